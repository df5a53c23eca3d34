//! Identity types for Arcanea entities

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Instance identifier using UUIDv7 so ids sort by creation time.
pub type InstanceId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Duration in milliseconds for timeouts and measured run times.
pub type DurationMs = u64;

/// Generate a new UUIDv7 instance id.
pub fn new_instance_id() -> InstanceId {
    Uuid::now_v7()
}

/// Current wall-clock time.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Milliseconds elapsed since `start`, clamped at zero.
pub fn elapsed_ms(start: Timestamp) -> DurationMs {
    (Utc::now() - start).num_milliseconds().max(0) as DurationMs
}
