//! Arcanea Events - Runtime Progress Notifications
//!
//! Every component reports progress (spell cast, trigger fired, workflow
//! phase completed) as a [`RuntimeEvent`] sent through an [`EventBus`].
//! Components hold the bus by value; callers that care subscribe, and
//! nothing in the core waits on a listener.
//!
//! - Uses a tokio broadcast channel for distribution
//! - Sending with no subscribers is a no-op
//! - Events are serde-serializable with a `type` tag

mod bus;
mod event;

pub use bus::{EventBus, DEFAULT_EVENT_CAPACITY};
pub use event::RuntimeEvent;
