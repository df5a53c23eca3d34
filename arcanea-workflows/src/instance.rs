//! Workflow instances and run results

use arcanea_core::{DurationMs, InstanceId, Timestamp, ValueMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl WorkflowStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkflowStatus::Running)
    }
}

/// Outcome of one executed phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase_id: String,
    pub name: String,
    pub success: bool,
    pub guardian: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub input: ValueMap,
    pub duration_ms: DurationMs,
}

/// Live state of one workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub id: InstanceId,
    pub definition_id: String,
    pub name: String,
    pub context: Value,
    pub status: WorkflowStatus,
    pub current_phase: usize,
    pub total_phases: usize,
    pub phases: Vec<PhaseResult>,
    pub results_by_key: ValueMap,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub error: Option<String>,
    /// Instance that started this one through a `workflow` phase
    pub parent: Option<InstanceId>,
}

/// What `start_workflow` returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRunResult {
    pub success: bool,
    pub instance_id: InstanceId,
    pub workflow_id: String,
    pub workflow_name: String,
    pub status: WorkflowStatus,
    pub duration_ms: DurationMs,
    pub results_by_key: ValueMap,
    pub phases: Vec<PhaseResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Snapshot answering `get_workflow_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStatusReport {
    pub instance_id: InstanceId,
    pub name: String,
    pub status: WorkflowStatus,
    pub current_phase: usize,
    pub total_phases: usize,
    pub duration_ms: DurationMs,
    /// Share of phases executed, 0 to 100
    pub progress: f64,
    pub result_keys: Vec<String>,
}

/// Entry of `list_workflows`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub phases: usize,
    pub orchestrator: String,
}

impl WorkflowInstance {
    pub fn report(&self, now: Timestamp) -> WorkflowStatusReport {
        let end = self.ended_at.unwrap_or(now);
        let duration_ms = (end - self.started_at).num_milliseconds().max(0) as DurationMs;
        let progress = if self.total_phases == 0 {
            100.0
        } else {
            self.phases.len() as f64 / self.total_phases as f64 * 100.0
        };
        WorkflowStatusReport {
            instance_id: self.id,
            name: self.name.clone(),
            status: self.status,
            current_phase: self.current_phase,
            total_phases: self.total_phases,
            duration_ms,
            progress,
            result_keys: self.results_by_key.keys().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcanea_core::{new_instance_id, now};
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_report_progress_and_duration() {
        let started = now();
        let instance = WorkflowInstance {
            id: new_instance_id(),
            definition_id: "spell-creation".to_string(),
            name: "Arcane Spell Crafting".to_string(),
            context: json!({}),
            status: WorkflowStatus::Running,
            current_phase: 1,
            total_phases: 4,
            phases: vec![PhaseResult {
                phase_id: "concept".to_string(),
                name: "Spell Concept".to_string(),
                success: true,
                guardian: "void-gazer".to_string(),
                output: Some(json!("idea")),
                error: None,
                input: ValueMap::new(),
                duration_ms: 3,
            }],
            results_by_key: json!({"concept": "idea"}).as_object().cloned().unwrap(),
            started_at: started,
            ended_at: None,
            error: None,
            parent: None,
        };

        let report = instance.report(started + Duration::milliseconds(250));
        assert_eq!(report.progress, 25.0);
        assert_eq!(report.duration_ms, 250);
        assert_eq!(report.result_keys, vec!["concept"]);
        assert!(!report.status.is_terminal());
    }
}
