//! Workflow status reporting.
//!
//! Summarizes a workflow's task-state distribution. An unresolvable
//! workflow id produces an explicit not-found payload rather than an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::graph::Workflow;
use super::task::TaskStatus;

/// Per-task detail in a status report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDetail {
    pub agent_type: String,
    pub description: String,
    pub status: TaskStatus,
    pub dependencies: Vec<String>,
}

/// Task-state distribution plus per-task detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub workflow_id: String,
    pub total_tasks: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Keyed by task id; BTreeMap keeps JSON output stable
    pub tasks: BTreeMap<String, TaskDetail>,
}

/// Reply from the status reporter: a report, or an explicit not-found payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusResponse {
    Report(StatusReport),
    NotFound {
        error: String,
        workflow_id: Option<String>,
    },
}

impl StatusResponse {
    pub fn not_found(workflow_id: Option<String>) -> Self {
        StatusResponse::NotFound {
            error: "No workflow found".to_string(),
            workflow_id,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StatusResponse::NotFound { .. })
    }
}

/// Summarize one workflow
pub fn summarize(workflow: &Workflow) -> StatusReport {
    let tasks = workflow
        .tasks()
        .map(|t| {
            (
                t.task_id.clone(),
                TaskDetail {
                    agent_type: t.agent.to_string(),
                    description: t.description.clone(),
                    status: t.status(),
                    dependencies: t.dependencies.clone(),
                },
            )
        })
        .collect();

    StatusReport {
        workflow_id: workflow.workflow_id.clone(),
        total_tasks: workflow.len(),
        completed: workflow.count_in(TaskStatus::Completed),
        in_progress: workflow.count_in(TaskStatus::InProgress),
        pending: workflow.count_in(TaskStatus::Pending),
        failed: workflow.count_in(TaskStatus::Failed),
        cancelled: workflow.count_in(TaskStatus::Cancelled),
        tasks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::task::WorkflowTask;
    use insight_crew_sdk::AgentKind;
    use serde_json::json;

    fn task(id: &str) -> WorkflowTask {
        WorkflowTask::new(id, AgentKind::DataAnalyst, "work", json!({}), vec![])
    }

    #[test]
    fn test_counts_by_status() {
        let mut wf = Workflow::new(
            "workflow_counts",
            vec![task("t1"), task("t2"), task("t3"), task("t4")],
        )
        .unwrap();
        // t3 completed, t4 failed, t1/t2 remain pending
        wf.get_mut("t3").unwrap().start().unwrap();
        wf.get_mut("t3").unwrap().complete("ok").unwrap();
        wf.get_mut("t4").unwrap().start().unwrap();
        wf.get_mut("t4").unwrap().fail("boom").unwrap();

        let report = summarize(&wf);
        assert_eq!(report.total_tasks, 4);
        assert_eq!(report.pending, 2);
        assert_eq!(report.completed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.in_progress, 0);
        assert_eq!(report.cancelled, 0);
    }

    #[test]
    fn test_task_detail_fields() {
        let wf = Workflow::new(
            "workflow_detail",
            vec![WorkflowTask::new(
                "task_1",
                AgentKind::Research,
                "Conduct research and gather information",
                json!({}),
                vec![],
            )],
        )
        .unwrap();

        let report = summarize(&wf);
        let detail = &report.tasks["task_1"];
        assert_eq!(detail.agent_type, "research");
        assert_eq!(detail.status, TaskStatus::Pending);
        assert!(detail.dependencies.is_empty());
    }

    #[test]
    fn test_not_found_payload_serializes_with_error() {
        let response = StatusResponse::not_found(Some("workflow_missing".to_string()));
        assert!(response.is_not_found());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], "No workflow found");
        assert_eq!(json["workflow_id"], "workflow_missing");
    }
}
