//! Keyword-driven workflow planning.
//!
//! The planner turns a free-text request into an ordered task list: a
//! data-analysis task if the request mentions data work, a research task if
//! it mentions research work, and a report task that depends on everything
//! created before it. A request matching no category yields an empty plan,
//! not an error.

use chrono::Local;
use insight_crew_sdk::AgentKind;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::task::WorkflowTask;

const DATA_KEYWORDS: &[&str] = &["data", "analyze", "csv", "excel", "statistics"];
const RESEARCH_KEYWORDS: &[&str] = &["research", "market", "competitor", "trend", "search"];
const REPORT_KEYWORDS: &[&str] = &["report", "document", "summary", "presentation"];

/// Minutes estimated per task, a deliberately rough heuristic
const MINUTES_PER_TASK: u64 = 2;

/// A planned workflow: advisory until registered with the coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowPlan {
    pub workflow_id: String,
    pub user_request: String,
    pub requirements: Vec<String>,
    pub tasks: Vec<WorkflowTask>,
    pub estimated_duration_minutes: u64,
}

/// Produce a plan for a user request.
///
/// Task ids are `task_1`, `task_2`, … in creation order; the report task,
/// when present, depends on every task created before it.
pub fn plan_workflow(user_request: &str, requirements: &[String]) -> WorkflowPlan {
    let workflow_id = format!("workflow_{}", Local::now().format("%Y%m%d_%H%M%S"));
    let request_lower = user_request.to_lowercase();
    let mut tasks: Vec<WorkflowTask> = Vec::new();

    if contains_any(&request_lower, DATA_KEYWORDS) {
        tasks.push(WorkflowTask::new(
            format!("task_{}", tasks.len() + 1),
            AgentKind::DataAnalyst,
            "Analyze data and provide insights",
            json!({ "request": user_request }),
            vec![],
        ));
    }

    if contains_any(&request_lower, RESEARCH_KEYWORDS) {
        tasks.push(WorkflowTask::new(
            format!("task_{}", tasks.len() + 1),
            AgentKind::Research,
            "Conduct research and gather information",
            json!({ "request": user_request }),
            vec![],
        ));
    }

    // The report always waits on every prior task, never on other reports
    if contains_any(&request_lower, REPORT_KEYWORDS) {
        let dependencies: Vec<String> = tasks.iter().map(|t| t.task_id.clone()).collect();
        tasks.push(WorkflowTask::new(
            format!("task_{}", tasks.len() + 1),
            AgentKind::ReportGenerator,
            "Generate comprehensive report",
            json!({ "request": user_request, "requirements": requirements }),
            dependencies,
        ));
    }

    let estimated_duration_minutes = tasks.len() as u64 * MINUTES_PER_TASK;
    WorkflowPlan {
        workflow_id,
        user_request: user_request.to_string(),
        requirements: requirements.to_vec(),
        tasks,
        estimated_duration_minutes,
    }
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::task::TaskStatus;

    #[test]
    fn test_data_request_yields_single_analyst_task() {
        let plan = plan_workflow("Analyze this CSV and give me statistics", &[]);
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].agent, AgentKind::DataAnalyst);
        assert!(plan.tasks[0].dependencies.is_empty());
        assert_eq!(plan.tasks[0].status(), TaskStatus::Pending);
        assert_eq!(plan.estimated_duration_minutes, 2);
    }

    #[test]
    fn test_report_depends_on_all_prior_tasks() {
        let plan = plan_workflow("Research competitors and produce a report", &[]);
        assert_eq!(plan.tasks.len(), 2);
        assert_eq!(plan.tasks[0].agent, AgentKind::Research);
        assert_eq!(plan.tasks[1].agent, AgentKind::ReportGenerator);
        assert_eq!(
            plan.tasks[1].dependencies,
            vec![plan.tasks[0].task_id.clone()]
        );
    }

    #[test]
    fn test_full_pipeline_ordering() {
        let plan = plan_workflow(
            "Analyze the sales data, research market trends, and write a summary document",
            &["include charts".to_string()],
        );
        assert_eq!(plan.tasks.len(), 3);
        assert_eq!(plan.tasks[0].task_id, "task_1");
        assert_eq!(plan.tasks[1].task_id, "task_2");
        assert_eq!(plan.tasks[2].task_id, "task_3");
        assert_eq!(
            plan.tasks[2].dependencies,
            vec!["task_1".to_string(), "task_2".to_string()]
        );
        assert_eq!(plan.estimated_duration_minutes, 6);
    }

    #[test]
    fn test_no_keywords_yields_empty_plan() {
        let plan = plan_workflow("Say hello", &[]);
        assert!(plan.tasks.is_empty());
        assert_eq!(plan.estimated_duration_minutes, 0);
    }

    #[test]
    fn test_keyword_matching_is_case_insensitive() {
        let plan = plan_workflow("RESEARCH the EV MARKET", &[]);
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].agent, AgentKind::Research);
    }

    #[test]
    fn test_workflow_id_format() {
        let plan = plan_workflow("Say hello", &[]);
        assert!(plan.workflow_id.starts_with("workflow_"));
        // workflow_YYYYMMDD_HHMMSS
        assert_eq!(plan.workflow_id.len(), "workflow_".len() + 15);
    }
}
