//! Workflow model, planning, scheduling, and status reporting.

pub mod graph;
pub mod planner;
pub mod scheduler;
pub mod status;
pub mod task;

pub use graph::Workflow;
pub use planner::{plan_workflow, WorkflowPlan};
pub use scheduler::{run_workflow, RunStatus, RunSummary};
pub use status::{summarize, StatusReport, StatusResponse, TaskDetail};
pub use task::{TaskStatus, WorkflowTask};
