//! Shared types for the insight-crew multi-agent assistant.
//!
//! This crate defines the pieces both CLI binaries and any external consumer
//! need to speak the same language as the coordinator:
//!
//! - [`AgentKind`] — the collaborator roles the coordinator can delegate to
//! - [`AgentInvocation`] + [`AgentRuntime`] — the boundary behind which the
//!   hosted LLM (or the deterministic local implementation) lives
//! - [`CrewLog`] — structured lifecycle events emitted to stderr, plus the
//!   `log_*!` macros that wrap them
//! - Console macros for human-readable CLI output

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export async trait for runtime implementors
pub use async_trait::async_trait;

/// Result type for runtime operations crossing the agent boundary
pub type CrewResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// The agent roles known to the coordinator.
///
/// Workflow tasks are only ever assigned to the three collaborator roles;
/// `Coordinator` exists so the free-text planning path can cross the same
/// runtime boundary as everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    DataAnalyst,
    Research,
    ReportGenerator,
    Coordinator,
}

impl AgentKind {
    /// Stable string identifier, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::DataAnalyst => "data_analyst",
            AgentKind::Research => "research",
            AgentKind::ReportGenerator => "report_generator",
            AgentKind::Coordinator => "coordinator",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data_analyst" => Ok(AgentKind::DataAnalyst),
            "research" | "research_agent" => Ok(AgentKind::Research),
            "report_generator" => Ok(AgentKind::ReportGenerator),
            "coordinator" => Ok(AgentKind::Coordinator),
            other => Err(format!("Unknown agent type: {}", other)),
        }
    }
}

/// One request crossing the runtime boundary.
///
/// Agents build both a natural-language `prompt` (consumed by the LLM-backed
/// runtime) and a structured `operation` + `params` pair (consumed by the
/// deterministic local runtime), so either implementation can answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInvocation {
    /// Task this invocation belongs to (for event correlation)
    pub task_id: String,
    /// Which collaborator should answer
    pub agent: AgentKind,
    /// Operation name, e.g. `analyze_file` or `conduct_market_research`
    pub operation: String,
    /// Human-readable summary of what is being asked
    pub description: String,
    /// Full prompt for the LLM-backed runtime
    pub prompt: String,
    /// System prompt establishing the agent's role
    pub system_prompt: String,
    /// Structured arguments for the deterministic runtime
    #[serde(default)]
    pub params: serde_json::Value,
}

/// The boundary behind which agent execution happens.
///
/// Two implementations exist: one streaming the hosted LLM, one computing
/// deterministic results locally. Selected by configuration so tests only
/// ever touch the local one.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Execute one invocation and return the full response text
    async fn run(&self, invocation: AgentInvocation) -> CrewResult<String>;

    /// Short identifier for logs and the status surface
    fn name(&self) -> &'static str;
}

/// Structured lifecycle events emitted by workflows and agents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrewLog {
    /// Workflow run started
    WorkflowStarted {
        workflow_id: String,
        total_tasks: usize,
    },
    /// Workflow run finished with every task completed
    WorkflowCompleted { workflow_id: String },
    /// Workflow run finished with at least one failed task
    WorkflowFailed { workflow_id: String, error: String },
    /// Task moved to in-progress
    TaskStarted {
        task_id: String,
        description: String,
        total_tasks: Option<usize>,
    },
    /// Task progress update
    TaskProgress { task_id: String, message: String },
    /// Task completed
    TaskCompleted {
        task_id: String,
        result: Option<String>,
    },
    /// Task failed
    TaskFailed { task_id: String, error: String },
    /// Task cancelled because a dependency did not complete
    TaskCancelled { task_id: String, reason: String },
    /// Agent started answering an invocation
    AgentStarted {
        task_id: String,
        agent: String,
        description: String,
    },
    /// Streaming agent output
    AgentMessage {
        task_id: String,
        agent: String,
        message: String,
    },
    /// Agent finished
    AgentCompleted {
        task_id: String,
        agent: String,
        result: Option<String>,
    },
    /// Agent errored
    AgentFailed {
        task_id: String,
        agent: String,
        error: String,
    },
}

impl CrewLog {
    /// Emit this event to stderr as a `__CREW_EVENT__:` line for machine parsing
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            use std::io::Write;
            eprintln!("__CREW_EVENT__:{}", json);
            // Force flush stderr in async/concurrent contexts
            let _ = std::io::stderr().flush();
        }
    }
}

#[macro_export]
macro_rules! log_workflow_start {
    ($workflow_id:expr, $total:expr) => {
        $crate::CrewLog::WorkflowStarted {
            workflow_id: $workflow_id.to_string(),
            total_tasks: $total,
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_workflow_complete {
    ($workflow_id:expr) => {
        $crate::CrewLog::WorkflowCompleted {
            workflow_id: $workflow_id.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_workflow_failed {
    ($workflow_id:expr, $error:expr) => {
        $crate::CrewLog::WorkflowFailed {
            workflow_id: $workflow_id.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_task_start {
    ($task_id:expr, $desc:expr) => {
        $crate::CrewLog::TaskStarted {
            task_id: $task_id.to_string(),
            description: $desc.to_string(),
            total_tasks: None,
        }
        .emit();
    };
    ($task_id:expr, $desc:expr, $total:expr) => {
        $crate::CrewLog::TaskStarted {
            task_id: $task_id.to_string(),
            description: $desc.to_string(),
            total_tasks: Some($total),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_task_progress {
    ($task_id:expr, $msg:expr) => {
        $crate::CrewLog::TaskProgress {
            task_id: $task_id.to_string(),
            message: $msg.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_task_complete {
    ($task_id:expr) => {
        $crate::CrewLog::TaskCompleted {
            task_id: $task_id.to_string(),
            result: None,
        }
        .emit();
    };
    ($task_id:expr, $result:expr) => {
        $crate::CrewLog::TaskCompleted {
            task_id: $task_id.to_string(),
            result: Some($result.to_string()),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_task_failed {
    ($task_id:expr, $error:expr) => {
        $crate::CrewLog::TaskFailed {
            task_id: $task_id.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_task_cancelled {
    ($task_id:expr, $reason:expr) => {
        $crate::CrewLog::TaskCancelled {
            task_id: $task_id.to_string(),
            reason: $reason.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_agent_start {
    ($task_id:expr, $agent:expr, $desc:expr) => {
        $crate::CrewLog::AgentStarted {
            task_id: $task_id.to_string(),
            agent: $agent.to_string(),
            description: $desc.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_agent_message {
    ($task_id:expr, $agent:expr, $msg:expr) => {
        $crate::CrewLog::AgentMessage {
            task_id: $task_id.to_string(),
            agent: $agent.to_string(),
            message: $msg.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_agent_complete {
    ($task_id:expr, $agent:expr) => {
        $crate::CrewLog::AgentCompleted {
            task_id: $task_id.to_string(),
            agent: $agent.to_string(),
            result: None,
        }
        .emit();
    };
    ($task_id:expr, $agent:expr, $result:expr) => {
        $crate::CrewLog::AgentCompleted {
            task_id: $task_id.to_string(),
            agent: $agent.to_string(),
            result: Some($result.to_string()),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_agent_failed {
    ($task_id:expr, $agent:expr, $error:expr) => {
        $crate::CrewLog::AgentFailed {
            task_id: $task_id.to_string(),
            agent: $agent.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

// ============================================================================
// Console Logging Macros (human-readable CLI output)
// ============================================================================

/// Logs the start of a CLI step with a colored header.
///
/// # Example
/// ```
/// use insight_crew_sdk::log_step_start;
/// log_step_start!(1, "Data Analysis", "Analyzing sales_q3.csv");
/// ```
#[macro_export]
macro_rules! log_step_start {
    ($step:expr, $title:expr, $description:expr) => {
        println!("\x1b[1;36m═══ STEP {}: {} ═══\x1b[0m", $step, $title);
        println!("\x1b[36m{}\x1b[0m", $description);
    };
}

/// Logs the completion of a CLI step.
#[macro_export]
macro_rules! log_step_complete {
    ($step:expr) => {
        println!("\x1b[32m✓ Step {} complete\x1b[0m", $step);
    };
}

/// Logs an informational message.
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        println!("\x1b[36mℹ {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[36mℹ {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs a warning message.
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", format!($fmt, $($arg)*));
    };
}
