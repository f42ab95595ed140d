//! The task data model: lifecycle states and guarded transitions.
//!
//! `TaskStatus` is a closed set — every consumption site matches
//! exhaustively, and the only way to move a task between states is through
//! the [`WorkflowTask`] methods, which reject anything but
//! `Pending → InProgress → {Completed | Failed | Cancelled}`.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use insight_crew_sdk::AgentKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a workflow task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Terminal states admit no further transition
    pub fn is_terminal(&self) -> bool {
        match self {
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled => true,
            TaskStatus::Pending | TaskStatus::InProgress => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of delegated work inside a workflow.
///
/// Status, result, and timestamps are private: they only change through the
/// transition methods below, which enforce the lifecycle invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTask {
    pub task_id: String,
    pub agent: AgentKind,
    pub description: String,
    /// Named arguments handed to the agent
    #[serde(default)]
    pub parameters: serde_json::Value,
    /// Task ids that must reach `Completed` before this task may start
    #[serde(default)]
    pub dependencies: Vec<String>,
    status: TaskStatus,
    result: Option<String>,
    error: Option<String>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl WorkflowTask {
    pub fn new(
        task_id: impl Into<String>,
        agent: AgentKind,
        description: impl Into<String>,
        parameters: serde_json::Value,
        dependencies: Vec<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            agent,
            description: description.into(),
            parameters,
            dependencies,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Pending → InProgress
    pub fn start(&mut self) -> Result<()> {
        match self.status {
            TaskStatus::Pending => {
                self.status = TaskStatus::InProgress;
                self.started_at = Some(Utc::now());
                Ok(())
            }
            other => bail!("Task {} cannot start from state {}", self.task_id, other),
        }
    }

    /// InProgress → Completed, recording the agent's result
    pub fn complete(&mut self, result: impl Into<String>) -> Result<()> {
        match self.status {
            TaskStatus::InProgress => {
                self.status = TaskStatus::Completed;
                self.result = Some(result.into());
                self.completed_at = Some(Utc::now());
                Ok(())
            }
            other => bail!("Task {} cannot complete from state {}", self.task_id, other),
        }
    }

    /// InProgress → Failed, recording the error
    pub fn fail(&mut self, error: impl Into<String>) -> Result<()> {
        match self.status {
            TaskStatus::InProgress => {
                self.status = TaskStatus::Failed;
                self.error = Some(error.into());
                self.completed_at = Some(Utc::now());
                Ok(())
            }
            other => bail!("Task {} cannot fail from state {}", self.task_id, other),
        }
    }

    /// Pending | InProgress → Cancelled
    pub fn cancel(&mut self) -> Result<()> {
        match self.status {
            TaskStatus::Pending | TaskStatus::InProgress => {
                self.status = TaskStatus::Cancelled;
                self.completed_at = Some(Utc::now());
                Ok(())
            }
            other => bail!("Task {} cannot cancel from state {}", self.task_id, other),
        }
    }
}
