//! Multi-agent business analysis assistant.
//!
//! A coordinator plans free-text requests into dependency-ordered task
//! graphs and delegates the tasks to three specialized agents (data
//! analysis, research, report generation). Agents talk to a runtime
//! behind the [`insight_crew_sdk::AgentRuntime`] trait: Claude for live
//! runs, a deterministic local runtime for demos and tests.

pub mod agents;
pub mod config;
pub mod coordinator;
pub mod runtime;
pub mod tools;
pub mod workflow;

pub use config::{RuntimeMode, Settings};
pub use coordinator::{Coordinator, DispatchOutcome};
