//! Deterministic tool implementations the agents build on: tabular data
//! profiling, web search and retrieval, and report assembly.

pub mod data;
pub mod report;
pub mod search;
