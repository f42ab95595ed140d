//! Specialized agents and their system prompts.
//!
//! Each agent owns a handle to a runtime and turns method calls into
//! invocations: a natural-language prompt for the live runtime, plus the
//! structured operation and parameters the local runtime dispatches on.

pub mod data_analyst;
pub mod report_generator;
pub mod research;

pub use data_analyst::DataAnalystAgent;
pub use report_generator::ReportGeneratorAgent;
pub use research::ResearchAgent;

use anyhow::Result;
use chrono::{DateTime, Utc};
use insight_crew_sdk::{AgentInvocation, AgentKind, AgentRuntime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const DATA_ANALYST_SYSTEM_PROMPT: &str = "\
You are a Data Analyst Agent specialized in processing and analyzing data.

Your responsibilities include:
1. Loading and processing data files (CSV)
2. Performing comprehensive statistical analysis
3. Identifying patterns, trends, and anomalies in data
4. Providing actionable insights based on data analysis

When analyzing data:
- Start by loading the data and understanding its structure
- Check for data quality issues (missing values, outliers, inconsistencies)
- Perform appropriate statistical analysis based on the data type";

pub const RESEARCH_SYSTEM_PROMPT: &str = "\
You are a Research Agent specialized in gathering and analyzing information from various sources.

Your responsibilities include:
1. Conducting comprehensive web searches for relevant information
2. Gathering data from multiple sources and cross-referencing
3. Performing market research and competitive analysis
4. Verifying facts and claims with reliable sources
5. Providing well-researched, factual insights with proper citations

When conducting research:
- Always search multiple sources to verify information
- Cross-reference facts from different sources";

pub const REPORT_GENERATOR_SYSTEM_PROMPT: &str = "\
You are a Report Generator Agent specialized in creating professional reports and documents.

Your responsibilities include:
1. Creating well-structured reports
2. Organizing content from various sources into coherent documents
3. Creating executive summaries and key findings sections
4. Maintaining consistent style and presentation

When creating reports:
- Start with a clear executive summary
- Organize content logically with clear sections";

pub const COORDINATOR_SYSTEM_PROMPT: &str = "\
You are a Coordinator Agent responsible for orchestrating multi-agent workflows.

Your responsibilities include:
1. Understanding complex user requests and breaking them down into tasks
2. Assigning tasks to appropriate specialized agents
3. Managing task dependencies and execution order
4. Monitoring task progress and handling failures
5. Aggregating results from multiple agents

Available specialized agents:
- Data Analyst Agent: Data processing, analysis, and insights
- Research Agent: Web research, fact-checking, market analysis
- Report Generator Agent: Creating reports and documents";

pub fn system_prompt_for(kind: AgentKind) -> &'static str {
    match kind {
        AgentKind::DataAnalyst => DATA_ANALYST_SYSTEM_PROMPT,
        AgentKind::Research => RESEARCH_SYSTEM_PROMPT,
        AgentKind::ReportGenerator => REPORT_GENERATOR_SYSTEM_PROMPT,
        AgentKind::Coordinator => COORDINATOR_SYSTEM_PROMPT,
    }
}

/// Uniform envelope around one agent method call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub agent: AgentKind,
    pub operation: String,
    pub timestamp: DateTime<Utc>,
    /// Echo of the arguments the method was called with
    pub arguments: Value,
    pub result: String,
}

/// Shared plumbing behind every agent method: numbered task ids and the
/// prompt/params split the two runtimes each consume their half of.
pub(crate) struct AgentCore {
    runtime: Arc<dyn AgentRuntime>,
    kind: AgentKind,
    seq: AtomicU64,
}

impl AgentCore {
    pub(crate) fn new(runtime: Arc<dyn AgentRuntime>, kind: AgentKind) -> Self {
        Self {
            runtime,
            kind,
            seq: AtomicU64::new(0),
        }
    }

    pub(crate) async fn invoke(
        &self,
        operation: &str,
        description: impl Into<String>,
        prompt: String,
        params: Value,
    ) -> Result<AgentResponse> {
        let n = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let invocation = AgentInvocation {
            task_id: format!("{}_{}", self.kind.as_str(), n),
            agent: self.kind,
            operation: operation.to_string(),
            description: description.into(),
            prompt,
            system_prompt: system_prompt_for(self.kind).to_string(),
            params: params.clone(),
        };

        let result = self
            .runtime
            .run(invocation)
            .await
            .map_err(|e| anyhow::anyhow!("{} {} failed: {}", self.kind, operation, e))?;

        Ok(AgentResponse {
            agent: self.kind,
            operation: operation.to_string(),
            timestamp: Utc::now(),
            arguments: params,
            result,
        })
    }
}
