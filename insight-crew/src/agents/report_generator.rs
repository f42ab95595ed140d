//! Report generator agent: comprehensive reports, executive summaries, and
//! report combination.

use anyhow::Result;
use insight_crew_sdk::{AgentKind, AgentRuntime};
use serde_json::json;
use std::sync::Arc;

use super::{AgentCore, AgentResponse};

pub struct ReportGeneratorAgent {
    core: AgentCore,
}

impl ReportGeneratorAgent {
    pub fn new(runtime: Arc<dyn AgentRuntime>) -> Self {
        Self {
            core: AgentCore::new(runtime, AgentKind::ReportGenerator),
        }
    }

    /// Build a full business report from upstream analysis and research
    pub async fn create_comprehensive_report(
        &self,
        title: &str,
        data_insights: &str,
        research_findings: &str,
    ) -> Result<AgentResponse> {
        let prompt = format!(
            "Create a comprehensive report with the title: \"{}\"\n\n\
             You have the following data insights:\n{}\n\n\
             And these research findings:\n{}\n\n\
             Structure the report with these sections:\n\
             1. Executive Summary\n\
             2. Data Analysis\n\
             3. Market Research\n\
             4. Recommendations\n\
             5. Conclusion\n\n\
             Ensure professional formatting and a logical flow between sections.",
            title, data_insights, research_findings
        );
        self.core
            .invoke(
                "create_comprehensive_report",
                format!("Creating report: {}", title),
                prompt,
                json!({
                    "title": title,
                    "data_insights": data_insights,
                    "research_findings": research_findings,
                }),
            )
            .await
    }

    /// Distill a longer document into an executive summary
    pub async fn create_executive_summary(&self, content: &str) -> Result<AgentResponse> {
        let prompt = format!(
            "Create a concise executive summary from the following content:\n\n{}\n\n\
             The executive summary should:\n\
             - Highlight the most critical findings\n\
             - Present key metrics and data points\n\
             - Provide clear, actionable recommendations\n\
             - Use bullet points for readability\n\n\
             Make it compelling and easy to read for busy executives.",
            content
        );
        self.core
            .invoke(
                "create_executive_summary",
                "Creating executive summary",
                prompt,
                json!({ "content": content }),
            )
            .await
    }

    /// Merge several reports into one document
    pub async fn combine_reports(&self, reports: &[String]) -> Result<AgentResponse> {
        let joined = reports.join("\n\n---\n\n");
        let prompt = format!(
            "Combine the following {} reports into a single coherent document, \
             removing duplication and harmonizing the structure:\n\n{}",
            reports.len(),
            joined
        );
        self.core
            .invoke(
                "combine_reports",
                format!("Combining {} reports", reports.len()),
                prompt,
                json!({ "reports": reports }),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::LocalRuntime;
    use serde_json::Value;

    fn agent() -> ReportGeneratorAgent {
        ReportGeneratorAgent::new(Arc::new(LocalRuntime::new(10 * 1024 * 1024)))
    }

    #[tokio::test]
    async fn test_comprehensive_report_is_markdown() {
        let response = agent()
            .create_comprehensive_report(
                "EV Market Entry",
                "Sales grew 15% quarter over quarter",
                "Three major players dominate the segment",
            )
            .await
            .unwrap();
        assert!(response.result.starts_with("# EV Market Entry"));
        assert!(response.result.contains("## Executive Summary"));
        assert!(response.result.contains("Sales grew 15%"));
    }

    #[tokio::test]
    async fn test_executive_summary_truncates_long_content() {
        let content = "finding ".repeat(200);
        let response = agent().create_executive_summary(&content).await.unwrap();
        let parsed: Value = serde_json::from_str(&response.result).unwrap();
        let summary = parsed["executive_summary"].as_str().unwrap();
        assert!(summary.chars().count() <= 601);
    }

    #[tokio::test]
    async fn test_combine_reports() {
        let response = agent()
            .combine_reports(&["# Alpha".to_string(), "# Beta".to_string()])
            .await
            .unwrap();
        assert!(response.result.contains("# Alpha"));
        assert!(response.result.contains("# Beta"));
    }
}
