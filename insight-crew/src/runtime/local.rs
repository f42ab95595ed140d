//! Deterministic local runtime.
//!
//! Executes invocations without any model or network access: data work
//! profiles real files, research synthesizes findings from the mock search
//! tools, and reports are assembled from whatever upstream results arrive
//! in the parameters. Output is shaped like the live runtime's so the two
//! are interchangeable.

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use insight_crew_sdk::{
    async_trait, log_agent_complete, log_agent_failed, log_agent_start, AgentInvocation,
    AgentKind, AgentRuntime, CrewResult,
};
use serde_json::{json, Value};
use std::path::Path;

use crate::tools::data::{analyze_csv, segment_csv};
use crate::tools::report::assemble_business_report;
use crate::tools::search::{verify_facts, web_search};

pub struct LocalRuntime {
    max_file_bytes: u64,
}

impl LocalRuntime {
    pub fn new(max_file_bytes: u64) -> Self {
        Self { max_file_bytes }
    }

    fn dispatch(&self, invocation: &AgentInvocation) -> Result<String> {
        match invocation.agent {
            AgentKind::DataAnalyst => self.run_data_analyst(invocation),
            AgentKind::Research => self.run_research(invocation),
            AgentKind::ReportGenerator => self.run_report_generator(invocation),
            AgentKind::Coordinator => {
                bail!("coordinator work is not dispatched through a runtime")
            }
        }
    }

    fn run_data_analyst(&self, invocation: &AgentInvocation) -> Result<String> {
        let params = &invocation.params;
        match invocation.operation.as_str() {
            "analyze_file" | "generate_report_data" => {
                let path = require_str(params, "file_path")?;
                let analysis = analyze_csv(Path::new(path), self.max_file_bytes)?;
                to_completed_json(invocation.agent, json!({ "analysis": analysis }))
            }
            "compare_datasets" => {
                let path_a = require_str(params, "file_a")?;
                let path_b = require_str(params, "file_b")?;
                let a = analyze_csv(Path::new(path_a), self.max_file_bytes)?;
                let b = analyze_csv(Path::new(path_b), self.max_file_bytes)?;
                let row_delta = b.rows as i64 - a.rows as i64;
                to_completed_json(
                    invocation.agent,
                    json!({
                        "comparison": {
                            "first": a,
                            "second": b,
                            "row_delta": row_delta,
                        }
                    }),
                )
            }
            "perform_segmentation" => {
                let path = require_str(params, "file_path")?;
                let segment_column = require_str(params, "segment_column")?;
                let target_column = params.get("target_column").and_then(Value::as_str);
                let segmentation = segment_csv(
                    Path::new(path),
                    self.max_file_bytes,
                    segment_column,
                    target_column,
                )?;
                to_completed_json(invocation.agent, json!({ "segmentation": segmentation }))
            }
            "forecast_trends" => {
                let metric = require_str(params, "metric")?;
                let periods = params
                    .get("periods")
                    .and_then(Value::as_u64)
                    .unwrap_or(4);
                // Flat 5%-per-period projection off a base of 100
                let projection: Vec<f64> = (1..=periods)
                    .map(|p| 100.0 * 1.05_f64.powi(p as i32))
                    .collect();
                to_completed_json(
                    invocation.agent,
                    json!({
                        "forecast": {
                            "metric": metric,
                            "periods": periods,
                            "projection": projection,
                            "assumption": "5% growth per period from an indexed base of 100",
                        }
                    }),
                )
            }
            "execute_task" => {
                if let Some(path) = params.get("file_path").and_then(Value::as_str) {
                    let analysis = analyze_csv(Path::new(path), self.max_file_bytes)?;
                    to_completed_json(invocation.agent, json!({ "analysis": analysis }))
                } else {
                    let request = params
                        .get("request")
                        .and_then(Value::as_str)
                        .unwrap_or(&invocation.description);
                    to_completed_json(
                        invocation.agent,
                        json!({
                            "analysis": {
                                "request": request,
                                "insights": [
                                    "No dataset was supplied, analysis based on the request text",
                                    "Provide a CSV file for quantitative results",
                                ],
                            }
                        }),
                    )
                }
            }
            other => Err(unknown_operation(invocation.agent, other)),
        }
    }

    fn run_research(&self, invocation: &AgentInvocation) -> Result<String> {
        let params = &invocation.params;
        match invocation.operation.as_str() {
            "conduct_market_research" | "execute_task" => {
                let topic = params
                    .get("topic")
                    .or_else(|| params.get("request"))
                    .and_then(Value::as_str)
                    .unwrap_or(&invocation.description);
                let sources = web_search(topic, 5);
                to_completed_json(
                    invocation.agent,
                    json!({
                        "research": {
                            "topic": topic,
                            "sources_consulted": sources.len(),
                            "sources": sources,
                            "overall_insights": [
                                format!("The {} market shows strong potential for growth", topic),
                                "Technology innovation is a key driver",
                                "Competition is intensifying with new entrants",
                            ],
                        }
                    }),
                )
            }
            "analyze_competitors" => {
                let competitors = params
                    .get("competitors")
                    .and_then(Value::as_array)
                    .ok_or_else(|| anyhow!("analyze_competitors requires a 'competitors' list"))?;
                let profiles: Vec<Value> = competitors
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|name| {
                        json!({
                            "name": name,
                            "positioning": format!("{} competes on product breadth and pricing", name),
                            "sources": web_search(name, 3),
                        })
                    })
                    .collect();
                to_completed_json(invocation.agent, json!({ "competitors": profiles }))
            }
            "research_industry_trends" => {
                let industry = require_str(params, "industry")?;
                to_completed_json(
                    invocation.agent,
                    json!({
                        "trends": {
                            "industry": industry,
                            "emerging": [
                                format!("Automation is reshaping {}", industry),
                                "Sustainability requirements are tightening",
                                "Consolidation among mid-size players",
                            ],
                            "outlook": "Positive growth expected",
                            "sources": web_search(industry, 5),
                        }
                    }),
                )
            }
            "gather_customer_insights" => {
                let product = require_str(params, "product_or_service")?;
                let aspects: Vec<&str> = params
                    .get("aspects")
                    .and_then(Value::as_array)
                    .map(|a| a.iter().filter_map(Value::as_str).collect())
                    .unwrap_or_default();
                let themes: Vec<Value> = aspects
                    .iter()
                    .map(|aspect| {
                        json!({
                            "aspect": aspect,
                            "summary": format!("Customers frequently mention {} when discussing {}", aspect, product),
                            "sentiment": "mixed_positive",
                        })
                    })
                    .collect();
                to_completed_json(
                    invocation.agent,
                    json!({
                        "customer_insights": {
                            "product_or_service": product,
                            "overall_sentiment": "mixed_positive",
                            "themes": themes,
                            "pain_points": [
                                format!("Pricing transparency for {}", product),
                                "Inconsistent support response times",
                            ],
                            "sources": web_search(product, 5),
                        }
                    }),
                )
            }
            "research_best_practices" => {
                let topic = require_str(params, "topic")?;
                let industry = params.get("industry").and_then(Value::as_str);
                to_completed_json(
                    invocation.agent,
                    json!({
                        "best_practices": {
                            "topic": topic,
                            "industry": industry,
                            "recommendations": [
                                format!("Establish measurable goals before adopting {}", topic),
                                "Pilot with a small scope and iterate",
                                "Document the rollout and review it quarterly",
                            ],
                            "pitfalls": [
                                "Skipping stakeholder alignment",
                                "Scaling before the pilot proves out",
                            ],
                            "sources": web_search(topic, 5),
                        }
                    }),
                )
            }
            "fact_check_claims" => {
                let claims: Vec<String> = params
                    .get("claims")
                    .and_then(Value::as_array)
                    .ok_or_else(|| anyhow!("fact_check_claims requires a 'claims' list"))?
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect();
                to_completed_json(invocation.agent, json!({ "fact_checks": verify_facts(&claims) }))
            }
            other => Err(unknown_operation(invocation.agent, other)),
        }
    }

    fn run_report_generator(&self, invocation: &AgentInvocation) -> Result<String> {
        let params = &invocation.params;
        match invocation.operation.as_str() {
            "create_comprehensive_report" | "execute_task" => {
                let title = params
                    .get("title")
                    .or_else(|| params.get("request"))
                    .and_then(Value::as_str)
                    .unwrap_or("Analysis Report");

                // Upstream results arrive either as named fields or folded in
                // as dependency_results by the scheduler
                let data_analysis = upstream_text(params, "data_insights");
                let market_research = upstream_text(params, "research_findings");
                let dependency_digest = dependency_digest(params);

                let report = assemble_business_report(
                    title,
                    &format!(
                        "This report analyzes {} based on data analysis and market research. \
                         Key findings indicate significant opportunities for growth and optimization.",
                        title
                    ),
                    &data_analysis,
                    &if market_research.is_empty() {
                        dependency_digest
                    } else {
                        market_research
                    },
                    "Leverage data insights to optimize operations. \
                     Capitalize on identified market opportunities.",
                    &format!(
                        "This comprehensive analysis of {} provides a foundation for strategic decision-making.",
                        title
                    ),
                );
                Ok(report.to_markdown())
            }
            "create_executive_summary" => {
                let content = require_str(params, "content")?;
                let mut summary: String = content.chars().take(600).collect();
                if summary.len() < content.len() {
                    summary.push('…');
                }
                to_completed_json(
                    invocation.agent,
                    json!({ "executive_summary": summary }),
                )
            }
            "combine_reports" => {
                let reports = params
                    .get("reports")
                    .and_then(Value::as_array)
                    .ok_or_else(|| anyhow!("combine_reports requires a 'reports' list"))?;
                let combined: Vec<String> = reports
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect();
                Ok(combined.join("\n\n---\n\n"))
            }
            other => Err(unknown_operation(invocation.agent, other)),
        }
    }
}

fn require_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("missing required parameter '{}'", key))
}

fn unknown_operation(agent: AgentKind, operation: &str) -> anyhow::Error {
    anyhow!("agent {} has no operation '{}'", agent, operation)
}

/// Wrap a payload the way the live agents report structured results
fn to_completed_json(agent: AgentKind, payload: Value) -> Result<String> {
    let mut wrapped = json!({
        "agent": agent.as_str(),
        "status": "completed",
        "timestamp": Utc::now().to_rfc3339(),
    });
    if let (Value::Object(target), Value::Object(source)) = (&mut wrapped, payload) {
        for (k, v) in source {
            target.insert(k, v);
        }
    }
    Ok(serde_json::to_string_pretty(&wrapped)?)
}

fn upstream_text(params: &Value, key: &str) -> String {
    match params.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) if !other.is_null() => other.to_string(),
        _ => String::new(),
    }
}

/// Flatten scheduler-provided dependency results into readable lines
fn dependency_digest(params: &Value) -> String {
    params
        .get("dependency_results")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(task_id, result)| {
                    let text = result.as_str().unwrap_or_default();
                    let short: String = text.chars().take(400).collect();
                    format!("Result from {}: {}", task_id, short)
                })
                .collect::<Vec<_>>()
                .join("\n\n")
        })
        .unwrap_or_default()
}

#[async_trait]
impl AgentRuntime for LocalRuntime {
    async fn run(&self, invocation: AgentInvocation) -> CrewResult<String> {
        log_agent_start!(
            invocation.task_id,
            invocation.agent.as_str(),
            invocation.description
        );

        match self.dispatch(&invocation) {
            Ok(result) => {
                log_agent_complete!(invocation.task_id, invocation.agent.as_str(), "Completed");
                Ok(result)
            }
            Err(e) => {
                log_agent_failed!(invocation.task_id, invocation.agent.as_str(), e.to_string());
                Err(e.into())
            }
        }
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn invocation(agent: AgentKind, operation: &str, params: Value) -> AgentInvocation {
        AgentInvocation {
            task_id: "task_1".to_string(),
            agent,
            operation: operation.to_string(),
            description: "test invocation".to_string(),
            prompt: String::new(),
            system_prompt: String::new(),
            params,
        }
    }

    fn runtime() -> LocalRuntime {
        LocalRuntime::new(10 * 1024 * 1024)
    }

    #[tokio::test]
    async fn test_analyze_file_profiles_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"region,sales\nnorth,100\nsouth,200\n").unwrap();
        file.flush().unwrap();

        let result = runtime()
            .run(invocation(
                AgentKind::DataAnalyst,
                "analyze_file",
                json!({ "file_path": file.path() }),
            ))
            .await
            .unwrap();

        let parsed: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["status"], "completed");
        assert_eq!(parsed["analysis"]["rows"], 2);
    }

    #[tokio::test]
    async fn test_analyze_file_missing_path_is_error() {
        let err = runtime()
            .run(invocation(AgentKind::DataAnalyst, "analyze_file", json!({})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("file_path"));
    }

    #[tokio::test]
    async fn test_unknown_operation_is_error() {
        let err = runtime()
            .run(invocation(AgentKind::Research, "summon_dragons", json!({})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("summon_dragons"));
    }

    #[tokio::test]
    async fn test_market_research_shape() {
        let result = runtime()
            .run(invocation(
                AgentKind::Research,
                "conduct_market_research",
                json!({ "topic": "electric vehicles" }),
            ))
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["research"]["topic"], "electric vehicles");
        assert_eq!(parsed["research"]["sources_consulted"], 5);
    }

    #[tokio::test]
    async fn test_fact_check_claims() {
        let result = runtime()
            .run(invocation(
                AgentKind::Research,
                "fact_check_claims",
                json!({ "claims": ["The market doubled"] }),
            ))
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["fact_checks"][0]["status"], "partially_true");
    }

    #[tokio::test]
    async fn test_report_includes_dependency_results() {
        let result = runtime()
            .run(invocation(
                AgentKind::ReportGenerator,
                "execute_task",
                json!({
                    "request": "EV market entry",
                    "dependency_results": { "task_1": "North region leads sales" },
                }),
            ))
            .await
            .unwrap();
        assert!(result.contains("# EV market entry"));
        assert!(result.contains("North region leads sales"));
    }

    #[tokio::test]
    async fn test_combine_reports_joins_sections() {
        let result = runtime()
            .run(invocation(
                AgentKind::ReportGenerator,
                "combine_reports",
                json!({ "reports": ["# One", "# Two"] }),
            ))
            .await
            .unwrap();
        assert!(result.contains("# One"));
        assert!(result.contains("---"));
        assert!(result.contains("# Two"));
    }

    #[tokio::test]
    async fn test_coordinator_kind_rejected() {
        assert!(runtime()
            .run(invocation(AgentKind::Coordinator, "execute_task", json!({})))
            .await
            .is_err());
    }
}
