//! The coordinator: plans workflows, delegates work to the specialized
//! agents, runs registered workflows through the scheduler, and reports
//! status.
//!
//! Workflow state lives in a mutex-guarded map keyed by workflow id. The
//! lock is never held across an await: a workflow is removed from the map
//! for the duration of a run and reinserted when the run finishes.

use anyhow::{anyhow, Context, Result};
use insight_crew_sdk::{AgentInvocation, AgentKind, AgentRuntime};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::agents::{
    system_prompt_for, DataAnalystAgent, ReportGeneratorAgent, ResearchAgent,
};
use crate::config::Settings;
use crate::runtime::runtime_from_settings;
use crate::tools::search::{fetch_client, fetch_multiple_urls, FetchOutcome};
use crate::workflow::{
    plan_workflow, run_workflow, summarize, RunSummary, StatusResponse, Workflow, WorkflowPlan,
};

/// Shallow result of a direct delegation: failure is data, not an error
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Completed { agent: AgentKind, result: String },
    Failed { agent: AgentKind, error: String },
}

pub struct Coordinator {
    settings: Settings,
    runtime: Arc<dyn AgentRuntime>,
    pub data_analyst: DataAnalystAgent,
    pub research: ResearchAgent,
    pub report_generator: ReportGeneratorAgent,
    workflows: Mutex<HashMap<String, Workflow>>,
    current_workflow: Mutex<Option<String>>,
}

impl Coordinator {
    pub fn new(settings: Settings, runtime: Arc<dyn AgentRuntime>) -> Self {
        Self {
            data_analyst: DataAnalystAgent::new(runtime.clone()),
            research: ResearchAgent::new(runtime.clone()),
            report_generator: ReportGeneratorAgent::new(runtime.clone()),
            settings,
            runtime,
            workflows: Mutex::new(HashMap::new()),
            current_workflow: Mutex::new(None),
        }
    }

    /// Build a coordinator with the runtime the settings select
    pub fn from_settings(settings: Settings) -> Self {
        let runtime = runtime_from_settings(&settings);
        Self::new(settings, runtime)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Plan a workflow from a user request and register it for execution.
    ///
    /// The plan is validated as a dependency graph before registration; a
    /// request matching no task category registers an empty workflow.
    pub fn create_plan(&self, user_request: &str, requirements: &[String]) -> Result<WorkflowPlan> {
        let mut plan = plan_workflow(user_request, requirements);

        {
            // Timestamp ids have second resolution; suffix on collision so a
            // plan never silently replaces an earlier one
            let guard = self
                .workflows
                .lock()
                .map_err(|_| anyhow!("workflow map lock poisoned"))?;
            if guard.contains_key(&plan.workflow_id) {
                let base = plan.workflow_id.clone();
                let mut n = 2;
                while guard.contains_key(&format!("{}_{}", base, n)) {
                    n += 1;
                }
                plan.workflow_id = format!("{}_{}", base, n);
            }
        }

        let workflow = Workflow::new(plan.workflow_id.clone(), plan.tasks.clone())
            .with_context(|| format!("registering workflow {}", plan.workflow_id))?;

        self.workflows
            .lock()
            .map_err(|_| anyhow!("workflow map lock poisoned"))?
            .insert(plan.workflow_id.clone(), workflow);
        *self
            .current_workflow
            .lock()
            .map_err(|_| anyhow!("current workflow lock poisoned"))? =
            Some(plan.workflow_id.clone());

        Ok(plan)
    }

    /// Status of a workflow by id, or of the most recently created one
    pub fn workflow_status(&self, workflow_id: Option<&str>) -> StatusResponse {
        let resolved = match workflow_id {
            Some(id) => Some(id.to_string()),
            None => self
                .current_workflow
                .lock()
                .ok()
                .and_then(|guard| guard.clone()),
        };

        let Some(id) = resolved else {
            return StatusResponse::not_found(None);
        };

        match self.workflows.lock() {
            Ok(guard) => match guard.get(&id) {
                Some(workflow) => StatusResponse::Report(summarize(workflow)),
                None => StatusResponse::not_found(Some(id)),
            },
            Err(_) => StatusResponse::not_found(Some(id)),
        }
    }

    /// Run a registered workflow to termination.
    ///
    /// The workflow leaves the shared map while it runs and is reinserted
    /// with its final task states afterwards.
    pub async fn run_workflow(&self, workflow_id: Option<&str>) -> Result<RunSummary> {
        let id = match workflow_id {
            Some(id) => id.to_string(),
            None => self
                .current_workflow
                .lock()
                .map_err(|_| anyhow!("current workflow lock poisoned"))?
                .clone()
                .ok_or_else(|| anyhow!("no workflow has been created yet"))?,
        };

        let mut workflow = self
            .workflows
            .lock()
            .map_err(|_| anyhow!("workflow map lock poisoned"))?
            .remove(&id)
            .ok_or_else(|| anyhow!("no workflow found with id {}", id))?;

        let outcome = run_workflow(&mut workflow, self.runtime.clone(), self.settings.batch_size)
            .await;

        self.workflows
            .lock()
            .map_err(|_| anyhow!("workflow map lock poisoned"))?
            .insert(id, workflow);

        outcome
    }

    /// Hand one task description directly to an agent, bypassing planning.
    /// Failures come back inside the outcome so a caller can keep going.
    pub async fn delegate(
        &self,
        agent: AgentKind,
        description: &str,
        params: Value,
    ) -> DispatchOutcome {
        let prompt = format!(
            "Task: {}\n\nParameters:\n{}\n\nPlease complete this task and return the results.",
            description,
            serde_json::to_string_pretty(&params).unwrap_or_else(|_| "{}".to_string())
        );
        let invocation = AgentInvocation {
            task_id: format!("delegate_{}", agent.as_str()),
            agent,
            operation: "execute_task".to_string(),
            description: description.to_string(),
            prompt,
            system_prompt: system_prompt_for(agent).to_string(),
            params,
        };

        match self.runtime.run(invocation).await {
            Ok(result) => DispatchOutcome::Completed { agent, result },
            Err(e) => DispatchOutcome::Failed {
                agent,
                error: e.to_string(),
            },
        }
    }

    /// Ad-hoc pipeline for a free-text request: optional data analysis,
    /// market research, then a report combining both. Runs outside the
    /// planner and scheduler.
    pub async fn execute_workflow(&self, request: &str, data_file: Option<&str>) -> Result<Value> {
        let topic = extract_topic(request);
        let mut agents_used: Vec<&str> = Vec::new();
        let mut results = serde_json::Map::new();

        // A bad data file degrades the report, it does not sink the run
        let data_insights = match data_file {
            Some(path) => match self.data_analyst.analyze_file(path, "comprehensive").await {
                Ok(response) => {
                    agents_used.push("data_analyst");
                    results.insert("data_analysis".to_string(), json!(response));
                    response.result
                }
                Err(e) => {
                    results.insert(
                        "data_analysis".to_string(),
                        json!({ "status": "failed", "error": e.to_string() }),
                    );
                    String::new()
                }
            },
            None => String::new(),
        };

        let research_findings = match self
            .research
            .conduct_market_research(
                &topic,
                &[
                    "Market Size".to_string(),
                    "Key Players".to_string(),
                    "Trends".to_string(),
                ],
            )
            .await
        {
            Ok(research) => {
                agents_used.push("research");
                let findings = research.result.clone();
                results.insert("market_research".to_string(), json!(research));
                findings
            }
            Err(e) => {
                return Ok(failed_workflow(request, &topic, e, agents_used, results));
            }
        };

        match self
            .report_generator
            .create_comprehensive_report(
                &format!("Analysis Report: {}", topic),
                &data_insights,
                &research_findings,
            )
            .await
        {
            Ok(report) => {
                agents_used.push("report_generator");
                results.insert("final_report".to_string(), json!(report));
            }
            Err(e) => {
                return Ok(failed_workflow(request, &topic, e, agents_used, results));
            }
        }

        Ok(json!({
            "request": request,
            "topic": topic,
            "status": "completed",
            "agents_used": agents_used,
            "results": results,
        }))
    }

    /// Plan, run, and summarize a complex request in one call
    pub async fn process_complex_request(
        &self,
        request: &str,
        requirements: &[String],
    ) -> Result<Value> {
        let plan = self.create_plan(request, requirements)?;
        if plan.tasks.is_empty() {
            // Nothing matched the planner's categories; answer ad hoc
            let fallback = self.execute_workflow(request, None).await?;
            return Ok(json!({
                "request": request,
                "workflow_id": plan.workflow_id,
                "planned_tasks": 0,
                "fallback": fallback,
            }));
        }

        let summary = self.run_workflow(Some(&plan.workflow_id)).await?;
        let status = self.workflow_status(Some(&plan.workflow_id));

        Ok(json!({
            "request": request,
            "workflow_id": plan.workflow_id,
            "planned_tasks": plan.tasks.len(),
            "estimated_duration_minutes": plan.estimated_duration_minutes,
            "summary": summary,
            "status": status,
        }))
    }

    /// Analyze a request in refinement rounds: each round feeds the prior
    /// round's findings back to the research agent with instructions to
    /// fill the gaps, up to `iteration_limit` rounds.
    pub async fn handle_iterative_analysis(
        &self,
        initial_request: &str,
        iteration_limit: u32,
    ) -> Result<Value> {
        if iteration_limit == 0 {
            return Err(anyhow!("iteration_limit must be at least 1"));
        }

        let topic = extract_topic(initial_request);
        let mut iterations = Vec::new();
        let mut previous_findings = String::new();

        for round in 1..=iteration_limit {
            let focus = if round == 1 {
                topic.clone()
            } else {
                format!(
                    "{} (refine: address gaps in the previous findings: {})",
                    topic,
                    previous_findings.chars().take(300).collect::<String>()
                )
            };

            let response = self
                .research
                .conduct_market_research(&focus, &["Key Findings".to_string()])
                .await?;
            previous_findings = response.result.clone();
            iterations.push(json!({
                "iteration": round,
                "focus": focus,
                "findings": response,
            }));
        }

        Ok(json!({
            "initial_request": initial_request,
            "iteration_limit": iteration_limit,
            "iterations_run": iterations.len(),
            "iterations": iterations,
            "result": previous_findings,
        }))
    }

    /// Build a report on a topic from fetched web sources plus fresh
    /// research. Unreachable sources are recorded and skipped.
    pub async fn generate_multi_source_report(
        &self,
        topic: &str,
        source_urls: &[String],
    ) -> Result<Value> {
        let mut source_digest = String::new();
        let mut source_outcomes = Vec::new();

        if !source_urls.is_empty() {
            let client = fetch_client()?;
            for outcome in fetch_multiple_urls(&client, source_urls).await {
                match &outcome {
                    FetchOutcome::Success { page } => {
                        source_digest.push_str(&format!(
                            "Source {} ({}): {}\n\n",
                            page.url,
                            page.title,
                            page.content.chars().take(500).collect::<String>()
                        ));
                    }
                    FetchOutcome::Error { url, error } => {
                        source_digest
                            .push_str(&format!("Source {} could not be fetched: {}\n\n", url, error));
                    }
                }
                source_outcomes.push(outcome);
            }
        }

        let research = self
            .research
            .conduct_market_research(topic, &["Market Size".to_string(), "Trends".to_string()])
            .await?;

        let report = self
            .report_generator
            .create_comprehensive_report(
                topic,
                &source_digest,
                &research.result,
            )
            .await?;

        Ok(json!({
            "topic": topic,
            "sources": source_outcomes,
            "research": research,
            "report": report,
        }))
    }
}

/// Terminal record for an ad-hoc workflow whose pipeline step errored
fn failed_workflow(
    request: &str,
    topic: &str,
    error: anyhow::Error,
    agents_used: Vec<&str>,
    results: serde_json::Map<String, Value>,
) -> Value {
    json!({
        "request": request,
        "topic": topic,
        "status": "failed",
        "error": error.to_string(),
        "agents_used": agents_used,
        "results": results,
    })
}

/// Pull a research topic out of a free-text request
fn extract_topic(request: &str) -> String {
    if let Some(idx) = request.find("about") {
        let tail = request[idx + "about".len()..].trim();
        if !tail.is_empty() {
            return tail.to_string();
        }
    }
    request.chars().take(50).collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeMode;
    use crate::runtime::LocalRuntime;
    use crate::workflow::{RunStatus, TaskStatus};

    fn coordinator() -> Coordinator {
        let settings = Settings {
            runtime: RuntimeMode::Local,
            ..Settings::default()
        };
        let runtime = Arc::new(LocalRuntime::new(settings.max_file_size_bytes()));
        Coordinator::new(settings, runtime)
    }

    #[test]
    fn test_create_plan_registers_workflow() {
        let coord = coordinator();
        let plan = coord
            .create_plan("Research the EV market and write a report", &[])
            .unwrap();
        assert_eq!(plan.tasks.len(), 2);

        let status = coord.workflow_status(Some(&plan.workflow_id));
        match status {
            StatusResponse::Report(report) => {
                assert_eq!(report.total_tasks, 2);
                assert_eq!(report.pending, 2);
            }
            StatusResponse::NotFound { .. } => panic!("workflow should be registered"),
        }
    }

    #[test]
    fn test_status_defaults_to_latest_workflow() {
        let coord = coordinator();
        coord.create_plan("Analyze the quarterly data", &[]).unwrap();
        assert!(!coord.workflow_status(None).is_not_found());
    }

    #[test]
    fn test_status_for_unknown_id() {
        let coord = coordinator();
        let status = coord.workflow_status(Some("workflow_missing"));
        assert!(status.is_not_found());
    }

    #[test]
    fn test_status_with_no_workflows() {
        let coord = coordinator();
        assert!(coord.workflow_status(None).is_not_found());
    }

    #[tokio::test]
    async fn test_run_workflow_completes_and_keeps_state() {
        let coord = coordinator();
        let plan = coord
            .create_plan("Research market trends and produce a summary report", &[])
            .unwrap();

        let summary = coord.run_workflow(Some(&plan.workflow_id)).await.unwrap();
        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.completed, 2);

        // State survives the run
        match coord.workflow_status(Some(&plan.workflow_id)) {
            StatusResponse::Report(report) => {
                assert_eq!(report.completed, 2);
                assert_eq!(report.pending, 0);
                assert!(report
                    .tasks
                    .values()
                    .all(|t| t.status == TaskStatus::Completed));
            }
            StatusResponse::NotFound { .. } => panic!("workflow lost after run"),
        }
    }

    #[tokio::test]
    async fn test_run_workflow_unknown_id_is_error() {
        let coord = coordinator();
        assert!(coord.run_workflow(Some("workflow_missing")).await.is_err());
    }

    #[tokio::test]
    async fn test_delegate_wraps_failure() {
        let coord = coordinator();
        let outcome = coord
            .delegate(
                AgentKind::DataAnalyst,
                "Analyze the attached file",
                json!({ "file_path": "/nonexistent/data.csv" }),
            )
            .await;
        match outcome {
            DispatchOutcome::Failed { agent, error } => {
                assert_eq!(agent, AgentKind::DataAnalyst);
                assert!(!error.is_empty());
            }
            DispatchOutcome::Completed { .. } => panic!("missing file should fail"),
        }
    }

    #[tokio::test]
    async fn test_delegate_success() {
        let coord = coordinator();
        let outcome = coord
            .delegate(
                AgentKind::Research,
                "Scan the solar market",
                json!({ "request": "solar market" }),
            )
            .await;
        assert!(matches!(outcome, DispatchOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn test_execute_workflow_produces_report() {
        let coord = coordinator();
        let result = coord
            .execute_workflow("Tell me about electric vehicles", None)
            .await
            .unwrap();
        assert_eq!(result["status"], "completed");
        assert_eq!(result["topic"], "electric vehicles");
        let agents = result["agents_used"].as_array().unwrap();
        assert!(agents.contains(&json!("research")));
        assert!(agents.contains(&json!("report_generator")));
    }

    #[tokio::test]
    async fn test_execute_workflow_survives_bad_data_file() {
        let coord = coordinator();
        let result = coord
            .execute_workflow("Tell me about wind power", Some("/nonexistent/wind.csv"))
            .await
            .unwrap();
        assert_eq!(result["status"], "completed");
        assert_eq!(result["results"]["data_analysis"]["status"], "failed");
    }

    #[test]
    fn test_same_second_plans_get_distinct_ids() {
        let coord = coordinator();
        let first = coord.create_plan("Analyze the sales data", &[]).unwrap();
        let second = coord.create_plan("Analyze the churn data", &[]).unwrap();
        let third = coord.create_plan("Analyze the cost data", &[]).unwrap();

        assert_ne!(first.workflow_id, second.workflow_id);
        assert_ne!(second.workflow_id, third.workflow_id);
        // Every registration is still reachable
        for plan in [&first, &second, &third] {
            assert!(!coord.workflow_status(Some(&plan.workflow_id)).is_not_found());
        }
    }

    #[tokio::test]
    async fn test_iterative_analysis_runs_requested_rounds() {
        let coord = coordinator();
        let result = coord
            .handle_iterative_analysis("Tell me about battery recycling", 3)
            .await
            .unwrap();
        assert_eq!(result["iterations_run"], 3);
        let iterations = result["iterations"].as_array().unwrap();
        assert_eq!(iterations[0]["focus"], "battery recycling");
        // Later rounds fold the prior findings into the focus
        assert!(iterations[1]["focus"]
            .as_str()
            .unwrap()
            .contains("refine"));
        assert!(result["result"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_iterative_analysis_rejects_zero_limit() {
        let coord = coordinator();
        assert!(coord
            .handle_iterative_analysis("Anything", 0)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_process_complex_request_end_to_end() {
        let coord = coordinator();
        let result = coord
            .process_complex_request("Research competitors and write a report", &[])
            .await
            .unwrap();
        assert_eq!(result["planned_tasks"], 2);
        assert_eq!(result["summary"]["status"], "completed");
    }

    #[tokio::test]
    async fn test_process_complex_request_falls_back_without_keywords() {
        let coord = coordinator();
        let result = coord
            .process_complex_request("Say hello", &[])
            .await
            .unwrap();
        assert_eq!(result["planned_tasks"], 0);
        assert_eq!(result["fallback"]["status"], "completed");
    }

    #[test]
    fn test_extract_topic() {
        assert_eq!(extract_topic("Tell me about solar panels"), "solar panels");
        assert_eq!(extract_topic("EV market"), "EV market");
        let long = "x".repeat(120);
        assert_eq!(extract_topic(&long).len(), 50);
    }
}
