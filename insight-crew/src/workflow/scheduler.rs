//! Dependency-aware workflow execution.
//!
//! Tasks run in waves: a task becomes eligible only when every dependency
//! is completed, eligible tasks execute concurrently under a semaphore, and
//! each wave collects every outcome — a failed task never aborts a sibling
//! already in flight. Tasks depending on a failed or cancelled task are
//! cancelled, so a run always terminates. One attempt per task, no retries.

use anyhow::{anyhow, Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use insight_crew_sdk::{
    log_task_cancelled, log_task_complete, log_task_failed, log_task_start,
    log_workflow_complete, log_workflow_failed, log_workflow_start, AgentInvocation, AgentRuntime,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::graph::Workflow;
use super::task::{TaskStatus, WorkflowTask};
use crate::agents::system_prompt_for;

/// Overall outcome of a workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// Summary returned after driving a workflow to termination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub workflow_id: String,
    pub status: RunStatus,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Results of completed tasks, keyed by task id
    pub outputs: BTreeMap<String, String>,
}

/// Drive a workflow to termination against the given runtime.
///
/// `batch_size` bounds how many tasks of one wave run concurrently.
pub async fn run_workflow(
    workflow: &mut Workflow,
    runtime: Arc<dyn AgentRuntime>,
    batch_size: usize,
) -> Result<RunSummary> {
    if batch_size == 0 {
        return Err(anyhow!("batch_size must be at least 1"));
    }

    log_workflow_start!(workflow.workflow_id, workflow.len());

    loop {
        // Cancel everything that can no longer run before looking for work.
        // blocked_tasks recomputes after each cancellation so transitive
        // dependents are swept in the same pass.
        loop {
            let blocked = workflow.blocked_tasks();
            if blocked.is_empty() {
                break;
            }
            for task_id in blocked {
                if let Some(task) = workflow.get_mut(&task_id) {
                    task.cancel()
                        .with_context(|| format!("cancelling task {}", task_id))?;
                    log_task_cancelled!(task_id, "dependency did not complete");
                }
            }
        }

        let ready = workflow.ready_tasks();
        if ready.is_empty() {
            break;
        }

        let total = workflow.len();
        let mut invocations = Vec::with_capacity(ready.len());
        for task_id in &ready {
            let task = workflow
                .get_mut(task_id)
                .ok_or_else(|| anyhow!("ready task {} missing from workflow", task_id))?;
            task.start()?;
            log_task_start!(task.task_id, task.description, total);
        }
        for task_id in &ready {
            let task = workflow
                .get(task_id)
                .ok_or_else(|| anyhow!("ready task {} missing from workflow", task_id))?;
            invocations.push(build_invocation(workflow, task));
        }

        let outcomes = execute_wave(invocations, runtime.clone(), batch_size).await;

        for (task_id, outcome) in outcomes {
            let task = workflow
                .get_mut(&task_id)
                .ok_or_else(|| anyhow!("finished task {} missing from workflow", task_id))?;
            match outcome {
                Ok(result) => {
                    log_task_complete!(task_id, "Task completed");
                    task.complete(result)?;
                }
                Err(error) => {
                    log_task_failed!(task_id, error);
                    task.fail(error)?;
                }
            }
        }
    }

    let completed = workflow.count_in(TaskStatus::Completed);
    let failed = workflow.count_in(TaskStatus::Failed);
    let cancelled = workflow.count_in(TaskStatus::Cancelled);
    let outputs: BTreeMap<String, String> = workflow
        .tasks()
        .filter_map(|t| t.result().map(|r| (t.task_id.clone(), r.to_string())))
        .collect();

    let status = if failed == 0 && cancelled == 0 {
        log_workflow_complete!(workflow.workflow_id);
        RunStatus::Completed
    } else {
        log_workflow_failed!(
            workflow.workflow_id,
            format!("{} failed, {} cancelled", failed, cancelled)
        );
        RunStatus::Failed
    };

    Ok(RunSummary {
        workflow_id: workflow.workflow_id.clone(),
        status,
        completed,
        failed,
        cancelled,
        outputs,
    })
}

/// Build the runtime invocation for one scheduled task, folding completed
/// dependency results into the parameters so downstream agents can
/// aggregate upstream work.
fn build_invocation(workflow: &Workflow, task: &WorkflowTask) -> AgentInvocation {
    let mut params = task.parameters.clone();
    if !task.dependencies.is_empty() {
        let dependency_results: serde_json::Map<String, serde_json::Value> = task
            .dependencies
            .iter()
            .filter_map(|dep| {
                workflow
                    .get(dep)
                    .and_then(|t| t.result())
                    .map(|r| (dep.clone(), serde_json::Value::String(r.to_string())))
            })
            .collect();
        if let serde_json::Value::Object(map) = &mut params {
            map.insert(
                "dependency_results".to_string(),
                serde_json::Value::Object(dependency_results),
            );
        }
    }

    let prompt = format!(
        "Task: {}\n\nParameters:\n{}\n\nPlease complete this task and return the results.",
        task.description,
        serde_json::to_string_pretty(&params).unwrap_or_else(|_| "{}".to_string())
    );

    AgentInvocation {
        task_id: task.task_id.clone(),
        agent: task.agent,
        operation: "execute_task".to_string(),
        description: task.description.clone(),
        prompt,
        system_prompt: system_prompt_for(task.agent).to_string(),
        params,
    }
}

/// Run one wave of invocations concurrently, collecting every outcome.
/// Unlike a fail-fast batch, an error here is data, not a short-circuit.
async fn execute_wave(
    invocations: Vec<AgentInvocation>,
    runtime: Arc<dyn AgentRuntime>,
    batch_size: usize,
) -> Vec<(String, Result<String, String>)> {
    let sem = Arc::new(Semaphore::new(batch_size));
    let mut futures = FuturesUnordered::new();

    for invocation in invocations {
        let sem = sem.clone();
        let runtime = runtime.clone();
        futures.push(async move {
            let task_id = invocation.task_id.clone();
            let outcome = match sem.acquire().await {
                Ok(_permit) => runtime
                    .run(invocation)
                    .await
                    .map_err(|e| e.to_string()),
                Err(_) => Err("semaphore closed".to_string()),
            };
            (task_id, outcome)
        });
    }

    let mut outcomes = Vec::new();
    while let Some(outcome) = futures.next().await {
        outcomes.push(outcome);
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_crew_sdk::{async_trait, AgentKind, CrewResult};
    use serde_json::json;
    use std::sync::Mutex;

    /// Runtime that records execution order and fails on request
    struct ScriptedRuntime {
        fail_tasks: Vec<String>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedRuntime {
        fn new(fail_tasks: &[&str]) -> Self {
            Self {
                fail_tasks: fail_tasks.iter().map(|s| s.to_string()).collect(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AgentRuntime for ScriptedRuntime {
        async fn run(&self, invocation: AgentInvocation) -> CrewResult<String> {
            self.seen.lock().unwrap().push(invocation.task_id.clone());
            if self.fail_tasks.contains(&invocation.task_id) {
                return Err(format!("scripted failure for {}", invocation.task_id).into());
            }
            Ok(format!("result of {}", invocation.task_id))
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn task(id: &str, agent: AgentKind, deps: Vec<&str>) -> WorkflowTask {
        WorkflowTask::new(
            id,
            agent,
            format!("Task {}", id),
            json!({}),
            deps.into_iter().map(String::from).collect(),
        )
    }

    #[tokio::test]
    async fn test_all_tasks_complete() {
        let mut wf = Workflow::new(
            "workflow_run",
            vec![
                task("task_1", AgentKind::DataAnalyst, vec![]),
                task("task_2", AgentKind::Research, vec![]),
                task("task_3", AgentKind::ReportGenerator, vec!["task_1", "task_2"]),
            ],
        )
        .unwrap();

        let runtime = Arc::new(ScriptedRuntime::new(&[]));
        let summary = run_workflow(&mut wf, runtime.clone(), 2).await.unwrap();

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.completed, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.outputs["task_3"], "result of task_3");

        // Report ran strictly after both dependencies
        let seen = runtime.seen.lock().unwrap();
        let report_pos = seen.iter().position(|id| id == "task_3").unwrap();
        assert_eq!(report_pos, 2);
    }

    #[tokio::test]
    async fn test_failure_cancels_dependents_only() {
        let mut wf = Workflow::new(
            "workflow_fail",
            vec![
                task("task_1", AgentKind::DataAnalyst, vec![]),
                task("task_2", AgentKind::Research, vec![]),
                task("task_3", AgentKind::ReportGenerator, vec!["task_1", "task_2"]),
            ],
        )
        .unwrap();

        let runtime = Arc::new(ScriptedRuntime::new(&["task_1"]));
        let summary = run_workflow(&mut wf, runtime.clone(), 2).await.unwrap();

        assert_eq!(summary.status, RunStatus::Failed);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(wf.get("task_2").unwrap().status(), TaskStatus::Completed);
        assert_eq!(wf.get("task_3").unwrap().status(), TaskStatus::Cancelled);
        // The report never reached the runtime
        assert!(!runtime.seen.lock().unwrap().contains(&"task_3".to_string()));
    }

    #[tokio::test]
    async fn test_transitive_cancellation() {
        let mut wf = Workflow::new(
            "workflow_chain",
            vec![
                task("a", AgentKind::Research, vec![]),
                task("b", AgentKind::Research, vec!["a"]),
                task("c", AgentKind::ReportGenerator, vec!["b"]),
            ],
        )
        .unwrap();

        let runtime = Arc::new(ScriptedRuntime::new(&["a"]));
        let summary = run_workflow(&mut wf, runtime, 1).await.unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.cancelled, 2);
        assert_eq!(wf.get("c").unwrap().status(), TaskStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_empty_workflow_completes_immediately() {
        let mut wf = Workflow::new("workflow_empty", vec![]).unwrap();
        let runtime = Arc::new(ScriptedRuntime::new(&[]));
        let summary = run_workflow(&mut wf, runtime, 2).await.unwrap();
        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.completed, 0);
    }

    #[tokio::test]
    async fn test_zero_batch_size_rejected() {
        let mut wf = Workflow::new("workflow_zero", vec![]).unwrap();
        let runtime = Arc::new(ScriptedRuntime::new(&[]));
        assert!(run_workflow(&mut wf, runtime, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_dependency_results_forwarded() {
        let mut wf = Workflow::new(
            "workflow_results",
            vec![
                task("task_1", AgentKind::Research, vec![]),
                task("task_2", AgentKind::ReportGenerator, vec!["task_1"]),
            ],
        )
        .unwrap();

        struct CaptureRuntime(Mutex<Option<serde_json::Value>>);

        #[async_trait]
        impl AgentRuntime for CaptureRuntime {
            async fn run(&self, invocation: AgentInvocation) -> CrewResult<String> {
                if invocation.task_id == "task_2" {
                    *self.0.lock().unwrap() = Some(invocation.params.clone());
                }
                Ok("ok".to_string())
            }
            fn name(&self) -> &'static str {
                "capture"
            }
        }

        let runtime = Arc::new(CaptureRuntime(Mutex::new(None)));
        run_workflow(&mut wf, runtime.clone(), 1).await.unwrap();

        let params = runtime.0.lock().unwrap().clone().unwrap();
        assert_eq!(params["dependency_results"]["task_1"], "ok");
    }
}
