//! Workflow container and dependency-graph validation.
//!
//! A workflow is a directed acyclic graph of tasks keyed by task id.
//! Construction validates the graph up front: unknown dependency ids and
//! cycles reject the whole plan, so a registered workflow can always be
//! driven to termination by the scheduler.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use super::task::{TaskStatus, WorkflowTask};

/// A named collection of tasks created to satisfy one user request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub workflow_id: String,
    tasks: HashMap<String, WorkflowTask>,
    /// Task ids in creation order, for deterministic reporting
    order: Vec<String>,
}

impl Workflow {
    /// Build a workflow, validating the dependency graph.
    ///
    /// Rejects duplicate task ids, dependencies on unknown tasks, and
    /// dependency cycles.
    pub fn new(workflow_id: impl Into<String>, tasks: Vec<WorkflowTask>) -> Result<Self> {
        let workflow_id = workflow_id.into();

        let mut order = Vec::with_capacity(tasks.len());
        let mut map: HashMap<String, WorkflowTask> = HashMap::with_capacity(tasks.len());
        for task in tasks {
            if map.contains_key(&task.task_id) {
                bail!(
                    "Workflow {} has duplicate task id: {}",
                    workflow_id,
                    task.task_id
                );
            }
            order.push(task.task_id.clone());
            map.insert(task.task_id.clone(), task);
        }

        for task in map.values() {
            for dep in &task.dependencies {
                if !map.contains_key(dep) {
                    bail!(
                        "Task {} depends on unknown task {}",
                        task.task_id,
                        dep
                    );
                }
            }
        }

        let workflow = Self {
            workflow_id,
            tasks: map,
            order,
        };
        workflow.check_acyclic()?;
        Ok(workflow)
    }

    /// Kahn's algorithm: every task must be reachable through a topological
    /// order, otherwise the leftover tasks form a cycle.
    fn check_acyclic(&self) -> Result<()> {
        let mut indegree: HashMap<&str, usize> = self
            .tasks
            .values()
            .map(|t| (t.task_id.as_str(), t.dependencies.len()))
            .collect();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        for task in self.tasks.values() {
            for dep in &task.dependencies {
                dependents
                    .entry(dep.as_str())
                    .or_default()
                    .push(task.task_id.as_str());
            }
        }

        let mut queue: VecDeque<&str> = indegree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut visited = 0usize;
        while let Some(id) = queue.pop_front() {
            visited += 1;
            if let Some(next) = dependents.get(id) {
                for dependent in next {
                    let deg = indegree.get_mut(dependent).unwrap();
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        if visited != self.tasks.len() {
            let stuck: Vec<&str> = indegree
                .iter()
                .filter(|(_, deg)| **deg > 0)
                .map(|(id, _)| *id)
                .collect();
            bail!(
                "Workflow {} has a dependency cycle involving: {}",
                self.workflow_id,
                stuck.join(", ")
            );
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, task_id: &str) -> Option<&WorkflowTask> {
        self.tasks.get(task_id)
    }

    pub fn get_mut(&mut self, task_id: &str) -> Option<&mut WorkflowTask> {
        self.tasks.get_mut(task_id)
    }

    /// Tasks in creation order
    pub fn tasks(&self) -> impl Iterator<Item = &WorkflowTask> {
        self.order.iter().filter_map(|id| self.tasks.get(id))
    }

    pub fn count_in(&self, status: TaskStatus) -> usize {
        self.tasks.values().filter(|t| t.status() == status).count()
    }

    /// Pending tasks whose dependencies are all completed, in creation order
    pub fn ready_tasks(&self) -> Vec<String> {
        let completed: HashSet<&str> = self
            .tasks
            .values()
            .filter(|t| t.status() == TaskStatus::Completed)
            .map(|t| t.task_id.as_str())
            .collect();

        self.tasks()
            .filter(|t| t.status() == TaskStatus::Pending)
            .filter(|t| t.dependencies.iter().all(|d| completed.contains(d.as_str())))
            .map(|t| t.task_id.clone())
            .collect()
    }

    /// Pending tasks with at least one failed or cancelled dependency.
    /// These can never become ready and are cancelled by the scheduler.
    pub fn blocked_tasks(&self) -> Vec<String> {
        let dead: HashSet<&str> = self
            .tasks
            .values()
            .filter(|t| matches!(t.status(), TaskStatus::Failed | TaskStatus::Cancelled))
            .map(|t| t.task_id.as_str())
            .collect();

        self.tasks()
            .filter(|t| t.status() == TaskStatus::Pending)
            .filter(|t| t.dependencies.iter().any(|d| dead.contains(d.as_str())))
            .map(|t| t.task_id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_crew_sdk::AgentKind;
    use serde_json::json;

    fn task(id: &str, deps: Vec<&str>) -> WorkflowTask {
        WorkflowTask::new(
            id,
            AgentKind::Research,
            format!("Task {}", id),
            json!({}),
            deps.into_iter().map(String::from).collect(),
        )
    }

    #[test]
    fn test_valid_chain_accepted() {
        let wf = Workflow::new(
            "workflow_test",
            vec![task("a", vec![]), task("b", vec!["a"]), task("c", vec!["a", "b"])],
        )
        .unwrap();
        assert_eq!(wf.len(), 3);
        assert_eq!(wf.ready_tasks(), vec!["a".to_string()]);
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let err = Workflow::new("workflow_test", vec![task("a", vec!["ghost"])])
            .unwrap_err()
            .to_string();
        assert!(err.contains("unknown task ghost"));
    }

    #[test]
    fn test_cycle_rejected() {
        let err = Workflow::new(
            "workflow_test",
            vec![task("a", vec!["b"]), task("b", vec!["a"])],
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("dependency cycle"));
    }

    #[test]
    fn test_self_dependency_rejected() {
        assert!(Workflow::new("workflow_test", vec![task("a", vec!["a"])]).is_err());
    }

    #[test]
    fn test_duplicate_task_id_rejected() {
        assert!(Workflow::new(
            "workflow_test",
            vec![task("a", vec![]), task("a", vec![])]
        )
        .is_err());
    }

    #[test]
    fn test_ready_tasks_gate_on_completed_dependencies() {
        let mut wf = Workflow::new(
            "workflow_test",
            vec![task("a", vec![]), task("b", vec![]), task("c", vec!["a", "b"])],
        )
        .unwrap();
        assert_eq!(wf.ready_tasks(), vec!["a".to_string(), "b".to_string()]);

        wf.get_mut("a").unwrap().start().unwrap();
        wf.get_mut("a").unwrap().complete("done").unwrap();
        // c still waits on b
        assert_eq!(wf.ready_tasks(), vec!["b".to_string()]);

        wf.get_mut("b").unwrap().start().unwrap();
        wf.get_mut("b").unwrap().complete("done").unwrap();
        assert_eq!(wf.ready_tasks(), vec!["c".to_string()]);
    }

    #[test]
    fn test_blocked_tasks_after_failure() {
        let mut wf = Workflow::new(
            "workflow_test",
            vec![task("a", vec![]), task("b", vec!["a"]), task("c", vec![])],
        )
        .unwrap();
        wf.get_mut("a").unwrap().start().unwrap();
        wf.get_mut("a").unwrap().fail("boom").unwrap();

        assert_eq!(wf.blocked_tasks(), vec!["b".to_string()]);
        // unrelated task c is still runnable
        assert_eq!(wf.ready_tasks(), vec!["c".to_string()]);
    }

    #[test]
    fn test_tasks_iterate_in_creation_order() {
        let wf = Workflow::new(
            "workflow_test",
            vec![task("z", vec![]), task("a", vec![]), task("m", vec![])],
        )
        .unwrap();
        let ids: Vec<&str> = wf.tasks().map(|t| t.task_id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }
}
