// src/graph/scheduler.rs

//! Per-set scheduling state machine.
//!
//! The scheduler owns one [`BuildSetTask`] plus its dependency graph and is
//! responsible for:
//! - deciding when a task is "ready" to run (all dependencies succeeded)
//! - recording completion outcomes idempotently
//! - failing dependents transitively when a task fails, instead of leaving
//!   them pending forever
//! - detecting set completion and computing the aggregate result

use chrono::Utc;
use tracing::{debug, warn};

use crate::coordinator::{BuildOutcome, BuildResult};
use crate::model::{BuildRecord, TaskId};

use super::graph::BuildGraph;
use super::set::{BuildSetTask, SetStatus};
use super::task::{readiness, DependencyReadiness, ScheduledBuild, TaskStatus};

/// Structured result of a single scheduler step.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready and were marked Building in this step.
    pub newly_ready: Vec<ScheduledBuild>,
    /// Records for tasks that reached a terminal state in this step
    /// (the completed task plus any dependents failed through it).
    pub finished: Vec<BuildRecord>,
    /// Set aggregate result, when this step completed the set.
    pub set_finished: Option<SetStatus>,
}

/// Scheduler for one build set.
#[derive(Debug)]
pub struct SetScheduler {
    set: BuildSetTask,
    graph: BuildGraph,
}

impl SetScheduler {
    /// Construct from a set whose dependency edges were already validated as
    /// acyclic (see [`super::graph::ensure_acyclic`]).
    pub fn new(set: BuildSetTask) -> Self {
        let graph = BuildGraph::from_tasks(&set.tasks);
        Self { set, graph }
    }

    pub fn set(&self) -> &BuildSetTask {
        &self.set
    }

    /// Readiness of a task with respect to its in-set dependencies.
    pub fn readiness_of(&self, id: TaskId) -> DependencyReadiness {
        readiness(
            self.graph
                .dependencies_of(id)
                .iter()
                .filter_map(|dep| self.set.task(*dep))
                .map(|dep| dep.status),
        )
    }

    /// Collect New tasks whose dependencies are all satisfied, mark them
    /// Building and return them for dispatch.
    pub fn dispatch_ready(&mut self) -> Vec<ScheduledBuild> {
        let now = Utc::now();

        let candidates: Vec<TaskId> = self
            .set
            .tasks
            .iter()
            .filter(|t| t.is_new() && self.readiness_of(t.id) == DependencyReadiness::Ready)
            .map(|t| t.id)
            .collect();

        let mut ready = Vec::new();
        for id in candidates {
            let set_id = self.set.id;
            if let Some(task) = self.set.task_mut(id) {
                match task.set_building(now) {
                    Ok(()) => {
                        debug!(
                            task = %task.id,
                            set = %set_id,
                            configuration = %task.configuration_name(),
                            "dependencies satisfied; dispatching build"
                        );
                        ready.push(ScheduledBuild::from_task(task));
                    }
                    Err(e) => warn!(task = %id, error = %e, "skipping dispatch"),
                }
            }
        }
        ready
    }

    /// Handle an executor-reported completion.
    ///
    /// Completion is idempotent: an unknown task id or a duplicate report for
    /// an already-terminal task is logged and ignored.
    pub fn on_completion(&mut self, id: TaskId, result: &BuildResult) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        let Some(task) = self.set.task_mut(id) else {
            warn!(task = %id, "completion for unknown task; ignoring");
            return step;
        };
        if task.is_done() {
            warn!(task = %id, "duplicate completion report; ignoring");
            return step;
        }

        match &result.outcome {
            BuildOutcome::Success => {
                if let Err(e) = task.completed_successfully(result.completed_at) {
                    warn!(task = %id, error = %e, "ignoring completion");
                    return step;
                }
                debug!(task = %id, "build completed successfully");
                step.finished
                    .push(task.to_record(result.execution_id.clone(), result.log.clone()));
                step.newly_ready = self.dispatch_ready();
            }
            BuildOutcome::Failed(reason) => {
                if let Err(e) = task.completed_with_error(reason.clone(), result.completed_at) {
                    warn!(task = %id, error = %e, "ignoring completion");
                    return step;
                }
                warn!(task = %id, reason = %reason, "build failed; failing dependents");
                step.finished
                    .push(task.to_record(result.execution_id.clone(), result.log.clone()));
                step.finished.extend(self.fail_dependents_of(id));
            }
        }

        if self.set.all_done() {
            let status = if self
                .set
                .tasks
                .iter()
                .all(|t| t.status == TaskStatus::Success)
            {
                SetStatus::Success
            } else {
                SetStatus::Failed
            };
            self.set.status = status;
            step.set_finished = Some(status);
        }

        step
    }

    pub fn all_done(&self) -> bool {
        self.set.all_done()
    }

    /// Mark all still-New transitive dependents of a failed task as Failed,
    /// without executing them, and return their records.
    fn fail_dependents_of(&mut self, failed: TaskId) -> Vec<BuildRecord> {
        let now = Utc::now();
        let mut stack: Vec<TaskId> = self.graph.dependents_of(failed).to_vec();
        let mut records = Vec::new();

        while let Some(id) = stack.pop() {
            let Some(task) = self.set.task_mut(id) else {
                continue;
            };
            if !task.is_new() {
                // Already running or terminal; a running dependent is
                // impossible since its dependency never succeeded.
                continue;
            }

            let reason = format!("not built: dependency build {failed} failed");
            if let Err(e) = task.completed_with_error(reason, now) {
                warn!(task = %id, error = %e, "could not fail dependent");
                continue;
            }
            debug!(task = %id, failed_dependency = %failed, "failing dependent transitively");
            records.push(task.to_record(None, None));
            stack.extend(self.graph.dependents_of(id));
        }

        records
    }
}
