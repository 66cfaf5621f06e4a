// src/coordinator/core.rs

//! Pure core state machine of the coordinator.
//!
//! This module contains a synchronous, deterministic core that consumes
//! [`CoordinatorEvent`]s and produces:
//! - an updated core state (the active set schedulers)
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`coordinator::runtime::Runtime`) is responsible
//! for:
//! - reading events from the channel
//! - sending `ScheduledBuild`s to the executor backend
//! - persisting records and maintaining the live task set
//!
//! The core is intended to be extensively unit tested without any Tokio,
//! channels, or executors.

use std::collections::HashMap;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::graph::{ScheduledBuild, SetScheduler};
use crate::model::{BuildRecord, BuildSetId, TaskId};

use super::{BuildResult, BuildSetResult, CoordinatorEvent, CoordinatorOptions};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug)]
pub enum CoreCommand {
    /// Send these builds to the executor.
    DispatchBuilds(Vec<ScheduledBuild>),
    /// Persist these finished builds and evict them from the live set.
    PersistRecords(Vec<BuildRecord>),
    /// Deliver the aggregate set result to the trigger's receiver.
    NotifySetFinished {
        notify: oneshot::Sender<BuildSetResult>,
        result: BuildSetResult,
    },
    /// Request that the event loop exits (used when idle in batch mode).
    RequestExit,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer event loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Pure coordinator state: one scheduler per in-flight build set.
#[derive(Debug)]
pub struct CoordinatorCore {
    sets: HashMap<BuildSetId, SetScheduler>,
    task_index: HashMap<TaskId, BuildSetId>,
    notifiers: HashMap<BuildSetId, oneshot::Sender<BuildSetResult>>,
    options: CoordinatorOptions,
}

impl CoordinatorCore {
    pub fn new(options: CoordinatorOptions) -> Self {
        Self {
            sets: HashMap::new(),
            task_index: HashMap::new(),
            notifiers: HashMap::new(),
            options,
        }
    }

    /// Number of build sets currently in flight (for tests).
    pub fn in_flight_sets(&self) -> usize {
        self.sets.len()
    }

    pub fn is_idle(&self) -> bool {
        self.sets.is_empty()
    }

    /// Handle a single event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: CoordinatorEvent) -> CoreStep {
        match event {
            CoordinatorEvent::SetSubmitted { set, notify } => self.handle_submitted(set, notify),
            CoordinatorEvent::BuildCompleted { task, result } => {
                self.handle_completed(task, result)
            }
            CoordinatorEvent::ShutdownRequested => {
                info!("shutdown requested; stopping event loop");
                CoreStep {
                    commands: Vec::new(),
                    keep_running: false,
                }
            }
        }
    }

    fn handle_submitted(
        &mut self,
        set: crate::graph::BuildSetTask,
        notify: Option<oneshot::Sender<BuildSetResult>>,
    ) -> CoreStep {
        let set_id = set.id;
        if self.sets.contains_key(&set_id) {
            warn!(set = %set_id, "duplicate set submission; ignoring");
            return CoreStep::running(Vec::new());
        }

        info!(set = %set_id, tasks = set.tasks.len(), "build set submitted");

        for id in set.task_ids() {
            self.task_index.insert(id, set_id);
        }
        if let Some(notify) = notify {
            self.notifiers.insert(set_id, notify);
        }

        let mut scheduler = SetScheduler::new(set);
        let ready = scheduler.dispatch_ready();
        self.sets.insert(set_id, scheduler);

        let mut commands = Vec::new();
        if !ready.is_empty() {
            commands.push(CoreCommand::DispatchBuilds(ready));
        }
        CoreStep::running(commands)
    }

    fn handle_completed(&mut self, task: TaskId, result: BuildResult) -> CoreStep {
        let mut commands = Vec::new();

        let Some(set_id) = self.task_index.get(&task).copied() else {
            // Late report for an already-finalized set. Completion is
            // idempotent, so this is a no-op.
            warn!(task = %task, "completion for unknown task; ignoring");
            return CoreStep::running(commands);
        };
        let Some(scheduler) = self.sets.get_mut(&set_id) else {
            warn!(task = %task, set = %set_id, "completion for finalized set; ignoring");
            return CoreStep::running(commands);
        };

        let step = scheduler.on_completion(task, &result);

        if !step.finished.is_empty() {
            commands.push(CoreCommand::PersistRecords(step.finished));
        }
        if !step.newly_ready.is_empty() {
            commands.push(CoreCommand::DispatchBuilds(step.newly_ready));
        }

        if let Some(status) = step.set_finished {
            info!(set = %set_id, ?status, "build set finished");
            if let Some(scheduler) = self.sets.remove(&set_id) {
                for id in scheduler.set().task_ids() {
                    self.task_index.remove(&id);
                }
            }
            if let Some(notify) = self.notifiers.remove(&set_id) {
                commands.push(CoreCommand::NotifySetFinished {
                    notify,
                    result: BuildSetResult { set_id, status },
                });
            }
        }

        let mut keep_running = true;
        if self.options.exit_when_idle && self.sets.is_empty() {
            debug!("idle with exit_when_idle set; requesting exit");
            commands.push(CoreCommand::RequestExit);
            keep_running = false;
        }

        CoreStep {
            commands,
            keep_running,
        }
    }
}
