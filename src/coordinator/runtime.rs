// src/coordinator/runtime.rs

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::datastore::BuildRecordStore;
use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::graph::ScheduledBuild;
use crate::model::BuildRecord;

use super::core::{CoordinatorCore, CoreCommand};
use super::live::LiveBuildTasks;
use super::CoordinatorEvent;

/// Drives the coordinator core in response to [`CoordinatorEvent`]s and
/// delegates build execution to an [`ExecutorBackend`].
///
/// This is an IO shell around [`CoordinatorCore`], which contains the
/// scheduling semantics. The shell handles async IO: reading events from the
/// channel, dispatching builds, persisting finished records, and keeping the
/// live task set in step.
pub struct Runtime<E: ExecutorBackend> {
    core: CoordinatorCore,
    event_rx: mpsc::Receiver<CoordinatorEvent>,
    executor: E,
    store: Arc<dyn BuildRecordStore>,
    live: LiveBuildTasks,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(
        core: CoordinatorCore,
        event_rx: mpsc::Receiver<CoordinatorEvent>,
        executor: E,
        store: Arc<dyn BuildRecordStore>,
        live: LiveBuildTasks,
    ) -> Self {
        Self {
            core,
            event_rx,
            executor,
            store,
            live,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes [`CoordinatorEvent`]s from the channel.
    /// - Feeds them into the pure core.
    /// - Executes the commands returned by the core.
    pub async fn run(mut self) -> Result<()> {
        info!("build coordinator runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("coordinator event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "coordinator received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        // The live set has a defined lifecycle: clear it on the way out so a
        // stale "running" view never outlives the coordinator.
        let dropped = self.live.drain();
        if !dropped.is_empty() {
            warn!(count = dropped.len(), "dropping unfinished live tasks at shutdown");
        }

        info!("coordinator runtime exiting");
        Ok(())
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchBuilds(builds) => {
                self.dispatch(builds).await?;
            }
            CoreCommand::PersistRecords(records) => {
                for record in records {
                    self.persist(record);
                }
            }
            CoreCommand::NotifySetFinished { notify, result } => {
                if notify.send(result).is_err() {
                    debug!(set = %result.set_id, "set completion receiver dropped");
                }
            }
            CoreCommand::RequestExit => {
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, builds: Vec<ScheduledBuild>) -> Result<()> {
        if builds.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        for build in &builds {
            self.live.mark_building(build.task_id, now);
        }

        let names: Vec<_> = builds.iter().map(|b| b.name.as_str()).collect();
        debug!(?names, "dispatching ready builds");

        self.executor.spawn_ready_builds(builds).await
    }

    /// Persist first, evict second: a finished build must never be invisible
    /// to both the live view and the record store at the same time.
    fn persist(&mut self, record: BuildRecord) {
        let id = record.id;
        self.store.store_completed(record);
        if self.live.remove(id).is_none() {
            warn!(task = %id, "finished task was not in the live set");
        }
    }
}
