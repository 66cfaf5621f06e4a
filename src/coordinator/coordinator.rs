// src/coordinator/coordinator.rs

//! Public trigger API of the coordinator.
//!
//! [`BuildCoordinator`] is the handle callers use to start builds. All
//! validation happens synchronously in the caller's context: option checks,
//! override application, transitive dependency resolution, cycle detection,
//! and the conflict check against the live task set. Only a fully validated
//! set is handed to the event loop for execution.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::datastore::{BuildRecordStore, ConfigurationSource};
use crate::errors::{CoordinatorError, Result};
use crate::graph::{ensure_acyclic, BuildSetTask, BuildTask};
use crate::model::{
    BuildConfigurationAudited, BuildOptions, BuildOverrides, BuildSetId, ConfigurationId, TaskId,
};

use super::{BuildResult, BuildSetResult, CoordinatorEvent, LiveBuildTasks};

/// Returned to the trigger: the submitted set plus a receiver for its
/// aggregate result.
#[derive(Debug)]
pub struct BuildSetHandle {
    /// Snapshot of the set as submitted (all tasks `New`).
    pub set: BuildSetTask,
    /// Resolves once every member task is terminal.
    pub completion: oneshot::Receiver<BuildSetResult>,
}

impl BuildSetHandle {
    /// Ids of the member tasks, in submission order.
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.set.task_ids()
    }
}

/// Entry point for triggering builds.
///
/// Cheap to clone-by-`Arc` and safe to call from any task; the heavy lifting
/// happens in the event loop behind the channel.
pub struct BuildCoordinator {
    event_tx: mpsc::Sender<CoordinatorEvent>,
    live: LiveBuildTasks,
    configurations: Arc<dyn ConfigurationSource>,
    records: Arc<dyn BuildRecordStore>,
    next_task_id: AtomicU64,
    next_set_id: AtomicU64,
}

impl BuildCoordinator {
    pub fn new(
        event_tx: mpsc::Sender<CoordinatorEvent>,
        live: LiveBuildTasks,
        configurations: Arc<dyn ConfigurationSource>,
        records: Arc<dyn BuildRecordStore>,
    ) -> Self {
        Self {
            event_tx,
            live,
            configurations,
            records,
            next_task_id: AtomicU64::new(1),
            next_set_id: AtomicU64::new(1),
        }
    }

    /// Trigger a build of one configuration, optionally expanding its
    /// transitive dependents and dependencies into the same set.
    ///
    /// Overrides apply to the triggered configuration only, before any task
    /// is created; resolved dependents and dependencies build from their
    /// stored audited revisions.
    ///
    /// Unless `force_rebuild` is set, a target that already has a successful
    /// record for its revision is rejected with a distinct error, and
    /// already-built members of the dependency closure are left out of the
    /// set (their artifacts satisfy the dependency). Dependents pulled in by
    /// `build_dependents` always rebuild; rebuilding them is the point of
    /// the flag.
    pub async fn build(
        &self,
        configuration: BuildConfigurationAudited,
        user: &str,
        options: BuildOptions,
        overrides: BuildOverrides,
    ) -> Result<BuildSetHandle> {
        options.validate()?;

        let target = BuildConfigurationAudited::new(
            overrides.apply(configuration.configuration),
            configuration.revision,
        );

        if !options.force_rebuild && self.records.has_successful(target.id_rev()) {
            return Err(CoordinatorError::NoRebuildRequired(target.id_rev()));
        }

        let mut members = vec![target];
        if options.build_dependents {
            self.resolve_dependents(&mut members)?;
        }
        if options.build_dependencies {
            let explicit = members.len();
            self.resolve_dependencies(&mut members)?;
            if !options.force_rebuild {
                let records = &self.records;
                let mut index = 0;
                members.retain(|member| {
                    let keep = index < explicit || !records.has_successful(member.id_rev());
                    index += 1;
                    keep
                });
            }
        }

        self.submit(members, user, options).await
    }

    /// Trigger a build set from an explicit group of configurations.
    ///
    /// Dependencies are honored only between members of the group; nothing
    /// outside the group is pulled in.
    pub async fn build_set(
        &self,
        configurations: Vec<BuildConfigurationAudited>,
        user: &str,
        options: BuildOptions,
    ) -> Result<BuildSetHandle> {
        if configurations.is_empty() {
            return Err(CoordinatorError::InvalidRequest(
                "build set must contain at least one configuration".to_string(),
            ));
        }
        options.validate()?;

        let mut members = Vec::with_capacity(configurations.len());
        let mut seen = HashSet::new();
        for configuration in configurations {
            if seen.insert(configuration.id()) {
                members.push(configuration);
            }
        }

        self.submit(members, user, options).await
    }

    /// Snapshot of all tasks currently in flight (`New` or `Building`).
    pub fn get_submitted_build_tasks(&self) -> Vec<BuildTask> {
        self.live.snapshot()
    }

    /// Report the outcome of a dispatched build back to the event loop.
    ///
    /// Reports are idempotent per task: a duplicate or late report is logged
    /// and ignored by the scheduler.
    pub async fn report_completion(&self, task: TaskId, result: BuildResult) -> Result<()> {
        self.event_tx
            .send(CoordinatorEvent::BuildCompleted { task, result })
            .await
            .map_err(|_| CoordinatorError::ChannelClosed("coordinator events"))
    }

    /// Ask the event loop to stop. In-flight builds are dropped from the
    /// live view; their records are not persisted.
    pub async fn shutdown(&self) -> Result<()> {
        self.event_tx
            .send(CoordinatorEvent::ShutdownRequested)
            .await
            .map_err(|_| CoordinatorError::ChannelClosed("coordinator events"))
    }

    /// Expand `members` with the transitive dependents of its current
    /// entries, fetched from the configuration source.
    fn resolve_dependents(&self, members: &mut Vec<BuildConfigurationAudited>) -> Result<()> {
        let mut seen: HashSet<ConfigurationId> = members.iter().map(|m| m.id()).collect();
        let mut pending: VecDeque<ConfigurationId> = members
            .iter()
            .flat_map(|m| self.configurations.dependents_of(m.id()))
            .collect();

        while let Some(id) = pending.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            let dependent = self
                .configurations
                .configuration(id)
                .ok_or(CoordinatorError::ConfigurationNotFound(id))?;
            pending.extend(self.configurations.dependents_of(id));
            members.push(dependent);
        }

        Ok(())
    }

    /// Expand `members` with the transitive dependency closure of its
    /// current entries, fetched from the configuration source.
    fn resolve_dependencies(&self, members: &mut Vec<BuildConfigurationAudited>) -> Result<()> {
        let mut seen: HashSet<ConfigurationId> = members.iter().map(|m| m.id()).collect();
        let mut pending: VecDeque<ConfigurationId> = members
            .iter()
            .flat_map(|m| m.configuration.dependencies.iter().copied())
            .collect();

        while let Some(id) = pending.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            let dependency = self
                .configurations
                .configuration(id)
                .ok_or(CoordinatorError::ConfigurationNotFound(id))?;
            pending.extend(dependency.configuration.dependencies.iter().copied());
            members.push(dependency);
        }

        Ok(())
    }

    /// Validate the member graph, create the tasks, claim the live set and
    /// hand the set to the event loop.
    async fn submit(
        &self,
        members: Vec<BuildConfigurationAudited>,
        user: &str,
        options: BuildOptions,
    ) -> Result<BuildSetHandle> {
        let member_ids: Vec<ConfigurationId> = members.iter().map(|m| m.id()).collect();
        let in_set: HashSet<ConfigurationId> = member_ids.iter().copied().collect();

        // Edges only between members; dependencies outside the set are
        // assumed satisfied by existing artifacts.
        let mut edges = Vec::new();
        for member in &members {
            for dep in &member.configuration.dependencies {
                if in_set.contains(dep) {
                    edges.push((member.id(), *dep));
                }
            }
        }
        ensure_acyclic(&member_ids, &edges)?;

        let set_id = BuildSetId(self.next_set_id.fetch_add(1, Ordering::Relaxed));
        let submit_time = Utc::now();

        let task_ids: HashMap<ConfigurationId, TaskId> = member_ids
            .iter()
            .map(|&id| (id, TaskId(self.next_task_id.fetch_add(1, Ordering::Relaxed))))
            .collect();

        let mut tasks = Vec::with_capacity(members.len());
        for member in members {
            let id = task_ids[&member.id()];
            let dependencies: Vec<TaskId> = member
                .configuration
                .dependencies
                .iter()
                .filter_map(|dep| task_ids.get(dep).copied())
                .collect();
            let mut task = BuildTask::new(id, set_id, member, user, options, submit_time);
            task.dependencies = dependencies;
            tasks.push(task);
        }

        let set = BuildSetTask::new(set_id, tasks, submit_time);

        self.live
            .insert_new_set(&set.tasks)
            .map_err(CoordinatorError::BuildConflict)?;

        info!(set = %set_id, tasks = set.tasks.len(), user, "triggering build set");
        debug!(configurations = ?member_ids, "build set members");

        let (notify_tx, notify_rx) = oneshot::channel();
        let submitted = set.clone();
        if self
            .event_tx
            .send(CoordinatorEvent::SetSubmitted {
                set,
                notify: Some(notify_tx),
            })
            .await
            .is_err()
        {
            // The event loop is gone; release the live claim we just took.
            for id in submitted.task_ids() {
                self.live.remove(id);
            }
            return Err(CoordinatorError::ChannelClosed("coordinator events"));
        }

        Ok(BuildSetHandle {
            set: submitted,
            completion: notify_rx,
        })
    }
}
