// src/graph/task.rs

//! Build task state machine and scheduling metadata.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{CoordinatorError, Result};
use crate::model::{
    BuildConfigurationAudited, BuildOptions, BuildRecord, BuildSetId, IdRev, TaskId,
};

/// Lifecycle status of a single build task.
///
/// Transitions are monotonic: `New → Building → {Success, Failed}`, plus
/// `New → Failed` for tasks rejected through a failed dependency. There is no
/// transition out of a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    New,
    Building,
    Success,
    Failed,
}

impl TaskStatus {
    pub fn is_done(self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failed)
    }
}

/// Readiness of a task with respect to its declared dependencies.
///
/// A failed dependency makes the task `Unsatisfiable` rather than leaving it
/// pending forever; the scheduler fails it transitively without running it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyReadiness {
    /// Every dependency finished successfully (vacuously true when empty).
    Ready,
    /// Some dependency has not reached a terminal state yet.
    Pending,
    /// At least one dependency failed; this task can never become ready.
    Unsatisfiable,
}

/// Compute readiness from the statuses of the direct dependencies.
pub fn readiness<I>(dependency_statuses: I) -> DependencyReadiness
where
    I: IntoIterator<Item = TaskStatus>,
{
    let mut ready = DependencyReadiness::Ready;
    for status in dependency_statuses {
        match status {
            TaskStatus::Failed => return DependencyReadiness::Unsatisfiable,
            TaskStatus::Success => {}
            TaskStatus::New | TaskStatus::Building => ready = DependencyReadiness::Pending,
        }
    }
    ready
}

/// One schedulable unit of build work tied to an audited configuration.
///
/// Owned by the coordinator that created it; evicted from the live set once
/// its outcome has been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTask {
    pub id: TaskId,
    pub set_id: BuildSetId,
    /// Audited configuration, with trigger overrides already applied.
    pub configuration: BuildConfigurationAudited,
    pub user: String,
    pub options: BuildOptions,
    pub status: TaskStatus,
    pub submit_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    /// Direct dependencies within the same build set.
    pub dependencies: Vec<TaskId>,
}

impl BuildTask {
    pub fn new(
        id: TaskId,
        set_id: BuildSetId,
        configuration: BuildConfigurationAudited,
        user: impl Into<String>,
        options: BuildOptions,
        submit_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            set_id,
            configuration,
            user: user.into(),
            options,
            status: TaskStatus::New,
            submit_time,
            start_time: None,
            end_time: None,
            failure_reason: None,
            dependencies: Vec::new(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.status == TaskStatus::New
    }

    pub fn is_building(&self) -> bool {
        self.status == TaskStatus::Building
    }

    pub fn is_done(&self) -> bool {
        self.status.is_done()
    }

    /// Move `New → Building`. Calling this in any other state is a
    /// programming error and fails fast instead of being silently ignored.
    pub fn set_building(&mut self, at: DateTime<Utc>) -> Result<()> {
        if self.status != TaskStatus::New {
            return Err(CoordinatorError::InvalidTransition(format!(
                "task {} cannot start building from {:?}",
                self.id, self.status
            )));
        }
        self.status = TaskStatus::Building;
        self.start_time = Some(at);
        Ok(())
    }

    /// Move `Building → Success`.
    pub fn completed_successfully(&mut self, at: DateTime<Utc>) -> Result<()> {
        if self.status != TaskStatus::Building {
            return Err(CoordinatorError::InvalidTransition(format!(
                "task {} cannot succeed from {:?}",
                self.id, self.status
            )));
        }
        self.status = TaskStatus::Success;
        self.end_time = Some(at);
        Ok(())
    }

    /// Move to `Failed`, from `Building` (execution failure) or from `New`
    /// (rejected through a failed dependency, without ever running).
    pub fn completed_with_error(
        &mut self,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        if self.status.is_done() {
            return Err(CoordinatorError::InvalidTransition(format!(
                "task {} is already terminal ({:?})",
                self.id, self.status
            )));
        }
        self.status = TaskStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.end_time = Some(at);
        Ok(())
    }

    pub fn id_rev(&self) -> IdRev {
        self.configuration.id_rev()
    }

    pub fn configuration_name(&self) -> &str {
        self.configuration.name()
    }

    /// Convert a terminal task into its persisted record form.
    pub fn to_record(&self, execution_id: Option<String>, log: Option<String>) -> BuildRecord {
        BuildRecord {
            id: self.id,
            id_rev: self.id_rev(),
            configuration_name: self.configuration_name().to_string(),
            status: self.status,
            submit_time: self.submit_time,
            start_time: self.start_time,
            end_time: self.end_time,
            user: self.user.clone(),
            temporary_build: self.options.temporary_build,
            execution_id,
            failure_reason: self.failure_reason.clone(),
            log,
        }
    }
}

/// Description of a task the scheduler wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledBuild {
    pub task_id: TaskId,
    pub set_id: BuildSetId,
    pub id_rev: IdRev,
    pub name: String,
    pub scm_url: String,
    pub scm_revision: String,
    pub build_script: String,
    pub generic_parameters: BTreeMap<String, String>,
    pub options: BuildOptions,
}

impl ScheduledBuild {
    pub fn from_task(task: &BuildTask) -> Self {
        let configuration = &task.configuration.configuration;
        Self {
            task_id: task.id,
            set_id: task.set_id,
            id_rev: task.id_rev(),
            name: configuration.name.clone(),
            scm_url: configuration.scm_url.clone(),
            scm_revision: configuration.scm_revision.clone(),
            build_script: configuration.build_script.clone(),
            generic_parameters: configuration.generic_parameters.clone(),
            options: task.options,
        }
    }
}
