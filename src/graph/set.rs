// src/graph/set.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{BuildSetId, TaskId};

use super::task::BuildTask;

/// Aggregate result of a build set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetStatus {
    InProgress,
    /// Every member task succeeded.
    Success,
    /// At least one member task failed.
    Failed,
}

/// An ordered group of build tasks submitted together from one trigger.
///
/// All member tasks are created together; the set is complete once every
/// member is terminal, succeeding only when all of them did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSetTask {
    pub id: BuildSetId,
    pub tasks: Vec<BuildTask>,
    pub status: SetStatus,
    pub submit_time: DateTime<Utc>,
}

impl BuildSetTask {
    pub fn new(id: BuildSetId, tasks: Vec<BuildTask>, submit_time: DateTime<Utc>) -> Self {
        Self {
            id,
            tasks,
            status: SetStatus::InProgress,
            submit_time,
        }
    }

    pub fn task(&self, id: TaskId) -> Option<&BuildTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut BuildTask> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|t| t.id).collect()
    }

    pub fn all_done(&self) -> bool {
        self.tasks.iter().all(|t| t.is_done())
    }
}
