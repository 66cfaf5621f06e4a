// src/model/record.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::task::TaskStatus;

use super::ids::{IdRev, TaskId};

/// Persisted outcome of a finished build task.
///
/// Records are append-only: one is written when a task reaches a terminal
/// state, keyed by the task id and the audited configuration revision that
/// was built. `status` is always terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub id: TaskId,
    pub id_rev: IdRev,
    pub configuration_name: String,
    pub status: TaskStatus,
    pub submit_time: DateTime<Utc>,
    /// Unset when the task never started (failed through a dependency).
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub user: String,
    pub temporary_build: bool,
    /// Free-form identifier assigned by the execution backend.
    pub execution_id: Option<String>,
    pub failure_reason: Option<String>,
    pub log: Option<String>,
}
