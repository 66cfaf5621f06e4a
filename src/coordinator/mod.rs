// src/coordinator/mod.rs

//! Build coordination engine.
//!
//! This module ties together:
//! - the per-set scheduler ([`crate::graph`])
//! - the live in-flight task set ([`live`])
//! - the event loop that reacts to:
//!   - submitted build sets
//!   - executor completion reports
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]; the public trigger API is [`coordinator`].

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::graph::{BuildSetTask, SetStatus};
use crate::model::{BuildSetId, TaskId};

/// Outcome of a build execution as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    Failed(String),
}

/// Completion report for one dispatched build.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub outcome: BuildOutcome,
    /// Free-form identifier assigned by the execution backend.
    pub execution_id: Option<String>,
    pub completed_at: DateTime<Utc>,
    pub log: Option<String>,
}

impl BuildResult {
    pub fn success(execution_id: impl Into<String>) -> Self {
        Self {
            outcome: BuildOutcome::Success,
            execution_id: Some(execution_id.into()),
            completed_at: Utc::now(),
            log: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            outcome: BuildOutcome::Failed(reason.into()),
            execution_id: None,
            completed_at: Utc::now(),
            log: None,
        }
    }
}

/// Final result of a build set, delivered to the trigger's completion
/// receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSetResult {
    pub set_id: BuildSetId,
    pub status: SetStatus,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinatorOptions {
    /// If true, exit the event loop once no build set is in flight
    /// (used for batch runs and tests).
    pub exit_when_idle: bool,
}

/// Events flowing into the coordinator's event loop.
#[derive(Debug)]
pub enum CoordinatorEvent {
    /// A validated build set was submitted for execution.
    SetSubmitted {
        set: BuildSetTask,
        notify: Option<oneshot::Sender<BuildSetResult>>,
    },
    /// The execution backend reported a build outcome.
    BuildCompleted { task: TaskId, result: BuildResult },
    /// Graceful shutdown requested.
    ShutdownRequested,
}

pub mod coordinator;
pub mod core;
pub mod live;
pub mod runtime;

pub use coordinator::{BuildCoordinator, BuildSetHandle};
pub use core::{CoordinatorCore, CoreCommand, CoreStep};
pub use live::LiveBuildTasks;
pub use runtime::Runtime;
