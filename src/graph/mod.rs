// src/graph/mod.rs

//! Build task graph and scheduling.
//!
//! - [`task`] holds the task status machine, dependency readiness and the
//!   rich `BuildTask` type.
//! - [`graph`] holds the per-set dependency adjacency plus cycle validation.
//! - [`set`] defines the build set (one trigger request).
//! - [`scheduler`] contains the per-set state machine that decides which
//!   tasks are ready to run and propagates failure to dependents.

pub mod graph;
pub mod scheduler;
pub mod set;
pub mod task;

pub use graph::{ensure_acyclic, BuildGraph};
pub use scheduler::{SchedulerStep, SetScheduler};
pub use set::{BuildSetTask, SetStatus};
pub use task::{readiness, BuildTask, DependencyReadiness, ScheduledBuild, TaskStatus};
