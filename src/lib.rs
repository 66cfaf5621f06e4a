// src/lib.rs

//! Concurrent build coordination engine.
//!
//! The engine turns trigger requests into dependency-ordered build task
//! sets, dispatches ready tasks to a pluggable execution backend, reacts to
//! completion reports, and keeps a queryable view over both in-flight and
//! finished builds.
//!
//! Architecture:
//! - [`coordinator`]: trigger API, pure scheduling core and async event loop
//! - [`graph`]: task state machine and per-set dependency scheduling
//! - [`exec`]: executor backend seam
//! - [`monitor`]: timeout-bounded condition polling
//! - [`provider`]: paged listing merging live and persisted builds
//! - [`datastore`]: persistence collaborator interfaces
//! - [`config`]: TOML service configuration

pub mod config;
pub mod coordinator;
pub mod datastore;
pub mod errors;
pub mod exec;
pub mod graph;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod provider;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use config::SystemConfig;
use coordinator::{
    BuildCoordinator, CoordinatorCore, CoordinatorEvent, CoordinatorOptions, LiveBuildTasks,
    Runtime,
};
use datastore::{BuildRecordStore, ConfigurationSource};
use errors::Result;
use exec::{ChannelExecutorBackend, ExecutorBackend};
use graph::ScheduledBuild;
use monitor::PollingMonitor;
use provider::BuildRecordProvider;

/// A running coordination engine: trigger handle, read side and the event
/// loop task.
pub struct CoordinatorService {
    pub coordinator: Arc<BuildCoordinator>,
    pub provider: Arc<BuildRecordProvider>,
    pub monitor: Arc<PollingMonitor>,
    runtime: JoinHandle<Result<()>>,
}

impl CoordinatorService {
    /// Wait for the event loop to finish.
    pub async fn join(self) -> Result<()> {
        self.monitor.shutdown();
        match self.runtime.await {
            Ok(result) => result,
            Err(e) => Err(errors::CoordinatorError::Other(anyhow::Error::new(e))),
        }
    }
}

/// Start the engine with a channel-backed executor.
///
/// The returned receiver carries dispatched builds; whatever consumes it is
/// expected to run them and report outcomes through
/// [`BuildCoordinator::report_completion`]. Must be called within a Tokio
/// runtime.
pub fn start(
    config: &SystemConfig,
    options: CoordinatorOptions,
    configurations: Arc<dyn ConfigurationSource>,
    store: Arc<dyn BuildRecordStore>,
) -> (CoordinatorService, mpsc::Receiver<ScheduledBuild>) {
    let (backend, builds_rx) = ChannelExecutorBackend::channel(config.coordinator.executor_queue_length);
    let service = start_with_executor(config, options, configurations, store, |_| backend);
    (service, builds_rx)
}

/// Start the engine with a caller-provided executor backend.
///
/// The backend factory receives a sender for the coordinator's event
/// channel, so backends that simulate execution can report completions
/// directly.
pub fn start_with_executor<E, F>(
    config: &SystemConfig,
    options: CoordinatorOptions,
    configurations: Arc<dyn ConfigurationSource>,
    store: Arc<dyn BuildRecordStore>,
    backend: F,
) -> CoordinatorService
where
    E: ExecutorBackend + 'static,
    F: FnOnce(mpsc::Sender<CoordinatorEvent>) -> E,
{
    let (event_tx, event_rx) = mpsc::channel(config.coordinator.event_queue_length);
    let live = LiveBuildTasks::new();

    let executor = backend(event_tx.clone());
    let core = CoordinatorCore::new(options);
    let runtime = Runtime::new(core, event_rx, executor, Arc::clone(&store), live.clone());
    let runtime = tokio::spawn(runtime.run());

    let coordinator = Arc::new(BuildCoordinator::new(
        event_tx,
        live.clone(),
        configurations,
        Arc::clone(&store),
    ));
    let provider = Arc::new(BuildRecordProvider::new(live, store));
    let monitor = Arc::new(PollingMonitor::new(
        config.monitor.check_interval(),
        config.monitor.timeout(),
    ));

    CoordinatorService {
        coordinator,
        provider,
        monitor,
        runtime,
    }
}
