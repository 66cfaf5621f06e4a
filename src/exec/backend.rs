// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender.
//! The actual build execution system (container cluster, agent pool, ...) is
//! an external collaborator: it consumes dispatched [`ScheduledBuild`]s and
//! reports outcomes back as `CoordinatorEvent::BuildCompleted` events.
//!
//! - [`ChannelExecutorBackend`] forwards dispatched builds over an mpsc
//!   channel for an external consumer.
//! - Tests provide their own `ExecutorBackend` that records which builds
//!   were dispatched and directly emits completion events.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::errors::{CoordinatorError, Result};
use crate::graph::ScheduledBuild;

/// Trait abstracting how dispatched builds reach the execution backend.
pub trait ExecutorBackend: Send {
    /// Hand the given builds to the execution backend.
    ///
    /// The implementation is free to:
    /// - forward them to an external executor (production)
    /// - simulate completion and emit `CoordinatorEvent`s (tests)
    fn spawn_ready_builds(
        &mut self,
        builds: Vec<ScheduledBuild>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Backend that forwards dispatched builds over an mpsc channel.
///
/// Whatever consumes the receiving end is expected to run the builds and
/// report each outcome with a `BuildCompleted` event carrying the execution
/// id, end timestamp and log output.
pub struct ChannelExecutorBackend {
    tx: mpsc::Sender<ScheduledBuild>,
}

impl ChannelExecutorBackend {
    pub fn new(tx: mpsc::Sender<ScheduledBuild>) -> Self {
        Self { tx }
    }

    /// Convenience constructor returning the backend plus the receiving end
    /// for the external executor.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ScheduledBuild>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

impl ExecutorBackend for ChannelExecutorBackend {
    fn spawn_ready_builds(
        &mut self,
        builds: Vec<ScheduledBuild>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for build in builds {
                tx.send(build)
                    .await
                    .map_err(|_| CoordinatorError::ChannelClosed("executor builds"))?;
            }
            Ok(())
        })
    }
}
