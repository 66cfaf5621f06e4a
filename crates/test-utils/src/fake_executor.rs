use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use buildcoord::coordinator::{BuildResult, CoordinatorEvent};
use buildcoord::errors::{CoordinatorError, Result};
use buildcoord::exec::ExecutorBackend;
use buildcoord::graph::ScheduledBuild;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records which builds were "run" (by configuration name)
/// - immediately reports a successful completion for each dispatched build.
pub struct FakeExecutor {
    event_tx: mpsc::Sender<CoordinatorEvent>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl FakeExecutor {
    pub fn new(
        event_tx: mpsc::Sender<CoordinatorEvent>,
        executed: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self { event_tx, executed }
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_builds(
        &mut self,
        builds: Vec<ScheduledBuild>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.event_tx.clone();
        let executed = Arc::clone(&self.executed);

        Box::pin(async move {
            for build in builds {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(build.name.clone());
                }

                tx.send(CoordinatorEvent::BuildCompleted {
                    task: build.task_id,
                    result: BuildResult::success(format!("exec-{}", build.task_id)),
                })
                .await
                .map_err(|_| CoordinatorError::ChannelClosed("coordinator events"))?;
            }
            Ok(())
        })
    }
}

/// Like [`FakeExecutor`], but fails builds whose configuration name is in the
/// failing set. Everything else succeeds.
pub struct ScriptedExecutor {
    event_tx: mpsc::Sender<CoordinatorEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    failing: HashSet<String>,
}

impl ScriptedExecutor {
    pub fn new(
        event_tx: mpsc::Sender<CoordinatorEvent>,
        executed: Arc<Mutex<Vec<String>>>,
        failing: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            event_tx,
            executed,
            failing: failing.into_iter().collect(),
        }
    }
}

impl ExecutorBackend for ScriptedExecutor {
    fn spawn_ready_builds(
        &mut self,
        builds: Vec<ScheduledBuild>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.event_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing.clone();

        Box::pin(async move {
            for build in builds {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(build.name.clone());
                }

                let result = if failing.contains(&build.name) {
                    BuildResult::failed(format!("build of {} failed", build.name))
                } else {
                    BuildResult::success(format!("exec-{}", build.task_id))
                };

                tx.send(CoordinatorEvent::BuildCompleted {
                    task: build.task_id,
                    result,
                })
                .await
                .map_err(|_| CoordinatorError::ChannelClosed("coordinator events"))?;
            }
            Ok(())
        })
    }
}
