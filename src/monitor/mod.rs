// src/monitor/mod.rs

//! Periodic condition monitoring with timeout enforcement.
//!
//! [`PollingMonitor`] evaluates registered conditions on a fixed interval and
//! resolves each watch exactly once, with one of three outcomes:
//! - the condition returned `true`: the callback gets `Ok(())`
//! - the condition returned an error: the callback gets
//!   [`MonitorError::Condition`]
//! - the deadline passed first: the callback gets [`MonitorError::Timeout`]
//!
//! Deadlines are enforced by a dedicated watchdog task that scans all active
//! watches every [`WATCHDOG_TICK`], independently of the per-watch check
//! interval. A watch whose condition polls slowly (or never returns `true`)
//! still times out on schedule.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Scan cadence of the timeout watchdog.
pub const WATCHDOG_TICK: Duration = Duration::from_millis(250);

/// Default per-watch condition check interval.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Default per-watch timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Why a watch resolved unsuccessfully.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Monitored condition was not satisfied within {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Monitored condition failed")]
    Condition(#[source] anyhow::Error),
}

type Callback = Box<dyn FnOnce(Result<(), MonitorError>) + Send>;

struct Watch {
    resolved: AtomicBool,
    deadline: Instant,
    timeout: Duration,
    callback: Mutex<Option<Callback>>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl Watch {
    /// Claim the right to resolve this watch. At most one caller ever gets
    /// the callback back; everyone else sees `None` and must stand down.
    fn claim(&self) -> Option<Callback> {
        if self.resolved.swap(true, Ordering::SeqCst) {
            return None;
        }
        self.callback.lock().expect("watch callback lock poisoned").take()
    }

    fn abort_poll(&self) {
        if let Some(task) = self
            .poll_task
            .lock()
            .expect("watch poll task lock poisoned")
            .take()
        {
            task.abort();
        }
    }
}

type WatchMap = Arc<Mutex<HashMap<u64, Arc<Watch>>>>;

/// Handle to a registered watch; allows cancelling it before it resolves.
pub struct MonitorHandle {
    id: u64,
    watches: WatchMap,
}

impl std::fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorHandle").field("id", &self.id).finish()
    }
}

impl MonitorHandle {
    /// Cancel the watch. The callback is discarded without being invoked.
    /// A no-op when the watch has already resolved; safe to call twice.
    pub fn cancel(&self) {
        let removed = self
            .watches
            .lock()
            .expect("monitor watch map lock poisoned")
            .remove(&self.id);
        if let Some(watch) = removed {
            drop(watch.claim());
            watch.abort_poll();
            debug!(watch = self.id, "watch cancelled");
        }
    }
}

/// Shared monitor for timeout-bounded condition polling.
///
/// One watchdog task serves all watches; each registered watch additionally
/// runs its own polling task at its check interval.
pub struct PollingMonitor {
    watches: WatchMap,
    next_id: Arc<AtomicU64>,
    check_interval: Duration,
    timeout: Duration,
    watchdog: JoinHandle<()>,
}

impl PollingMonitor {
    pub fn new(check_interval: Duration, timeout: Duration) -> Self {
        let watches: WatchMap = Arc::new(Mutex::new(HashMap::new()));
        let watchdog = tokio::spawn(Self::watchdog_loop(Arc::clone(&watches)));

        Self {
            watches,
            next_id: Arc::new(AtomicU64::new(1)),
            check_interval,
            timeout,
            watchdog,
        }
    }

    /// Register a watch with the monitor's default interval and timeout.
    pub fn monitor<C, F>(&self, condition: C, on_resolved: F) -> MonitorHandle
    where
        C: FnMut() -> anyhow::Result<bool> + Send + 'static,
        F: FnOnce(Result<(), MonitorError>) + Send + 'static,
    {
        self.monitor_with(condition, on_resolved, self.check_interval, self.timeout)
    }

    /// Register a watch with an explicit check interval and timeout.
    ///
    /// The condition is evaluated immediately, then once per interval, until
    /// it returns `true`, returns an error, the timeout expires, or the
    /// watch is cancelled. Whichever happens first resolves the watch; the
    /// callback runs exactly once.
    pub fn monitor_with<C, F>(
        &self,
        mut condition: C,
        on_resolved: F,
        check_interval: Duration,
        timeout: Duration,
    ) -> MonitorHandle
    where
        C: FnMut() -> anyhow::Result<bool> + Send + 'static,
        F: FnOnce(Result<(), MonitorError>) + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let watch = Arc::new(Watch {
            resolved: AtomicBool::new(false),
            deadline: Instant::now() + timeout,
            timeout,
            callback: Mutex::new(Some(Box::new(on_resolved))),
            poll_task: Mutex::new(None),
        });

        self.watches
            .lock()
            .expect("monitor watch map lock poisoned")
            .insert(id, Arc::clone(&watch));

        let poll_watch = Arc::clone(&watch);
        let poll_watches = Arc::clone(&self.watches);
        let poll = tokio::spawn(async move {
            let mut ticker = interval(check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                if poll_watch.resolved.load(Ordering::SeqCst) {
                    break;
                }

                let outcome = match condition() {
                    Ok(false) => continue,
                    Ok(true) => Ok(()),
                    Err(e) => Err(MonitorError::Condition(e)),
                };

                if let Some(callback) = poll_watch.claim() {
                    poll_watches
                        .lock()
                        .expect("monitor watch map lock poisoned")
                        .remove(&id);
                    callback(outcome);
                }
                break;
            }
        });

        *watch.poll_task.lock().expect("watch poll task lock poisoned") = Some(poll);

        debug!(watch = id, ?check_interval, ?timeout, "watch registered");

        MonitorHandle {
            id,
            watches: Arc::clone(&self.watches),
        }
    }

    /// Run `task` once after `delay`.
    pub fn timer<F>(&self, task: F, delay: Duration) -> JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        })
    }

    /// Stop the watchdog and every active watch without resolving them.
    pub fn shutdown(&self) {
        self.watchdog.abort();
        let drained: Vec<Arc<Watch>> = self
            .watches
            .lock()
            .expect("monitor watch map lock poisoned")
            .drain()
            .map(|(_, w)| w)
            .collect();
        for watch in drained {
            drop(watch.claim());
            watch.abort_poll();
        }
    }

    async fn watchdog_loop(watches: WatchMap) {
        // Nothing can expire before the first tick, so start one tick in.
        let mut ticker = interval_at(Instant::now() + WATCHDOG_TICK, WATCHDOG_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let now = Instant::now();

            let expired: Vec<(u64, Arc<Watch>)> = {
                let mut guard = watches.lock().expect("monitor watch map lock poisoned");
                let ids: Vec<u64> = guard
                    .iter()
                    .filter(|(_, w)| now >= w.deadline)
                    .map(|(&id, _)| id)
                    .collect();
                ids.into_iter()
                    .filter_map(|id| guard.remove(&id).map(|w| (id, w)))
                    .collect()
            };

            for (id, watch) in expired {
                if let Some(callback) = watch.claim() {
                    warn!(watch = id, timeout = ?watch.timeout, "watch timed out");
                    callback(Err(MonitorError::Timeout {
                        timeout: watch.timeout,
                    }));
                }
                watch.abort_poll();
            }
        }
    }
}

impl Drop for PollingMonitor {
    fn drop(&mut self) {
        self.watchdog.abort();
        let guard = self.watches.lock();
        if let Ok(mut guard) = guard {
            for (_, watch) in guard.drain() {
                watch.abort_poll();
            }
        }
    }
}

impl std::fmt::Debug for PollingMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingMonitor")
            .field("check_interval", &self.check_interval)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
