// tests/monitor.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use buildcoord::monitor::{MonitorError, PollingMonitor};
use buildcoord_test_utils::init_tracing;

type Outcome = Result<(), MonitorError>;

fn outcome_slot() -> (
    Arc<Mutex<Vec<Outcome>>>,
    impl FnOnce(Outcome) + Send + 'static,
) {
    let slot = Arc::new(Mutex::new(Vec::new()));
    let writer = Arc::clone(&slot);
    (slot, move |outcome| {
        writer.lock().unwrap().push(outcome);
    })
}

#[tokio::test(start_paused = true)]
async fn resolves_once_when_the_condition_becomes_true() {
    init_tracing();

    let monitor = PollingMonitor::new(Duration::from_secs(1), Duration::from_secs(300));
    let checks = Arc::new(AtomicUsize::new(0));
    let (outcomes, on_resolved) = outcome_slot();

    let condition_checks = Arc::clone(&checks);
    monitor.monitor(
        move || {
            // True on the third check (t = 2s; the first check is immediate).
            Ok(condition_checks.fetch_add(1, Ordering::SeqCst) + 1 >= 3)
        },
        on_resolved,
    );

    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(checks.load(Ordering::SeqCst), 3);
    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_ok());
}

#[tokio::test(start_paused = true)]
async fn never_true_condition_times_out() {
    init_tracing();

    let monitor = PollingMonitor::new(Duration::from_secs(1), Duration::from_secs(3));
    let (outcomes, on_resolved) = outcome_slot();

    monitor.monitor(|| Ok(false), on_resolved);

    tokio::time::sleep(Duration::from_secs(10)).await;

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(
        outcomes[0],
        Err(MonitorError::Timeout { timeout }) if timeout == Duration::from_secs(3)
    ));
}

#[tokio::test(start_paused = true)]
async fn slow_polling_still_times_out_on_schedule() {
    init_tracing();

    // The check interval is far beyond the timeout; the watchdog must fire
    // anyway, long before the second condition check.
    let monitor = PollingMonitor::new(Duration::from_secs(60), Duration::from_secs(3));
    let (outcomes, on_resolved) = outcome_slot();

    monitor.monitor(|| Ok(false), on_resolved);

    tokio::time::sleep(Duration::from_secs(5)).await;

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0], Err(MonitorError::Timeout { .. })));
}

#[tokio::test(start_paused = true)]
async fn cancel_discards_the_callback() {
    init_tracing();

    let monitor = PollingMonitor::new(Duration::from_secs(1), Duration::from_secs(3));
    let (outcomes, on_resolved) = outcome_slot();

    let handle = monitor.monitor(|| Ok(false), on_resolved);
    handle.cancel();
    // Safe to cancel twice.
    handle.cancel();

    tokio::time::sleep(Duration::from_secs(10)).await;

    assert!(outcomes.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn condition_error_resolves_the_watch() {
    init_tracing();

    let monitor = PollingMonitor::new(Duration::from_secs(1), Duration::from_secs(300));
    let (outcomes, on_resolved) = outcome_slot();

    let checks = Arc::new(AtomicUsize::new(0));
    let condition_checks = Arc::clone(&checks);
    monitor.monitor(
        move || {
            if condition_checks.fetch_add(1, Ordering::SeqCst) + 1 >= 2 {
                Err(anyhow::anyhow!("status endpoint unreachable"))
            } else {
                Ok(false)
            }
        },
        on_resolved,
    );

    tokio::time::sleep(Duration::from_secs(10)).await;

    // The error stops polling.
    assert_eq!(checks.load(Ordering::SeqCst), 2);
    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0], Err(MonitorError::Condition(_))));
}

#[tokio::test(start_paused = true)]
async fn completion_and_timeout_race_resolves_exactly_once() {
    init_tracing();

    // Condition becomes true exactly at the timeout boundary; whichever side
    // wins, the callback must run exactly once.
    let monitor = PollingMonitor::new(Duration::from_secs(3), Duration::from_secs(3));
    let (outcomes, on_resolved) = outcome_slot();

    let checks = Arc::new(AtomicUsize::new(0));
    let condition_checks = Arc::clone(&checks);
    monitor.monitor(
        move || Ok(condition_checks.fetch_add(1, Ordering::SeqCst) + 1 >= 2),
        on_resolved,
    );

    tokio::time::sleep(Duration::from_secs(10)).await;

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn watches_resolve_independently() {
    init_tracing();

    let monitor = PollingMonitor::new(Duration::from_secs(1), Duration::from_secs(3));
    let (fast_outcomes, fast_resolved) = outcome_slot();
    let (slow_outcomes, slow_resolved) = outcome_slot();

    monitor.monitor(|| Ok(true), fast_resolved);
    monitor.monitor(|| Ok(false), slow_resolved);

    tokio::time::sleep(Duration::from_secs(10)).await;

    assert!(fast_outcomes.lock().unwrap()[0].is_ok());
    assert!(matches!(
        slow_outcomes.lock().unwrap()[0],
        Err(MonitorError::Timeout { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn timer_runs_once_after_the_delay() {
    init_tracing();

    let monitor = PollingMonitor::new(Duration::from_secs(1), Duration::from_secs(300));
    let fired = Arc::new(AtomicUsize::new(0));

    let fired_in = Arc::clone(&fired);
    monitor.timer(
        move || {
            fired_in.fetch_add(1, Ordering::SeqCst);
        },
        Duration::from_secs(2),
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}
