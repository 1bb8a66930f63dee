// tests/reconciler_loop.rs

//! End-to-end behaviour of the status reconciliation loop: failure
//! isolation, stale-entry removal, immediate fire on list changes, and
//! deterministic teardown.

use std::error::Error;
use std::sync::Arc;

use tokio::time::{Duration, timeout};

use taskhelm::model::TaskStatus;
use taskhelm::reconcile::{ReconcilerHandle, StatusReconciler, StatusSnapshot};
use taskhelm::rpc::{MemoryScheduler, SchedulerRpc};
use taskhelm::store::TaskStore;
use taskhelm_test_utils::builders::TaskBuilder;
use taskhelm_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

/// Poll the handle until the snapshot satisfies `pred`, bounded by a
/// timeout so a broken loop fails the test instead of hanging it.
async fn wait_for_snapshot(
    handle: &ReconcilerHandle,
    pred: impl Fn(&StatusSnapshot) -> bool,
    limit: Duration,
) -> Result<StatusSnapshot, Box<dyn Error>> {
    let snapshot = timeout(limit, async {
        loop {
            let snapshot = handle.snapshot();
            if pred(&snapshot) {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;
    Ok(snapshot)
}

#[tokio::test]
async fn one_failing_query_does_not_poison_the_tick() -> TestResult {
    init_tracing();

    let rpc = MemoryScheduler::new();
    rpc.seed_task(TaskBuilder::new("/bin/a").id(1).build());
    rpc.seed_task(TaskBuilder::new("/bin/b").id(7).build());
    rpc.set_status(1, TaskStatus::Running);
    rpc.fail_runnable_queries_for("/bin/b");

    let mut store = TaskStore::new(Arc::new(rpc.clone()));
    store.fetch().await;

    let handle = StatusReconciler::spawn(Arc::new(rpc), store.subscribe());
    let snapshot = wait_for_snapshot(
        &handle,
        |s| s.probed_ids().count() == 2,
        Duration::from_secs(3),
    )
    .await?;

    assert!(snapshot.running(1));
    assert!(snapshot.runnable(1));
    assert!(!snapshot.running(7));
    assert!(!snapshot.runnable(7), "failed query must default to false");

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn removed_task_leaves_no_stale_snapshot_entry() -> TestResult {
    init_tracing();

    let rpc = MemoryScheduler::new();
    rpc.seed_task(TaskBuilder::new("/bin/a").id(1).build());
    rpc.seed_task(TaskBuilder::new("/bin/b").id(2).build());
    rpc.set_status(2, TaskStatus::Running);

    let mut store = TaskStore::new(Arc::new(rpc.clone()));
    store.fetch().await;

    let handle = StatusReconciler::spawn(Arc::new(rpc.clone()), store.subscribe());
    wait_for_snapshot(
        &handle,
        |s| s.probed_ids().count() == 2,
        Duration::from_secs(3),
    )
    .await?;

    rpc.remove_task(2).await?;
    store.fetch().await;

    let snapshot = wait_for_snapshot(
        &handle,
        |s| s.probed_ids().count() == 1,
        Duration::from_secs(3),
    )
    .await?;
    assert!(!snapshot.running(2), "wholesale replace must drop the entry");
    assert!(snapshot.probed_ids().all(|id| id == 1));

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn list_change_fires_a_tick_well_before_the_cadence() -> TestResult {
    init_tracing();

    let rpc = MemoryScheduler::new();
    rpc.seed_task(TaskBuilder::new("/bin/a").id(1).build());

    let mut store = TaskStore::new(Arc::new(rpc.clone()));
    store.fetch().await;

    let handle = StatusReconciler::spawn(Arc::new(rpc.clone()), store.subscribe());
    wait_for_snapshot(
        &handle,
        |s| s.probed_ids().count() == 1,
        Duration::from_secs(3),
    )
    .await?;

    rpc.seed_task(TaskBuilder::new("/bin/b").id(2).build());
    store.fetch().await;

    // The 2000 ms cadence alone would not get here this quickly.
    wait_for_snapshot(
        &handle,
        |s| s.probed_ids().count() == 2,
        Duration::from_millis(1500),
    )
    .await?;

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn teardown_discards_a_stalled_tick() -> TestResult {
    init_tracing();

    let rpc = MemoryScheduler::new();
    rpc.seed_task(TaskBuilder::new("/bin/a").id(1).build());
    rpc.stall_status_queries_for(1);

    let mut store = TaskStore::new(Arc::new(rpc.clone()));
    store.fetch().await;

    let handle = StatusReconciler::spawn(Arc::new(rpc), store.subscribe());
    let late_rx = handle.subscribe();

    // Give the first tick time to start and stall on the status query.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(handle.snapshot(), StatusSnapshot::default());

    // Stop must return promptly even though a query hangs forever, and the
    // stalled tick must never publish.
    timeout(Duration::from_secs(1), handle.stop()).await?;
    assert_eq!(*late_rx.borrow(), StatusSnapshot::default());

    Ok(())
}
