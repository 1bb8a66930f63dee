// src/reconcile/mod.rs

//! Periodic status reconciliation.
//!
//! A single owned background task keeps two derived mappings fresh for the
//! current task list: `task id → running` and `task id → runnable`. Ticks
//! fire on a fixed cadence and once immediately whenever the list changes.
//!
//! Within a tick, the per-task queries run concurrently and independently; a
//! failed query defaults that one task's value to `false` and never aborts
//! the rest of the tick. The tick's result is published as a wholesale
//! snapshot replacement, never merged with the previous tick, so a task
//! that left the list cannot leak a stale entry.
//!
//! Teardown is deterministic: [`ReconcilerHandle::stop`] cancels the loop's
//! token and awaits it. A tick racing with cancellation is discarded
//! unpublished; late query results never touch torn-down state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::model::{Task, TaskStatus};
use crate::rpc::SchedulerRpc;

/// Cadence of the reconciliation loop.
pub const RECONCILE_INTERVAL: Duration = Duration::from_millis(2000);

/// One tick's worth of derived per-task state. Replaced wholesale at every
/// tick; never partially updated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    running: HashMap<i64, bool>,
    runnable: HashMap<i64, bool>,
}

impl StatusSnapshot {
    /// Whether the reconciler saw this task running on its last tick.
    /// Unknown ids report `false`.
    pub fn running(&self, id: i64) -> bool {
        self.running.get(&id).copied().unwrap_or(false)
    }

    /// Whether the task's program resolved to something runnable. Only a
    /// definite `false` marks a task; ids the reconciler has not (yet) probed
    /// count as runnable.
    pub fn runnable(&self, id: i64) -> bool {
        self.runnable.get(&id).copied().unwrap_or(true)
    }

    /// Ids present in this snapshot (for staleness assertions in tests).
    pub fn probed_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.running.keys().copied()
    }
}

/// Handle to the running reconciler.
///
/// Dropping the handle without calling [`stop`](Self::stop) cancels the loop
/// as well (the token is owned), so the background task cannot outlive its
/// owner unnoticed.
pub struct ReconcilerHandle {
    snapshot_rx: watch::Receiver<StatusSnapshot>,
    cancel: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl ReconcilerHandle {
    /// The most recently published snapshot.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to snapshot publications (one `watch` send per tick).
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Stop the loop and wait for it to wind down. In-flight tick results are
    /// discarded, not published.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                warn!(error = %e, "reconciler task did not shut down cleanly");
            }
        }
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub struct StatusReconciler;

impl StatusReconciler {
    /// Spawn the reconciliation loop against the given backend, watching
    /// `list_rx` for task-list replacements.
    pub fn spawn(
        rpc: Arc<dyn SchedulerRpc>,
        list_rx: watch::Receiver<Vec<Task>>,
    ) -> ReconcilerHandle {
        let (snapshot_tx, snapshot_rx) = watch::channel(StatusSnapshot::default());
        let cancel = CancellationToken::new();
        let join = tokio::spawn(Self::run_loop(
            rpc,
            list_rx,
            snapshot_tx,
            cancel.clone(),
        ));
        ReconcilerHandle {
            snapshot_rx,
            cancel,
            join: Some(join),
        }
    }

    async fn run_loop(
        rpc: Arc<dyn SchedulerRpc>,
        mut list_rx: watch::Receiver<Vec<Task>>,
        snapshot_tx: watch::Sender<StatusSnapshot>,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(RECONCILE_INTERVAL);
        // A slow tick must not cause a burst of catch-up ticks.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
                changed = list_rx.changed() => {
                    // The store dropped its sender: nothing left to reconcile.
                    if changed.is_err() {
                        break;
                    }
                }
            }

            let tasks: Vec<Task> = list_rx.borrow_and_update().clone();

            let snapshot = tokio::select! {
                _ = cancel.cancelled() => break,
                snapshot = Self::collect_snapshot(&rpc, &tasks) => snapshot,
            };

            snapshot_tx.send_replace(snapshot);
        }

        debug!("status reconciler stopped");
    }

    /// Probe every listed task concurrently and assemble one snapshot.
    async fn collect_snapshot(rpc: &Arc<dyn SchedulerRpc>, tasks: &[Task]) -> StatusSnapshot {
        let mut probes = JoinSet::new();
        for task in tasks {
            let Some(id) = task.id else { continue };
            let rpc = Arc::clone(rpc);
            let program = task.program.clone();
            probes.spawn(async move { Self::probe_task(rpc, id, program).await });
        }

        let mut snapshot = StatusSnapshot::default();
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok((id, running, runnable)) => {
                    snapshot.running.insert(id, running);
                    snapshot.runnable.insert(id, runnable);
                }
                Err(e) => warn!(error = %e, "status probe panicked"),
            }
        }
        snapshot
    }

    /// Query one task's status and runnability. Each query failure defaults
    /// that value to `false`; isolation between tasks is the caller's
    /// concern, isolation between the two queries is handled here.
    async fn probe_task(rpc: Arc<dyn SchedulerRpc>, id: i64, program: String) -> (i64, bool, bool) {
        let running = match rpc.task_status(id).await {
            Ok(status) => status == TaskStatus::Running,
            Err(e) => {
                warn!(task_id = id, error = %e, "status query failed; assuming not running");
                false
            }
        };

        let runnable = if program.is_empty() {
            false
        } else {
            match rpc.is_program_runnable(&program).await {
                Ok(runnable) => runnable,
                Err(e) => {
                    warn!(task_id = id, error = %e, "runnability query failed; assuming not runnable");
                    false
                }
            }
        };

        (id, running, runnable)
    }
}
