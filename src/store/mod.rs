// src/store/mod.rs

//! Authoritative local task list.
//!
//! The store owns the only shared copy of the task list. It is fed by
//! `fetch()` (a wholesale replace from the scheduler) and publishes the list
//! over a `watch` channel so the status reconciler can react to changes
//! without polling the store.
//!
//! Failure policy: a failed fetch is absorbed, never raised. The previous
//! list stays in place and the error message is parked in a sticky slot until
//! the next successful fetch clears it. Background refreshes must never blank
//! an already-populated view.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use crate::model::Task;
use crate::rpc::SchedulerRpc;

pub struct TaskStore {
    rpc: Arc<dyn SchedulerRpc>,
    tasks_tx: watch::Sender<Vec<Task>>,
    loading: bool,
    error: Option<String>,
}

impl TaskStore {
    pub fn new(rpc: Arc<dyn SchedulerRpc>) -> Self {
        let (tasks_tx, _) = watch::channel(Vec::new());
        Self {
            rpc,
            tasks_tx,
            loading: true,
            error: None,
        }
    }

    /// Replace the entire list from the scheduler.
    ///
    /// On failure the previous list is preserved and the error recorded; the
    /// call itself never fails. The `loading` flag covers only the window up
    /// to the first completed fetch, so background refetches don't blank the
    /// view.
    pub async fn fetch(&mut self) {
        match self.rpc.list_tasks().await {
            Ok(tasks) => {
                self.error = None;
                self.tasks_tx.send_replace(tasks);
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch task list; keeping previous");
                self.error = Some(e.to_string());
            }
        }
        self.loading = false;
    }

    /// Current list, by value. The store remains the only writer.
    pub fn tasks(&self) -> Vec<Task> {
        self.tasks_tx.borrow().clone()
    }

    pub fn get(&self, id: i64) -> Option<Task> {
        self.tasks_tx
            .borrow()
            .iter()
            .find(|t| t.id == Some(id))
            .cloned()
    }

    /// Subscribe to list replacements (used by the status reconciler).
    pub fn subscribe(&self) -> watch::Receiver<Vec<Task>> {
        self.tasks_tx.subscribe()
    }

    /// Apply the authoritative result of an enable/disable switch to the
    /// local copy, so the view reflects it without a fetch round-trip.
    pub fn mark_enabled(&mut self, id: i64, enabled: bool) {
        self.tasks_tx.send_modify(|tasks| {
            if let Some(task) = tasks.iter_mut().find(|t| t.id == Some(id)) {
                task.enabled = enabled;
            }
        });
    }

    /// True only until the initial fetch completes.
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Sticky error from the most recent failed fetch, if the failure has not
    /// been superseded by a successful one.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
