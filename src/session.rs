// src/session.rs

//! One running control-surface session.
//!
//! This wires together:
//! - the task store (authoritative list)
//! - the status reconciler (background loop + snapshot)
//! - the action gateway (discrete user commands)
//! - the list presenter (display rows, optimistic run, two-phase delete)
//!
//! and adds nothing of its own beyond the wiring. Hosts drive it from their
//! UI loop; tests drive it end-to-end against an in-memory scheduler.

use std::sync::Arc;

use crate::actions::ActionGateway;
use crate::editor::TaskEditor;
use crate::errors::{Result, TaskhelmError};
use crate::model::{AppConfig, Task};
use crate::present::{TaskListPresenter, TaskRow};
use crate::reconcile::{ReconcilerHandle, StatusReconciler, StatusSnapshot};
use crate::rpc::SchedulerRpc;
use crate::store::TaskStore;

pub struct ControlSession {
    rpc: Arc<dyn SchedulerRpc>,
    store: TaskStore,
    gateway: ActionGateway,
    reconciler: ReconcilerHandle,
    presenter: TaskListPresenter,
}

impl ControlSession {
    /// Fetch the initial list and start the reconciliation loop.
    pub async fn start(rpc: Arc<dyn SchedulerRpc>) -> Self {
        let mut store = TaskStore::new(Arc::clone(&rpc));
        store.fetch().await;
        let reconciler = StatusReconciler::spawn(Arc::clone(&rpc), store.subscribe());
        let gateway = ActionGateway::new(Arc::clone(&rpc));
        Self {
            rpc,
            store,
            gateway,
            reconciler,
            presenter: TaskListPresenter::new(),
        }
    }

    // Viewing.

    /// Current display rows: tasks merged with the latest status snapshot.
    pub fn rows(&mut self) -> Vec<TaskRow> {
        let tasks = self.store.tasks();
        let snapshot = self.reconciler.snapshot();
        self.presenter.rows(&tasks, &snapshot)
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.store.tasks()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.reconciler.snapshot()
    }

    pub fn loading(&self) -> bool {
        self.store.loading()
    }

    pub fn list_error(&self) -> Option<&str> {
        self.store.error()
    }

    /// User-initiated refresh of the list.
    pub async fn refresh(&mut self) {
        self.store.fetch().await;
    }

    // Editing.

    /// Open an edit session on a snapshot of one stored task.
    pub fn editor_for(&self, id: i64) -> Option<TaskEditor> {
        self.store.get(id).map(|task| TaskEditor::edit(&task))
    }

    /// Open an edit session on a blank draft.
    pub fn editor_for_new(&self) -> TaskEditor {
        TaskEditor::blank()
    }

    /// Validate, save, and refetch. Validation failures reject locally with
    /// zero backend calls; save failures propagate and leave the list as it
    /// was.
    pub async fn commit(&mut self, editor: &TaskEditor) -> Result<()> {
        let task = editor.finish()?;
        self.gateway.save(task).await?;
        self.store.fetch().await;
        Ok(())
    }

    /// Fill the editor's program field from the native file picker. A
    /// cancelled picker leaves the field untouched. The picked path runs
    /// through the same name auto-derivation as a typed one.
    pub async fn browse_program(&self, editor: &mut TaskEditor) -> Result<()> {
        let picked = self
            .rpc
            .pick_file()
            .await
            .map_err(|e| TaskhelmError::transport("failed to open file picker", e))?;
        if let Some(path) = picked {
            editor.set_program(path);
        }
        Ok(())
    }

    /// Fill the editor's working-directory field from the native directory
    /// picker. A cancelled picker leaves the field untouched.
    pub async fn browse_working_dir(&self, editor: &mut TaskEditor) -> Result<()> {
        let picked = self
            .rpc
            .pick_dir()
            .await
            .map_err(|e| TaskhelmError::transport("failed to open directory picker", e))?;
        if let Some(dir) = picked {
            editor.set_working_dir(dir);
        }
        Ok(())
    }

    // Task actions.

    /// Switch a task on or off. On success the local copy is updated in
    /// place; on failure it keeps its pre-call value.
    pub async fn toggle_enabled(&mut self, id: i64, enabled: bool) -> Result<()> {
        self.gateway.switch(id, enabled).await?;
        self.store.mark_enabled(id, enabled);
        Ok(())
    }

    pub async fn run(&mut self, id: i64) -> Result<()> {
        self.presenter.run_task(&self.gateway, id).await
    }

    pub async fn stop(&self, id: i64) -> Result<()> {
        self.gateway.stop(id).await
    }

    pub fn stage_delete(&mut self, id: i64) {
        self.presenter.stage_delete(id);
    }

    pub fn staged_delete(&self) -> Option<i64> {
        self.presenter.staged_delete()
    }

    pub fn cancel_delete(&mut self) {
        self.presenter.cancel_delete();
    }

    /// Fire the staged removal and refetch on success.
    pub async fn confirm_delete(&mut self) -> Result<()> {
        if self.presenter.confirm_delete(&self.gateway).await?.is_some() {
            self.store.fetch().await;
        }
        Ok(())
    }

    // Scheduler configuration.

    pub async fn load_config(&self) -> Result<AppConfig> {
        self.rpc
            .get_config()
            .await
            .map_err(|e| TaskhelmError::transport("failed to load config", e))
    }

    pub async fn save_config(&self, config: AppConfig) -> Result<()> {
        self.rpc
            .update_config(config)
            .await
            .map_err(|e| TaskhelmError::transport("failed to save config", e))
    }

    // Teardown.

    /// Stop the reconciler deterministically. Requests still in flight
    /// resolve into the void.
    pub async fn shutdown(self) {
        self.reconciler.stop().await;
    }

    /// Stop the reconciler, then ask the scheduler service to exit.
    pub async fn quit(self) -> Result<()> {
        let rpc = Arc::clone(&self.rpc);
        self.reconciler.stop().await;
        rpc.exit()
            .await
            .map_err(|e| TaskhelmError::transport("failed to exit", e))?;
        Ok(())
    }
}
