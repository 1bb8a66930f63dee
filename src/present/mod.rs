// src/present/mod.rs

//! List presentation: turns the store's tasks plus the reconciler's snapshot
//! into display rows.
//!
//! Two pieces of transient state live here, deliberately outside the shared
//! list:
//!
//! - an **optimistic run set**: a manually started task is shown as running
//!   immediately, for up to one second, to mask the poll latency until the
//!   reconciler confirms it. Kept as per-id deadlines and combined with the
//!   authoritative snapshot by a pure read-time function; no timer callback
//!   ever mutates shared state. A failed run request clears its entry at
//!   once.
//! - a **staged delete**: delete is two-phase. Staging remembers the target
//!   id and issues no call; only an explicit confirmation fires the one
//!   destructive call, and cancelling forgets the id with no side effect.

use std::collections::HashMap;

use tokio::time::{Duration, Instant};

use crate::actions::ActionGateway;
use crate::errors::Result;
use crate::model::{Task, Trigger};
use crate::reconcile::StatusSnapshot;

/// How long a manual run keeps its optimistic "running" mark without
/// confirmation from the reconciler.
pub const OPTIMISTIC_RUN_WINDOW: Duration = Duration::from_millis(1000);

/// One task, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub id: Option<i64>,
    pub name: String,
    pub program: String,
    pub trigger_label: String,
    pub enabled: bool,
    pub running: bool,
    pub runnable: bool,
    /// Whether the manual-run control is available: enabled and not already
    /// displayed as running.
    pub run_allowed: bool,
    pub last_exit_code: Option<i64>,
    pub last_run: String,
}

#[derive(Default)]
pub struct TaskListPresenter {
    optimistic_runs: HashMap<i64, Instant>,
    staged_delete: Option<i64>,
}

impl TaskListPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build display rows for the current list and snapshot. Expired
    /// optimistic entries are pruned as a side effect.
    pub fn rows(&mut self, tasks: &[Task], snapshot: &StatusSnapshot) -> Vec<TaskRow> {
        let now = Instant::now();
        self.optimistic_runs.retain(|_, deadline| *deadline > now);

        tasks
            .iter()
            .map(|task| {
                let running = task
                    .id
                    .is_some_and(|id| self.displayed_running(id, snapshot, now));
                let runnable = task.id.map(|id| snapshot.runnable(id)).unwrap_or(true);
                TaskRow {
                    id: task.id,
                    name: task.name.clone(),
                    program: task.program.clone(),
                    trigger_label: trigger_label(&task.trigger),
                    enabled: task.enabled,
                    running,
                    runnable,
                    run_allowed: task.id.is_some() && task.enabled && !running,
                    last_exit_code: task.last_exit_code,
                    last_run: format_last_run(task.last_run_at.as_deref()),
                }
            })
            .collect()
    }

    /// Displayed "running" is the OR of the authoritative snapshot and the
    /// not-yet-expired optimistic set.
    fn displayed_running(&self, id: i64, snapshot: &StatusSnapshot, now: Instant) -> bool {
        snapshot.running(id)
            || self
                .optimistic_runs
                .get(&id)
                .is_some_and(|deadline| *deadline > now)
    }

    /// Request a manual run, marking the task optimistically running first.
    /// On rejection the mark is cleared immediately and the error propagates.
    pub async fn run_task(&mut self, gateway: &ActionGateway, id: i64) -> Result<()> {
        self.optimistic_runs
            .insert(id, Instant::now() + OPTIMISTIC_RUN_WINDOW);
        match gateway.run(id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.optimistic_runs.remove(&id);
                Err(e)
            }
        }
    }

    // Two-phase delete.

    pub fn stage_delete(&mut self, id: i64) {
        self.staged_delete = Some(id);
    }

    pub fn staged_delete(&self) -> Option<i64> {
        self.staged_delete
    }

    pub fn cancel_delete(&mut self) {
        self.staged_delete = None;
    }

    /// Fire the staged removal, if any. Returns the removed id so the caller
    /// can refetch. The stage is cleared whether or not the call succeeds.
    pub async fn confirm_delete(&mut self, gateway: &ActionGateway) -> Result<Option<i64>> {
        let Some(id) = self.staged_delete.take() else {
            return Ok(None);
        };
        gateway.remove(id).await?;
        Ok(Some(id))
    }
}

/// Human label for a trigger, exhaustively over the union.
pub fn trigger_label(trigger: &Trigger) -> String {
    match trigger {
        Trigger::Routine(ms) => format!("every {:.1}s", *ms as f64 / 1000.0),
        Trigger::Instant(at) => format!("once at {}", format_instant(at)),
        Trigger::Startup => "at startup".to_string(),
        Trigger::KeepAlive => "keep alive".to_string(),
        Trigger::Manual => "manual".to_string(),
        Trigger::UntilSucceed => "until succeed".to_string(),
    }
}

/// Render an Instant trigger's datetime for display; unparseable input is
/// shown as entered.
fn format_instant(at: &str) -> String {
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(at, "%Y-%m-%dT%H:%M") {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(at, "%Y-%m-%dT%H:%M:%S") {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(at) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    at.to_string()
}

/// Last-run timestamp for display: `MMM dd, HH:mm:ss`, or `-` when absent or
/// unparseable.
pub fn format_last_run(timestamp: Option<&str>) -> String {
    let Some(ts) = timestamp else {
        return "-".to_string();
    };
    match chrono::DateTime::parse_from_rfc3339(ts) {
        Ok(dt) => dt.format("%b %d, %H:%M:%S").to_string(),
        Err(_) => "-".to_string(),
    }
}
