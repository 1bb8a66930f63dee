// src/model/mod.rs

//! Wire-level data model shared with the scheduler service.
//!
//! Everything here is plain serde data: the scheduler owns persistence and
//! execution, this crate only edits and displays these values. `Trigger` uses
//! the adjacently-tagged representation so the serialized shape is
//! `{"tag": "...", "content": ...}` with `content` omitted for payload-free
//! variants.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Trigger policy. Whatever the mode, a task whose program is already running
/// is not triggered again.
#[derive(Deserialize, Serialize, Default, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "tag", content = "content")]
pub enum Trigger {
    /// Fire once every interval, in milliseconds.
    Routine(u64),
    /// Fire once at a fixed local datetime.
    Instant(String),
    /// Fire when the scheduler service starts.
    Startup,
    /// Restart the process whenever it exits.
    KeepAlive,
    /// Only fired explicitly by the user.
    #[default]
    Manual,
    /// Re-fire until the process exits with success.
    UntilSucceed,
}

impl Trigger {
    pub fn kind(&self) -> TriggerKind {
        match self {
            Trigger::Routine(_) => TriggerKind::Routine,
            Trigger::Instant(_) => TriggerKind::Instant,
            Trigger::Startup => TriggerKind::Startup,
            Trigger::KeepAlive => TriggerKind::KeepAlive,
            Trigger::Manual => TriggerKind::Manual,
            Trigger::UntilSucceed => TriggerKind::UntilSucceed,
        }
    }
}

/// The tag of a [`Trigger`], without its payload. This is what the editor's
/// trigger-type selector switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    Routine,
    Instant,
    Startup,
    KeepAlive,
    Manual,
    UntilSucceed,
}

/// A scheduled task as the scheduler service knows it.
///
/// `id` is assigned by the service; `None` marks an unsaved draft. The
/// ephemeral facts (is it running right now, is the program runnable) are
/// *not* part of this type, they are re-queried every reconciliation tick.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Task {
    pub id: Option<i64>,
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub working_dir: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,
    #[serde(default)]
    pub stdin: Option<String>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    pub trigger: Trigger,
    pub enabled: bool,
    #[serde(default)]
    pub no_console: bool,
    #[serde(default)]
    pub last_exit_code: Option<i64>,
    #[serde(default)]
    pub last_run_at: Option<String>,
}

impl Task {
    /// An empty draft with the defaults a fresh edit session starts from.
    pub fn draft() -> Self {
        Task {
            id: None,
            name: String::new(),
            program: String::new(),
            working_dir: None,
            args: Vec::new(),
            env_vars: BTreeMap::new(),
            stdin: None,
            stdout: None,
            stderr: None,
            trigger: Trigger::Manual,
            enabled: true,
            no_console: false,
            last_exit_code: None,
            last_run_at: None,
        }
    }
}

/// Execution state of a task as reported by the scheduler.
///
/// This tri-state form supersedes the older boolean `is_task_running` query;
/// "running" in the boolean sense is exactly `TaskStatus::Running`.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    /// Disabled; the scheduler will not fire its trigger.
    Suspended,
    Running,
    Idle,
}

/// Application-level scheduler configuration.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Start the scheduler service in the background, without raising a
    /// window.
    #[serde(default)]
    pub quiet_launch: bool,
}
