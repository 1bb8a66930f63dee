// src/rpc/mod.rs

//! Abstract asynchronous RPC surface to the scheduler service.
//!
//! The control surface never talks to the scheduler directly; everything goes
//! through [`SchedulerRpc`]. This keeps the transport pluggable: production
//! hosts wire in their IPC of choice, tests use the in-memory implementation
//! in [`memory`] (optionally wrapped by the call-recording backend from
//! `test-utils`).
//!
//! Every call may fail with a generic, message-carrying [`RpcError`]. There
//! are no client-side timeouts and no automatic retries; recovery is always a
//! user-initiated repeat of the same action.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{AppConfig, Task, TaskStatus};

pub mod memory;

pub use memory::MemoryScheduler;

/// Generic failure of a single scheduler call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RpcError {
    message: String,
}

impl RpcError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type RpcResult<T> = std::result::Result<T, RpcError>;

/// The scheduler service, as seen from the client side.
///
/// Semantics the implementations must honour:
///
/// - `save_task` creates when `task.id` is absent and updates otherwise; it
///   does **not** imply any refresh of previously listed data.
/// - `switch_task` is authoritative and idempotent; re-setting the current
///   value is a harmless no-op.
/// - `manually_run_task` asks the executor to run once immediately; a
///   rejection (e.g. the program is not runnable) is an `Err`, never silently
///   swallowed.
/// - `task_status` is the canonical status query. The historical boolean
///   "is running" form is superseded by it: a task is running exactly when
///   the status is [`TaskStatus::Running`].
/// - `pick_file` / `pick_dir` resolve to `None` when the user cancels the
///   native picker.
#[async_trait]
pub trait SchedulerRpc: Send + Sync {
    async fn list_tasks(&self) -> RpcResult<Vec<Task>>;
    async fn get_task(&self, id: i64) -> RpcResult<Option<Task>>;
    async fn save_task(&self, task: Task) -> RpcResult<()>;
    async fn remove_task(&self, id: i64) -> RpcResult<()>;
    async fn switch_task(&self, id: i64, enable: bool) -> RpcResult<()>;
    async fn manually_run_task(&self, id: i64) -> RpcResult<()>;
    async fn task_status(&self, id: i64) -> RpcResult<TaskStatus>;
    async fn stop_task(&self, id: i64) -> RpcResult<()>;
    async fn is_program_runnable(&self, path: &str) -> RpcResult<bool>;
    async fn pick_file(&self) -> RpcResult<Option<String>>;
    async fn pick_dir(&self) -> RpcResult<Option<String>>;
    async fn get_config(&self) -> RpcResult<AppConfig>;
    async fn update_config(&self, config: AppConfig) -> RpcResult<()>;
    async fn exit(&self) -> RpcResult<()>;
}
