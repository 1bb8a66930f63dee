// src/lib.rs

//! Client-side control surface for a scheduled-task runner.
//!
//! The scheduler service itself, the thing that spawns programs and
//! evaluates triggers, lives out of process behind the [`rpc::SchedulerRpc`]
//! trait. This crate owns the client half:
//!
//! - the task/trigger data model ([`model`])
//! - the authoritative local task list ([`store`])
//! - a periodic status reconciliation loop ([`reconcile`])
//! - the task edit session and its state machines ([`editor`])
//! - list presentation with optimistic run state and two-phase delete
//!   ([`present`])
//! - discrete user actions ([`actions`]) and the wiring that ties it all
//!   together ([`session`])

pub mod actions;
pub mod editor;
pub mod errors;
pub mod logging;
pub mod model;
pub mod present;
pub mod reconcile;
pub mod rpc;
pub mod session;
pub mod store;

pub use actions::ActionGateway;
pub use editor::{EnvPair, NameMode, TaskEditor};
pub use errors::{Result, TaskhelmError};
pub use model::{AppConfig, Task, TaskStatus, Trigger, TriggerKind};
pub use present::{TaskListPresenter, TaskRow};
pub use reconcile::{ReconcilerHandle, StatusReconciler, StatusSnapshot};
pub use rpc::{MemoryScheduler, RpcError, RpcResult, SchedulerRpc};
pub use session::ControlSession;
pub use store::TaskStore;
