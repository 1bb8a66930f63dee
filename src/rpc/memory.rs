// src/rpc/memory.rs

//! In-memory scheduler backend.
//!
//! Close enough to the real service's observable semantics to drive the
//! control surface in unit tests, or to embed it without a live scheduler.
//! Shared-state handle: clones see the same task table.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::model::{AppConfig, Task, TaskStatus};
use crate::rpc::{RpcError, RpcResult, SchedulerRpc};

#[derive(Debug, Default)]
struct State {
    tasks: Vec<Task>,
    next_id: i64,
    statuses: HashMap<i64, TaskStatus>,
    runnable: HashMap<String, bool>,
    picked_file: Option<String>,
    picked_dir: Option<String>,
    config: AppConfig,
    exit_requested: bool,
    offline: bool,
    failing_status_ids: HashSet<i64>,
    failing_runnable_paths: HashSet<String>,
    stalling_status_ids: HashSet<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryScheduler {
    state: Arc<Mutex<State>>,
}

impl MemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a task directly, bypassing `save_task` semantics. Returns the
    /// assigned id.
    pub fn seed_task(&self, mut task: Task) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = match task.id {
            Some(id) => id,
            None => {
                state.next_id += 1;
                state.next_id
            }
        };
        state.next_id = state.next_id.max(id);
        task.id = Some(id);
        state.tasks.push(task);
        id
    }

    pub fn set_status(&self, id: i64, status: TaskStatus) {
        self.state.lock().unwrap().statuses.insert(id, status);
    }

    /// Mark a program path as runnable or not. Unknown paths count as
    /// runnable.
    pub fn set_runnable(&self, path: impl Into<String>, runnable: bool) {
        self.state.lock().unwrap().runnable.insert(path.into(), runnable);
    }

    /// Preset what the native file picker will return.
    pub fn set_picked_file(&self, path: Option<String>) {
        self.state.lock().unwrap().picked_file = path;
    }

    /// Preset what the native directory picker will return.
    pub fn set_picked_dir(&self, path: Option<String>) {
        self.state.lock().unwrap().picked_dir = path;
    }

    pub fn exit_requested(&self) -> bool {
        self.state.lock().unwrap().exit_requested
    }

    /// While offline, every call fails with "scheduler unreachable".
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    /// Make `task_status` fail for one task id, leaving other queries intact.
    pub fn fail_status_queries_for(&self, id: i64) {
        self.state.lock().unwrap().failing_status_ids.insert(id);
    }

    /// Make `task_status` hang forever for one task id. Models a stalled
    /// backend query; there are no client-side timeouts to paper over it.
    pub fn stall_status_queries_for(&self, id: i64) {
        self.state.lock().unwrap().stalling_status_ids.insert(id);
    }

    /// Make `is_program_runnable` fail for one path, leaving other queries
    /// intact.
    pub fn fail_runnable_queries_for(&self, path: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .failing_runnable_paths
            .insert(path.into());
    }

    fn check_online(state: &State) -> RpcResult<()> {
        if state.offline {
            return Err(RpcError::new("scheduler unreachable"));
        }
        Ok(())
    }
}

fn no_such_task(id: i64) -> RpcError {
    RpcError::new(format!("no task with id {id}"))
}

#[async_trait]
impl SchedulerRpc for MemoryScheduler {
    async fn list_tasks(&self) -> RpcResult<Vec<Task>> {
        let state = self.state.lock().unwrap();
        Self::check_online(&state)?;
        Ok(state.tasks.clone())
    }

    async fn get_task(&self, id: i64) -> RpcResult<Option<Task>> {
        let state = self.state.lock().unwrap();
        Self::check_online(&state)?;
        Ok(state.tasks.iter().find(|t| t.id == Some(id)).cloned())
    }

    async fn save_task(&self, mut task: Task) -> RpcResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_online(&state)?;
        match task.id {
            Some(id) => {
                let Some(existing) = state.tasks.iter_mut().find(|t| t.id == Some(id)) else {
                    return Err(no_such_task(id));
                };
                // The service owns these; they are not writable via save.
                task.enabled = existing.enabled;
                task.last_exit_code = existing.last_exit_code;
                task.last_run_at = existing.last_run_at.clone();
                *existing = task;
            }
            None => {
                state.next_id += 1;
                task.id = Some(state.next_id);
                task.last_exit_code = None;
                task.last_run_at = None;
                state.tasks.push(task);
            }
        }
        Ok(())
    }

    async fn remove_task(&self, id: i64) -> RpcResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_online(&state)?;
        state.tasks.retain(|t| t.id != Some(id));
        state.statuses.remove(&id);
        Ok(())
    }

    async fn switch_task(&self, id: i64, enable: bool) -> RpcResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_online(&state)?;
        let Some(task) = state.tasks.iter_mut().find(|t| t.id == Some(id)) else {
            return Err(no_such_task(id));
        };
        task.enabled = enable;
        Ok(())
    }

    async fn manually_run_task(&self, id: i64) -> RpcResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_online(&state)?;
        let Some(task) = state.tasks.iter().find(|t| t.id == Some(id)) else {
            return Err(no_such_task(id));
        };
        if !state.runnable.get(&task.program).copied().unwrap_or(true) {
            return Err(RpcError::new(format!(
                "program is not runnable: {}",
                task.program
            )));
        }
        state.statuses.insert(id, TaskStatus::Running);
        Ok(())
    }

    async fn task_status(&self, id: i64) -> RpcResult<TaskStatus> {
        let stalled = {
            let state = self.state.lock().unwrap();
            Self::check_online(&state)?;
            state.stalling_status_ids.contains(&id)
        };
        if stalled {
            std::future::pending::<()>().await;
        }
        let state = self.state.lock().unwrap();
        if state.failing_status_ids.contains(&id) {
            return Err(RpcError::new(format!("status query failed for task {id}")));
        }
        let Some(task) = state.tasks.iter().find(|t| t.id == Some(id)) else {
            return Err(no_such_task(id));
        };
        if let Some(status) = state.statuses.get(&id) {
            return Ok(*status);
        }
        Ok(if task.enabled {
            TaskStatus::Idle
        } else {
            TaskStatus::Suspended
        })
    }

    async fn stop_task(&self, id: i64) -> RpcResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_online(&state)?;
        if !state.tasks.iter().any(|t| t.id == Some(id)) {
            return Err(no_such_task(id));
        }
        state.statuses.insert(id, TaskStatus::Idle);
        Ok(())
    }

    async fn is_program_runnable(&self, path: &str) -> RpcResult<bool> {
        let state = self.state.lock().unwrap();
        Self::check_online(&state)?;
        if state.failing_runnable_paths.contains(path) {
            return Err(RpcError::new(format!("runnability query failed for {path}")));
        }
        Ok(state.runnable.get(path).copied().unwrap_or(true))
    }

    async fn pick_file(&self) -> RpcResult<Option<String>> {
        let state = self.state.lock().unwrap();
        Self::check_online(&state)?;
        Ok(state.picked_file.clone())
    }

    async fn pick_dir(&self) -> RpcResult<Option<String>> {
        let state = self.state.lock().unwrap();
        Self::check_online(&state)?;
        Ok(state.picked_dir.clone())
    }

    async fn get_config(&self) -> RpcResult<AppConfig> {
        let state = self.state.lock().unwrap();
        Self::check_online(&state)?;
        Ok(state.config.clone())
    }

    async fn update_config(&self, config: AppConfig) -> RpcResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_online(&state)?;
        state.config = config;
        Ok(())
    }

    async fn exit(&self) -> RpcResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_online(&state)?;
        state.exit_requested = true;
        Ok(())
    }
}
