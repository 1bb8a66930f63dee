// src/actions.rs

//! Action gateway: the discrete, user-initiated commands.
//!
//! Unlike the store and the reconciler, which absorb failures into their own
//! state, every gateway call propagates failure to its caller with a
//! human-readable operation context. A failed action leaves local state at
//! its pre-call value; there are no retries and no implicit refetch on
//! success; the caller decides when to resynchronize.

use std::sync::Arc;

use crate::errors::{Result, TaskhelmError};
use crate::model::Task;
use crate::rpc::SchedulerRpc;

#[derive(Clone)]
pub struct ActionGateway {
    rpc: Arc<dyn SchedulerRpc>,
}

impl ActionGateway {
    pub fn new(rpc: Arc<dyn SchedulerRpc>) -> Self {
        Self { rpc }
    }

    /// Create (`id` absent) or update (`id` present) a task.
    pub async fn save(&self, task: Task) -> Result<()> {
        self.rpc
            .save_task(task)
            .await
            .map_err(|e| TaskhelmError::transport("failed to save task", e))
    }

    pub async fn remove(&self, id: i64) -> Result<()> {
        self.rpc
            .remove_task(id)
            .await
            .map_err(|e| TaskhelmError::transport("failed to remove task", e))
    }

    /// Enable or disable a task. Authoritative and idempotent; re-setting the
    /// current value is a harmless no-op.
    pub async fn switch(&self, id: i64, enabled: bool) -> Result<()> {
        self.rpc
            .switch_task(id, enabled)
            .await
            .map_err(|e| TaskhelmError::transport("failed to switch task", e))
    }

    /// Ask the executor to run the task once, immediately. A rejection (e.g.
    /// the program is not runnable) comes back as an error.
    pub async fn run(&self, id: i64) -> Result<()> {
        self.rpc
            .manually_run_task(id)
            .await
            .map_err(|e| TaskhelmError::transport("failed to run task", e))
    }

    pub async fn stop(&self, id: i64) -> Result<()> {
        self.rpc
            .stop_task(id)
            .await
            .map_err(|e| TaskhelmError::transport("failed to stop task", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Task;
    use crate::rpc::{MemoryScheduler, SchedulerRpc};

    #[tokio::test]
    async fn run_failure_carries_operation_context() {
        let rpc = MemoryScheduler::new();
        let id = rpc.seed_task(Task {
            name: "t".into(),
            program: "/bin/gone".into(),
            ..Task::draft()
        });
        rpc.set_runnable("/bin/gone", false);

        let gateway = ActionGateway::new(Arc::new(rpc));
        let err = gateway.run(id).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("failed to run task:"), "got: {msg}");
    }

    #[tokio::test]
    async fn switch_is_idempotent() {
        let rpc = MemoryScheduler::new();
        let id = rpc.seed_task(Task {
            name: "t".into(),
            program: "/bin/true".into(),
            ..Task::draft()
        });

        let gateway = ActionGateway::new(Arc::new(rpc.clone()));
        gateway.switch(id, true).await.unwrap();
        gateway.switch(id, true).await.unwrap();
        assert!(rpc.get_task(id).await.unwrap().unwrap().enabled);
    }
}
