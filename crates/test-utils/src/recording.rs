use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use taskhelm::model::{AppConfig, Task, TaskStatus};
use taskhelm::rpc::{MemoryScheduler, RpcResult, SchedulerRpc};

/// One observed scheduler call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListTasks,
    GetTask(i64),
    SaveTask { id: Option<i64>, name: String },
    RemoveTask(i64),
    SwitchTask { id: i64, enable: bool },
    ManuallyRunTask(i64),
    TaskStatus(i64),
    StopTask(i64),
    IsProgramRunnable(String),
    PickFile,
    PickDir,
    GetConfig,
    UpdateConfig,
    Exit,
}

/// A scheduler backend that:
/// - records every call it sees
/// - delegates behaviour to an inner [`MemoryScheduler`]
///
/// Use [`inner`](Self::inner) to seed tasks or inject failures, and
/// [`calls`](Self::calls) to assert on what the control surface actually
/// asked the backend to do.
#[derive(Clone, Default)]
pub struct RecordingScheduler {
    inner: MemoryScheduler,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryScheduler {
        &self.inner
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Number of recorded calls matching the predicate.
    pub fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SchedulerRpc for RecordingScheduler {
    async fn list_tasks(&self) -> RpcResult<Vec<Task>> {
        self.record(Call::ListTasks);
        self.inner.list_tasks().await
    }

    async fn get_task(&self, id: i64) -> RpcResult<Option<Task>> {
        self.record(Call::GetTask(id));
        self.inner.get_task(id).await
    }

    async fn save_task(&self, task: Task) -> RpcResult<()> {
        self.record(Call::SaveTask {
            id: task.id,
            name: task.name.clone(),
        });
        self.inner.save_task(task).await
    }

    async fn remove_task(&self, id: i64) -> RpcResult<()> {
        self.record(Call::RemoveTask(id));
        self.inner.remove_task(id).await
    }

    async fn switch_task(&self, id: i64, enable: bool) -> RpcResult<()> {
        self.record(Call::SwitchTask { id, enable });
        self.inner.switch_task(id, enable).await
    }

    async fn manually_run_task(&self, id: i64) -> RpcResult<()> {
        self.record(Call::ManuallyRunTask(id));
        self.inner.manually_run_task(id).await
    }

    async fn task_status(&self, id: i64) -> RpcResult<TaskStatus> {
        self.record(Call::TaskStatus(id));
        self.inner.task_status(id).await
    }

    async fn stop_task(&self, id: i64) -> RpcResult<()> {
        self.record(Call::StopTask(id));
        self.inner.stop_task(id).await
    }

    async fn is_program_runnable(&self, path: &str) -> RpcResult<bool> {
        self.record(Call::IsProgramRunnable(path.to_string()));
        self.inner.is_program_runnable(path).await
    }

    async fn pick_file(&self) -> RpcResult<Option<String>> {
        self.record(Call::PickFile);
        self.inner.pick_file().await
    }

    async fn pick_dir(&self) -> RpcResult<Option<String>> {
        self.record(Call::PickDir);
        self.inner.pick_dir().await
    }

    async fn get_config(&self) -> RpcResult<AppConfig> {
        self.record(Call::GetConfig);
        self.inner.get_config().await
    }

    async fn update_config(&self, config: AppConfig) -> RpcResult<()> {
        self.record(Call::UpdateConfig);
        self.inner.update_config(config).await
    }

    async fn exit(&self) -> RpcResult<()> {
        self.record(Call::Exit);
        self.inner.exit().await
    }
}
