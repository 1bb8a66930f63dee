#![allow(dead_code)]

use taskhelm::model::{Task, Trigger};

/// Builder for `Task` to simplify test setup.
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(program: &str) -> Self {
        let mut task = Task::draft();
        task.program = program.to_string();
        task.name = taskhelm::editor::program_basename(program);
        Self { task }
    }

    pub fn id(mut self, id: i64) -> Self {
        self.task.id = Some(id);
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.task.name = name.to_string();
        self
    }

    pub fn working_dir(mut self, dir: &str) -> Self {
        self.task.working_dir = Some(dir.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.task.args.push(arg.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.task.env_vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.task.trigger = trigger;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.task.enabled = false;
        self
    }

    pub fn last_exit_code(mut self, code: i64) -> Self {
        self.task.last_exit_code = Some(code);
        self
    }

    pub fn last_run_at(mut self, at: &str) -> Self {
        self.task.last_run_at = Some(at.to_string());
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}
