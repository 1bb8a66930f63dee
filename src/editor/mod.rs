// src/editor/mod.rs

//! Private edit buffer for one task.
//!
//! An edit session reads one immutable snapshot of a task (or starts from a
//! blank draft) into its own buffer; the shared list is never touched until
//! the caller saves through the action gateway and refetches. Cancelling is
//! just dropping the editor.
//!
//! Two state machines live here:
//!
//! - **Naming.** `name` is either auto-derived from the program path's
//!   basename or user-entered. The flag follows provenance: an editor seeded
//!   from an existing task starts explicit even when the stored name is
//!   blank, a blank draft starts auto. Typing a non-empty name switches to
//!   explicit for the rest of the session; clearing the field back to blank
//!   re-enters auto.
//! - **Trigger switching.** Selecting a trigger type rewrites the draft's
//!   trigger from per-type sub-state cached for the session, so flipping
//!   between two types and back restores each type's last-entered payload
//!   instead of resetting to the default.
//!
//! Environment variables are edited as an ordered pair list, not a map, so
//! duplicate or blank keys can exist mid-edit; the list collapses to the
//! persisted mapping only in [`TaskEditor::finish`].

use std::collections::BTreeMap;

use crate::errors::{Result, TaskhelmError};
use crate::model::{Task, Trigger, TriggerKind};

/// Default interval offered the first time Routine is selected.
pub const DEFAULT_ROUTINE_INTERVAL_MS: u64 = 5000;

/// Whether the task name is derived from the program path or user-authored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMode {
    /// Every program-path edit re-derives the name from its basename.
    Auto,
    /// The name is the user's; program-path edits leave it alone.
    Explicit,
}

/// One row of the environment-variable editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvPair {
    pub key: String,
    pub value: String,
}

/// Session-local payloads for the payload-carrying trigger types. Survives
/// switching away from the type; dies with the editor.
#[derive(Debug, Clone)]
struct TriggerSubState {
    routine_interval_ms: u64,
    instant_at: String,
}

impl Default for TriggerSubState {
    fn default() -> Self {
        Self {
            routine_interval_ms: DEFAULT_ROUTINE_INTERVAL_MS,
            instant_at: String::new(),
        }
    }
}

pub struct TaskEditor {
    draft: Task,
    env_pairs: Vec<EnvPair>,
    name_mode: NameMode,
    sub_state: TriggerSubState,
}

impl TaskEditor {
    /// Start a fresh draft. Naming begins in auto mode.
    pub fn blank() -> Self {
        Self {
            draft: Task::draft(),
            env_pairs: Vec::new(),
            name_mode: NameMode::Auto,
            sub_state: TriggerSubState::default(),
        }
    }

    /// Start from a snapshot of an existing task. Naming begins in explicit
    /// mode: even a blank stored name is treated as user-authored and is
    /// never overwritten by a later program edit.
    pub fn edit(task: &Task) -> Self {
        let mut sub_state = TriggerSubState::default();
        match &task.trigger {
            Trigger::Routine(ms) => sub_state.routine_interval_ms = *ms,
            Trigger::Instant(at) => sub_state.instant_at = at.clone(),
            _ => {}
        }
        Self {
            draft: task.clone(),
            env_pairs: env_map_to_pairs(&task.env_vars),
            name_mode: NameMode::Explicit,
            sub_state,
        }
    }

    pub fn draft(&self) -> &Task {
        &self.draft
    }

    pub fn name_mode(&self) -> NameMode {
        self.name_mode
    }

    /// Type into the name field. A non-empty name is user-authored from here
    /// on; clearing the field re-enters auto mode.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.name_mode = if name.trim().is_empty() {
            NameMode::Auto
        } else {
            NameMode::Explicit
        };
        self.draft.name = name;
    }

    /// Type into the program field. In auto mode this re-derives the name
    /// from the path's basename.
    pub fn set_program(&mut self, program: impl Into<String>) {
        self.draft.program = program.into();
        if self.name_mode == NameMode::Auto {
            self.draft.name = program_basename(&self.draft.program);
        }
    }

    pub fn set_working_dir(&mut self, dir: impl Into<String>) {
        self.draft.working_dir = Some(dir.into());
    }

    pub fn set_stdin(&mut self, path: impl Into<String>) {
        self.draft.stdin = none_if_empty(path.into());
    }

    pub fn set_stdout(&mut self, path: impl Into<String>) {
        self.draft.stdout = none_if_empty(path.into());
    }

    pub fn set_stderr(&mut self, path: impl Into<String>) {
        self.draft.stderr = none_if_empty(path.into());
    }

    pub fn set_no_console(&mut self, no_console: bool) {
        self.draft.no_console = no_console;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.draft.enabled = enabled;
    }

    // Argument list.

    pub fn push_arg(&mut self) {
        self.draft.args.push(String::new());
    }

    pub fn set_arg(&mut self, index: usize, value: impl Into<String>) {
        if let Some(arg) = self.draft.args.get_mut(index) {
            *arg = value.into();
        }
    }

    pub fn remove_arg(&mut self, index: usize) {
        if index < self.draft.args.len() {
            self.draft.args.remove(index);
        }
    }

    // Environment variables.

    pub fn env_pairs(&self) -> &[EnvPair] {
        &self.env_pairs
    }

    pub fn push_env_pair(&mut self) {
        self.env_pairs.push(EnvPair::default());
    }

    pub fn set_env_key(&mut self, index: usize, key: impl Into<String>) {
        if let Some(pair) = self.env_pairs.get_mut(index) {
            pair.key = key.into();
        }
    }

    pub fn set_env_value(&mut self, index: usize, value: impl Into<String>) {
        if let Some(pair) = self.env_pairs.get_mut(index) {
            pair.value = value.into();
        }
    }

    pub fn remove_env_pair(&mut self, index: usize) {
        if index < self.env_pairs.len() {
            self.env_pairs.remove(index);
        }
    }

    // Trigger.

    pub fn trigger_kind(&self) -> TriggerKind {
        self.draft.trigger.kind()
    }

    /// Switch the trigger type, rebuilding the payload from the session
    /// cache.
    pub fn select_trigger(&mut self, kind: TriggerKind) {
        self.draft.trigger = match kind {
            TriggerKind::Routine => Trigger::Routine(self.sub_state.routine_interval_ms),
            TriggerKind::Instant => Trigger::Instant(self.sub_state.instant_at.clone()),
            TriggerKind::Startup => Trigger::Startup,
            TriggerKind::KeepAlive => Trigger::KeepAlive,
            TriggerKind::Manual => Trigger::Manual,
            TriggerKind::UntilSucceed => Trigger::UntilSucceed,
        };
    }

    /// Edit the Routine interval. Updates both the draft (when Routine is
    /// selected) and the session cache.
    pub fn set_routine_interval_ms(&mut self, ms: u64) {
        self.sub_state.routine_interval_ms = ms;
        if matches!(self.draft.trigger, Trigger::Routine(_)) {
            self.draft.trigger = Trigger::Routine(ms);
        }
    }

    /// Edit the Instant datetime. Updates both the draft (when Instant is
    /// selected) and the session cache.
    pub fn set_instant_at(&mut self, at: impl Into<String>) {
        let at = at.into();
        self.sub_state.instant_at = at.clone();
        if matches!(self.draft.trigger, Trigger::Instant(_)) {
            self.draft.trigger = Trigger::Instant(at);
        }
    }

    /// Validate and assemble the task to persist. Purely local: a rejection
    /// here means zero backend calls were made.
    ///
    /// - blank `program` → validation error
    /// - zero Routine interval → validation error
    /// - blank `name` → replaced by the program basename
    /// - blank `working_dir` (after trimming) → absent
    /// - env pair list → mapping, dropping blank-keyed pairs
    pub fn finish(&self) -> Result<Task> {
        if self.draft.program.trim().is_empty() {
            return Err(TaskhelmError::Validation(
                "program path is required".to_string(),
            ));
        }
        if matches!(self.draft.trigger, Trigger::Routine(0)) {
            return Err(TaskhelmError::Validation(
                "routine interval must be greater than zero".to_string(),
            ));
        }

        let mut task = self.draft.clone();

        let trimmed = task.name.trim();
        task.name = if trimmed.is_empty() {
            program_basename(&task.program)
        } else {
            trimmed.to_string()
        };

        task.working_dir = task
            .working_dir
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        task.env_vars = env_pairs_to_map(&self.env_pairs);

        Ok(task)
    }
}

/// Final path segment of a program path, tolerant of both separator styles:
/// normalize `\` to `/`, strip trailing slashes, take the last segment.
/// Empty input yields an empty string.
pub fn program_basename(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let normalized = path.replace('\\', "/");
    let trimmed = normalized.trim_end_matches('/');
    match trimmed.rsplit('/').next() {
        Some(segment) => segment.to_string(),
        None => String::new(),
    }
}

/// Collapse the edit list into the persisted mapping. Pairs whose key is
/// blank or whitespace are dropped; the key itself is stored untrimmed.
/// Later pairs win on duplicate keys.
pub fn env_pairs_to_map(pairs: &[EnvPair]) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for pair in pairs {
        if pair.key.trim().is_empty() {
            continue;
        }
        map.insert(pair.key.clone(), pair.value.clone());
    }
    map
}

/// Expand the persisted mapping back into an edit list.
pub fn env_map_to_pairs(map: &BTreeMap<String, String>) -> Vec<EnvPair> {
    map.iter()
        .map(|(key, value)| EnvPair {
            key: key.clone(),
            value: value.clone(),
        })
        .collect()
}

fn none_if_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_handles_both_separators() {
        assert_eq!(program_basename(r"C:\a\b\prog.exe"), "prog.exe");
        assert_eq!(program_basename("/usr/bin/prog"), "prog");
        assert_eq!(program_basename("/usr/bin/"), "bin");
        assert_eq!(program_basename("prog"), "prog");
        assert_eq!(program_basename(""), "");
    }

    #[test]
    fn blank_draft_auto_derives_name_until_user_types_one() {
        let mut editor = TaskEditor::blank();
        assert_eq!(editor.name_mode(), NameMode::Auto);

        editor.set_program("/opt/x/run.sh");
        assert_eq!(editor.draft().name, "run.sh");

        editor.set_name("Custom");
        assert_eq!(editor.name_mode(), NameMode::Explicit);

        editor.set_program("/opt/y/other.sh");
        assert_eq!(editor.draft().name, "Custom");
    }

    #[test]
    fn clearing_the_name_reenters_auto_mode() {
        let mut editor = TaskEditor::blank();
        editor.set_name("Custom");
        editor.set_name("");
        assert_eq!(editor.name_mode(), NameMode::Auto);

        editor.set_program("/opt/x/run.sh");
        assert_eq!(editor.draft().name, "run.sh");
    }

    #[test]
    fn loaded_task_with_blank_name_stays_blank_across_program_edits() {
        let task = Task {
            id: Some(1),
            name: String::new(),
            program: "/bin/old".to_string(),
            ..Task::draft()
        };
        let mut editor = TaskEditor::edit(&task);
        assert_eq!(editor.name_mode(), NameMode::Explicit);

        editor.set_program("/bin/new");
        assert_eq!(editor.draft().name, "");
    }

    #[test]
    fn trigger_cache_restores_last_entered_payloads() {
        let mut editor = TaskEditor::blank();

        editor.select_trigger(TriggerKind::Routine);
        assert_eq!(
            editor.draft().trigger,
            Trigger::Routine(DEFAULT_ROUTINE_INTERVAL_MS)
        );
        editor.set_routine_interval_ms(7000);

        editor.select_trigger(TriggerKind::Instant);
        editor.set_instant_at("2026-03-01T08:30");

        editor.select_trigger(TriggerKind::Routine);
        assert_eq!(editor.draft().trigger, Trigger::Routine(7000));

        editor.select_trigger(TriggerKind::Instant);
        assert_eq!(
            editor.draft().trigger,
            Trigger::Instant("2026-03-01T08:30".to_string())
        );
    }

    #[test]
    fn seeding_preloads_the_trigger_cache() {
        let task = Task {
            id: Some(4),
            name: "t".to_string(),
            program: "/bin/t".to_string(),
            trigger: Trigger::Routine(7000),
            ..Task::draft()
        };
        let mut editor = TaskEditor::edit(&task);

        editor.select_trigger(TriggerKind::Instant);
        editor.select_trigger(TriggerKind::Routine);
        assert_eq!(editor.draft().trigger, Trigger::Routine(7000));
    }

    #[test]
    fn finish_rejects_blank_program_locally() {
        let editor = TaskEditor::blank();
        let err = editor.finish().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn finish_rejects_a_zero_routine_interval() {
        let mut editor = TaskEditor::blank();
        editor.set_program("/bin/x");
        editor.select_trigger(TriggerKind::Routine);
        editor.set_routine_interval_ms(0);
        assert!(editor.finish().unwrap_err().is_validation());

        editor.set_routine_interval_ms(250);
        assert!(editor.finish().is_ok());
    }

    #[test]
    fn finish_falls_back_to_basename_for_blank_name() {
        let mut editor = TaskEditor::blank();
        editor.set_program("/srv/jobs/sync.sh");
        editor.set_name("   ");
        let task = editor.finish().unwrap();
        assert_eq!(task.name, "sync.sh");
    }

    #[test]
    fn finish_trims_working_dir_and_drops_blank() {
        let mut editor = TaskEditor::blank();
        editor.set_program("/bin/x");
        editor.set_working_dir("  /srv/data  ");
        assert_eq!(editor.finish().unwrap().working_dir.as_deref(), Some("/srv/data"));

        editor.set_working_dir("   ");
        assert_eq!(editor.finish().unwrap().working_dir, None);
    }

    #[test]
    fn env_pairs_tolerate_blanks_mid_edit_and_drop_them_on_finish() {
        let mut editor = TaskEditor::blank();
        editor.set_program("/bin/x");

        editor.push_env_pair();
        editor.set_env_key(0, "PATH");
        editor.set_env_value(0, "/usr/bin");
        editor.push_env_pair(); // left blank
        editor.push_env_pair();
        editor.set_env_key(2, "   ");
        editor.set_env_value(2, "ignored");

        let task = editor.finish().unwrap();
        assert_eq!(task.env_vars.len(), 1);
        assert_eq!(task.env_vars.get("PATH").map(String::as_str), Some("/usr/bin"));
    }

    #[test]
    fn later_duplicate_env_keys_win() {
        let pairs = vec![
            EnvPair {
                key: "K".into(),
                value: "first".into(),
            },
            EnvPair {
                key: "K".into(),
                value: "second".into(),
            },
        ];
        let map = env_pairs_to_map(&pairs);
        assert_eq!(map.get("K").map(String::as_str), Some("second"));
    }
}
