use crate::gateway::PersistenceGateway;
use crate::model::{Priority, Subtask, Task, TaskId};
use crate::view::{self, Filter, SortMode};
use crate::writer::SaveWriter;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

// ── Snapshots ──────────────────────────────────────────────────

/// An immutable copy of the task sequence at one revision.
///
/// Cheap to clone (Arc inside). This is what gets handed to the saver
/// and what the gateway hands back at startup.
#[derive(Debug, Clone)]
pub struct Snapshot {
    revision: u64,
    tasks: Arc<Vec<Task>>,
}

impl Snapshot {
    pub fn new(revision: u64, tasks: Vec<Task>) -> Self {
        Snapshot { revision, tasks: Arc::new(tasks) }
    }

    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }
}

// ── Commands ──────────────────────────────────────────────────

/// A mutation the UI wants to happen.
#[derive(Debug, Clone)]
pub enum Command {
    AddTask {
        text: String,
        priority: Priority,
    },
    DeleteTask {
        task_id: TaskId,
    },
    ToggleCompleted {
        task_id: TaskId,
    },
    /// Replaces text, priority and end date. Text is not checked for blanks.
    EditTask {
        task_id: TaskId,
        text: String,
        priority: Priority,
        end_date: Option<DateTime<Utc>>,
    },
    /// The caller trims and validates the subtask text.
    AddSubtask {
        task_id: TaskId,
        subtask: Subtask,
    },
    ToggleSubtaskCompleted {
        task_id: TaskId,
        index: usize,
    },
}

// ── Events ────────────────────────────────────────────────────

/// What a command actually did. Carries the revision it produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    TaskAdded {
        revision: u64,
        task: Task,
    },
    TaskDeleted {
        revision: u64,
        task_id: TaskId,
    },
    TaskToggled {
        revision: u64,
        task_id: TaskId,
        completed: bool,
    },
    TaskEdited {
        revision: u64,
        task_id: TaskId,
    },
    SubtaskAdded {
        revision: u64,
        task_id: TaskId,
        index: usize,
    },
    SubtaskToggled {
        revision: u64,
        task_id: TaskId,
        index: usize,
        completed: bool,
    },
}

impl Event {
    pub fn revision(&self) -> u64 {
        match self {
            Event::TaskAdded { revision, .. }
            | Event::TaskDeleted { revision, .. }
            | Event::TaskToggled { revision, .. }
            | Event::TaskEdited { revision, .. }
            | Event::SubtaskAdded { revision, .. }
            | Event::SubtaskToggled { revision, .. } => *revision,
        }
    }
}

/// Why a command left the store untouched.
///
/// Not an error: nothing is raised, nothing is saved, the revision stays put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOp {
    BlankText,
    TaskNotFound,
    SubtaskNotFound { index: usize },
}

// ── The store ─────────────────────────────────────────────────

/// Owner of the task sequence plus the list's UI selections.
///
/// All mutations go through [`TaskStore::apply`]. The sequence is
/// copy-on-write: snapshots taken before a mutation keep seeing the old
/// tasks. When opened over a gateway, every applied command queues a
/// save of the new snapshot and returns without waiting for it.
pub struct TaskStore {
    tasks: Arc<Vec<Task>>,
    revision: u64,
    filter: Filter,
    sort_mode: SortMode,
    draft_priority: Priority,
    writer: Option<SaveWriter>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Empty store with no persistence.
    pub fn new() -> Self {
        Self::from_snapshot(Snapshot::empty())
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        TaskStore {
            tasks: snapshot.tasks,
            revision: snapshot.revision,
            filter: Filter::default(),
            sort_mode: SortMode::default(),
            draft_priority: Priority::default(),
            writer: None,
        }
    }

    /// Load the saved sequence from `gateway`, then keep saving to it.
    ///
    /// Never fails: a missing or unreadable payload yields an empty store.
    /// The store is only handed out once the load has resolved.
    pub async fn open(gateway: Arc<dyn PersistenceGateway>) -> Self {
        let loader = Arc::clone(&gateway);
        let snapshot = match tokio::task::spawn_blocking(move || loader.load()).await {
            Ok(Ok(Some(snapshot))) => dedupe(snapshot),
            Ok(Ok(None)) => Snapshot::empty(),
            Ok(Err(e)) => {
                warn!(error = %e, "failed to load tasks, starting empty");
                Snapshot::empty()
            }
            Err(e) => {
                warn!(error = %e, "task load aborted, starting empty");
                Snapshot::empty()
            }
        };
        debug!(revision = snapshot.revision, tasks = snapshot.tasks.len(), "task store opened");

        let mut store = Self::from_snapshot(snapshot);
        store.writer = Some(SaveWriter::spawn(gateway));
        store
    }

    /// Stop accepting saves and wait for queued ones to be written.
    pub async fn close(self) {
        if let Some(writer) = self.writer {
            writer.shutdown().await;
        }
    }

    // ── Reads ─────────────────────────────────────────────────

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot { revision: self.revision, tasks: Arc::clone(&self.tasks) }
    }

    /// Filtered and sorted projection. Never touches the stored order.
    pub fn view(&self, filter: Filter, sort_mode: SortMode) -> Vec<&Task> {
        view::view(&self.tasks, filter, sort_mode)
    }

    /// [`TaskStore::view`] with the active selections.
    pub fn visible(&self) -> Vec<&Task> {
        self.view(self.filter, self.sort_mode)
    }

    // ── Selections ────────────────────────────────────────────

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn set_sort_mode(&mut self, sort_mode: SortMode) {
        self.sort_mode = sort_mode;
    }

    /// Priority that [`TaskStore::submit_draft`] will use.
    pub fn draft_priority(&self) -> Priority {
        self.draft_priority
    }

    pub fn cycle_draft_priority(&mut self) -> Priority {
        self.draft_priority = self.draft_priority.next();
        self.draft_priority
    }

    // ── Mutations ─────────────────────────────────────────────

    /// Apply a command. This is the only codepath that changes tasks.
    pub fn apply(&mut self, cmd: Command) -> Result<Event, NoOp> {
        let revision = self.revision + 1;

        let event = match cmd {
            Command::AddTask { text, priority } => {
                if text.trim().is_empty() {
                    return Err(NoOp::BlankText);
                }
                let task = Task::new(text, priority, Utc::now());
                Arc::make_mut(&mut self.tasks).push(task.clone());
                Event::TaskAdded { revision, task }
            }

            Command::DeleteTask { task_id } => {
                let idx = self.position(task_id)?;
                Arc::make_mut(&mut self.tasks).remove(idx);
                Event::TaskDeleted { revision, task_id }
            }

            Command::ToggleCompleted { task_id } => {
                let idx = self.position(task_id)?;
                let task = &mut Arc::make_mut(&mut self.tasks)[idx];
                task.completed = !task.completed;
                Event::TaskToggled { revision, task_id, completed: task.completed }
            }

            Command::EditTask { task_id, text, priority, end_date } => {
                let idx = self.position(task_id)?;
                let task = &mut Arc::make_mut(&mut self.tasks)[idx];
                task.text = text;
                task.priority = priority;
                task.end_date = end_date;
                Event::TaskEdited { revision, task_id }
            }

            Command::AddSubtask { task_id, subtask } => {
                let idx = self.position(task_id)?;
                let subtasks = &mut Arc::make_mut(&mut self.tasks)[idx].subtasks;
                subtasks.push(subtask);
                Event::SubtaskAdded { revision, task_id, index: subtasks.len() - 1 }
            }

            Command::ToggleSubtaskCompleted { task_id, index } => {
                let idx = self.position(task_id)?;
                if index >= self.tasks[idx].subtasks.len() {
                    return Err(NoOp::SubtaskNotFound { index });
                }
                let subtask = &mut Arc::make_mut(&mut self.tasks)[idx].subtasks[index];
                subtask.completed = !subtask.completed;
                Event::SubtaskToggled { revision, task_id, index, completed: subtask.completed }
            }
        };

        self.revision = revision;
        debug!(revision, ?event, "applied command");
        if let Some(writer) = &self.writer {
            writer.submit(self.snapshot());
        }
        Ok(event)
    }

    /// Append a task. Blank or whitespace-only text is ignored.
    pub fn add_task(&mut self, text: impl Into<String>, priority: Priority) -> Option<TaskId> {
        match self.apply(Command::AddTask { text: text.into(), priority }) {
            Ok(Event::TaskAdded { task, .. }) => Some(task.id),
            _ => None,
        }
    }

    /// Add a task at the draft priority, then reset the draft to Medium.
    pub fn submit_draft(&mut self, text: impl Into<String>) -> Option<TaskId> {
        let id = self.add_task(text, self.draft_priority)?;
        self.draft_priority = Priority::default();
        Some(id)
    }

    pub fn delete_task(&mut self, task_id: TaskId) {
        let _ = self.apply(Command::DeleteTask { task_id });
    }

    pub fn toggle_completed(&mut self, task_id: TaskId) {
        let _ = self.apply(Command::ToggleCompleted { task_id });
    }

    pub fn edit_task(
        &mut self,
        task_id: TaskId,
        text: impl Into<String>,
        priority: Priority,
        end_date: Option<DateTime<Utc>>,
    ) {
        let _ = self.apply(Command::EditTask { task_id, text: text.into(), priority, end_date });
    }

    pub fn add_subtask(&mut self, task_id: TaskId, subtask: Subtask) {
        let _ = self.apply(Command::AddSubtask { task_id, subtask });
    }

    pub fn toggle_subtask_completed(&mut self, task_id: TaskId, index: usize) {
        let _ = self.apply(Command::ToggleSubtaskCompleted { task_id, index });
    }

    fn position(&self, task_id: TaskId) -> Result<usize, NoOp> {
        self.tasks.iter().position(|t| t.id == task_id).ok_or(NoOp::TaskNotFound)
    }
}

/// Drop later records that reuse an id. Keeps ids unique after a load.
fn dedupe(snapshot: Snapshot) -> Snapshot {
    let mut seen = HashSet::new();
    if snapshot.tasks.iter().all(|t| seen.insert(t.id)) {
        return snapshot;
    }

    seen.clear();
    let before = snapshot.tasks.len();
    let tasks: Vec<Task> = snapshot.tasks.iter().filter(|t| seen.insert(t.id)).cloned().collect();
    warn!(dropped = before - tasks.len(), "loaded tasks contained duplicate ids");
    Snapshot::new(snapshot.revision, tasks)
}

// ── Tests ──────────────────────────────────────────────────────
