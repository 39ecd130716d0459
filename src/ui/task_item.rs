use crate::actions::{ActionResult, DeletedTask};
use crate::db::models::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemPhase {
    Idle,
    /// A toggle is in flight. `previous` is the completion shown before the click.
    Toggling { previous: bool },
    Deleting,
}

/// Request a [`TaskItem`] wants sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRequest {
    Toggle { task_id: String },
    Delete { task_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The parent list should drop the row.
    Removed,
    Kept,
}

/// One row of the task list with optimistic toggling.
///
/// At most one request is in flight per item; interactions while busy are ignored.
#[derive(Debug, Clone)]
pub struct TaskItem {
    task: Task,
    checked: bool,
    phase: ItemPhase,
    error: Option<String>,
}

impl TaskItem {
    pub fn new(task: Task) -> Self {
        Self {
            checked: task.completed,
            task,
            phase: ItemPhase::Idle,
            error: None,
        }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn id(&self) -> &str {
        &self.task.id
    }

    /// Completion as currently displayed, including an unconfirmed toggle.
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn phase(&self) -> ItemPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != ItemPhase::Idle
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Checkbox clicked: flip the display now and ask for a toggle.
    pub fn begin_toggle(&mut self) -> Option<ItemRequest> {
        if self.is_busy() {
            return None;
        }

        self.phase = ItemPhase::Toggling {
            previous: self.checked,
        };
        self.checked = !self.checked;
        self.error = None;

        Some(ItemRequest::Toggle {
            task_id: self.task.id.clone(),
        })
    }

    pub fn finish_toggle(&mut self, result: ActionResult<Task>) {
        let ItemPhase::Toggling { previous } = self.phase else {
            tracing::warn!(task_id = %self.task.id, "Toggle result without a toggle in flight");
            return;
        };

        match result {
            ActionResult::Success(task) => {
                self.checked = task.completed;
                self.task = task;
            },
            ActionResult::Failure(err) => {
                self.checked = previous;
                self.error = Some(err.message);
            },
        }
        self.phase = ItemPhase::Idle;
    }

    /// Delete clicked: ask for a delete. The row stays until the result arrives.
    pub fn begin_delete(&mut self) -> Option<ItemRequest> {
        if self.is_busy() {
            return None;
        }

        self.phase = ItemPhase::Deleting;
        self.error = None;

        Some(ItemRequest::Delete {
            task_id: self.task.id.clone(),
        })
    }

    pub fn finish_delete(&mut self, result: ActionResult<DeletedTask>) -> DeleteOutcome {
        if self.phase != ItemPhase::Deleting {
            tracing::warn!(task_id = %self.task.id, "Delete result without a delete in flight");
            return DeleteOutcome::Kept;
        }

        self.phase = ItemPhase::Idle;
        match result {
            ActionResult::Success(_) => DeleteOutcome::Removed,
            ActionResult::Failure(err) => {
                self.error = Some(err.message);
                DeleteOutcome::Kept
            },
        }
    }

    /// Adopt a fresh server copy of the task, unless a request is in flight.
    pub(crate) fn refresh(&mut self, task: Task) {
        if self.is_busy() {
            return;
        }
        self.checked = task.completed;
        self.task = task;
    }
}
