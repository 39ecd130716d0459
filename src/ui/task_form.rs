use crate::actions::ActionResult;
use crate::db::models::Task;
use crate::validation::{CreateTaskInput, FieldErrors};

/// The "new task" form.
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
    title: String,
    description: String,
    field_errors: FieldErrors,
    error: Option<String>,
    submitting: bool,
}

impl TaskForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field)
    }

    /// Form-level error from the last failed submission.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Validate locally and, if valid, return the create request to send.
    pub fn submit(&mut self) -> Option<CreateTaskInput> {
        if self.submitting {
            return None;
        }

        let input = CreateTaskInput {
            title: self.title.clone(),
            description: Some(self.description.clone()).filter(|d| !d.trim().is_empty()),
        };

        self.error = None;
        match input.check() {
            Ok(_) => {
                self.field_errors = FieldErrors::default();
                self.submitting = true;
                Some(input)
            },
            Err(errors) => {
                self.field_errors = errors;
                None
            },
        }
    }

    /// Apply the create result. Returns the new task on success.
    pub fn finish_submit(&mut self, result: ActionResult<Task>) -> Option<Task> {
        self.submitting = false;
        match result {
            ActionResult::Success(task) => {
                self.title.clear();
                self.description.clear();
                Some(task)
            },
            ActionResult::Failure(err) => {
                self.error = Some(err.message);
                None
            },
        }
    }
}
