use crate::db::models::Task;
use crate::error::{AppError, Result};
use crate::gateway::{
    DeleteTask, InsertTask, OwnerScope, SelectTask, SelectTasks, TaskGateway, ToggleTask,
    UpdateTask,
};
use crate::validation::{validate_task_id, CreateTaskInput, UpdateTaskInput};
use std::sync::Arc;

/// Task operations for a single account.
///
/// Composes input validation with the persistence gateway and turns store
/// failures into user-facing [`AppError::Gateway`] messages. The underlying
/// store error is logged, never returned.
#[derive(Clone)]
pub struct TaskService {
    gateway: Arc<dyn TaskGateway>,
}

impl TaskService {
    pub fn new(gateway: Arc<dyn TaskGateway>) -> Self {
        Self { gateway }
    }

    /// Create a task owned by `owner_id`. Nothing is written if validation fails.
    pub async fn create(&self, owner_id: &str, input: &CreateTaskInput) -> Result<Task> {
        let new_task = input.validate()?;

        let task = self
            .gateway
            .insert(InsertTask {
                scope: OwnerScope::new(owner_id),
                title: new_task.title,
                description: new_task.description,
            })
            .await
            .map_err(|e| gateway_failure("Failed to create task", owner_id, None, e))?;

        tracing::debug!(user_id = owner_id, task_id = %task.id, "Task created");
        Ok(task)
    }

    /// All tasks of `owner_id`, newest first. Empty when there are none.
    pub async fn get_all(&self, owner_id: &str) -> Result<Vec<Task>> {
        self.gateway
            .select(SelectTasks {
                scope: OwnerScope::new(owner_id),
            })
            .await
            .map_err(|e| gateway_failure("Failed to fetch tasks", owner_id, None, e))
    }

    pub async fn get(&self, task_id: &str, owner_id: &str) -> Result<Task> {
        let task_id = validate_task_id(task_id).map_err(|_| AppError::task_not_found())?;

        self.gateway
            .select_one(SelectTask {
                scope: OwnerScope::new(owner_id),
                task_id: task_id.clone(),
            })
            .await
            .map_err(|e| gateway_failure("Failed to fetch task", owner_id, Some(&task_id), e))?
            .ok_or_else(AppError::task_not_found)
    }

    /// Flip the completion flag of a task owned by `owner_id`.
    ///
    /// Issued as one conditional update, so concurrent toggles each flip exactly once.
    pub async fn toggle(&self, task_id: &str, owner_id: &str) -> Result<Task> {
        let task_id = validate_task_id(task_id).map_err(|_| AppError::task_not_found())?;

        let task = self
            .gateway
            .toggle(ToggleTask {
                scope: OwnerScope::new(owner_id),
                task_id: task_id.clone(),
            })
            .await
            .map_err(|e| gateway_failure("Failed to update task", owner_id, Some(&task_id), e))?
            .ok_or_else(|| {
                tracing::debug!(user_id = owner_id, task_id = %task_id, "Toggle matched no task");
                AppError::task_not_found()
            })?;

        tracing::debug!(
            user_id = owner_id,
            task_id = %task.id,
            completed = task.completed,
            "Task toggled"
        );
        Ok(task)
    }

    /// Edit title and/or description of a task owned by `owner_id`.
    pub async fn update(
        &self,
        task_id: &str,
        owner_id: &str,
        input: &UpdateTaskInput,
    ) -> Result<Task> {
        let changes = input.validate()?;
        let task_id = validate_task_id(task_id).map_err(|_| AppError::task_not_found())?;

        let task = self
            .gateway
            .update(UpdateTask {
                scope: OwnerScope::new(owner_id),
                task_id: task_id.clone(),
                changes,
            })
            .await
            .map_err(|e| gateway_failure("Failed to update task", owner_id, Some(&task_id), e))?
            .ok_or_else(AppError::task_not_found)?;

        tracing::debug!(user_id = owner_id, task_id = %task.id, "Task updated");
        Ok(task)
    }

    /// Delete a task owned by `owner_id`. A delete that matches no row is
    /// reported as not found, the same as toggle.
    pub async fn delete(&self, task_id: &str, owner_id: &str) -> Result<()> {
        let task_id = validate_task_id(task_id).map_err(|_| AppError::task_not_found())?;

        let removed = self
            .gateway
            .delete(DeleteTask {
                scope: OwnerScope::new(owner_id),
                task_id: task_id.clone(),
            })
            .await
            .map_err(|e| gateway_failure("Failed to delete task", owner_id, Some(&task_id), e))?;

        if removed == 0 {
            return Err(AppError::task_not_found());
        }

        tracing::debug!(user_id = owner_id, task_id = %task_id, "Task deleted");
        Ok(())
    }
}

fn gateway_failure(message: &str, owner_id: &str, task_id: Option<&str>, err: AppError) -> AppError {
    tracing::error!(
        user_id = owner_id,
        task_id = task_id.unwrap_or("-"),
        error = %err,
        "{}",
        message
    );
    AppError::Gateway(message.to_string())
}
