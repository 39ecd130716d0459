//! Server actions: the boundary between the UI surfaces and the services.
//!
//! Every action authenticates the caller, delegates to a service, invalidates the
//! caller's cached task list on a successful mutation, and reports the outcome as an
//! [`ActionResult`]. Actions never return `Err`.

use crate::auth::AuthService;
use crate::db::models::{Task, User};
use crate::error::{AppError, Result};
use crate::revisions::ListRevisions;
use crate::tasks::TaskService;
use crate::validation::{CreateTaskInput, CredentialsInput, UpdateTaskInput};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// Tagged outcome of an action: `{"success":true,"data":…}` or
/// `{"success":false,"error":"…","code":"…"}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult<T> {
    Success(T),
    Failure(ActionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionError {
    pub message: String,
    pub code: &'static str,
    pub status: StatusCode,
}

impl From<&AppError> for ActionError {
    fn from(err: &AppError) -> Self {
        Self {
            message: err.public_message(),
            code: err.to_error_code(),
            status: err.status_code(),
        }
    }
}

impl<T> ActionResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ActionResult::Success(data) => Some(data),
            ActionResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ActionResult::Success(_) => None,
            ActionResult::Failure(err) => Some(&err.message),
        }
    }

    pub fn into_result(self) -> std::result::Result<T, ActionError> {
        match self {
            ActionResult::Success(data) => Ok(data),
            ActionResult::Failure(err) => Err(err),
        }
    }
}

impl<T: Serialize> Serialize for ActionResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ActionResult::Success(data) => {
                let mut state = serializer.serialize_struct("ActionResult", 2)?;
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
                state.end()
            },
            ActionResult::Failure(err) => {
                let mut state = serializer.serialize_struct("ActionResult", 3)?;
                state.serialize_field("success", &false)?;
                state.serialize_field("error", &err.message)?;
                state.serialize_field("code", err.code)?;
                state.end()
            },
        }
    }
}

impl<T: Serialize> IntoResponse for ActionResult<T> {
    fn into_response(self) -> Response {
        let status = match &self {
            ActionResult::Success(_) => StatusCode::OK,
            ActionResult::Failure(err) => err.status,
        };
        (status, Json(self)).into_response()
    }
}

/// A freshly opened session.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedTask {
    pub id: String,
}

/// Services the actions run against. Cloning is cheap.
#[derive(Clone)]
pub struct ActionContext {
    pub tasks: Arc<TaskService>,
    pub auth: Arc<AuthService>,
    pub revisions: Arc<ListRevisions>,
}

impl ActionContext {
    pub fn new(
        tasks: Arc<TaskService>,
        auth: Arc<AuthService>,
        revisions: Arc<ListRevisions>,
    ) -> Self {
        Self {
            tasks,
            auth,
            revisions,
        }
    }

    pub async fn create_task(
        &self,
        token: Option<&str>,
        input: &CreateTaskInput,
    ) -> ActionResult<Task> {
        let outcome = async {
            let user = self.auth.require_auth(token).await?;
            let task = self.tasks.create(&user.id, input).await?;
            self.revisions.invalidate(&user.id).await;
            Ok::<_, AppError>(task)
        }
        .await;
        finish("create_task", outcome)
    }

    pub async fn get_tasks(&self, token: Option<&str>) -> ActionResult<Vec<Task>> {
        let outcome = async {
            let user = self.auth.require_auth(token).await?;
            self.tasks.get_all(&user.id).await
        }
        .await;
        finish("get_tasks", outcome)
    }

    pub async fn get_task(&self, token: Option<&str>, task_id: &str) -> ActionResult<Task> {
        let outcome = async {
            let user = self.auth.require_auth(token).await?;
            self.tasks.get(task_id, &user.id).await
        }
        .await;
        finish("get_task", outcome)
    }

    pub async fn toggle_task(&self, token: Option<&str>, task_id: &str) -> ActionResult<Task> {
        let outcome = async {
            let user = self.auth.require_auth(token).await?;
            let task = self.tasks.toggle(task_id, &user.id).await?;
            self.revisions.invalidate(&user.id).await;
            Ok::<_, AppError>(task)
        }
        .await;
        finish("toggle_task", outcome)
    }

    pub async fn update_task(
        &self,
        token: Option<&str>,
        task_id: &str,
        input: &UpdateTaskInput,
    ) -> ActionResult<Task> {
        let outcome = async {
            let user = self.auth.require_auth(token).await?;
            let task = self.tasks.update(task_id, &user.id, input).await?;
            self.revisions.invalidate(&user.id).await;
            Ok::<_, AppError>(task)
        }
        .await;
        finish("update_task", outcome)
    }

    pub async fn delete_task(&self, token: Option<&str>, task_id: &str) -> ActionResult<DeletedTask> {
        let outcome = async {
            let user = self.auth.require_auth(token).await?;
            self.tasks.delete(task_id, &user.id).await?;
            self.revisions.invalidate(&user.id).await;
            Ok::<_, AppError>(DeletedTask {
                id: task_id.to_string(),
            })
        }
        .await;
        finish("delete_task", outcome)
    }

    pub async fn sign_up(&self, input: &CredentialsInput) -> ActionResult<AuthSession> {
        let outcome = self.auth.sign_up(input).await.map(|(user, token)| AuthSession {
            user,
            token: token.as_str().to_string(),
        });
        finish("sign_up", outcome)
    }

    pub async fn sign_in(&self, input: &CredentialsInput) -> ActionResult<AuthSession> {
        let outcome = self.auth.sign_in(input).await.map(|(user, token)| AuthSession {
            user,
            token: token.as_str().to_string(),
        });
        finish("sign_in", outcome)
    }

    pub async fn current_user(&self, token: Option<&str>) -> ActionResult<User> {
        finish("current_user", self.auth.require_auth(token).await)
    }

    pub async fn sign_out(&self, token: Option<&str>) -> ActionResult<()> {
        let outcome = match token {
            Some(token) => self.auth.sign_out(token).await,
            None => Ok(()),
        };
        finish("sign_out", outcome)
    }
}

fn finish<T>(action: &'static str, outcome: Result<T>) -> ActionResult<T> {
    match outcome {
        Ok(data) => ActionResult::Success(data),
        Err(err) => {
            match &err {
                AppError::Validation(_) | AppError::Auth(_) | AppError::NotFound(_) => {
                    tracing::info!(action, error = %err, "Action rejected");
                },
                _ => tracing::error!(action, error = %err, "Action failed"),
            }
            ActionResult::Failure(ActionError::from(&err))
        },
    }
}
