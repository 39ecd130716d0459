use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{
        header::{ETAG, IF_NONE_MATCH, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Response},
};

use super::server::AppState;
use super::session::{clear_session_cookie, session_cookie, session_token};
use crate::actions::{ActionError, ActionResult, AuthSession};
use crate::error::AppError;
use crate::validation::{CreateTaskInput, CredentialsInput, UpdateTaskInput};

/// Turn a body that failed to parse into the same tagged failure the actions return
fn invalid_body(rejection: JsonRejection) -> Response {
    tracing::debug!("Rejected request body: {}", rejection);
    let err = AppError::Validation(format!("Invalid request body: {}", rejection.body_text()));
    ActionResult::<()>::Failure(ActionError::from(&err)).into_response()
}

fn with_session_cookie(state: &AppState, result: ActionResult<AuthSession>) -> Response {
    let cookie = result
        .data()
        .and_then(|session| session_cookie(&session.token, &state.config));

    let mut response = result.into_response();
    if let Some(cookie) = cookie {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    response
}

/// Register an account
pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsInput>, JsonRejection>,
) -> Response {
    let Json(input) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(rejection),
    };

    let result = state.actions.sign_up(&input).await;
    with_session_cookie(&state, result)
}

/// Open a session
pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsInput>, JsonRejection>,
) -> Response {
    let Json(input) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(rejection),
    };

    let result = state.actions.sign_in(&input).await;
    with_session_cookie(&state, result)
}

/// End the current session
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = session_token(&headers);
    let mut response = state.actions.sign_out(token.as_deref()).await.into_response();
    response
        .headers_mut()
        .insert(SET_COOKIE, clear_session_cookie());
    response
}

/// The signed-in account
pub async fn current_user(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = session_token(&headers);
    state.actions.current_user(token.as_deref()).await.into_response()
}

/// List the caller's tasks, answering `304` when the caller's copy is current
pub async fn list_tasks(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = session_token(&headers);

    // Read the revision before the list so a concurrent mutation can only make the tag stale
    let etag = match state.actions.auth.current_user(token.as_deref()).await {
        Ok(Some(user)) => Some(state.actions.revisions.etag(&user.id).await),
        Ok(None) => None,
        Err(e) => {
            tracing::error!("Failed to resolve session: {}", e);
            None
        },
    };
    let etag = etag.and_then(|tag| HeaderValue::from_str(&tag).ok());

    if let Some(etag) = &etag {
        let cached = headers
            .get(IF_NONE_MATCH)
            .is_some_and(|value| value.as_bytes() == etag.as_bytes());
        if cached {
            return (StatusCode::NOT_MODIFIED, [(ETAG, etag.clone())]).into_response();
        }
    }

    let result = state.actions.get_tasks(token.as_deref()).await;
    let success = result.is_success();
    let mut response = result.into_response();
    if let (true, Some(etag)) = (success, etag) {
        response.headers_mut().insert(ETAG, etag);
    }
    response
}

/// Create a task
pub async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateTaskInput>, JsonRejection>,
) -> Response {
    let Json(input) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(rejection),
    };

    let token = session_token(&headers);
    match state.actions.create_task(token.as_deref(), &input).await {
        result @ ActionResult::Success(_) => (StatusCode::CREATED, Json(result)).into_response(),
        failure => failure.into_response(),
    }
}

/// A single task of the caller
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let token = session_token(&headers);
    state
        .actions
        .get_task(token.as_deref(), &id)
        .await
        .into_response()
}

/// Edit a task's title or description
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<UpdateTaskInput>, JsonRejection>,
) -> Response {
    let Json(input) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(rejection),
    };

    let token = session_token(&headers);
    state
        .actions
        .update_task(token.as_deref(), &id, &input)
        .await
        .into_response()
}

/// Flip a task's completion
pub async fn toggle_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let token = session_token(&headers);
    state
        .actions
        .toggle_task(token.as_deref(), &id)
        .await
        .into_response()
}

/// Delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let token = session_token(&headers);
    state
        .actions
        .delete_task(token.as_deref(), &id)
        .await
        .into_response()
}
