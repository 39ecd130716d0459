//! Server-rendered pages and their form posts.
//!
//! Pages work without JavaScript: every interaction is a form post that runs the
//! matching server action and then redirects back, or re-renders the page with the
//! failure shown inline.

use axum::{
    extract::{Path, State},
    http::{
        header::{CONTENT_TYPE, SET_COOKIE},
        HeaderMap, StatusCode,
    },
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use super::server::AppState;
use super::session::{clear_session_cookie, session_cookie, session_token};
use crate::actions::ActionResult;
use crate::db::models::User;
use crate::ui::{TaskForm, TaskList};
use crate::validation::CredentialsInput;

/// Body of the "new task" form
#[derive(Debug, Deserialize)]
pub struct NewTaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthPage {
    Login,
    Signup,
}

impl AuthPage {
    fn title(self) -> &'static str {
        match self {
            AuthPage::Login => "Log in",
            AuthPage::Signup => "Sign up",
        }
    }

    fn action(self) -> &'static str {
        match self {
            AuthPage::Login => "/login",
            AuthPage::Signup => "/signup",
        }
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, user: Option<&User>, body: &str) -> String {
    let nav = match user {
        Some(user) => format!(
            r#"<span class="who">{}</span>
            <form method="post" action="/logout" class="inline"><button type="submit">Log out</button></form>"#,
            escape_html(&user.email)
        ),
        None => r#"<a href="/login">Log in</a> <a href="/signup">Sign up</a>"#.to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} · Taskdeck</title>
    <style>
        * {{ box-sizing: border-box; }}
        body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 0; background: #f7f7f7; color: #333; }}
        header {{ display: flex; justify-content: space-between; align-items: center; padding: 16px 24px; background: white; box-shadow: 0 1px 4px rgba(0,0,0,0.08); }}
        main {{ max-width: 640px; margin: 32px auto; padding: 0 16px; }}
        .inline {{ display: inline; }}
        .alert {{ background: #fee2e2; color: #991b1b; padding: 12px 16px; border-radius: 8px; margin-bottom: 16px; }}
        .field-error {{ color: #b91c1c; font-size: 0.9em; }}
        .task {{ display: flex; gap: 12px; align-items: center; background: white; padding: 12px; border-radius: 8px; margin-bottom: 8px; }}
        .task.done .title {{ text-decoration: line-through; color: #999; }}
        .task .error {{ color: #b91c1c; font-size: 0.85em; }}
        label {{ display: block; margin-top: 12px; }}
        input[type=text], input[type=email], input[type=password], textarea {{ width: 100%; padding: 8px; }}
    </style>
</head>
<body>
    <header><a href="/"><strong>Taskdeck</strong></a><nav>{nav}</nav></header>
    <main>
{body}
    </main>
</body>
</html>
"#,
        title = escape_html(title),
        nav = nav,
        body = body
    )
}

fn alert(message: Option<&str>) -> String {
    message
        .map(|m| format!(r#"<div class="alert" role="alert">{}</div>"#, escape_html(m)))
        .unwrap_or_default()
}

fn render_auth_page(page: AuthPage, email: &str, error: Option<&str>) -> String {
    let other = match page {
        AuthPage::Login => r#"No account yet? <a href="/signup">Sign up</a>"#,
        AuthPage::Signup => r#"Already registered? <a href="/login">Log in</a>"#,
    };
    let autocomplete = match page {
        AuthPage::Login => "current-password",
        AuthPage::Signup => "new-password",
    };

    let body = format!(
        r#"<h1>{title}</h1>
        {alert}
        <form method="post" action="{action}">
            <label>Email <input type="email" name="email" value="{email}" required></label>
            <label>Password <input type="password" name="password" autocomplete="{autocomplete}" required></label>
            <p><button type="submit">{title}</button></p>
        </form>
        <p>{other}</p>"#,
        title = page.title(),
        alert = alert(error),
        action = page.action(),
        email = escape_html(email),
        autocomplete = autocomplete,
        other = other
    );

    layout(page.title(), None, &body)
}

/// Dashboard markup: the new-task form followed by the task rows.
pub fn render_dashboard(user: &User, list: &TaskList, form: &TaskForm, banner: Option<&str>) -> String {
    let field_error = |field: &str| {
        form.field_error(field)
            .map(|m| format!(r#"<div class="field-error">{}</div>"#, escape_html(m)))
            .unwrap_or_default()
    };

    let mut rows = String::new();
    for item in list.items() {
        let task = item.task();
        let description = task
            .description
            .as_deref()
            .map(|d| format!(r#"<div class="description">{}</div>"#, escape_html(d)))
            .unwrap_or_default();
        let error = item
            .error()
            .map(|e| format!(r#"<div class="error" role="alert">{}</div>"#, escape_html(e)))
            .unwrap_or_default();

        rows.push_str(&format!(
            r#"
        <li class="task{done}" id="task-{id}">
            <form method="post" action="/dashboard/tasks/{id}/toggle" class="inline">
                <button type="submit" aria-label="Toggle">{checkbox}</button>
            </form>
            <div>
                <div class="title">{title}</div>
                {description}
                {error}
            </div>
            <form method="post" action="/dashboard/tasks/{id}/delete" class="inline">
                <button type="submit">Delete</button>
            </form>
        </li>"#,
            done = if item.is_checked() { " done" } else { "" },
            id = escape_html(item.id()),
            checkbox = if item.is_checked() { "☑" } else { "☐" },
            title = escape_html(&task.title),
            description = description,
            error = error,
        ));
    }

    let list_markup = if list.is_empty() {
        r#"<p class="empty">No tasks yet. Add one above.</p>"#.to_string()
    } else {
        format!(r#"<ul class="tasks">{}</ul>"#, rows)
    };

    let body = format!(
        r#"<h1>Your tasks</h1>
        {banner}
        {form_error}
        <form method="post" action="/dashboard/tasks">
            <label>Title <input type="text" name="title" value="{title}" maxlength="200"></label>
            {title_error}
            <label>Description <textarea name="description" maxlength="1000">{description}</textarea></label>
            {description_error}
            <p><button type="submit">Add task</button></p>
        </form>
        <p class="summary">{completed} of {total} completed</p>
        {list}"#,
        banner = alert(banner),
        form_error = alert(form.error()),
        title = escape_html(form.title()),
        title_error = field_error("title"),
        description = escape_html(form.description()),
        description_error = field_error("description"),
        completed = list.completed_count(),
        total = list.len(),
        list = list_markup,
    );

    layout("Dashboard", Some(user), &body)
}

/// Fetch the caller and their list, then render the dashboard with `form` and `banner`.
async fn dashboard_response(
    state: &AppState,
    token: Option<&str>,
    list: Option<TaskList>,
    form: &TaskForm,
    banner: Option<&str>,
    status: StatusCode,
) -> Response {
    let user = match state.actions.current_user(token).await {
        ActionResult::Success(user) => user,
        ActionResult::Failure(_) => return Redirect::to("/login").into_response(),
    };

    let (list, fetch_error) = match list {
        Some(list) => (list, None),
        None => match state.actions.get_tasks(token).await {
            ActionResult::Success(tasks) => (TaskList::from_tasks(tasks), None),
            ActionResult::Failure(err) => (TaskList::default(), Some(err)),
        },
    };

    let (banner, status) = match &fetch_error {
        Some(err) => (Some(err.message.as_str()), err.status),
        None => (banner, status),
    };

    (status, Html(render_dashboard(&user, &list, form, banner))).into_response()
}

pub async fn landing(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let token = session_token(&headers);
    let user = state
        .actions
        .auth
        .current_user(token.as_deref())
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to resolve session: {}", e);
            None
        });

    let call_to_action = if user.is_some() {
        r#"<p><a href="/dashboard">Go to your dashboard</a></p>"#
    } else {
        r#"<p><a href="/signup">Create an account</a> or <a href="/login">log in</a>.</p>"#
    };

    let body = format!(
        r#"<h1>Taskdeck</h1>
        <p>Keep track of what needs doing. Your tasks are private to your account.</p>
        {}"#,
        call_to_action
    );

    Html(layout("Welcome", user.as_ref(), &body))
}

pub async fn login_page() -> Html<String> {
    Html(render_auth_page(AuthPage::Login, "", None))
}

pub async fn signup_page() -> Html<String> {
    Html(render_auth_page(AuthPage::Signup, "", None))
}

async fn auth_submit(state: &AppState, page: AuthPage, input: CredentialsInput) -> Response {
    let result = match page {
        AuthPage::Login => state.actions.sign_in(&input).await,
        AuthPage::Signup => state.actions.sign_up(&input).await,
    };

    match result {
        ActionResult::Success(session) => {
            let mut response = Redirect::to("/dashboard").into_response();
            if let Some(cookie) = session_cookie(&session.token, &state.config) {
                response.headers_mut().insert(SET_COOKIE, cookie);
            }
            response
        },
        ActionResult::Failure(err) => (
            err.status,
            Html(render_auth_page(page, &input.email, Some(&err.message))),
        )
            .into_response(),
    }
}

pub async fn login_submit(
    State(state): State<AppState>,
    Form(input): Form<CredentialsInput>,
) -> Response {
    auth_submit(&state, AuthPage::Login, input).await
}

pub async fn signup_submit(
    State(state): State<AppState>,
    Form(input): Form<CredentialsInput>,
) -> Response {
    auth_submit(&state, AuthPage::Signup, input).await
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = session_token(&headers);
    // Signing out never fails from the visitor's point of view
    let _ = state.actions.sign_out(token.as_deref()).await;

    let mut response = Redirect::to("/").into_response();
    response
        .headers_mut()
        .insert(SET_COOKIE, clear_session_cookie());
    response
}

pub async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = session_token(&headers);
    dashboard_response(
        &state,
        token.as_deref(),
        None,
        &TaskForm::new(),
        None,
        StatusCode::OK,
    )
    .await
}

pub async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(submitted): Form<NewTaskForm>,
) -> Response {
    let token = session_token(&headers);

    let mut form = TaskForm::new();
    form.set_title(submitted.title);
    form.set_description(submitted.description);

    let Some(input) = form.submit() else {
        return dashboard_response(
            &state,
            token.as_deref(),
            None,
            &form,
            None,
            StatusCode::BAD_REQUEST,
        )
        .await;
    };

    let result = state.actions.create_task(token.as_deref(), &input).await;
    let status = match &result {
        ActionResult::Success(_) => return Redirect::to("/dashboard").into_response(),
        ActionResult::Failure(err) => err.status,
    };

    form.finish_submit(result);
    dashboard_response(&state, token.as_deref(), None, &form, None, status).await
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let token = session_token(&headers);

    let mut list = match state.actions.get_tasks(token.as_deref()).await {
        ActionResult::Success(tasks) => TaskList::from_tasks(tasks),
        ActionResult::Failure(err) => {
            return dashboard_response(
                &state,
                token.as_deref(),
                Some(TaskList::default()),
                &TaskForm::new(),
                Some(&err.message),
                err.status,
            )
            .await
        },
    };

    let in_list = list
        .get_mut(&id)
        .and_then(|item| item.begin_toggle())
        .is_some();

    let result = state.actions.toggle_task(token.as_deref(), &id).await;
    let err = match &result {
        ActionResult::Success(_) => return Redirect::to("/dashboard").into_response(),
        ActionResult::Failure(err) => err.clone(),
    };

    if in_list {
        // Roll the row back and show the failure next to it
        if let Some(item) = list.get_mut(&id) {
            item.finish_toggle(result);
        }
        dashboard_response(&state, token.as_deref(), Some(list), &TaskForm::new(), None, err.status)
            .await
    } else {
        dashboard_response(
            &state,
            token.as_deref(),
            Some(list),
            &TaskForm::new(),
            Some(&err.message),
            err.status,
        )
        .await
    }
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let token = session_token(&headers);

    let mut list = match state.actions.get_tasks(token.as_deref()).await {
        ActionResult::Success(tasks) => TaskList::from_tasks(tasks),
        ActionResult::Failure(err) => {
            return dashboard_response(
                &state,
                token.as_deref(),
                Some(TaskList::default()),
                &TaskForm::new(),
                Some(&err.message),
                err.status,
            )
            .await
        },
    };

    let in_list = list
        .get_mut(&id)
        .and_then(|item| item.begin_delete())
        .is_some();

    let result = state.actions.delete_task(token.as_deref(), &id).await;
    let err = match &result {
        ActionResult::Success(_) => return Redirect::to("/dashboard").into_response(),
        ActionResult::Failure(err) => err.clone(),
    };

    if in_list {
        list.finish_delete(&id, result);
        dashboard_response(&state, token.as_deref(), Some(list), &TaskForm::new(), None, err.status)
            .await
    } else {
        dashboard_response(
            &state,
            token.as_deref(),
            Some(list),
            &TaskForm::new(),
            Some(&err.message),
            err.status,
        )
        .await
    }
}

pub async fn robots_txt(State(state): State<AppState>) -> impl IntoResponse {
    let body = if state.config.disable_indexing {
        "User-agent: *\nDisallow: /\n"
    } else {
        "User-agent: *\nAllow: /\n"
    };
    ([(CONTENT_TYPE, "text/plain; charset=utf-8")], body)
}
