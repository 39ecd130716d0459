use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::server::AppState;
use crate::config::AppConfig;

pub const SESSION_COOKIE: &str = "taskdeck_session";

/// Session token from an `Authorization: Bearer` header or the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str, config: &AppConfig) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        config.session_ttl.num_seconds()
    );
    if config.secure_cookies() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("taskdeck_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn is_protected(path: &str) -> bool {
    path == "/dashboard" || path.starts_with("/dashboard/")
}

fn is_guest_only(path: &str) -> bool {
    path == "/login" || path == "/signup"
}

/// Page redirect rules:
/// - signed-out visitors of the dashboard are sent to `/login`
/// - signed-in visitors of `/login` or `/signup` are sent to `/dashboard`
pub async fn redirect_rules(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    let protected = is_protected(path);
    let guest_only = is_guest_only(path);

    if !protected && !guest_only {
        return next.run(request).await;
    }

    let token = session_token(request.headers());
    let signed_in = match state.actions.auth.current_user(token.as_deref()).await {
        Ok(user) => user.is_some(),
        Err(e) => {
            tracing::error!("Failed to resolve session: {}", e);
            false
        },
    };

    if protected && !signed_in {
        return Redirect::to("/login").into_response();
    }
    if guest_only && signed_in {
        return Redirect::to("/dashboard").into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; taskdeck_session=abc123; other=1"),
        );
        assert_eq!(session_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("taskdeck_session=cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header"));
        assert_eq!(session_token(&headers), Some("header".to_string()));
    }

    #[test]
    fn test_missing_or_empty_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("taskdeck_session="));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let mut config = AppConfig {
            session_ttl: Duration::hours(1),
            ..AppConfig::default()
        };
        let cookie = session_cookie("tok", &config).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("taskdeck_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(!cookie.contains("Secure"));

        config.public_url = "https://app.example.com".to_string();
        let cookie = session_cookie("tok", &config).unwrap();
        assert!(cookie.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn test_route_classes() {
        assert!(is_protected("/dashboard"));
        assert!(is_protected("/dashboard/tasks"));
        assert!(!is_protected("/dashboards"));
        assert!(is_guest_only("/login"));
        assert!(is_guest_only("/signup"));
        assert!(!is_guest_only("/logout"));
    }
}
