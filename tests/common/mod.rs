//! Common utilities for integration tests

#![allow(dead_code)]

use assert_cmd::Command;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, Response, StatusCode},
    Router,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use taskdeck::config::AppConfig;
use taskdeck::db::{create_pool, run_migrations};
use taskdeck::web::server::{create_router, AppState};
use tempfile::TempDir;
use tower::ServiceExt;

pub const STORE_KEY: &str = "integration-store-key-0123";
pub const PASSWORD: &str = "correct horse battery";

/// Path to the `taskdeck` binary built for this test run
#[allow(deprecated)]
pub fn taskdeck_binary() -> PathBuf {
    std::env::var("CARGO_BIN_EXE_taskdeck")
        .map(PathBuf::from)
        .unwrap_or_else(|_| assert_cmd::cargo::cargo_bin("taskdeck"))
}

/// `taskdeck` command with its configuration isolated to `db_path`
pub fn taskdeck_command(db_path: &Path) -> Command {
    let mut cmd = Command::new(taskdeck_binary());
    cmd.env("TASKDECK_DATABASE_URL", format!("sqlite://{}", db_path.display()))
        .env("TASKDECK_STORE_KEY", STORE_KEY)
        .env_remove("TASKDECK_PUBLIC_URL")
        .env_remove("TASKDECK_DISABLE_INDEXING")
        .env_remove("TASKDECK_SESSION_TTL_HOURS")
        .env_remove("RUST_LOG");
    cmd
}

/// A router backed by a fresh database in a temp dir
pub struct TestApp {
    pub router: Router,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(configure: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = dir.path().join("taskdeck.db");

        let pool = create_pool(&db_path).await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let mut config = AppConfig {
            database_url: format!("sqlite://{}", db_path.display()),
            store_key: Some(STORE_KEY.to_string()),
            ..AppConfig::default()
        };
        configure(&mut config);

        let state = AppState::new(pool, config).expect("Failed to build state");
        Self {
            router: create_router(state),
            _dir: dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed")
    }

    /// Send a JSON request, optionally authenticated with a bearer token
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.send(request).await;
        let status = response.status();
        let headers = response.headers().clone();
        let body = body_text(response).await;
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).unwrap_or(Value::Null)
        };
        (status, headers, json)
    }

    /// Send an urlencoded form post, optionally carrying the session cookie
    pub async fn form(&self, uri: &str, cookie: Option<&str>, body: &str) -> Response<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn get_page(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Register through the API and return the session token
    pub async fn sign_up(&self, email: &str) -> String {
        let (status, _, body) = self
            .json(
                Method::POST,
                "/api/auth/signup",
                None,
                Some(serde_json::json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "signup failed: {}", body);
        body["data"]["token"]
            .as_str()
            .expect("signup returns a token")
            .to_string()
    }

    /// Create a task through the API and return its id
    pub async fn create_task(&self, token: &str, title: &str) -> String {
        let (status, _, body) = self
            .json(
                Method::POST,
                "/api/tasks",
                Some(token),
                Some(serde_json::json!({ "title": title })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8_lossy(&bytes).into_owned()
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// `name=value` pair from the response's session `Set-Cookie`, ready for a `Cookie` header
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("taskdeck_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
