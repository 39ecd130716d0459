use anyhow::{Context, Result};
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, StatusCode,
    },
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use super::{pages, routes, session};
use crate::actions::ActionContext;
use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::db::{create_pool, run_migrations};
use crate::gateway::SqliteTaskGateway;
use crate::revisions::ListRevisions;
use crate::tasks::TaskService;

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub actions: ActionContext,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wire the services on top of an already migrated pool.
    pub fn new(pool: SqlitePool, config: AppConfig) -> Result<Self> {
        let store_key = config.require_store_key()?.to_string();

        let tasks = TaskService::new(Arc::new(SqliteTaskGateway::new(pool.clone())));
        let auth = AuthService::new(pool, store_key, config.session_ttl);

        Ok(Self {
            actions: ActionContext::new(
                Arc::new(tasks),
                Arc::new(auth),
                Arc::new(ListRevisions::new()),
            ),
            config: Arc::new(config),
        })
    }
}

/// HTTP server instance
pub struct WebServer {
    addr: SocketAddr,
    config: AppConfig,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

impl WebServer {
    pub fn new(addr: SocketAddr, config: AppConfig) -> Self {
        Self { addr, config }
    }

    /// Run the server until Ctrl-C
    pub async fn run(self) -> Result<()> {
        let db_path = self.config.database_path();
        let pool = create_pool(&db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        let public_url = self.config.public_url.clone();
        let state = AppState::new(pool, self.config)?;
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("Failed to bind to {}", self.addr))?;

        tracing::info!("Taskdeck listening on {}", self.addr);
        tracing::info!("Public URL: {}", public_url);
        tracing::info!("Database: {}", db_path.display());

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        tracing::info!("Taskdeck stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_handler))
        .merge(routes::api_routes());

    let page_routes = Router::new()
        .route("/", get(pages::landing))
        .route("/login", get(pages::login_page).post(pages::login_submit))
        .route("/signup", get(pages::signup_page).post(pages::signup_submit))
        .route("/logout", post(pages::logout))
        .route("/dashboard", get(pages::dashboard))
        .route("/dashboard/tasks", post(pages::create_task))
        .route("/dashboard/tasks/:id/toggle", post(pages::toggle_task))
        .route("/dashboard/tasks/:id/delete", post(pages::delete_task))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::redirect_rules,
        ));

    let disable_indexing = state.config.disable_indexing;
    let cors = cors_layer(&state.config);

    let router = Router::new()
        .merge(page_routes)
        .route("/robots.txt", get(pages::robots_txt))
        .nest("/api", api_routes)
        .fallback(not_found_handler)
        .with_state(state);

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    let router = if disable_indexing {
        router.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-robots-tag"),
            HeaderValue::from_static("noindex, nofollow"),
        ))
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    match HeaderValue::from_str(&config.public_url) {
        Ok(origin) => Some(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
                .allow_headers([CONTENT_TYPE, AUTHORIZATION])
                .allow_credentials(true),
        ),
        Err(e) => {
            tracing::warn!("CORS disabled, public URL is not a valid origin: {}", e);
            None
        },
    }
}

/// Health check handler
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "taskdeck".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// 404 Not Found handler
async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "success": false,
            "error": "Not found",
            "code": "NOT_FOUND"
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            service: "test".to_string(),
            version: "1.0.0".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("test"));
    }

    #[test]
    fn test_cors_layer_for_valid_origin() {
        assert!(cors_layer(&AppConfig::default()).is_some());
    }

    #[tokio::test]
    async fn test_app_state_requires_store_key() {
        let dir = tempfile::TempDir::new().unwrap();
        let pool = create_pool(&dir.path().join("app.db")).await.unwrap();

        assert!(AppState::new(pool.clone(), AppConfig::default()).is_err());

        let config = AppConfig {
            store_key: Some("0123456789abcdef".to_string()),
            ..AppConfig::default()
        };
        assert!(AppState::new(pool, config).is_ok());
    }
}
