use crate::error::{AppError, Result};
use chrono::Duration;
use std::path::PathBuf;

const DEFAULT_DATABASE_URL: &str = "sqlite://taskdeck.db";
const DEFAULT_PUBLIC_URL: &str = "http://127.0.0.1:3030";
const DEFAULT_SESSION_TTL_HOURS: i64 = 168;
const MAX_SESSION_TTL_HOURS: i64 = 87_600;
const MIN_STORE_KEY_LEN: usize = 16;

/// Application configuration parsed from environment variables.
///
/// Optional:
///   TASKDECK_DATABASE_URL     : `sqlite://path` or a plain path, defaults to `sqlite://taskdeck.db`
///   TASKDECK_STORE_KEY        : pepper for session token digests (required by `serve` and `purge-sessions`)
///   TASKDECK_PUBLIC_URL       : public app URL, defaults to `http://127.0.0.1:3030`
///   TASKDECK_DISABLE_INDEXING : `true` opts the site out of search indexing
///   TASKDECK_SESSION_TTL_HOURS: session lifetime, defaults to 168 (one week), at most 87600 (ten years)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub store_key: Option<String>,
    pub public_url: String,
    pub disable_indexing: bool,
    pub session_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            store_key: None,
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            disable_indexing: false,
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        }
    }
}

impl AppConfig {
    /// Parse configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup("TASKDECK_DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.database_url);

        let store_key = lookup("TASKDECK_STORE_KEY").filter(|v| !v.is_empty());
        if let Some(key) = &store_key {
            if key.len() < MIN_STORE_KEY_LEN {
                return Err(AppError::Config(format!(
                    "TASKDECK_STORE_KEY must be at least {} characters",
                    MIN_STORE_KEY_LEN
                )));
            }
        }

        let public_url = match lookup("TASKDECK_PUBLIC_URL").filter(|v| !v.trim().is_empty()) {
            Some(url) => {
                let url = url.trim().trim_end_matches('/').to_string();
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(AppError::Config(format!(
                        "TASKDECK_PUBLIC_URL must start with http:// or https://, got '{}'",
                        url
                    )));
                }
                url
            },
            None => defaults.public_url,
        };

        let disable_indexing = match lookup("TASKDECK_DISABLE_INDEXING") {
            Some(raw) => parse_bool("TASKDECK_DISABLE_INDEXING", &raw)?,
            None => defaults.disable_indexing,
        };

        let session_ttl = match lookup("TASKDECK_SESSION_TTL_HOURS") {
            Some(raw) => {
                let hours: i64 = raw.trim().parse().map_err(|_| {
                    AppError::Config(format!(
                        "TASKDECK_SESSION_TTL_HOURS must be a positive integer, got '{}'",
                        raw
                    ))
                })?;
                Some(hours)
                    .filter(|h| (1..=MAX_SESSION_TTL_HOURS).contains(h))
                    .and_then(Duration::try_hours)
                    .ok_or_else(|| {
                        AppError::Config(format!(
                            "TASKDECK_SESSION_TTL_HOURS must be between 1 and {}, got {}",
                            MAX_SESSION_TTL_HOURS, hours
                        ))
                    })?
            },
            None => defaults.session_ttl,
        };

        Ok(Self {
            database_url,
            store_key,
            public_url,
            disable_indexing,
            session_ttl,
        })
    }

    /// Filesystem path of the SQLite database named by `database_url`.
    pub fn database_path(&self) -> PathBuf {
        let raw = self
            .database_url
            .strip_prefix("sqlite://")
            .or_else(|| self.database_url.strip_prefix("sqlite:"))
            .unwrap_or(&self.database_url);
        PathBuf::from(raw)
    }

    /// The store key, or a configuration error when it is missing.
    pub fn require_store_key(&self) -> Result<&str> {
        self.store_key.as_deref().ok_or_else(|| {
            AppError::Config("TASKDECK_STORE_KEY environment variable not set".to_string())
        })
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Config(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}
