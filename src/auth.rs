//! Accounts and sessions.
//!
//! Passwords are stored as argon2 PHC strings. Session tokens are random 256-bit
//! values handed to the client; the store only keeps a SHA-256 digest of the token
//! peppered with the configured store key.

use crate::db::models::{Session, User, UserCredentials};
use crate::error::{AppError, Result};
use crate::validation::CredentialsInput;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::fmt;
use std::sync::OnceLock;

const MSG_INVALID_CREDENTIALS: &str = "Invalid email or password";
const MSG_EMAIL_TAKEN: &str = "An account with this email already exists";

/// Opaque bearer token identifying a session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rng().fill(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

pub struct AuthService {
    pool: SqlitePool,
    store_key: String,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(pool: SqlitePool, store_key: impl Into<String>, session_ttl: Duration) -> Self {
        Self {
            pool,
            store_key: store_key.into(),
            session_ttl,
        }
    }

    /// Register a new account and open a session for it.
    pub async fn sign_up(&self, input: &CredentialsInput) -> Result<(User, SessionToken)> {
        let credentials = input.check_signup()?;

        let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(&credentials.email)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::Validation(MSG_EMAIL_TAKEN.to_string()));
        }

        let password = credentials.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to create account: {}", e)))??;

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: credentials.email,
            created_at: Utc::now(),
        };

        let inserted = sqlx::query(
            "INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {},
            // Lost a race with a concurrent signup for the same email
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(AppError::Validation(MSG_EMAIL_TAKEN.to_string()));
            },
            Err(e) => return Err(e.into()),
        }

        let token = self.open_session(&user.id).await?;
        tracing::info!(user_id = %user.id, "Account created");
        Ok((user, token))
    }

    /// Verify credentials and open a session.
    ///
    /// Unknown emails and wrong passwords produce the same error.
    pub async fn sign_in(&self, input: &CredentialsInput) -> Result<(User, SessionToken)> {
        let credentials = input.check_login()?;

        let row = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(&credentials.email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            // Spend the same hashing work as a real check
            let password = credentials.password.clone();
            tokio::task::spawn_blocking(move || {
                if let Some(stored) = placeholder_hash() {
                    verify_password(&password, stored);
                }
            })
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to sign in: {}", e)))?;
            tracing::info!("Sign-in rejected: unknown account");
            return Err(AppError::Auth(MSG_INVALID_CREDENTIALS.to_string()));
        };

        let stored = row.password_hash.clone();
        let password = credentials.password.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to sign in: {}", e)))?;

        if !valid {
            tracing::info!(user_id = %row.id, "Sign-in rejected: wrong password");
            return Err(AppError::Auth(MSG_INVALID_CREDENTIALS.to_string()));
        }

        self.purge_expired_sessions().await?;
        let token = self.open_session(&row.id).await?;
        tracing::info!(user_id = %row.id, "Signed in");
        Ok((row.into(), token))
    }

    /// End the session behind `token`. Unknown tokens are ignored.
    pub async fn sign_out(&self, token: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(self.digest(token))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::info!("Signed out");
        }
        Ok(())
    }

    /// The account behind `token`, or `None` for a missing, unknown or expired session.
    pub async fn current_user(&self, token: Option<&str>) -> Result<Option<User>> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        let token_hash = self.digest(token);

        let session = sqlx::query_as::<_, Session>(
            "SELECT token_hash, user_id, created_at, expires_at FROM sessions WHERE token_hash = ?",
        )
        .bind(&token_hash)
        .fetch_optional(&self.pool)
        .await?;

        let Some(session) = session else {
            return Ok(None);
        };

        if session.is_expired(Utc::now()) {
            sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
                .bind(&token_hash)
                .execute(&self.pool)
                .await?;
            tracing::debug!(user_id = %session.user_id, "Session expired");
            return Ok(None);
        }

        let user = sqlx::query_as::<_, User>("SELECT id, email, created_at FROM users WHERE id = ?")
            .bind(&session.user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Like [`current_user`](Self::current_user) but fails with "Unauthorized".
    pub async fn require_auth(&self, token: Option<&str>) -> Result<User> {
        self.current_user(token)
            .await?
            .ok_or_else(AppError::unauthorized)
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn open_session(&self, user_id: &str) -> Result<SessionToken> {
        let token = SessionToken::generate();
        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.session_ttl).ok_or_else(|| {
            AppError::Config(format!(
                "Session lifetime of {} hours is out of range",
                self.session_ttl.num_hours()
            ))
        })?;

        sqlx::query(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(self.digest(token.as_str()))
        .bind(user_id)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(token)
    }

    fn digest(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.store_key.as_bytes());
        hasher.update([0u8]);
        hasher.update(token.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
        .map_err(|e| AppError::Gateway(format!("Failed to hash password: {}", e)))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Gateway(format!("Failed to hash password: {}", e)))
}

/// Hash checked against when the account does not exist.
fn placeholder_hash() -> Option<&'static str> {
    static HASH: OnceLock<Option<String>> = OnceLock::new();
    HASH.get_or_init(|| hash_password("taskdeck-placeholder-password").ok())
        .as_deref()
}

fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is unreadable: {}", e);
            false
        },
    }
}
