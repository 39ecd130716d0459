//! Input schemas for task and account operations.
//!
//! Each schema deserializes from request bodies and form posts, and turns into a
//! validated value (or a list of field errors) before anything reaches the store.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
pub const EMAIL_MAX_CHARS: usize = 254;
pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 128;
const TASK_ID_MAX_CHARS: usize = 64;

pub const MSG_TITLE_REQUIRED: &str = "Title is required";
pub const MSG_TITLE_TOO_LONG: &str = "Title must be 200 characters or less";
pub const MSG_DESCRIPTION_TOO_LONG: &str = "Description must be 1000 characters or less";

/// Per-field validation failures, rendered inline next to form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First message recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    fn into_result<T>(self, value: T) -> std::result::Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        let message = errors
            .errors
            .first()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| "Invalid input".to_string());
        AppError::Validation(message)
    }
}

/// Body of a create-task request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTaskInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A title and description that passed the creation schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
}

impl CreateTaskInput {
    pub fn check(&self) -> std::result::Result<NewTask, FieldErrors> {
        let mut errors = FieldErrors::default();
        let title = check_title(&self.title, &mut errors);
        let description = self
            .description
            .as_deref()
            .map(|d| check_description(d, &mut errors));
        errors.into_result(NewTask { title, description })
    }

    pub fn validate(&self) -> Result<NewTask> {
        Ok(self.check()?)
    }
}

/// Body of an edit-task request. Absent fields are left unchanged; an empty
/// description clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
}

impl UpdateTaskInput {
    pub fn check(&self) -> std::result::Result<TaskChanges, FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.title.is_none() && self.description.is_none() {
            errors.push("title", "Nothing to update");
            return Err(errors);
        }

        let title = self.title.as_deref().map(|t| check_title(t, &mut errors));
        let description = self.description.as_deref().map(|d| match d {
            "" => None,
            d => Some(check_description(d, &mut errors)),
        });

        errors.into_result(TaskChanges { title, description })
    }

    pub fn validate(&self) -> Result<TaskChanges> {
        Ok(self.check()?)
    }
}

/// Task ids are uuids; anything else cannot name a stored task.
pub fn validate_task_id(id: &str) -> Result<String> {
    let id = id.trim();
    if id.is_empty() || id.chars().count() > TASK_ID_MAX_CHARS {
        return Err(AppError::Validation("Invalid task id".to_string()));
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(AppError::Validation("Invalid task id".to_string()));
    }
    Ok(id.to_string())
}

/// Email and password, as submitted to the login and signup forms.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl CredentialsInput {
    /// Signup schema: well-formed email and a password within length bounds.
    pub fn check_signup(&self) -> std::result::Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::default();
        let email = normalize_email(&self.email);

        if email.is_empty() {
            errors.push("email", "Email is required");
        } else if email.chars().count() > EMAIL_MAX_CHARS || !looks_like_email(&email) {
            errors.push("email", "Please enter a valid email address");
        }

        let len = self.password.chars().count();
        if len < PASSWORD_MIN_CHARS {
            errors.push("password", "Password must be at least 8 characters");
        } else if len > PASSWORD_MAX_CHARS {
            errors.push("password", "Password must be 128 characters or less");
        }

        errors.into_result(Credentials {
            email,
            password: self.password.clone(),
        })
    }

    /// Login schema: both fields present. Lengths are not revealed here.
    pub fn check_login(&self) -> std::result::Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::default();
        let email = normalize_email(&self.email);

        if email.is_empty() {
            errors.push("email", "Email is required");
        }
        if self.password.is_empty() {
            errors.push("password", "Password is required");
        }

        errors.into_result(Credentials {
            email,
            password: self.password.clone(),
        })
    }
}

/// Titles are stored exactly as submitted, whitespace included.
fn check_title(raw: &str, errors: &mut FieldErrors) -> String {
    if raw.is_empty() {
        errors.push("title", MSG_TITLE_REQUIRED);
    } else if raw.chars().count() > TITLE_MAX_CHARS {
        errors.push("title", MSG_TITLE_TOO_LONG);
    }
    raw.to_string()
}

fn check_description(raw: &str, errors: &mut FieldErrors) -> String {
    if raw.chars().count() > DESCRIPTION_MAX_CHARS {
        errors.push("description", MSG_DESCRIPTION_TOO_LONG);
    }
    raw.to_string()
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(title: &str, description: Option<&str>) -> CreateTaskInput {
        CreateTaskInput {
            title: title.to_string(),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn test_create_accepts_boundary_lengths() {
        for len in [1, 2, 199, 200] {
            let title = "t".repeat(len);
            for description in [None, Some(String::new()), Some("d".repeat(1000))] {
                let input = CreateTaskInput {
                    title: title.clone(),
                    description: description.clone(),
                };
                let valid = input.validate().unwrap();
                assert_eq!(valid.title, title);
                assert_eq!(valid.description, description);
            }
        }
    }

    #[test]
    fn test_create_rejects_empty_title() {
        let err = create("", None).validate().unwrap_err();
        assert_eq!(err.to_string(), MSG_TITLE_REQUIRED);
    }

    #[test]
    fn test_create_keeps_whitespace() {
        let valid = create("  Buy milk ", Some(" two ")).validate().unwrap();
        assert_eq!(valid.title, "  Buy milk ");
        assert_eq!(valid.description.as_deref(), Some(" two "));

        // A single space is a one-character title
        let valid = create(" ", None).validate().unwrap();
        assert_eq!(valid.title, " ");

        // Padding counts toward the limit
        let padded = format!(" {}", "t".repeat(200));
        assert!(create(&padded, None).validate().is_err());
    }

    #[test]
    fn test_create_rejects_long_fields() {
        let err = create(&"x".repeat(201), None).validate().unwrap_err();
        assert_eq!(err.to_string(), MSG_TITLE_TOO_LONG);

        let err = create("ok", Some(&"x".repeat(1001))).validate().unwrap_err();
        assert_eq!(err.to_string(), MSG_DESCRIPTION_TOO_LONG);
    }

    #[test]
    fn test_lengths_count_characters_not_bytes() {
        // 200 multi-byte characters is still within the limit
        let title = "任".repeat(200);
        assert!(create(&title, None).validate().is_ok());
        assert!(create(&"任".repeat(201), None).validate().is_err());
    }

    #[test]
    fn test_create_collects_all_field_errors() {
        let errors = create("", Some(&"x".repeat(1001))).check().unwrap_err();
        assert_eq!(errors.get("title"), Some(MSG_TITLE_REQUIRED));
        assert_eq!(errors.get("description"), Some(MSG_DESCRIPTION_TOO_LONG));
    }

    #[test]
    fn test_update_requires_a_field() {
        let err = UpdateTaskInput::default().validate().unwrap_err();
        assert_eq!(err.to_string(), "Nothing to update");
    }

    #[test]
    fn test_update_clears_description() {
        let changes = UpdateTaskInput {
            title: None,
            description: Some(String::new()),
        }
        .validate()
        .unwrap();
        assert_eq!(changes.title, None);
        assert_eq!(changes.description, Some(None));

        let changes = UpdateTaskInput {
            title: Some(" padded ".to_string()),
            description: Some("  ".to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(changes.title.as_deref(), Some(" padded "));
        assert_eq!(changes.description, Some(Some("  ".to_string())));
    }

    #[test]
    fn test_update_validates_title() {
        let err = UpdateTaskInput {
            title: Some(String::new()),
            description: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), MSG_TITLE_REQUIRED);
    }

    #[test]
    fn test_task_id() {
        assert!(validate_task_id("3f2b8c1e-1111-4222-8333-444455556666").is_ok());
        assert!(validate_task_id("").is_err());
        assert!(validate_task_id("1; DROP TABLE tasks").is_err());
        assert!(validate_task_id(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_signup_schema() {
        let ok = CredentialsInput {
            email: "  Alice@Example.COM ".to_string(),
            password: "correct horse".to_string(),
        }
        .check_signup()
        .unwrap();
        assert_eq!(ok.email, "alice@example.com");

        let errors = CredentialsInput {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        }
        .check_signup()
        .unwrap_err();
        assert_eq!(
            errors.get("email"),
            Some("Please enter a valid email address")
        );
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 8 characters")
        );

        for bad in ["a@b@c", "@example.com", "user@", "a b@example.com", "a@.com"] {
            let input = CredentialsInput {
                email: bad.to_string(),
                password: "long enough".to_string(),
            };
            assert!(input.check_signup().is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_login_schema_only_requires_presence() {
        let ok = CredentialsInput {
            email: "a@example.com".to_string(),
            password: "x".to_string(),
        }
        .check_login();
        assert!(ok.is_ok());

        let errors = CredentialsInput::default().check_login().unwrap_err();
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.get("password"), Some("Password is required"));
    }
}
