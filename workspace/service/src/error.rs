use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

/// Field name -> human readable messages, in the order they were raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn merge(&mut self, other: FormErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self))
        }
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = FormErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for err in field_errors {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", err.code));
                form_errors.add(&field.to_string(), message);
            }
        }
        form_errors
    }
}

impl From<std::result::Result<(), ValidationErrors>> for FormErrors {
    fn from(result: std::result::Result<(), ValidationErrors>) -> Self {
        match result {
            Ok(()) => FormErrors::new(),
            Err(errors) => errors.into(),
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Error types for the blog services
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Submitted input failed shape or uniqueness checks
    #[error("Validation failed: {0}")]
    Validation(FormErrors),

    /// Unknown post or user
    #[error("Not found: {0}")]
    NotFound(String),

    /// Mutation attempted by someone other than the owner
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad credentials; never says which part was wrong
    #[error("Login unsuccessful")]
    AuthenticationFailed,

    /// A unique constraint fired after validation passed (concurrent write)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Error from bcrypt
    #[error("Password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    /// Error while signing a token
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Error while encoding or writing an image
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Error from the filesystem
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from composing or delivering an email
    #[error("Mail error: {0}")]
    Mail(String),

    /// Runtime error for unexpected situations
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl ServiceError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FormErrors::new();
        errors.add(field, message);
        ServiceError::Validation(errors)
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(join_error: tokio::task::JoinError) -> Self {
        let err = ServiceError::Runtime(format!("Blocking task failed: {}", join_error));
        error!(?err, "Blocking task failed");
        err
    }
}

/// Type alias for Result with ServiceError
pub type Result<T> = std::result::Result<T, ServiceError>;
