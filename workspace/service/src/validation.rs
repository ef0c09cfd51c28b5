//! Shape rules for the data the services accept.
//!
//! Uniqueness rules need the database and live in the services themselves.

use std::borrow::Cow;

use serde::Deserialize;
use validator::{Validate, ValidationError};

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const USERNAME_LENGTH_MESSAGE: &str = "Field must be between 2 and 20 characters long.";
pub const EMAIL_MESSAGE: &str = "Invalid email address.";
pub const TITLE_LENGTH_MESSAGE: &str = "Field cannot be longer than 100 characters.";

/// Rejects empty and whitespace-only input.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(Cow::Borrowed(REQUIRED_MESSAGE));
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Registration {
    #[validate(
        custom(function = "not_blank"),
        length(min = 2, max = 20, message = "Field must be between 2 and 20 characters long.")
    )]
    pub username: String,
    #[validate(
        custom(function = "not_blank"),
        email(message = "Invalid email address.")
    )]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AccountUpdate {
    #[validate(
        custom(function = "not_blank"),
        length(min = 2, max = 20, message = "Field must be between 2 and 20 characters long.")
    )]
    pub username: String,
    #[validate(
        custom(function = "not_blank"),
        email(message = "Invalid email address.")
    )]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PostInput {
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "Field cannot be longer than 100 characters.")
    )]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPassword {
    #[validate(custom(function = "not_blank"))]
    pub password: String,
}
