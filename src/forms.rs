//! Submitted forms and query strings, plus what of them is echoed back.

use serde::{Deserialize, Serialize};
use service::validation::{AccountUpdate, PostInput, Registration, not_blank};
use utoipa::IntoParams;
use validator::Validate;

pub const CONFIRM_MESSAGE: &str = "Field must be equal to password.";

#[derive(Debug, Default, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    #[validate(
        custom(function = "not_blank"),
        must_match(other = "password", message = "Field must be equal to password.")
    )]
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn registration(&self) -> Registration {
        Registration {
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }

    pub fn fields(&self) -> RegisterFields {
        RegisterFields {
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// What a registration page shows back; passwords are never echoed.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RegisterFields {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Default, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(
        custom(function = "not_blank"),
        email(message = "Invalid email address.")
    )]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
    /// Present when the "remember me" box is ticked
    pub remember: Option<String>,
}

impl LoginForm {
    pub fn remember(&self) -> bool {
        self.remember
            .as_deref()
            .is_some_and(|v| !v.is_empty() && v != "false" && v != "0")
    }

    pub fn fields(&self) -> LoginFields {
        LoginFields {
            email: self.email.clone(),
            remember: self.remember(),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct LoginFields {
    pub email: String,
    pub remember: bool,
}

/// Username and email as shown on the account page
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AccountFields {
    pub username: String,
    pub email: String,
}

impl From<&AccountFields> for AccountUpdate {
    fn from(fields: &AccountFields) -> Self {
        AccountUpdate {
            username: fields.username.clone(),
            email: fields.email.clone(),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub content: String,
}

impl From<&PostForm> for PostInput {
    fn from(form: &PostForm) -> Self {
        PostInput {
            title: form.title.clone(),
            content: form.content.clone(),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RequestResetForm {
    #[validate(
        custom(function = "not_blank"),
        email(message = "Invalid email address.")
    )]
    pub email: String,
}

#[derive(Debug, Default, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct ResetPasswordForm {
    #[validate(custom(function = "not_blank"))]
    pub password: String,
    #[validate(
        custom(function = "not_blank"),
        must_match(other = "password", message = "Field must be equal to password.")
    )]
    pub confirm_password: String,
}

/// Nothing of a password form is echoed back.
#[derive(Debug, Default, Clone, Serialize)]
pub struct EmptyFields {}

/// `?page=` of the listings. Anything that is not a number means page 1.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
    }
}

/// `?next=` of the login page
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}
