use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use service::{FormErrors, ServiceError};
use tracing::{debug, error, info, instrument};
use validator::Validate;

use crate::error::AppResult;
use crate::flash::FlashCategory;
use crate::forms::{EmptyFields, RequestResetForm, ResetPasswordForm};
use crate::schemas::{AppState, FormData};
use crate::session::MaybeUser;
use crate::views;

pub const RESET_SENT_MESSAGE: &str = "An email has been sent with instructions to reset your password.";
pub const INVALID_TOKEN_MESSAGE: &str = "That is an invalid or expired token";
pub const PASSWORD_UPDATED_MESSAGE: &str = "Your password has been updated! You are now able to log in";

const TITLE: &str = "Reset Password";

pub async fn request_form(MaybeUser(user): MaybeUser, jar: CookieJar) -> Response {
    if user.is_some() {
        return views::redirect(jar, "/");
    }
    views::page(jar, TITLE, FormData::new(RequestResetForm::default(), FormErrors::new()))
}

/// Answers the same way whether or not the address has an account. The
/// mail goes out in the background.
#[instrument(skip_all)]
pub async fn request_reset(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Form(form): Form<RequestResetForm>,
) -> Response {
    if user.is_some() {
        return views::redirect(jar, "/");
    }

    let errors = FormErrors::from(form.validate());
    if !errors.is_empty() {
        return views::render(
            jar,
            StatusCode::UNPROCESSABLE_ENTITY,
            TITLE,
            FormData::new(form, errors),
            Vec::new(),
        );
    }

    let notifications = state.notifications.clone();
    let email = form.email;
    tokio::spawn(async move {
        match notifications.request_password_reset(&email).await {
            Ok(true) => info!("Password reset mail dispatched"),
            Ok(false) => debug!("No account for password reset request"),
            Err(e) => error!("Failed to send password reset mail: {}", e),
        }
    });

    views::redirect_with_flash(jar, "/login", FlashCategory::Info, RESET_SENT_MESSAGE)
}

fn invalid_token(jar: CookieJar) -> Response {
    views::redirect_with_flash(jar, "/reset_password", FlashCategory::Warning, INVALID_TOKEN_MESSAGE)
}

#[instrument(skip_all)]
pub async fn reset_form(
    State(state): State<AppState>,
    Path(token): Path<String>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
) -> AppResult<Response> {
    if user.is_some() {
        return Ok(views::redirect(jar, "/"));
    }
    if state.identity.verify_reset_token(&token).await?.is_none() {
        return Ok(invalid_token(jar));
    }
    Ok(views::page(jar, TITLE, FormData::new(EmptyFields::default(), FormErrors::new())))
}

#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Form(form): Form<ResetPasswordForm>,
) -> AppResult<Response> {
    if user.is_some() {
        return Ok(views::redirect(jar, "/"));
    }
    let Some(owner) = state.identity.verify_reset_token(&token).await? else {
        return Ok(invalid_token(jar));
    };

    let errors = FormErrors::from(form.validate());
    if !errors.is_empty() {
        return Ok(password_page(jar, errors));
    }

    match state.identity.reset_password(&owner, form.password).await {
        Ok(_) => Ok(views::redirect_with_flash(
            jar,
            "/login",
            FlashCategory::Success,
            PASSWORD_UPDATED_MESSAGE,
        )),
        Err(ServiceError::Validation(errors)) => Ok(password_page(jar, errors)),
        Err(err) => Err(err.into()),
    }
}

fn password_page(jar: CookieJar, errors: FormErrors) -> Response {
    views::render(
        jar,
        StatusCode::UNPROCESSABLE_ENTITY,
        TITLE,
        FormData::new(EmptyFields::default(), errors),
        Vec::new(),
    )
}
