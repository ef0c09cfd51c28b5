use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use model::entities::user;
use service::{AvatarUpload, FormErrors, ServiceError};
use tracing::{debug, error, info, instrument};

use crate::error::{AppError, AppResult};
use crate::flash::FlashCategory;
use crate::forms::AccountFields;
use crate::schemas::{AccountData, AppState, avatar_url};
use crate::session::CurrentUser;
use crate::views;

pub const ACCOUNT_UPDATED_MESSAGE: &str = "Your account has been updated!";

pub async fn account_page(CurrentUser(user): CurrentUser, jar: CookieJar) -> Response {
    let fields = AccountFields {
        username: user.username.clone(),
        email: user.email.clone(),
    };
    views::page(jar, "Account", account_data(&user, fields, FormErrors::new()))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn update_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    multipart: Multipart,
) -> AppResult<Response> {
    let (fields, picture) = read_account_form(multipart).await?;

    match state
        .identity
        .update_account(&user, (&fields).into(), picture)
        .await
    {
        Ok(updated) => {
            info!("Account {} updated", updated.id);
            Ok(views::redirect_with_flash(
                jar,
                "/account",
                FlashCategory::Success,
                ACCOUNT_UPDATED_MESSAGE,
            ))
        }
        Err(ServiceError::Validation(errors)) => {
            debug!("Account update rejected: {}", errors);
            Ok(views::render(
                jar,
                StatusCode::UNPROCESSABLE_ENTITY,
                "Account",
                account_data(&user, fields, errors),
                Vec::new(),
            ))
        }
        Err(err) => Err(err.into()),
    }
}

fn account_data(user: &user::Model, form: AccountFields, errors: FormErrors) -> AccountData {
    AccountData {
        form,
        errors,
        image_url: avatar_url(&user.image_file),
    }
}

/// Pulls `username`, `email` and the optional `picture` out of the upload.
/// A picture part without a file name or content counts as no picture.
async fn read_account_form(
    mut multipart: Multipart,
) -> AppResult<(AccountFields, Option<AvatarUpload>)> {
    let mut fields = AccountFields::default();
    let mut picture = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Failed to read multipart field: {}", e);
        AppError::BadRequest(e.to_string())
    })? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "username" | "email" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if name == "username" {
                    fields.username = value;
                } else {
                    fields.email = value;
                }
            }
            "picture" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    picture = Some(AvatarUpload {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            other => debug!("Ignoring unexpected form field {}", other),
        }
    }

    Ok((fields, picture))
}
