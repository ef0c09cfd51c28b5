use std::time::Duration;

use model::entities::user;
use sea_orm::{DbErr, SqlErr, Set};
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::error::{FormErrors, Result, ServiceError};
use crate::media::{AvatarUpload, EXTENSION_MESSAGE, MediaService, allowed_extension};
use crate::store::Store;
use crate::tokens::{TokenPurpose, TokenSigner};
use crate::validation::{AccountUpdate, NewPassword, Registration};

pub const USERNAME_TAKEN_MESSAGE: &str = "That username is taken. Please choose a different one.";
pub const EMAIL_TAKEN_MESSAGE: &str = "That email is taken. Please choose a different one.";

/// Default lifetime of a password reset token.
pub const DEFAULT_RESET_TOKEN_TTL: Duration = Duration::from_secs(1800);

/// Knobs for hashing and token lifetimes.
#[derive(Clone, Debug)]
pub struct IdentityConfig {
    pub bcrypt_cost: u32,
    /// Lifetime of a session started without "remember me".
    pub session_ttl: Duration,
    /// Lifetime of a remembered session.
    pub remember_ttl: Duration,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
            session_ttl: Duration::from_secs(24 * 60 * 60),
            remember_ttl: Duration::from_secs(365 * 24 * 60 * 60),
        }
    }
}

/// A freshly signed session and how long the client should keep it.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub token: String,
    /// `None` means the cookie should die with the browser session.
    pub max_age: Option<Duration>,
}

/// Accounts, credentials, sessions and password resets.
#[derive(Clone, Debug)]
pub struct IdentityService {
    store: Store,
    tokens: TokenSigner,
    media: MediaService,
    config: IdentityConfig,
}

impl IdentityService {
    pub fn new(store: Store, tokens: TokenSigner, media: MediaService, config: IdentityConfig) -> Self {
        Self {
            store,
            tokens,
            media,
            config,
        }
    }

    /// Shape and uniqueness problems with a registration, all at once.
    pub async fn check_registration(&self, registration: &Registration) -> Result<FormErrors> {
        let mut errors = FormErrors::from(registration.validate());
        if !errors.contains("username")
            && self.store.user_by_username(&registration.username).await?.is_some()
        {
            errors.add("username", USERNAME_TAKEN_MESSAGE);
        }
        if !errors.contains("email") && self.store.user_by_email(&registration.email).await?.is_some() {
            errors.add("email", EMAIL_TAKEN_MESSAGE);
        }
        Ok(errors)
    }

    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: Registration) -> Result<user::Model> {
        self.check_registration(&registration).await?.into_result()?;

        let password_hash = self.hash_password(registration.password).await?;
        let user = self
            .store
            .insert_user(&registration.username, &registration.email, password_hash)
            .await
            .map_err(unique_violation_as_conflict)?;

        info!("Registered user {} with ID {}", user.username, user.id);
        Ok(user)
    }

    /// The user owning `email`, if `password` matches. Unknown emails and
    /// wrong passwords fail identically.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<user::Model> {
        let Some(user) = self.store.user_by_email(email).await? else {
            debug!("No account for login attempt");
            return Err(ServiceError::AuthenticationFailed);
        };

        let hash = user.password.clone();
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await?;

        match matches {
            Ok(true) => {
                info!("User {} authenticated", user.id);
                Ok(user)
            }
            Ok(false) => {
                debug!("Password mismatch for user {}", user.id);
                Err(ServiceError::AuthenticationFailed)
            }
            Err(e) => {
                warn!("Stored hash for user {} is unusable: {}", user.id, e);
                Err(ServiceError::AuthenticationFailed)
            }
        }
    }

    pub async fn user_with_email(&self, email: &str) -> Result<Option<user::Model>> {
        Ok(self.store.user_by_email(email).await?)
    }

    pub fn start_session(&self, user: &user::Model, remember: bool) -> Result<SessionGrant> {
        let (ttl, max_age) = if remember {
            (self.config.remember_ttl, Some(self.config.remember_ttl))
        } else {
            (self.config.session_ttl, None)
        };
        let token = self.tokens.sign(TokenPurpose::Session, user.id, ttl)?;
        Ok(SessionGrant { token, max_age })
    }

    /// The user a session token belongs to. Invalid tokens and deleted
    /// users both resolve to `None`.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<user::Model>> {
        match self.tokens.verify(TokenPurpose::Session, token) {
            Some(user_id) => Ok(self.store.user_by_id(user_id).await?),
            None => Ok(None),
        }
    }

    /// Shape problems, plus uniqueness problems for values that differ
    /// from the user's current ones.
    pub async fn check_account_update(
        &self,
        user: &user::Model,
        update: &AccountUpdate,
        picture: Option<&AvatarUpload>,
    ) -> Result<FormErrors> {
        let mut errors = FormErrors::from(update.validate());
        if !errors.contains("username")
            && update.username != user.username
            && self.store.user_by_username(&update.username).await?.is_some()
        {
            errors.add("username", USERNAME_TAKEN_MESSAGE);
        }
        if !errors.contains("email")
            && update.email != user.email
            && self.store.user_by_email(&update.email).await?.is_some()
        {
            errors.add("email", EMAIL_TAKEN_MESSAGE);
        }
        if let Some(picture) = picture {
            if allowed_extension(&picture.file_name).is_none() {
                errors.add("picture", EXTENSION_MESSAGE);
            }
        }
        Ok(errors)
    }

    /// Applies new username/email and, when given, a new avatar.
    ///
    /// Everything is validated before the avatar touches the disk. The
    /// avatar file is written before the row is updated; if the update
    /// fails the file stays behind.
    #[instrument(skip(self, user, update, picture), fields(user_id = user.id))]
    pub async fn update_account(
        &self,
        user: &user::Model,
        update: AccountUpdate,
        picture: Option<AvatarUpload>,
    ) -> Result<user::Model> {
        self.check_account_update(user, &update, picture.as_ref())
            .await?
            .into_result()?;

        let mut changes: user::ActiveModel = user.clone().into();
        if let Some(picture) = picture {
            let image_file = self.media.save_avatar(picture).await?;
            changes.image_file = Set(image_file);
        }
        changes.username = Set(update.username);
        changes.email = Set(update.email);

        let updated = self
            .store
            .update_user(changes)
            .await
            .map_err(unique_violation_as_conflict)?;
        info!("Updated account {}", updated.id);
        Ok(updated)
    }

    pub fn issue_reset_token(&self, user: &user::Model, ttl: Duration) -> Result<String> {
        self.tokens.sign(TokenPurpose::PasswordReset, user.id, ttl)
    }

    /// The user a reset token was issued for, or `None` for any token that
    /// is malformed, tampered with, expired or names a missing user.
    pub async fn verify_reset_token(&self, token: &str) -> Result<Option<user::Model>> {
        match self.tokens.verify(TokenPurpose::PasswordReset, token) {
            Some(user_id) => Ok(self.store.user_by_id(user_id).await?),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, user, new_password), fields(user_id = user.id))]
    pub async fn reset_password(&self, user: &user::Model, new_password: String) -> Result<user::Model> {
        FormErrors::from(
            NewPassword {
                password: new_password.clone(),
            }
            .validate(),
        )
        .into_result()?;

        let mut changes: user::ActiveModel = user.clone().into();
        changes.password = Set(self.hash_password(new_password).await?);
        let updated = self.store.update_user(changes).await?;
        info!("Password reset for user {}", updated.id);
        Ok(updated)
    }

    async fn hash_password(&self, password: String) -> Result<String> {
        let cost = self.config.bcrypt_cost;
        Ok(tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??)
    }
}

fn unique_violation_as_conflict(err: DbErr) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            warn!("Unique constraint fired after validation: {}", detail);
            ServiceError::Conflict("Username or email is already in use".to_string())
        }
        _ => ServiceError::Database(err),
    }
}
