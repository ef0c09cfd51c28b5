use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment};
use sea_orm::Database;
use serde::Deserialize;
use service::{
    ContentService, IdentityConfig, IdentityService, LogMailer, Mailer, MediaService,
    NotificationService, SmtpMailer, Store, TokenSigner,
};
use tracing::{debug, info, warn};

use crate::schemas::AppState;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://blogsite.db?mode=rwc";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Runtime settings, read once at startup from the environment.
#[derive(Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    /// Signs sessions and reset tokens. A random key is used when unset,
    /// which logs everybody out on restart.
    pub secret_key: Option<String>,
    /// Base of the links put into outgoing mail.
    pub public_url: String,
    pub avatar_dir: PathBuf,
    pub mail_server: String,
    pub mail_port: u16,
    pub mail_sender: String,
    pub email_user: Option<String>,
    pub email_pass: Option<String>,
    pub reset_token_ttl_secs: u64,
    pub session_ttl_hours: u64,
    pub remember_days: u64,
    pub bcrypt_cost: u32,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("database_url", &self.database_url)
            .field("bind_address", &self.bind_address)
            .field("public_url", &self.public_url)
            .field("avatar_dir", &self.avatar_dir)
            .field("mail_server", &self.mail_server)
            .field("mail_port", &self.mail_port)
            .field("mail_sender", &self.mail_sender)
            .field("email_user", &self.email_user)
            .field("reset_token_ttl_secs", &self.reset_token_ttl_secs)
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("remember_days", &self.remember_days)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Loads `.env` if present, then reads the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_environment(Environment::default().try_parsing(true))
    }

    /// Reads settings from an explicit variable map instead of the process
    /// environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::from_environment(Environment::default().try_parsing(true).source(Some(vars)))
    }

    fn from_environment(environment: Environment) -> Result<Self> {
        let settings = Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("public_url", "http://localhost:3000")?
            .set_default("avatar_dir", "static/profile_pics")?
            .set_default("mail_server", "smtp.googlemail.com")?
            .set_default("mail_port", 587_i64)?
            .set_default("mail_sender", "noreply@demo.com")?
            .set_default("reset_token_ttl_secs", 1800_i64)?
            .set_default("session_ttl_hours", 24_i64)?
            .set_default("remember_days", 365_i64)?
            .set_default("bcrypt_cost", bcrypt_default_cost())?
            .add_source(environment)
            .build()
            .context("Failed to read configuration")?;

        let settings: Settings = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn reset_token_ttl(&self) -> Duration {
        Duration::from_secs(self.reset_token_ttl_secs)
    }

    pub fn identity_config(&self) -> IdentityConfig {
        IdentityConfig {
            bcrypt_cost: self.bcrypt_cost,
            session_ttl: Duration::from_secs(self.session_ttl_hours.saturating_mul(60 * 60)),
            remember_ttl: Duration::from_secs(self.remember_days.saturating_mul(24 * 60 * 60)),
        }
    }

    fn secret(&self) -> Vec<u8> {
        match self.secret_key.as_deref().filter(|key| !key.is_empty()) {
            Some(key) => key.as_bytes().to_vec(),
            None => {
                warn!("SECRET_KEY is not set; using a random key, sessions end on restart");
                rand::random::<[u8; 32]>().to_vec()
            }
        }
    }

    fn mailer(&self) -> Result<Arc<dyn Mailer>> {
        match (&self.email_user, &self.email_pass) {
            (Some(user), Some(pass)) => {
                info!("Sending mail through {}:{}", self.mail_server, self.mail_port);
                let mailer =
                    SmtpMailer::new(&self.mail_server, self.mail_port, user.clone(), pass.clone())?;
                Ok(Arc::new(mailer))
            }
            _ => {
                warn!("EMAIL_USER/EMAIL_PASS not set; outgoing mail is only logged");
                Ok(Arc::new(LogMailer))
            }
        }
    }
}

fn bcrypt_default_cost() -> i64 {
    i64::from(IdentityConfig::default().bcrypt_cost)
}

/// Connect to the database and wire every service together
pub async fn initialize_app_state(settings: &Settings) -> Result<AppState> {
    info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url)
        .await
        .with_context(|| format!("Failed to connect to {}", settings.database_url))?;

    let mailer = settings.mailer()?;
    Ok(build_app_state(db, settings, mailer))
}

/// Wire the services around an existing connection
pub fn build_app_state(
    db: sea_orm::DatabaseConnection,
    settings: &Settings,
    mailer: Arc<dyn Mailer>,
) -> AppState {
    let store = Store::new(db.clone());
    let media = MediaService::new(settings.avatar_dir.clone());
    let identity = IdentityService::new(
        store.clone(),
        TokenSigner::new(&settings.secret()),
        media,
        settings.identity_config(),
    );
    let notifications = NotificationService::new(
        identity.clone(),
        mailer,
        settings.mail_sender.clone(),
        settings.public_url.clone(),
        settings.reset_token_ttl(),
    );

    AppState {
        db,
        identity,
        content: ContentService::new(store),
        notifications,
        avatar_dir: settings.avatar_dir.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_vars(HashMap::new()).unwrap();

        assert_eq!(settings.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(settings.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(settings.mail_server, "smtp.googlemail.com");
        assert_eq!(settings.mail_port, 587);
        assert_eq!(settings.mail_sender, "noreply@demo.com");
        assert_eq!(settings.avatar_dir, PathBuf::from("static/profile_pics"));
        assert_eq!(settings.reset_token_ttl(), Duration::from_secs(1800));
        assert_eq!(settings.bcrypt_cost, IdentityConfig::default().bcrypt_cost);
        assert!(settings.secret_key.is_none());
        assert!(settings.email_user.is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let settings = Settings::from_vars(vars(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("MAIL_PORT", "2525"),
            ("SECRET_KEY", "hunter2"),
            ("REMEMBER_DAYS", "7"),
            ("BCRYPT_COST", "4"),
        ]))
        .unwrap();

        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.mail_port, 2525);
        assert_eq!(settings.secret_key.as_deref(), Some("hunter2"));
        assert_eq!(settings.bcrypt_cost, 4);
        assert_eq!(
            settings.identity_config().remember_ttl,
            Duration::from_secs(7 * 24 * 60 * 60)
        );
    }

    #[test]
    fn test_huge_lifetimes_saturate() {
        let settings = Settings::from_vars(vars(&[
            ("SESSION_TTL_HOURS", "9223372036854775807"),
            ("REMEMBER_DAYS", "9223372036854775807"),
        ]))
        .unwrap();

        let config = settings.identity_config();
        assert_eq!(config.session_ttl, Duration::from_secs(u64::MAX));
        assert_eq!(config.remember_ttl, Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_secret_is_random_when_unset() {
        let settings = Settings::from_vars(HashMap::new()).unwrap();
        let first = settings.secret();
        let second = settings.secret();

        assert_eq!(first.len(), 32);
        assert_ne!(first, second);
    }

    #[test]
    fn test_debug_hides_credentials() {
        let settings = Settings::from_vars(vars(&[
            ("SECRET_KEY", "hunter2"),
            ("EMAIL_PASS", "smtp-password"),
        ]))
        .unwrap();

        let printed = format!("{:?}", settings);
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("smtp-password"));
    }
}
