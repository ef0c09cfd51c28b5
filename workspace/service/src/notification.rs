use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use model::entities::user;
use tracing::{debug, info, instrument};

use crate::error::{Result, ServiceError};
use crate::identity::IdentityService;

pub const RESET_SUBJECT: &str = "Password Reset Request";

/// A plaintext message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

/// Delivers outgoing mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<()>;
}

/// Delivers through an SMTP relay using STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(host: &str, port: u16, username: String, password: String) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| ServiceError::Mail(format!("Invalid SMTP relay {}: {}", host, e)))?
            .port(port)
            .credentials(Credentials::new(username, password))
            .build();
        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip(self, mail), fields(to = %mail.to))]
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        let message = Message::builder()
            .from(parse_mailbox(&mail.from)?)
            .to(parse_mailbox(&mail.to)?)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| ServiceError::Mail(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| ServiceError::Mail(e.to_string()))?;
        info!("Mail delivered");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e| ServiceError::Mail(format!("Invalid address {}: {}", address, e)))
}

/// Writes mail to the log instead of sending it. Used when no SMTP
/// credentials are configured.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        info!(
            to = %mail.to,
            from = %mail.from,
            subject = %mail.subject,
            "Mail not sent (no SMTP credentials configured):\n{}",
            mail.body
        );
        Ok(())
    }
}

/// Keeps every message instead of sending it.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: std::sync::Mutex<Vec<OutgoingMail>>,
}

#[cfg(any(test, feature = "testing"))]
impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(any(test, feature = "testing"))]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).push(mail);
        Ok(())
    }
}

/// Composes and dispatches the password reset email.
#[derive(Clone)]
pub struct NotificationService {
    identity: IdentityService,
    mailer: Arc<dyn Mailer>,
    sender: String,
    public_url: String,
    reset_ttl: Duration,
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService")
            .field("sender", &self.sender)
            .field("public_url", &self.public_url)
            .field("reset_ttl", &self.reset_ttl)
            .finish_non_exhaustive()
    }
}

impl NotificationService {
    pub fn new(
        identity: IdentityService,
        mailer: Arc<dyn Mailer>,
        sender: impl Into<String>,
        public_url: impl Into<String>,
        reset_ttl: Duration,
    ) -> Self {
        Self {
            identity,
            mailer,
            sender: sender.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
            reset_ttl,
        }
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset_password/{}", self.public_url, token)
    }

    pub fn compose_password_reset(&self, user: &user::Model) -> Result<OutgoingMail> {
        let token = self.identity.issue_reset_token(user, self.reset_ttl)?;
        let body = format!(
            "To reset your password, visit the following link:\n{}\n\n\
             If you did not make this request then simply ignore this email and no changes will be made.\n",
            self.reset_link(&token)
        );
        Ok(OutgoingMail {
            to: user.email.clone(),
            from: self.sender.clone(),
            subject: RESET_SUBJECT.to_string(),
            body,
        })
    }

    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn send_password_reset(&self, user: &user::Model) -> Result<()> {
        let mail = self.compose_password_reset(user)?;
        debug!("Dispatching password reset mail");
        self.mailer.send(mail).await
    }

    /// Sends a reset mail when `email` belongs to an account. Returns
    /// whether a mail went out; unknown addresses are not an error.
    #[instrument(skip(self, email))]
    pub async fn request_password_reset(&self, email: &str) -> Result<bool> {
        match self.identity.user_with_email(email).await? {
            Some(user) => {
                self.send_password_reset(&user).await?;
                Ok(true)
            }
            None => {
                debug!("Password reset requested for an unknown address");
                Ok(false)
            }
        }
    }
}
