//! Business logic of the blog: accounts, posts, avatars and mail.
//!
//! Every service takes a [`Store`] handle and is cheap to clone.

pub mod content;
pub mod error;
pub mod identity;
pub mod media;
pub mod notification;
pub mod pagination;
pub mod store;
pub mod tokens;
pub mod validation;

#[cfg(test)]
mod testing;

pub use content::{ContentService, POSTS_PER_PAGE};
pub use error::{FormErrors, Result, ServiceError};
pub use identity::{IdentityConfig, IdentityService, SessionGrant};
pub use media::{AvatarUpload, MediaService};
pub use notification::{LogMailer, Mailer, NotificationService, OutgoingMail, SmtpMailer};
#[cfg(any(test, feature = "testing"))]
pub use notification::RecordingMailer;
pub use pagination::Page;
pub use store::{AuthoredPost, Store};
pub use tokens::{TokenPurpose, TokenSigner};
