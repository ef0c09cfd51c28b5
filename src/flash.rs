//! One-shot messages carried to the next page in a cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

pub const FLASH_COOKIE: &str = "flash";

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
pub struct FlashMessage {
    pub category: FlashCategory,
    pub message: String,
}

impl FlashMessage {
    pub fn new(category: FlashCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

/// Messages currently queued in the jar. A missing or unreadable cookie
/// holds none.
pub fn peek(jar: &CookieJar) -> Vec<FlashMessage> {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return Vec::new();
    };
    if cookie.value().is_empty() {
        return Vec::new();
    }

    URL_SAFE_NO_PAD
        .decode(cookie.value())
        .ok()
        .and_then(|raw| serde_json::from_slice(&raw).ok())
        .unwrap_or_else(|| {
            debug!("Discarding unreadable flash cookie");
            Vec::new()
        })
}

/// Queues a message for the next page that renders.
pub fn push(jar: CookieJar, message: FlashMessage) -> CookieJar {
    let mut queued = peek(&jar);
    queued.push(message);
    store(jar, &queued)
}

/// Takes every queued message out of the jar.
pub fn drain(jar: CookieJar) -> (CookieJar, Vec<FlashMessage>) {
    let queued = peek(&jar);
    if queued.is_empty() && jar.get(FLASH_COOKIE).is_none() {
        return (jar, queued);
    }
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), queued)
}

fn store(jar: CookieJar, queued: &[FlashMessage]) -> CookieJar {
    let Ok(raw) = serde_json::to_vec(queued) else {
        return jar;
    };
    let cookie = Cookie::build((FLASH_COOKIE, URL_SAFE_NO_PAD.encode(raw)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_then_drain_keeps_order() {
        let jar = CookieJar::new();
        let jar = push(jar, FlashMessage::new(FlashCategory::Success, "first"));
        let jar = push(jar, FlashMessage::new(FlashCategory::Danger, "second"));

        let (jar, drained) = drain(jar);
        assert_eq!(
            drained,
            vec![
                FlashMessage::new(FlashCategory::Success, "first"),
                FlashMessage::new(FlashCategory::Danger, "second"),
            ]
        );
        assert!(peek(&jar).is_empty());
    }

    #[test]
    fn test_garbage_cookie_holds_nothing() {
        let jar = CookieJar::new().add(Cookie::new(FLASH_COOKIE, "%%%not-base64"));
        assert!(peek(&jar).is_empty());

        let jar = push(jar, FlashMessage::new(FlashCategory::Info, "fresh"));
        assert_eq!(peek(&jar).len(), 1);
    }

    #[test]
    fn test_categories_serialize_lowercase() {
        let json = serde_json::to_value(FlashMessage::new(FlashCategory::Warning, "careful")).unwrap();
        assert_eq!(json["category"], "warning");
        assert_eq!(json["message"], "careful");
    }
}
