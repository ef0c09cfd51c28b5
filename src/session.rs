//! Who is making the request, as told by the `session` cookie.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use model::entities::user;
use service::SessionGrant;
use tracing::{debug, trace};

use crate::error::AppError;
use crate::flash::{self, FlashCategory, FlashMessage};
use crate::schemas::AppState;

pub const SESSION_COOKIE: &str = "session";
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to access this page.";

/// The signed-in user, if any.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<user::Model>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
            return Ok(MaybeUser(None));
        };
        if token.is_empty() {
            return Ok(MaybeUser(None));
        }

        let user = state.identity.resolve_session(&token).await?;
        match &user {
            Some(user) => trace!("Request made by user {}", user.id),
            None => debug!("Ignoring stale session cookie"),
        }
        Ok(MaybeUser(user))
    }
}

/// The signed-in user. Anonymous requests are sent to the login page with
/// the current path as `next`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await {
            Ok(MaybeUser(Some(user))) => Ok(CurrentUser(user)),
            Ok(MaybeUser(None)) => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                debug!("Anonymous request to {} sent to login", next);

                let jar = flash::push(
                    CookieJar::from_headers(&parts.headers),
                    FlashMessage::new(FlashCategory::Info, LOGIN_REQUIRED_MESSAGE),
                );
                let location = format!("/login?next={}", urlencoding::encode(next));
                Err((jar, Redirect::to(&location)).into_response())
            }
            Err(err) => Err(err.into_response()),
        }
    }
}

/// Sets the session cookie. Without a max age the browser drops it when it
/// closes.
pub fn start(jar: CookieJar, grant: SessionGrant) -> CookieJar {
    let mut cookie = Cookie::build((SESSION_COOKIE, grant.token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    if let Some(max_age) = grant.max_age {
        let seconds = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        cookie = cookie.max_age(time::Duration::seconds(seconds));
    }
    jar.add(cookie)
}

pub fn end(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// `next` when it points back into this site, otherwise `/`.
pub fn local_redirect_target(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path,
        _ => "/",
    }
}
