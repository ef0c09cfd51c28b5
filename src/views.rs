use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::flash::{self, FlashCategory, FlashMessage};
use crate::schemas::View;

/// Renders a page, handing it every flash queued so far plus `extra`.
pub fn render<T: Serialize>(
    jar: CookieJar,
    status: StatusCode,
    title: &str,
    data: T,
    extra: Vec<FlashMessage>,
) -> Response {
    let (jar, mut flashes) = flash::drain(jar);
    flashes.extend(extra);

    let view = View {
        title: title.to_string(),
        data,
        flashes,
    };
    (status, jar, Json(view)).into_response()
}

pub fn page<T: Serialize>(jar: CookieJar, title: &str, data: T) -> Response {
    render(jar, StatusCode::OK, title, data, Vec::new())
}

/// A 303 to `to`, with a message for the page that follows.
pub fn redirect_with_flash(
    jar: CookieJar,
    to: &str,
    category: FlashCategory,
    message: &str,
) -> Response {
    let jar = flash::push(jar, FlashMessage::new(category, message));
    (jar, Redirect::to(to)).into_response()
}

pub fn redirect(jar: CookieJar, to: &str) -> Response {
    (jar, Redirect::to(to)).into_response()
}
