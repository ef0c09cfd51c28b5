use axum::{
    extract::{Query, State},
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, instrument};

use crate::error::AppResult;
use crate::forms::PageQuery;
use crate::schemas::{AboutData, AppState, ErrorResponse, PostListData, PostListView, AboutView};
use crate::views;

/// Newest posts first, five per page
#[utoipa::path(
    get,
    path = "/",
    tag = "posts",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of posts", body = PostListView),
        (status = 404, description = "Page out of range", body = ErrorResponse)
    )
)]
#[instrument(skip(state, jar))]
pub async fn home(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    jar: CookieJar,
) -> AppResult<Response> {
    let page = state.content.list_posts(query.page()).await?;
    debug!("Home page {} with {} posts", page.page, page.items.len());
    Ok(views::page(jar, "Home", PostListData::from(page)))
}

#[utoipa::path(
    get,
    path = "/about",
    tag = "pages",
    responses(
        (status = 200, description = "About the blog", body = AboutView)
    )
)]
pub async fn about(jar: CookieJar) -> Response {
    let data = AboutData {
        description: "A small blog where registered users share posts.".to_string(),
    };
    views::page(jar, "About", data)
}
