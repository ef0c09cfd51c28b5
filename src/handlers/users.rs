use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::instrument;

use crate::error::AppResult;
use crate::forms::PageQuery;
use crate::schemas::{
    AppState, AuthorView, ErrorResponse, PaginationView, PostView, UserPostsData, UserPostsView,
};
use crate::views;

/// Posts of one user, newest first
#[utoipa::path(
    get,
    path = "/user/{username}",
    tag = "posts",
    params(
        ("username" = String, Path, description = "Author's username"),
        PageQuery
    ),
    responses(
        (status = 200, description = "One page of the user's posts", body = UserPostsView),
        (status = 404, description = "Unknown user or page out of range", body = ErrorResponse)
    )
)]
#[instrument(skip(state, jar))]
pub async fn user_posts(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
    jar: CookieJar,
) -> AppResult<Response> {
    let (author, page) = state
        .content
        .list_user_posts(&username, query.page())
        .await?;

    let page = page.map(PostView::from);
    let data = UserPostsData {
        user: AuthorView::from(&author),
        pagination: PaginationView::from(&page),
        posts: page.items,
    };
    Ok(views::page(jar, &author.username, data))
}
