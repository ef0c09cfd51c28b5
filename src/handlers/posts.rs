use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use service::{FormErrors, ServiceError};
use tracing::{debug, instrument};

use crate::error::AppResult;
use crate::flash::FlashCategory;
use crate::forms::PostForm;
use crate::schemas::{AppState, ErrorResponse, FormData, PostData, PostPageView, PostView};
use crate::session::{CurrentUser, MaybeUser};
use crate::views;

pub const POST_CREATED_MESSAGE: &str = "Your post has been created!";
pub const POST_UPDATED_MESSAGE: &str = "Your post has been updated!";
pub const POST_DELETED_MESSAGE: &str = "Your post has been deleted!";

const NEW_POST: &str = "New Post";
const UPDATE_POST: &str = "Update Post";

/// Post ids that are not numbers name no post.
fn post_id(raw: &str) -> Result<i32, ServiceError> {
    raw.parse()
        .map_err(|_| ServiceError::NotFound(format!("Post {} not found", raw)))
}

fn editor(jar: CookieJar, status: StatusCode, legend: &str, form: PostForm, errors: FormErrors) -> Response {
    let data = FormData::new(form, errors).with_legend(legend);
    views::render(jar, status, legend, data, Vec::new())
}

pub async fn new_post_form(CurrentUser(_user): CurrentUser, jar: CookieJar) -> Response {
    editor(jar, StatusCode::OK, NEW_POST, PostForm::default(), FormErrors::new())
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    match state.content.create_post(&user, (&form).into()).await {
        Ok(_) => Ok(views::redirect_with_flash(
            jar,
            "/",
            FlashCategory::Success,
            POST_CREATED_MESSAGE,
        )),
        Err(ServiceError::Validation(errors)) => Ok(editor(
            jar,
            StatusCode::UNPROCESSABLE_ENTITY,
            NEW_POST,
            form,
            errors,
        )),
        Err(err) => Err(err.into()),
    }
}

/// A single post
#[utoipa::path(
    get,
    path = "/post/{post_id}",
    tag = "posts",
    params(("post_id" = i32, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post", body = PostPageView),
        (status = 404, description = "No such post", body = ErrorResponse)
    )
)]
#[instrument(skip(state, viewer, jar))]
pub async fn show_post(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    MaybeUser(viewer): MaybeUser,
    jar: CookieJar,
) -> AppResult<Response> {
    let found = state.content.get_post(post_id(&raw_id)?).await?;
    let can_edit = viewer.is_some_and(|v| v.id == found.post.user_id);
    let title = found.post.title.clone();
    let data = PostData {
        post: PostView::from(found),
        can_edit,
    };
    Ok(views::page(jar, &title, data))
}

#[instrument(skip(state, user, jar), fields(user_id = user.id))]
pub async fn edit_post_form(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> AppResult<Response> {
    let found = state.content.editable_post(&user, post_id(&raw_id)?).await?;
    let form = PostForm {
        title: found.post.title,
        content: found.post.content,
    };
    Ok(editor(jar, StatusCode::OK, UPDATE_POST, form, FormErrors::new()))
}

#[instrument(skip(state, user, jar, form), fields(user_id = user.id))]
pub async fn update_post(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    let id = post_id(&raw_id)?;
    match state.content.update_post(&user, id, (&form).into()).await {
        Ok(updated) => Ok(views::redirect_with_flash(
            jar,
            &format!("/post/{}", updated.id),
            FlashCategory::Success,
            POST_UPDATED_MESSAGE,
        )),
        Err(ServiceError::Validation(errors)) => {
            debug!("Post {} update rejected: {}", id, errors);
            Ok(editor(jar, StatusCode::UNPROCESSABLE_ENTITY, UPDATE_POST, form, errors))
        }
        Err(err) => Err(err.into()),
    }
}

#[instrument(skip(state, user, jar), fields(user_id = user.id))]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> AppResult<Response> {
    state.content.delete_post(&user, post_id(&raw_id)?).await?;
    Ok(views::redirect_with_flash(
        jar,
        "/",
        FlashCategory::Success,
        POST_DELETED_MESSAGE,
    ))
}
