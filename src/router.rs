use crate::handlers::{
    account::{account_page, update_account},
    auth::{login, login_form, logout, register, register_form},
    health::health_check,
    pages::{about, home},
    posts::{create_post, delete_post, edit_post_form, new_post_form, show_post, update_post},
    reset::{request_form, request_reset, reset_form, reset_password},
    users::user_posts,
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Largest accepted request body, avatar uploads included.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let avatars = ServeDir::new(&state.avatar_dir);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Listings and static pages
        .route("/", get(home))
        .route("/home", get(home))
        .route("/about", get(about))
        .route("/user/:username", get(user_posts))
        // Accounts and sessions
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
        .route("/account", get(account_page).post(update_account))
        // Posts
        .route("/post/new", get(new_post_form).post(create_post))
        .route("/post/:post_id", get(show_post))
        .route("/post/:post_id/update", get(edit_post_form).post(update_post))
        .route("/post/:post_id/delete", post(delete_post))
        // Password reset
        .route("/reset_password", get(request_form).post(request_reset))
        .route("/reset_password/:token", get(reset_form).post(reset_password))
        // Uploaded avatars
        .nest_service("/static/profile_pics", avatars)
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}
