use std::path::PathBuf;

use chrono::{DateTime, Utc};
use model::entities::user;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use service::{
    AuthoredPost, ContentService, FormErrors, IdentityService, NotificationService, Page,
};
use utoipa::{OpenApi, ToSchema};

use crate::flash::{FlashCategory, FlashMessage};
use crate::forms::AccountFields;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection, used for health checks
    pub db: DatabaseConnection,
    pub identity: IdentityService,
    pub content: ContentService,
    pub notifications: NotificationService,
    /// Directory served under `/static/profile_pics`
    pub avatar_dir: PathBuf,
}

/// Every successful page answers with this document
#[derive(Serialize, Deserialize, ToSchema)]
#[aliases(
    PostListView = View<PostListData>,
    PostPageView = View<PostData>,
    UserPostsView = View<UserPostsData>,
    AboutView = View<AboutData>,
)]
pub struct View<T> {
    /// Page title
    pub title: String,
    /// Page payload
    pub data: T,
    /// Messages queued by earlier requests, oldest first
    pub flashes: Vec<FlashMessage>,
}

/// Payload of a form page: the values to show and what is wrong with them
#[derive(Serialize)]
pub struct FormData<F> {
    pub form: F,
    /// Field name -> messages
    pub errors: FormErrors,
    /// Heading of the post editor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<String>,
}

impl<F> FormData<F> {
    pub fn new(form: F, errors: FormErrors) -> Self {
        Self {
            form,
            errors,
            legend: None,
        }
    }

    pub fn with_legend(mut self, legend: &str) -> Self {
        self.legend = Some(legend.to_string());
        self
    }
}

/// Public view of a user
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct AuthorView {
    pub username: String,
    /// URL of the avatar
    pub image_url: String,
}

impl From<&user::Model> for AuthorView {
    fn from(user: &user::Model) -> Self {
        Self {
            username: user.username.clone(),
            image_url: avatar_url(&user.image_file),
        }
    }
}

pub fn avatar_url(image_file: &str) -> String {
    format!("/static/profile_pics/{}", image_file)
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct PostView {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub date_posted: DateTime<Utc>,
    pub author: AuthorView,
}

impl From<AuthoredPost> for PostView {
    fn from(authored: AuthoredPost) -> Self {
        Self {
            id: authored.post.id,
            title: authored.post.title,
            content: authored.post.content,
            date_posted: authored.post.date_posted,
            author: AuthorView::from(&authored.author),
        }
    }
}

/// Navigation state of a paginated listing
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct PaginationView {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub pages: u64,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_num: Option<u64>,
    pub next_num: Option<u64>,
    /// Page numbers to link to; `null` marks a gap
    pub page_links: Vec<Option<u64>>,
}

impl<T> From<&Page<T>> for PaginationView {
    fn from(page: &Page<T>) -> Self {
        Self {
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            pages: page.pages(),
            has_prev: page.has_prev(),
            has_next: page.has_next(),
            prev_num: page.prev_num(),
            next_num: page.next_num(),
            page_links: page.page_links(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct PostListData {
    pub posts: Vec<PostView>,
    pub pagination: PaginationView,
}

impl From<Page<AuthoredPost>> for PostListData {
    fn from(page: Page<AuthoredPost>) -> Self {
        let page = page.map(PostView::from);
        Self {
            pagination: PaginationView::from(&page),
            posts: page.items,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct PostData {
    pub post: PostView,
    /// Whether the viewer may edit or delete the post
    pub can_edit: bool,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct UserPostsData {
    pub user: AuthorView,
    pub posts: Vec<PostView>,
    pub pagination: PaginationView,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct AboutData {
    pub description: String,
}

/// Account page payload: the profile form plus the current avatar
#[derive(Serialize)]
pub struct AccountData {
    pub form: AccountFields,
    pub errors: FormErrors,
    pub image_url: String,
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::pages::home,
        crate::handlers::pages::about,
        crate::handlers::posts::show_post,
        crate::handlers::users::user_posts,
    ),
    components(
        schemas(
            PostListView,
            PostPageView,
            UserPostsView,
            AboutView,
            PostListData,
            PostData,
            UserPostsData,
            AboutData,
            PostView,
            AuthorView,
            PaginationView,
            FlashMessage,
            FlashCategory,
            ErrorResponse,
            HealthResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "posts", description = "Blog posts and listings"),
        (name = "pages", description = "Static pages"),
    ),
    info(
        title = "Blogsite",
        description = "A small multi-user blog: accounts, posts and password resets",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
