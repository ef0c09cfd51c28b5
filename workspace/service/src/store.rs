use chrono::Utc;
use model::entities::{post, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::{instrument, trace, warn};

/// A post together with the user who wrote it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthoredPost {
    pub post: post::Model,
    pub author: user::Model,
}

/// Repository over the `user` and `post` tables.
///
/// Cloning is cheap: the underlying connection is a pool handle.
#[derive(Clone, Debug)]
pub struct Store {
    db: DatabaseConnection,
}

impl Store {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn user_by_id(&self, id: i32) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find_by_id(id).one(&self.db).await
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
    }

    #[instrument(skip(self, password_hash))]
    pub async fn insert_user(
        &self,
        username: &str,
        email: &str,
        password_hash: String,
    ) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            image_file: Set(user::DEFAULT_IMAGE_FILE.to_string()),
            password: Set(password_hash),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    pub async fn update_user(&self, changes: user::ActiveModel) -> Result<user::Model, DbErr> {
        changes.update(&self.db).await
    }

    pub async fn post_by_id(&self, id: i32) -> Result<Option<post::Model>, DbErr> {
        post::Entity::find_by_id(id).one(&self.db).await
    }

    pub async fn authored_post(&self, id: i32) -> Result<Option<AuthoredPost>, DbErr> {
        let found = post::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(&self.db)
            .await?;
        Ok(found.and_then(pair_with_author))
    }

    #[instrument(skip(self, title, content))]
    pub async fn insert_post(
        &self,
        author_id: i32,
        title: &str,
        content: &str,
    ) -> Result<post::Model, DbErr> {
        post::ActiveModel {
            title: Set(title.to_string()),
            content: Set(content.to_string()),
            date_posted: Set(Utc::now()),
            user_id: Set(author_id),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    pub async fn update_post(
        &self,
        existing: post::Model,
        title: &str,
        content: &str,
    ) -> Result<post::Model, DbErr> {
        let mut changes: post::ActiveModel = existing.into();
        changes.title = Set(title.to_string());
        changes.content = Set(content.to_string());
        changes.update(&self.db).await
    }

    pub async fn delete_post(&self, id: i32) -> Result<u64, DbErr> {
        let result = post::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    /// Newest-first slice of posts, optionally limited to one author.
    ///
    /// Returns the rows of the zero-based `page_index` and the total number
    /// of matching posts. An index past the last page yields no rows.
    #[instrument(skip(self))]
    pub async fn posts_page(
        &self,
        author_id: Option<i32>,
        page_index: u64,
        per_page: u64,
    ) -> Result<(Vec<AuthoredPost>, u64), DbErr> {
        let mut query = post::Entity::find().find_also_related(user::Entity);
        if let Some(author_id) = author_id {
            query = query.filter(post::Column::UserId.eq(author_id));
        }

        let paginator = query
            .order_by_desc(post::Column::DatePosted)
            .order_by_desc(post::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        // fetch_page multiplies the index by the page size unchecked
        if page_index >= total.div_ceil(per_page) {
            trace!("Page index {} is past the {} matching posts", page_index, total);
            return Ok((Vec::new(), total));
        }
        let rows = paginator.fetch_page(page_index).await?;
        trace!("Fetched {} of {} posts", rows.len(), total);

        Ok((rows.into_iter().filter_map(pair_with_author).collect(), total))
    }
}

fn pair_with_author((post, author): (post::Model, Option<user::Model>)) -> Option<AuthoredPost> {
    match author {
        Some(author) => Some(AuthoredPost { post, author }),
        None => {
            warn!("Post {} references missing user {}", post.id, post.user_id);
            None
        }
    }
}
