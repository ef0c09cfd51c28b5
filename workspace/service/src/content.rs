use model::entities::{post, user};
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::error::{FormErrors, Result, ServiceError};
use crate::pagination::Page;
use crate::store::{AuthoredPost, Store};
use crate::validation::PostInput;

/// Posts shown per listing page.
pub const POSTS_PER_PAGE: u64 = 5;

/// Post authoring and the paginated listings.
#[derive(Clone, Debug)]
pub struct ContentService {
    store: Store,
}

impl ContentService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Newest-first page of every post.
    ///
    /// Page 1 always exists, even when there are no posts at all. Any other
    /// page past the end is `NotFound`, as is anything below 1.
    #[instrument(skip(self))]
    pub async fn list_posts(&self, page: i64) -> Result<Page<AuthoredPost>> {
        self.page_of(None, page).await
    }

    /// Newest-first page of the posts written by `username`.
    #[instrument(skip(self))]
    pub async fn list_user_posts(
        &self,
        username: &str,
        page: i64,
    ) -> Result<(user::Model, Page<AuthoredPost>)> {
        let author = self
            .store
            .user_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", username)))?;
        let posts = self.page_of(Some(author.id), page).await?;
        Ok((author, posts))
    }

    pub async fn get_post(&self, id: i32) -> Result<AuthoredPost> {
        self.store
            .authored_post(id)
            .await?
            .ok_or_else(|| post_not_found(id))
    }

    /// The post `id` when `actor` wrote it.
    pub async fn editable_post(&self, actor: &user::Model, id: i32) -> Result<AuthoredPost> {
        let found = self.get_post(id).await?;
        ensure_owner(actor, &found.post)?;
        Ok(found)
    }

    #[instrument(skip(self, author, input), fields(author_id = author.id))]
    pub async fn create_post(&self, author: &user::Model, input: PostInput) -> Result<post::Model> {
        FormErrors::from(input.validate()).into_result()?;

        let created = self
            .store
            .insert_post(author.id, &input.title, &input.content)
            .await?;
        info!("Created post {} by user {}", created.id, author.id);
        Ok(created)
    }

    /// Replaces title and content. Existence and ownership are checked
    /// before the input is.
    #[instrument(skip(self, actor, input), fields(actor_id = actor.id))]
    pub async fn update_post(
        &self,
        actor: &user::Model,
        id: i32,
        input: PostInput,
    ) -> Result<post::Model> {
        let existing = self.store.post_by_id(id).await?.ok_or_else(|| post_not_found(id))?;
        ensure_owner(actor, &existing)?;
        FormErrors::from(input.validate()).into_result()?;

        let updated = self
            .store
            .update_post(existing, &input.title, &input.content)
            .await?;
        info!("Updated post {}", updated.id);
        Ok(updated)
    }

    #[instrument(skip(self, actor), fields(actor_id = actor.id))]
    pub async fn delete_post(&self, actor: &user::Model, id: i32) -> Result<()> {
        let existing = self.store.post_by_id(id).await?.ok_or_else(|| post_not_found(id))?;
        ensure_owner(actor, &existing)?;

        if self.store.delete_post(id).await? == 0 {
            // deleted by a concurrent request between the lookup and now
            return Err(post_not_found(id));
        }
        info!("Deleted post {}", id);
        Ok(())
    }

    async fn page_of(&self, author_id: Option<i32>, page: i64) -> Result<Page<AuthoredPost>> {
        if page < 1 {
            return Err(ServiceError::NotFound(format!("Page {} does not exist", page)));
        }
        let page = page as u64;

        let (items, total) = self
            .store
            .posts_page(author_id, page - 1, POSTS_PER_PAGE)
            .await?;
        if items.is_empty() && page != 1 {
            debug!("Page {} is past the end ({} posts)", page, total);
            return Err(ServiceError::NotFound(format!("Page {} does not exist", page)));
        }

        Ok(Page::new(items, page, POSTS_PER_PAGE, total))
    }
}

fn ensure_owner(actor: &user::Model, post: &post::Model) -> Result<()> {
    if post.user_id != actor.id {
        warn!(
            "User {} tried to modify post {} owned by {}",
            actor.id, post.id, post.user_id
        );
        return Err(ServiceError::Forbidden(format!(
            "Post {} belongs to another user",
            post.id
        )));
    }
    Ok(())
}

fn post_not_found(id: i32) -> ServiceError {
    ServiceError::NotFound(format!("Post {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{identity, registration, setup_store};
    use model::entities::prelude::Post;
    use sea_orm::{EntityTrait, PaginatorTrait};

    fn input(title: &str, content: &str) -> PostInput {
        PostInput {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    async fn two_users(store: &Store) -> (user::Model, user::Model) {
        let (identity, _dir) = identity(store);
        let alice = identity
            .register(registration("alice", "a@x.com", "pw1"))
            .await
            .unwrap();
        let bob = identity
            .register(registration("bob", "b@y.com", "pw2"))
            .await
            .unwrap();
        (alice, bob)
    }

    #[tokio::test]
    async fn test_create_and_get_post() {
        let store = setup_store().await;
        let (alice, _) = two_users(&store).await;
        let content = ContentService::new(store);

        let created = content
            .create_post(&alice, input("Hello", "First!"))
            .await
            .unwrap();
        let found = content.get_post(created.id).await.unwrap();

        assert_eq!(found.post.title, "Hello");
        assert_eq!(found.post.content, "First!");
        assert_eq!(found.author.username, "alice");
    }

    #[tokio::test]
    async fn test_missing_post_is_not_found() {
        let store = setup_store().await;
        let content = ContentService::new(store);

        assert!(matches!(
            content.get_post(999).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_only_the_author_may_change_a_post() {
        let store = setup_store().await;
        let (alice, bob) = two_users(&store).await;
        let content = ContentService::new(store);
        let created = content
            .create_post(&alice, input("Hello", "First!"))
            .await
            .unwrap();

        let update = content
            .update_post(&bob, created.id, input("Mine now", "ha"))
            .await;
        assert!(matches!(update, Err(ServiceError::Forbidden(_))));

        // ownership is checked before the input
        let invalid_update = content.update_post(&bob, created.id, input("", "")).await;
        assert!(matches!(invalid_update, Err(ServiceError::Forbidden(_))));

        let delete = content.delete_post(&bob, created.id).await;
        assert!(matches!(delete, Err(ServiceError::Forbidden(_))));
        assert!(matches!(
            content.editable_post(&bob, created.id).await,
            Err(ServiceError::Forbidden(_))
        ));

        let unchanged = content.get_post(created.id).await.unwrap();
        assert_eq!(unchanged.post.title, "Hello");
        assert_eq!(unchanged.post.content, "First!");
    }

    #[tokio::test]
    async fn test_author_updates_and_deletes() {
        let store = setup_store().await;
        let (alice, _) = two_users(&store).await;
        let content = ContentService::new(store.clone());
        let created = content
            .create_post(&alice, input("Hello", "First!"))
            .await
            .unwrap();

        let updated = content
            .update_post(&alice, created.id, input("Hello again", "Edited"))
            .await
            .unwrap();
        assert_eq!(updated.title, "Hello again");
        assert_eq!(updated.date_posted, created.date_posted);
        assert_eq!(updated.user_id, alice.id);

        content.delete_post(&alice, created.id).await.unwrap();
        assert!(matches!(
            content.get_post(created.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            content.delete_post(&alice, created.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(Post::find().count(store.connection()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_post_is_not_stored() {
        let store = setup_store().await;
        let (alice, _) = two_users(&store).await;
        let content = ContentService::new(store.clone());

        let result = content
            .create_post(&alice, input(&"t".repeat(101), "body"))
            .await;

        match result {
            Err(ServiceError::Validation(errors)) => assert!(errors.contains("title")),
            other => panic!("expected a validation error, got {:?}", other),
        }
        assert_eq!(Post::find().count(store.connection()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_listing_pages_newest_first() {
        let store = setup_store().await;
        let (alice, bob) = two_users(&store).await;
        let content = ContentService::new(store);
        for n in 1..=12 {
            let author = if n % 2 == 0 { &alice } else { &bob };
            content
                .create_post(author, input(&format!("Post {}", n), "body"))
                .await
                .unwrap();
        }

        let first = content.list_posts(1).await.unwrap();
        let titles: Vec<_> = first.items.iter().map(|p| p.post.title.as_str()).collect();
        assert_eq!(titles, ["Post 12", "Post 11", "Post 10", "Post 9", "Post 8"]);
        assert_eq!(first.total, 12);
        assert_eq!(first.pages(), 3);

        let last = content.list_posts(3).await.unwrap();
        let titles: Vec<_> = last.items.iter().map(|p| p.post.title.as_str()).collect();
        assert_eq!(titles, ["Post 2", "Post 1"]);

        assert!(matches!(content.list_posts(4).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(content.list_posts(0).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(content.list_posts(-3).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_first_page_exists_when_empty() {
        let store = setup_store().await;
        let content = ContentService::new(store);

        let page = content.list_posts(1).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
        assert!(matches!(content.list_posts(2).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_huge_page_numbers_are_not_found() {
        let store = setup_store().await;
        let (alice, _) = two_users(&store).await;
        let content = ContentService::new(store);
        for n in 1..=7 {
            content
                .create_post(&alice, input(&format!("Post {}", n), "body"))
                .await
                .unwrap();
        }

        // (page - 1) * 5 wraps to 4 for this page on 64 bits
        let wrapping_page = (((1u128 << 64) + 4) / 5 + 1) as i64;
        for page in [i64::MAX, i64::MAX / 5, wrapping_page] {
            assert!(
                matches!(content.list_posts(page).await, Err(ServiceError::NotFound(_))),
                "page {} should not exist",
                page
            );
            assert!(matches!(
                content.list_user_posts("alice", page).await,
                Err(ServiceError::NotFound(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_user_listing_only_shows_their_posts() {
        let store = setup_store().await;
        let (alice, bob) = two_users(&store).await;
        let content = ContentService::new(store);
        content.create_post(&alice, input("A1", "x")).await.unwrap();
        content.create_post(&bob, input("B1", "x")).await.unwrap();
        content.create_post(&alice, input("A2", "x")).await.unwrap();

        let (author, page) = content.list_user_posts("alice", 1).await.unwrap();
        assert_eq!(author.id, alice.id);
        let titles: Vec<_> = page.items.iter().map(|p| p.post.title.as_str()).collect();
        assert_eq!(titles, ["A2", "A1"]);
        assert_eq!(page.total, 2);

        assert!(matches!(
            content.list_user_posts("nobody", 1).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            content.list_user_posts("bob", 2).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_user_without_posts_has_a_first_page() {
        let store = setup_store().await;
        let (_, bob) = two_users(&store).await;
        let content = ContentService::new(store);

        let (author, page) = content.list_user_posts("bob", 1).await.unwrap();
        assert_eq!(author.id, bob.id);
        assert!(page.items.is_empty());
    }
}
