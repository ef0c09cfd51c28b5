//! Root for the SeaORM entity modules: blog authors and their posts.

pub mod post;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::post::Entity as Post;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use chrono::{Duration, Utc};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, DbErr, EntityTrait,
        ModelTrait, QueryFilter, QueryOrder, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    fn new_user(username: &str, email: &str) -> user::ActiveModel {
        user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password: Set("$2b$04$notarealhashnotarealhashnotarealhashnotarealhash12".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let alice = new_user("alice", "alice@example.com").insert(&db).await?;
        let bob = new_user("bob", "bob@example.com").insert(&db).await?;

        // image_file falls back to the column default
        assert_eq!(alice.image_file, user::DEFAULT_IMAGE_FILE);

        let now = Utc::now();
        let first = post::ActiveModel {
            title: Set("First".to_string()),
            content: Set("Hello".to_string()),
            date_posted: Set(now - Duration::minutes(5)),
            user_id: Set(alice.id),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        post::ActiveModel {
            title: Set("Second".to_string()),
            content: Set("World".to_string()),
            date_posted: Set(now),
            user_id: Set(alice.id),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        post::ActiveModel {
            title: Set("Bob's".to_string()),
            content: Set("Hi".to_string()),
            date_posted: Set(now),
            user_id: Set(bob.id),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let alice_posts = alice
            .find_related(Post)
            .order_by_desc(post::Column::DatePosted)
            .all(&db)
            .await?;
        assert_eq!(alice_posts.len(), 2);
        assert_eq!(alice_posts[0].title, "Second");
        assert_eq!(alice_posts[1].id, first.id);

        let author = first.find_related(User).one(&db).await?.unwrap();
        assert_eq!(author.username, "alice");

        let by_email = User::find()
            .filter(user::Column::Email.eq("bob@example.com"))
            .one(&db)
            .await?;
        assert_eq!(by_email.map(|u| u.id), Some(bob.id));

        Ok(())
    }

    #[tokio::test]
    async fn test_username_and_email_are_unique() -> Result<(), DbErr> {
        let db = setup_db().await?;

        new_user("alice", "alice@example.com").insert(&db).await?;

        let same_username = new_user("alice", "other@example.com").insert(&db).await;
        assert!(same_username.is_err());

        let same_email = new_user("other", "alice@example.com").insert(&db).await;
        assert!(same_email.is_err());

        assert_eq!(User::find().all(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_post_requires_existing_author() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let orphan = post::ActiveModel {
            title: Set("Orphan".to_string()),
            content: Set("No author".to_string()),
            date_posted: Set(Utc::now()),
            user_id: Set(999),
            ..Default::default()
        }
        .insert(&db)
        .await;

        assert!(orphan.is_err());
        Ok(())
    }
}
