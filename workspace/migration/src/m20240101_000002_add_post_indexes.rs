use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Both listings page through posts newest first, one of them per author.
        manager
            .create_index(
                Index::create()
                    .name("idx_post_date_posted")
                    .table(Post::Table)
                    .col(Post::DatePosted)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_user_id")
                    .table(Post::Table)
                    .col(Post::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_post_user_id").table(Post::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_post_date_posted").table(Post::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Post {
    Table,
    DatePosted,
    UserId,
}
