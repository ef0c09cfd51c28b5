pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_user_and_post;
mod m20240101_000002_add_post_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_user_and_post::Migration),
            Box::new(m20240101_000002_add_post_indexes::Migration),
        ]
    }
}
