use sea_orm::entity::prelude::*;

/// Avatar assigned to every account until the owner uploads a picture.
pub const DEFAULT_IMAGE_FILE: &str = "default.jpg";

/// A registered blog author.
///
/// `password` always holds a bcrypt hash; the plaintext never reaches
/// the database.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    /// File name inside the avatar directory.
    #[sea_orm(default_value = "default.jpg")]
    pub image_file: String,
    pub password: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A user authors any number of posts.
    #[sea_orm(has_many = "super::post::Entity")]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
