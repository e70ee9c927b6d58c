//! User entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub handle: String,
    pub avatar: Option<String>,
    pub followers_count: i64,
    pub followees_count: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for murmur_core::domain::User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            handle: model.handle,
            avatar: model.avatar,
            followers_count: model.followers_count,
            followees_count: model.followees_count,
            created_at: model.created_at.into(),
        }
    }
}

impl From<Model> for murmur_core::domain::UserSummary {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            handle: model.handle,
            avatar: model.avatar,
        }
    }
}
