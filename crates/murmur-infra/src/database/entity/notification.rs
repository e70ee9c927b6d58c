//! Notification entity for SeaORM.

use sea_orm::entity::prelude::*;

use murmur_core::domain::Notification;
use murmur_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub actors: Vec<String>,
    #[sea_orm(column_name = "type")]
    pub kind: String,
    pub post_id: Option<i64>,
    pub read: bool,
    pub issued_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Notification {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            actors: model.actors,
            kind: model.kind.parse().map_err(RepoError::Query)?,
            post_id: model.post_id,
            read: model.read,
            issued_at: model.issued_at.into(),
        })
    }
}
