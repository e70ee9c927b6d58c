use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DbBackend, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Statement, Value,
};
use sea_orm::sea_query::Expr;

use murmur_core::domain::{
    Audience, BackwardPage, Notification, NotificationEvent, NotificationId, UserId,
};
use murmur_core::error::RepoError;
use murmur_core::ports::NotificationRepository;

use super::entity::notification;
use super::errors::db_err;
use super::sql;
use super::store::PostgresStore;

/// Picks the merge statement for an audience and binds its parameters.
fn notify_statement(audience: &Audience, event: &NotificationEvent) -> Option<Statement> {
    let actor: Value = event.actor.clone().into();
    let kind: Value = event.kind.as_str().into();
    let post_id: Value = event.post_id.into();

    let statement = match audience {
        Audience::User(user_id) => {
            if *user_id == event.actor_id {
                return None;
            }
            Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql::NOTIFY_USER,
                [(*user_id).into(), actor, kind, post_id],
            )
        }
        Audience::PostSubscribers(subject) => Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql::NOTIFY_POST_SUBSCRIBERS,
            [actor, kind, (*subject).into(), event.actor_id.into()],
        ),
        Audience::Handles(handles) => {
            if handles.is_empty() {
                return None;
            }
            Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql::NOTIFY_HANDLES,
                [actor, kind, post_id, event.actor_id.into(), handles.clone().into()],
            )
        }
    };
    Some(statement)
}

#[async_trait]
impl NotificationRepository for PostgresStore {
    async fn notify(
        &self,
        audience: &Audience,
        event: &NotificationEvent,
    ) -> Result<Vec<Notification>, RepoError> {
        let Some(statement) = notify_statement(audience, event) else {
            return Ok(Vec::new());
        };

        notification::Entity::find()
            .from_raw_sql(statement)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(Notification::try_from)
            .collect()
    }

    async fn list(
        &self,
        user_id: UserId,
        page: &BackwardPage,
    ) -> Result<Vec<Notification>, RepoError> {
        let mut query =
            notification::Entity::find().filter(notification::Column::UserId.eq(user_id));
        if let Some(before) = page.before {
            query = query.filter(notification::Column::Id.lt(before));
        }

        query
            .order_by_desc(notification::Column::Id)
            .limit(page.last)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(Notification::try_from)
            .collect()
    }

    async fn mark_read(&self, user_id: UserId, id: NotificationId) -> Result<(), RepoError> {
        let result = notification::Entity::update_many()
            .col_expr(notification::Column::Read, Expr::value(true))
            .filter(notification::Column::Id.eq(id))
            .filter(notification::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepoError> {
        let result = notification::Entity::update_many()
            .col_expr(notification::Column::Read, Expr::value(true))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::Read.eq(false))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected)
    }

    async fn unread_count(&self, user_id: UserId) -> Result<u64, RepoError> {
        notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::Read.eq(false))
            .count(&self.db)
            .await
            .map_err(db_err)
    }
}
