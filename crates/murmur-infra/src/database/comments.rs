use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

use murmur_core::domain::{Authored, BackwardPage, Comment, CommentId, NewComment, PostId, UserId};
use murmur_core::error::RepoError;
use murmur_core::ports::CommentRepository;

use super::entity::{comment, post, post_subscription, user};
use super::errors::db_err;
use super::posts::{authored, subscribe};
use super::store::PostgresStore;

#[async_trait]
impl CommentRepository for PostgresStore {
    async fn create(&self, new_comment: NewComment) -> Result<Comment, RepoError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let comment = comment::ActiveModel {
            post_id: Set(new_comment.post_id),
            author_id: Set(new_comment.author_id),
            content: Set(new_comment.content),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        subscribe(comment.author_id, comment.post_id)
            .exec_without_returning(&txn)
            .await
            .map_err(db_err)?;

        post::Entity::update_many()
            .col_expr(
                post::Column::CommentsCount,
                Expr::col(post::Column::CommentsCount).add(1),
            )
            .filter(post::Column::Id.eq(comment.post_id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(comment.into())
    }

    async fn find_by_id(&self, id: CommentId) -> Result<Option<Authored<Comment>>, RepoError> {
        comment::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(authored)
            .transpose()
    }

    async fn list(
        &self,
        post_id: PostId,
        page: &BackwardPage,
    ) -> Result<Vec<Authored<Comment>>, RepoError> {
        let mut query = comment::Entity::find().filter(comment::Column::PostId.eq(post_id));
        if let Some(before) = page.before {
            query = query.filter(comment::Column::Id.lt(before));
        }

        query
            .order_by_desc(comment::Column::Id)
            .limit(page.last)
            .find_also_related(user::Entity)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(authored)
            .collect()
    }

    async fn subscribers(&self, post_id: PostId) -> Result<Vec<UserId>, RepoError> {
        post_subscription::Entity::find()
            .select_only()
            .column(post_subscription::Column::UserId)
            .filter(post_subscription::Column::PostId.eq(post_id))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(db_err)
    }
}
