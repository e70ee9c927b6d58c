use std::collections::HashSet;

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseTransaction, DeleteResult, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};

use murmur_core::domain::{RelationshipKind, ToggleState, UserId};
use murmur_core::error::RepoError;
use murmur_core::ports::RelationshipStore;

use super::entity::{comment, comment_like, follow, post, post_like, user};
use super::errors::db_err;
use super::store::PostgresStore;

fn delta(was_active: bool) -> i64 {
    if was_active { -1 } else { 1 }
}

/// The edge was seen, but a concurrent toggle deleted it first. Failing here rolls the
/// transaction back before any counter moves.
fn ensure_deleted(result: DeleteResult, edge: &str, key: (i64, i64)) -> Result<(), RepoError> {
    if result.rows_affected == 0 {
        return Err(RepoError::StaleRead(format!("{edge} {key:?}")));
    }
    Ok(())
}

async fn toggle_follow(
    txn: &DatabaseTransaction,
    follower: UserId,
    followee: UserId,
) -> Result<ToggleState, RepoError> {
    let existing = follow::Entity::find_by_id((follower, followee))
        .one(txn)
        .await
        .map_err(db_err)?;
    let was_active = existing.is_some();

    if was_active {
        let result = follow::Entity::delete_by_id((follower, followee))
            .exec(txn)
            .await
            .map_err(db_err)?;
        ensure_deleted(result, "follows", (follower, followee))?;
    } else {
        follow::Entity::insert(follow::ActiveModel {
            follower_id: Set(follower),
            followee_id: Set(followee),
        })
        .exec_without_returning(txn)
        .await
        .map_err(db_err)?;
    }

    let delta = delta(was_active);
    let updated = user::Entity::update_many()
        .col_expr(
            user::Column::FollowersCount,
            Expr::col(user::Column::FollowersCount).add(delta),
        )
        .filter(user::Column::Id.eq(followee))
        .exec_with_returning(txn)
        .await
        .map_err(db_err)?;
    let count = updated
        .first()
        .map(|u| u.followers_count)
        .ok_or(RepoError::NotFound)?;

    user::Entity::update_many()
        .col_expr(
            user::Column::FolloweesCount,
            Expr::col(user::Column::FolloweesCount).add(delta),
        )
        .filter(user::Column::Id.eq(follower))
        .exec(txn)
        .await
        .map_err(db_err)?;

    Ok(ToggleState { was_active, count })
}

async fn toggle_post_like(
    txn: &DatabaseTransaction,
    user_id: UserId,
    post_id: i64,
) -> Result<ToggleState, RepoError> {
    let existing = post_like::Entity::find_by_id((user_id, post_id))
        .one(txn)
        .await
        .map_err(db_err)?;
    let was_active = existing.is_some();

    if was_active {
        let result = post_like::Entity::delete_by_id((user_id, post_id))
            .exec(txn)
            .await
            .map_err(db_err)?;
        ensure_deleted(result, "post_likes", (user_id, post_id))?;
    } else {
        post_like::Entity::insert(post_like::ActiveModel {
            user_id: Set(user_id),
            post_id: Set(post_id),
        })
        .exec_without_returning(txn)
        .await
        .map_err(db_err)?;
    }

    let updated = post::Entity::update_many()
        .col_expr(
            post::Column::LikesCount,
            Expr::col(post::Column::LikesCount).add(delta(was_active)),
        )
        .filter(post::Column::Id.eq(post_id))
        .exec_with_returning(txn)
        .await
        .map_err(db_err)?;
    let count = updated
        .first()
        .map(|p| p.likes_count)
        .ok_or(RepoError::NotFound)?;

    Ok(ToggleState { was_active, count })
}

async fn toggle_comment_like(
    txn: &DatabaseTransaction,
    user_id: UserId,
    comment_id: i64,
) -> Result<ToggleState, RepoError> {
    let existing = comment_like::Entity::find_by_id((user_id, comment_id))
        .one(txn)
        .await
        .map_err(db_err)?;
    let was_active = existing.is_some();

    if was_active {
        let result = comment_like::Entity::delete_by_id((user_id, comment_id))
            .exec(txn)
            .await
            .map_err(db_err)?;
        ensure_deleted(result, "comment_likes", (user_id, comment_id))?;
    } else {
        comment_like::Entity::insert(comment_like::ActiveModel {
            user_id: Set(user_id),
            comment_id: Set(comment_id),
        })
        .exec_without_returning(txn)
        .await
        .map_err(db_err)?;
    }

    let updated = comment::Entity::update_many()
        .col_expr(
            comment::Column::LikesCount,
            Expr::col(comment::Column::LikesCount).add(delta(was_active)),
        )
        .filter(comment::Column::Id.eq(comment_id))
        .exec_with_returning(txn)
        .await
        .map_err(db_err)?;
    let count = updated
        .first()
        .map(|c| c.likes_count)
        .ok_or(RepoError::NotFound)?;

    Ok(ToggleState { was_active, count })
}

#[async_trait]
impl RelationshipStore for PostgresStore {
    async fn toggle(
        &self,
        kind: RelationshipKind,
        actor: UserId,
        target: i64,
    ) -> Result<ToggleState, RepoError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let state = match kind {
            RelationshipKind::Follow => toggle_follow(&txn, actor, target).await,
            RelationshipKind::PostLike => toggle_post_like(&txn, actor, target).await,
            RelationshipKind::CommentLike => toggle_comment_like(&txn, actor, target).await,
        }?;

        txn.commit().await.map_err(db_err)?;
        Ok(state)
    }

    async fn active_targets(
        &self,
        kind: RelationshipKind,
        actor: UserId,
        targets: &[i64],
    ) -> Result<HashSet<i64>, RepoError> {
        let targets = targets.to_vec();
        let ids: Vec<i64> = match kind {
            RelationshipKind::Follow => follow::Entity::find()
                .select_only()
                .column(follow::Column::FolloweeId)
                .filter(follow::Column::FollowerId.eq(actor))
                .filter(follow::Column::FolloweeId.is_in(targets))
                .into_tuple::<i64>()
                .all(&self.db)
                .await,
            RelationshipKind::PostLike => post_like::Entity::find()
                .select_only()
                .column(post_like::Column::PostId)
                .filter(post_like::Column::UserId.eq(actor))
                .filter(post_like::Column::PostId.is_in(targets))
                .into_tuple::<i64>()
                .all(&self.db)
                .await,
            RelationshipKind::CommentLike => comment_like::Entity::find()
                .select_only()
                .column(comment_like::Column::CommentId)
                .filter(comment_like::Column::UserId.eq(actor))
                .filter(comment_like::Column::CommentId.is_in(targets))
                .into_tuple::<i64>()
                .all(&self.db)
                .await,
        }
        .map_err(db_err)?;

        Ok(ids.into_iter().collect())
    }

    async fn active_actors(
        &self,
        kind: RelationshipKind,
        target: i64,
        actors: &[UserId],
    ) -> Result<HashSet<UserId>, RepoError> {
        let actors = actors.to_vec();
        let ids: Vec<i64> = match kind {
            RelationshipKind::Follow => follow::Entity::find()
                .select_only()
                .column(follow::Column::FollowerId)
                .filter(follow::Column::FolloweeId.eq(target))
                .filter(follow::Column::FollowerId.is_in(actors))
                .into_tuple::<i64>()
                .all(&self.db)
                .await,
            RelationshipKind::PostLike => post_like::Entity::find()
                .select_only()
                .column(post_like::Column::UserId)
                .filter(post_like::Column::PostId.eq(target))
                .filter(post_like::Column::UserId.is_in(actors))
                .into_tuple::<i64>()
                .all(&self.db)
                .await,
            RelationshipKind::CommentLike => comment_like::Entity::find()
                .select_only()
                .column(comment_like::Column::UserId)
                .filter(comment_like::Column::CommentId.eq(target))
                .filter(comment_like::Column::UserId.is_in(actors))
                .into_tuple::<i64>()
                .all(&self.db)
                .await,
        }
        .map_err(db_err)?;

        Ok(ids.into_iter().collect())
    }
}
