use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbBackend, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, Statement, TransactionTrait,
};

use murmur_core::domain::{Authored, BackwardPage, NewPost, Post, PostId, TimelineItem, UserId};
use murmur_core::error::RepoError;
use murmur_core::ports::PostRepository;

use super::entity::{post, post_subscription, timeline, user};
use super::errors::db_err;
use super::sql;
use super::store::PostgresStore;

pub(super) fn authored<M, T>(row: (M, Option<user::Model>)) -> Result<Authored<T>, RepoError>
where
    M: Into<T>,
{
    let (model, author) = row;
    let author = author.ok_or_else(|| RepoError::Query("row without author".to_string()))?;
    Ok(Authored {
        item: model.into(),
        author: author.into(),
    })
}

pub(super) fn subscribe(user_id: UserId, post_id: PostId) -> sea_orm::Insert<post_subscription::ActiveModel> {
    post_subscription::Entity::insert(post_subscription::ActiveModel {
        user_id: Set(user_id),
        post_id: Set(post_id),
    })
    .on_conflict(
        OnConflict::columns([
            post_subscription::Column::UserId,
            post_subscription::Column::PostId,
        ])
        .do_nothing()
        .to_owned(),
    )
}

#[async_trait]
impl PostRepository for PostgresStore {
    async fn publish(&self, new_post: NewPost) -> Result<(Post, TimelineItem), RepoError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let post = post::ActiveModel {
            author_id: Set(new_post.author_id),
            content: Set(new_post.content),
            spoiler_of: Set(new_post.spoiler_of),
            nsfw: Set(new_post.nsfw),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        let item = timeline::ActiveModel {
            user_id: Set(post.author_id),
            post_id: Set(post.id),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        subscribe(post.author_id, post.id)
            .exec_without_returning(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok((post.into(), item.into()))
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Authored<Post>>, RepoError> {
        post::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(authored)
            .transpose()
    }

    async fn by_author(
        &self,
        author_id: UserId,
        page: &BackwardPage,
    ) -> Result<Vec<Post>, RepoError> {
        let mut query = post::Entity::find().filter(post::Column::AuthorId.eq(author_id));
        if let Some(before) = page.before {
            query = query.filter(post::Column::Id.lt(before));
        }

        let posts = query
            .order_by_desc(post::Column::Id)
            .limit(page.last)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(posts.into_iter().map(Into::into).collect())
    }

    async fn fan_out(&self, post: &Post) -> Result<Vec<TimelineItem>, RepoError> {
        let items = timeline::Entity::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql::FAN_OUT_POST,
                [post.id.into(), post.author_id.into()],
            ))
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(items.into_iter().map(Into::into).collect())
    }

    async fn timeline(
        &self,
        owner: UserId,
        page: &BackwardPage,
    ) -> Result<Vec<(TimelineItem, Authored<Post>)>, RepoError> {
        let mut query = timeline::Entity::find().filter(timeline::Column::UserId.eq(owner));
        if let Some(before) = page.before {
            query = query.filter(timeline::Column::Id.lt(before));
        }

        let items = query
            .order_by_desc(timeline::Column::Id)
            .limit(page.last)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<i64> = items.iter().map(|item| item.post_id).collect();
        let posts: HashMap<PostId, Authored<Post>> = post::Entity::find()
            .filter(post::Column::Id.is_in(post_ids))
            .find_also_related(user::Entity)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(authored)
            .map(|row| row.map(|a: Authored<Post>| (a.item.id, a)))
            .collect::<Result<_, _>>()?;

        Ok(items
            .into_iter()
            .filter_map(|item| {
                let post = posts.get(&item.post_id)?.clone();
                Some((item.into(), post))
            })
            .collect())
    }
}
