use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};

use murmur_core::domain::{ForwardPage, NewUser, User, UserId};
use murmur_core::error::RepoError;
use murmur_core::ports::UserRepository;

use super::entity::{follow, user};
use super::errors::db_err;
use super::store::PostgresStore;

/// `LIKE` pattern matching handles that start with `prefix`, case-insensitively.
fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl PostgresStore {
    async fn page_users(
        &self,
        mut query: Select<user::Entity>,
        page: &ForwardPage,
    ) -> Result<Vec<User>, RepoError> {
        if let Some(after) = &page.after {
            query = query.filter(user::Column::Handle.gt(after.as_str()));
        }

        let users = query
            .order_by_asc(user::Column::Handle)
            .limit(page.first)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(users.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl UserRepository for PostgresStore {
    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let model = user::ActiveModel {
            email: Set(new_user.email),
            handle: Set(new_user.handle),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        Ok(model.into())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let result = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_handle(&self, handle: &str) -> Result<Option<User>, RepoError> {
        let result = user::Entity::find()
            .filter(user::Column::Handle.eq(handle))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let result = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.map(Into::into))
    }

    async fn search(
        &self,
        query: Option<&str>,
        page: &ForwardPage,
    ) -> Result<Vec<User>, RepoError> {
        let mut select = user::Entity::find();
        if let Some(prefix) = query {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(user::Column::Handle))).like(prefix_pattern(prefix)),
            );
        }
        self.page_users(select, page).await
    }

    async fn followers(
        &self,
        user_id: UserId,
        page: &ForwardPage,
    ) -> Result<Vec<User>, RepoError> {
        let followers = Query::select()
            .column(follow::Column::FollowerId)
            .from(follow::Entity)
            .and_where(follow::Column::FolloweeId.eq(user_id))
            .to_owned();

        let select = user::Entity::find().filter(user::Column::Id.in_subquery(followers));
        self.page_users(select, page).await
    }

    async fn followees(
        &self,
        user_id: UserId,
        page: &ForwardPage,
    ) -> Result<Vec<User>, RepoError> {
        let followees = Query::select()
            .column(follow::Column::FolloweeId)
            .from(follow::Entity)
            .and_where(follow::Column::FollowerId.eq(user_id))
            .to_owned();

        let select = user::Entity::find().filter(user::Column::Id.in_subquery(followees));
        self.page_users(select, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::prefix_pattern;

    #[test]
    fn test_prefix_pattern_escapes_wildcards() {
        assert_eq!(prefix_pattern("Ann"), "ann%");
        assert_eq!(prefix_pattern("a_b"), "a\\_b%");
        assert_eq!(prefix_pattern("50%"), "50\\%%");
    }
}
