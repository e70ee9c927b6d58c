//! Accounts, profiles and user listings.

use std::collections::HashSet;

use crate::domain::{ForwardPage, NewUser, RelationshipKind, User, UserId, UserProfile};
use crate::error::{DomainError, RepoError};

use super::SocialService;

impl SocialService {
    pub async fn create_user(&self, email: &str, handle: &str) -> Result<User, DomainError> {
        let new_user = NewUser::new(email, handle)?;

        let user = self.repos.users.create(new_user).await.map_err(|e| match e {
            RepoError::UniqueViolation(constraint) if constraint.contains("email") => {
                DomainError::Conflict("email taken".to_string())
            }
            RepoError::UniqueViolation(_) => DomainError::Conflict("handle taken".to_string()),
            other => other.into(),
        })?;

        tracing::info!(user_id = user.id, handle = %user.handle, "User created");
        Ok(user)
    }

    /// Looks up the account a login token is issued for.
    pub async fn login(&self, email: &str) -> Result<User, DomainError> {
        let email = email.trim().to_lowercase();
        self.repos
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| DomainError::not_found("user", email))
    }

    pub async fn user(
        &self,
        viewer: Option<UserId>,
        handle: &str,
    ) -> Result<UserProfile, DomainError> {
        let user = self.user_by_handle(handle).await?;
        let mut profiles = self.profiles(viewer, vec![user]).await?;
        profiles
            .pop()
            .ok_or_else(|| DomainError::Internal("profile decoration lost a user".to_string()))
    }

    pub async fn search_users(
        &self,
        viewer: Option<UserId>,
        query: Option<&str>,
        page: &ForwardPage,
    ) -> Result<Vec<UserProfile>, DomainError> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let users = self.repos.users.search(query, page).await?;
        self.profiles(viewer, users).await
    }

    pub async fn followers(
        &self,
        viewer: Option<UserId>,
        handle: &str,
        page: &ForwardPage,
    ) -> Result<Vec<UserProfile>, DomainError> {
        let user = self.user_by_handle(handle).await?;
        let users = self.repos.users.followers(user.id, page).await?;
        self.profiles(viewer, users).await
    }

    pub async fn followees(
        &self,
        viewer: Option<UserId>,
        handle: &str,
        page: &ForwardPage,
    ) -> Result<Vec<UserProfile>, DomainError> {
        let user = self.user_by_handle(handle).await?;
        let users = self.repos.users.followees(user.id, page).await?;
        self.profiles(viewer, users).await
    }

    async fn user_by_handle(&self, handle: &str) -> Result<User, DomainError> {
        self.repos
            .users
            .find_by_handle(handle)
            .await?
            .ok_or_else(|| DomainError::not_found("user", handle))
    }

    /// Decorates users with the viewer's follow relationships.
    async fn profiles(
        &self,
        viewer: Option<UserId>,
        users: Vec<User>,
    ) -> Result<Vec<UserProfile>, DomainError> {
        let Some(viewer_id) = viewer else {
            return Ok(users.iter().map(UserProfile::anonymous).collect());
        };

        let ids: Vec<UserId> = users
            .iter()
            .map(|user| user.id)
            .filter(|id| *id != viewer_id)
            .collect();
        let (following, followed_by) = if ids.is_empty() {
            (HashSet::new(), HashSet::new())
        } else {
            let relationships = &self.repos.relationships;
            (
                relationships
                    .active_targets(RelationshipKind::Follow, viewer_id, &ids)
                    .await?,
                relationships
                    .active_actors(RelationshipKind::Follow, viewer_id, &ids)
                    .await?,
            )
        };

        Ok(users
            .iter()
            .map(|user| {
                let mut profile = UserProfile::anonymous(user);
                profile.me = user.id == viewer_id;
                profile.following = following.contains(&user.id);
                profile.followed_by = followed_by.contains(&user.id);
                if profile.me {
                    profile.email = Some(user.email.clone());
                }
                profile
            })
            .collect())
    }
}
