//! In-memory graph & content store.
//!
//! This is the fallback when no `DATABASE_URL` is configured, and the store the
//! service-level tests run against. It enforces the same uniqueness and reference
//! rules as the relational schema. Note: Data is lost on server restart.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use murmur_core::domain::{
    Audience, Authored, BackwardPage, Comment, CommentId, ForwardPage, NewComment, NewPost,
    NewUser, Notification, NotificationEvent, NotificationId, Post, PostId, RelationshipKind,
    TimelineItem, TimelineItemId, ToggleState, User, UserId,
};
use murmur_core::error::RepoError;
use murmur_core::ports::{
    CommentRepository, NotificationRepository, PostRepository, RelationshipStore, UserRepository,
};

#[derive(Default)]
struct State {
    last_id: i64,
    users: BTreeMap<UserId, User>,
    posts: BTreeMap<PostId, Post>,
    comments: BTreeMap<CommentId, Comment>,
    follows: BTreeSet<(UserId, UserId)>,
    post_likes: HashSet<(UserId, PostId)>,
    comment_likes: HashSet<(UserId, CommentId)>,
    subscriptions: BTreeSet<(PostId, UserId)>,
    timeline: BTreeMap<TimelineItemId, TimelineItem>,
    notifications: BTreeMap<NotificationId, Notification>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn user(&self, id: UserId) -> Result<&User, RepoError> {
        self.users
            .get(&id)
            .ok_or_else(|| RepoError::ForeignKeyViolation(format!("user {id}")))
    }

    fn user_mut(&mut self, id: UserId) -> Result<&mut User, RepoError> {
        self.users
            .get_mut(&id)
            .ok_or_else(|| RepoError::ForeignKeyViolation(format!("user {id}")))
    }

    fn authored_post(&self, post: &Post) -> Result<Authored<Post>, RepoError> {
        Ok(Authored {
            item: post.clone(),
            author: self.user(post.author_id)?.summary(),
        })
    }

    fn authored_comment(&self, comment: &Comment) -> Result<Authored<Comment>, RepoError> {
        Ok(Authored {
            item: comment.clone(),
            author: self.user(comment.author_id)?.summary(),
        })
    }

    fn page_users<'a>(
        &'a self,
        users: impl Iterator<Item = &'a User>,
        page: &ForwardPage,
    ) -> Vec<User> {
        let mut users: Vec<&User> = users
            .filter(|user| match &page.after {
                Some(after) => user.handle.as_str() > after.as_str(),
                None => true,
            })
            .collect();
        users.sort_by(|a, b| a.handle.cmp(&b.handle));
        users
            .into_iter()
            .take(page.first as usize)
            .cloned()
            .collect()
    }

    fn toggle_follow(&mut self, follower: UserId, followee: UserId) -> Result<ToggleState, RepoError> {
        if follower == followee {
            return Err(RepoError::Query("follows_check violated".to_string()));
        }
        self.user(follower)?;
        self.user(followee)?;

        let was_active = !self.follows.insert((follower, followee));
        if was_active {
            self.follows.remove(&(follower, followee));
        }
        let delta = if was_active { -1 } else { 1 };

        self.user_mut(follower)?.followees_count += delta;
        let followee = self.user_mut(followee)?;
        followee.followers_count += delta;

        Ok(ToggleState {
            was_active,
            count: followee.followers_count,
        })
    }

    fn toggle_post_like(&mut self, user_id: UserId, post_id: PostId) -> Result<ToggleState, RepoError> {
        self.user(user_id)?;
        let post = self
            .posts
            .get_mut(&post_id)
            .ok_or_else(|| RepoError::ForeignKeyViolation(format!("post {post_id}")))?;

        let was_active = !self.post_likes.insert((user_id, post_id));
        if was_active {
            self.post_likes.remove(&(user_id, post_id));
            post.likes_count -= 1;
        } else {
            post.likes_count += 1;
        }

        Ok(ToggleState {
            was_active,
            count: post.likes_count,
        })
    }

    fn toggle_comment_like(
        &mut self,
        user_id: UserId,
        comment_id: CommentId,
    ) -> Result<ToggleState, RepoError> {
        self.user(user_id)?;
        let comment = self
            .comments
            .get_mut(&comment_id)
            .ok_or_else(|| RepoError::ForeignKeyViolation(format!("comment {comment_id}")))?;

        let was_active = !self.comment_likes.insert((user_id, comment_id));
        if was_active {
            self.comment_likes.remove(&(user_id, comment_id));
            comment.likes_count -= 1;
        } else {
            comment.likes_count += 1;
        }

        Ok(ToggleState {
            was_active,
            count: comment.likes_count,
        })
    }

    fn has_edge(&self, kind: RelationshipKind, actor: UserId, target: i64) -> bool {
        match kind {
            RelationshipKind::Follow => self.follows.contains(&(actor, target)),
            RelationshipKind::PostLike => self.post_likes.contains(&(actor, target)),
            RelationshipKind::CommentLike => self.comment_likes.contains(&(actor, target)),
        }
    }

    fn recipients(&self, audience: &Audience) -> Vec<UserId> {
        match audience {
            Audience::User(user_id) => self
                .users
                .contains_key(user_id)
                .then_some(*user_id)
                .into_iter()
                .collect(),
            Audience::PostSubscribers(post_id) => self
                .subscriptions
                .range((*post_id, UserId::MIN)..=(*post_id, UserId::MAX))
                .map(|(_, user_id)| *user_id)
                .collect(),
            Audience::Handles(handles) => self
                .users
                .values()
                .filter(|user| handles.contains(&user.handle))
                .map(|user| user.id)
                .collect(),
        }
    }
}

/// Mutex-guarded store; every port call is one critical section, which makes each
/// write atomic the way a transaction is.
#[derive(Default)]
pub struct InMemorySocialStore {
    state: Mutex<State>,
}

impl InMemorySocialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owners of the timeline rows referencing `post_id`, sorted.
    pub async fn timeline_owners(&self, post_id: PostId) -> Vec<UserId> {
        let state = self.state.lock().await;
        let mut owners: Vec<UserId> = state
            .timeline
            .values()
            .filter(|item| item.post_id == post_id)
            .map(|item| item.user_id)
            .collect();
        owners.sort_unstable();
        owners
    }

    /// Number of follow edges pointing at `user_id`.
    pub async fn follower_edges(&self, user_id: UserId) -> usize {
        let state = self.state.lock().await;
        state.follows.iter().filter(|(_, followee)| *followee == user_id).count()
    }

    /// Number of like edges pointing at `post_id`.
    pub async fn post_like_edges(&self, post_id: PostId) -> usize {
        let state = self.state.lock().await;
        state.post_likes.iter().filter(|(_, post)| *post == post_id).count()
    }
}

#[async_trait]
impl UserRepository for InMemorySocialStore {
    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let mut state = self.state.lock().await;

        if state.users.values().any(|u| u.email == new_user.email) {
            return Err(RepoError::UniqueViolation("users_email_key".to_string()));
        }
        if state.users.values().any(|u| u.handle == new_user.handle) {
            return Err(RepoError::UniqueViolation("users_handle_key".to_string()));
        }

        let user = User {
            id: state.next_id(),
            email: new_user.email,
            handle: new_user.handle,
            avatar: None,
            followers_count: 0,
            followees_count: 0,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepoError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_by_handle(&self, handle: &str) -> Result<Option<User>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.handle == handle).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn search(
        &self,
        query: Option<&str>,
        page: &ForwardPage,
    ) -> Result<Vec<User>, RepoError> {
        let state = self.state.lock().await;
        let prefix = query.map(str::to_lowercase);
        let matching = state.users.values().filter(|user| match &prefix {
            Some(prefix) => user.handle.to_lowercase().starts_with(prefix.as_str()),
            None => true,
        });
        Ok(state.page_users(matching, page))
    }

    async fn followers(
        &self,
        user_id: UserId,
        page: &ForwardPage,
    ) -> Result<Vec<User>, RepoError> {
        let state = self.state.lock().await;
        let followers = state
            .follows
            .iter()
            .filter(|(_, followee)| *followee == user_id)
            .filter_map(|(follower, _)| state.users.get(follower));
        Ok(state.page_users(followers, page))
    }

    async fn followees(
        &self,
        user_id: UserId,
        page: &ForwardPage,
    ) -> Result<Vec<User>, RepoError> {
        let state = self.state.lock().await;
        let followees = state
            .follows
            .range((user_id, UserId::MIN)..=(user_id, UserId::MAX))
            .filter_map(|(_, followee)| state.users.get(followee));
        Ok(state.page_users(followees, page))
    }
}

#[async_trait]
impl RelationshipStore for InMemorySocialStore {
    async fn toggle(
        &self,
        kind: RelationshipKind,
        actor: UserId,
        target: i64,
    ) -> Result<ToggleState, RepoError> {
        let mut state = self.state.lock().await;
        match kind {
            RelationshipKind::Follow => state.toggle_follow(actor, target),
            RelationshipKind::PostLike => state.toggle_post_like(actor, target),
            RelationshipKind::CommentLike => state.toggle_comment_like(actor, target),
        }
    }

    async fn active_targets(
        &self,
        kind: RelationshipKind,
        actor: UserId,
        targets: &[i64],
    ) -> Result<HashSet<i64>, RepoError> {
        let state = self.state.lock().await;
        Ok(targets
            .iter()
            .copied()
            .filter(|target| state.has_edge(kind, actor, *target))
            .collect())
    }

    async fn active_actors(
        &self,
        kind: RelationshipKind,
        target: i64,
        actors: &[UserId],
    ) -> Result<HashSet<UserId>, RepoError> {
        let state = self.state.lock().await;
        Ok(actors
            .iter()
            .copied()
            .filter(|actor| state.has_edge(kind, *actor, target))
            .collect())
    }
}

#[async_trait]
impl PostRepository for InMemorySocialStore {
    async fn publish(&self, new_post: NewPost) -> Result<(Post, TimelineItem), RepoError> {
        let mut state = self.state.lock().await;
        state.user(new_post.author_id)?;

        let now = Utc::now();
        let post = Post {
            id: state.next_id(),
            author_id: new_post.author_id,
            content: new_post.content,
            spoiler_of: new_post.spoiler_of,
            nsfw: new_post.nsfw,
            likes_count: 0,
            comments_count: 0,
            created_at: now,
        };
        let item = TimelineItem {
            id: state.next_id(),
            user_id: post.author_id,
            post_id: post.id,
            created_at: now,
        };

        state.posts.insert(post.id, post.clone());
        state.timeline.insert(item.id, item);
        state.subscriptions.insert((post.id, post.author_id));
        Ok((post, item))
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Authored<Post>>, RepoError> {
        let state = self.state.lock().await;
        state
            .posts
            .get(&id)
            .map(|post| state.authored_post(post))
            .transpose()
    }

    async fn by_author(
        &self,
        author_id: UserId,
        page: &BackwardPage,
    ) -> Result<Vec<Post>, RepoError> {
        let state = self.state.lock().await;
        let upper = page.before.unwrap_or(PostId::MAX);
        Ok(state
            .posts
            .range(..upper)
            .rev()
            .map(|(_, post)| post)
            .filter(|post| post.author_id == author_id)
            .take(page.last as usize)
            .cloned()
            .collect())
    }

    async fn fan_out(&self, post: &Post) -> Result<Vec<TimelineItem>, RepoError> {
        let mut state = self.state.lock().await;

        let followers: Vec<UserId> = state
            .follows
            .iter()
            .filter(|(_, followee)| *followee == post.author_id)
            .map(|(follower, _)| *follower)
            .collect();

        let mut items = Vec::with_capacity(followers.len());
        let now = Utc::now();
        for follower in followers {
            let exists = state
                .timeline
                .values()
                .any(|item| item.user_id == follower && item.post_id == post.id);
            if exists {
                continue;
            }
            let item = TimelineItem {
                id: state.next_id(),
                user_id: follower,
                post_id: post.id,
                created_at: now,
            };
            state.timeline.insert(item.id, item);
            items.push(item);
        }
        Ok(items)
    }

    async fn timeline(
        &self,
        owner: UserId,
        page: &BackwardPage,
    ) -> Result<Vec<(TimelineItem, Authored<Post>)>, RepoError> {
        let state = self.state.lock().await;
        let upper = page.before.unwrap_or(TimelineItemId::MAX);

        state
            .timeline
            .range(..upper)
            .rev()
            .map(|(_, item)| item)
            .filter(|item| item.user_id == owner)
            .filter_map(|item| state.posts.get(&item.post_id).map(|post| (*item, post)))
            .take(page.last as usize)
            .map(|(item, post)| state.authored_post(post).map(|authored| (item, authored)))
            .collect()
    }
}

#[async_trait]
impl CommentRepository for InMemorySocialStore {
    async fn create(&self, new_comment: NewComment) -> Result<Comment, RepoError> {
        let mut state = self.state.lock().await;
        state.user(new_comment.author_id)?;
        if !state.posts.contains_key(&new_comment.post_id) {
            return Err(RepoError::ForeignKeyViolation(format!(
                "post {}",
                new_comment.post_id
            )));
        }

        let comment = Comment {
            id: state.next_id(),
            post_id: new_comment.post_id,
            author_id: new_comment.author_id,
            content: new_comment.content,
            likes_count: 0,
            created_at: Utc::now(),
        };
        state.comments.insert(comment.id, comment.clone());
        state
            .subscriptions
            .insert((comment.post_id, comment.author_id));
        if let Some(post) = state.posts.get_mut(&comment.post_id) {
            post.comments_count += 1;
        }
        Ok(comment)
    }

    async fn find_by_id(&self, id: CommentId) -> Result<Option<Authored<Comment>>, RepoError> {
        let state = self.state.lock().await;
        state
            .comments
            .get(&id)
            .map(|comment| state.authored_comment(comment))
            .transpose()
    }

    async fn list(
        &self,
        post_id: PostId,
        page: &BackwardPage,
    ) -> Result<Vec<Authored<Comment>>, RepoError> {
        let state = self.state.lock().await;
        let upper = page.before.unwrap_or(CommentId::MAX);
        state
            .comments
            .range(..upper)
            .rev()
            .map(|(_, comment)| comment)
            .filter(|comment| comment.post_id == post_id)
            .take(page.last as usize)
            .map(|comment| state.authored_comment(comment))
            .collect()
    }

    async fn subscribers(&self, post_id: PostId) -> Result<Vec<UserId>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.recipients(&Audience::PostSubscribers(post_id)))
    }
}

#[async_trait]
impl NotificationRepository for InMemorySocialStore {
    async fn notify(
        &self,
        audience: &Audience,
        event: &NotificationEvent,
    ) -> Result<Vec<Notification>, RepoError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let recipients: Vec<UserId> = state
            .recipients(audience)
            .into_iter()
            .filter(|user_id| *user_id != event.actor_id)
            .collect();

        let mut touched = Vec::with_capacity(recipients.len());
        for user_id in recipients {
            let open = state
                .notifications
                .values_mut()
                .find(|n| n.user_id == user_id && n.accepts(event.kind, event.post_id));

            let notification = match open {
                Some(existing) => {
                    existing.merge_actor(&event.actor, now);
                    existing.clone()
                }
                None => {
                    let id = state.next_id();
                    let created = Notification::open(id, user_id, event, now);
                    state.notifications.insert(id, created.clone());
                    created
                }
            };
            touched.push(notification);
        }
        Ok(touched)
    }

    async fn list(
        &self,
        user_id: UserId,
        page: &BackwardPage,
    ) -> Result<Vec<Notification>, RepoError> {
        let state = self.state.lock().await;
        let upper = page.before.unwrap_or(NotificationId::MAX);
        Ok(state
            .notifications
            .range(..upper)
            .rev()
            .map(|(_, n)| n)
            .filter(|n| n.user_id == user_id)
            .take(page.last as usize)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, user_id: UserId, id: NotificationId) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        match state.notifications.get_mut(&id) {
            Some(n) if n.user_id == user_id => {
                n.read = true;
                Ok(())
            }
            _ => Err(RepoError::NotFound),
        }
    }

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepoError> {
        let mut state = self.state.lock().await;
        let mut updated = 0;
        for n in state.notifications.values_mut() {
            if n.user_id == user_id && !n.read {
                n.read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn unread_count(&self, user_id: UserId) -> Result<u64, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.read)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests;
