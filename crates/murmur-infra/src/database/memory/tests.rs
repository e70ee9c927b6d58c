use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::join_all;

use murmur_core::domain::{
    BackwardPage, FeedFilter, LiveEvent, NotificationKind, RelationshipKind, ToggleState, User,
    UserId,
};
use murmur_core::error::{DomainError, RepoError};
use murmur_core::ports::{Job, JobHandler, JobQueue, JobQueueError, JobResult, QueueStats, RelationshipStore};
use murmur_core::{Repositories, SocialService};

use super::InMemorySocialStore;
use crate::live::LiveRegistry;

/// Holds queued jobs until the test runs them.
#[derive(Default)]
struct RecordingJobQueue {
    jobs: Mutex<Vec<Job>>,
}

impl RecordingJobQueue {
    fn drain(&self) -> Vec<Job> {
        std::mem::take(&mut *self.jobs.lock().unwrap())
    }
}

#[async_trait]
impl JobQueue for RecordingJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }

    async fn start_worker(&self, _handler: JobHandler) -> Result<(), JobQueueError> {
        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, JobQueueError> {
        Ok(QueueStats {
            pending: self.jobs.lock().unwrap().len(),
            ..QueueStats::default()
        })
    }
}

/// Loses the first `conflicts` toggles to a simulated concurrent writer.
struct RacingRelationships {
    inner: Arc<InMemorySocialStore>,
    conflicts: AtomicU32,
}

#[async_trait]
impl RelationshipStore for RacingRelationships {
    async fn toggle(
        &self,
        kind: RelationshipKind,
        actor: UserId,
        target: i64,
    ) -> Result<ToggleState, RepoError> {
        let lost = self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if lost {
            return Err(RepoError::UniqueViolation("follows_pkey".to_string()));
        }
        self.inner.toggle(kind, actor, target).await
    }

    async fn active_targets(
        &self,
        kind: RelationshipKind,
        actor: UserId,
        targets: &[i64],
    ) -> Result<std::collections::HashSet<i64>, RepoError> {
        self.inner.active_targets(kind, actor, targets).await
    }

    async fn active_actors(
        &self,
        kind: RelationshipKind,
        target: i64,
        actors: &[UserId],
    ) -> Result<std::collections::HashSet<UserId>, RepoError> {
        self.inner.active_actors(kind, target, actors).await
    }
}

/// Lets a concurrent toggle of the same edge commit first, then reports the delete this
/// toggle had planned as having matched nothing.
struct InterleavedToggles {
    inner: Arc<InMemorySocialStore>,
    races: Arc<AtomicU32>,
}

#[async_trait]
impl RelationshipStore for InterleavedToggles {
    async fn toggle(
        &self,
        kind: RelationshipKind,
        actor: UserId,
        target: i64,
    ) -> Result<ToggleState, RepoError> {
        let lost = self
            .races
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if lost {
            let winner = self.inner.toggle(kind, actor, target).await?;
            assert!(winner.was_active, "interleaving needs an existing edge");
            return Err(RepoError::StaleRead(format!("{kind:?} ({actor}, {target})")));
        }
        self.inner.toggle(kind, actor, target).await
    }

    async fn active_targets(
        &self,
        kind: RelationshipKind,
        actor: UserId,
        targets: &[i64],
    ) -> Result<std::collections::HashSet<i64>, RepoError> {
        self.inner.active_targets(kind, actor, targets).await
    }

    async fn active_actors(
        &self,
        kind: RelationshipKind,
        target: i64,
        actors: &[UserId],
    ) -> Result<std::collections::HashSet<UserId>, RepoError> {
        self.inner.active_actors(kind, target, actors).await
    }
}

struct Harness {
    store: Arc<InMemorySocialStore>,
    live: Arc<LiveRegistry>,
    jobs: Arc<RecordingJobQueue>,
    service: Arc<SocialService>,
}

impl Harness {
    fn new() -> Self {
        Self::with_repositories(|repos, _| repos)
    }

    fn with_repositories<F>(customize: F) -> Self
    where
        F: FnOnce(Repositories, Arc<InMemorySocialStore>) -> Repositories,
    {
        let store = Arc::new(InMemorySocialStore::new());
        let live = Arc::new(LiveRegistry::new(8));
        let jobs = Arc::new(RecordingJobQueue::default());
        let repos = customize(Repositories::from_store(store.clone()), store.clone());
        let service = Arc::new(SocialService::new(repos, live.clone(), jobs.clone()));

        Self {
            store,
            live,
            jobs,
            service,
        }
    }

    async fn user(&self, handle: &str) -> User {
        self.service
            .create_user(&format!("{handle}@example.org"), handle)
            .await
            .unwrap()
    }

    /// Runs queued background work to completion.
    async fn settle(&self) {
        loop {
            let jobs = self.jobs.drain();
            if jobs.is_empty() {
                break;
            }
            for job in jobs {
                let result = self.service.run_job(job).await;
                assert!(matches!(result, JobResult::Success), "job failed: {result:?}");
            }
        }
    }
}

#[tokio::test]
async fn test_like_toggle_round_trip() {
    let h = Harness::new();
    let ann = h.user("ann").await;
    let bob = h.user("bob").await;
    let post = h
        .service
        .publish_post(Some(ann.id), "hello", None, false)
        .await
        .unwrap();

    let liked = h
        .service
        .toggle_post_like(Some(bob.id), post.post.post.id)
        .await
        .unwrap();
    assert!(liked.active);
    assert_eq!(liked.count, 1);

    let unliked = h
        .service
        .toggle_post_like(Some(bob.id), post.post.post.id)
        .await
        .unwrap();
    assert!(!unliked.active);
    assert_eq!(unliked.count, 0);
    assert_eq!(h.store.post_like_edges(post.post.post.id).await, 0);
}

#[tokio::test]
async fn test_comment_like_toggle_and_missing_target() {
    let h = Harness::new();
    let ann = h.user("ann").await;
    let post = h
        .service
        .publish_post(Some(ann.id), "hello", None, false)
        .await
        .unwrap();
    let comment = h
        .service
        .create_comment(Some(ann.id), post.post.post.id, "first")
        .await
        .unwrap();

    let liked = h
        .service
        .toggle_comment_like(Some(ann.id), comment.comment.id)
        .await
        .unwrap();
    assert!(liked.active);
    assert_eq!(liked.count, 1);

    let err = h
        .service
        .toggle_comment_like(Some(ann.id), 9999)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity_type: "comment", .. }));
}

#[tokio::test]
async fn test_concurrent_follow_toggles_keep_counters_exact() {
    let h = Harness::new();
    let star = h.user("star").await;
    let mut fans = Vec::new();
    for i in 0..10 {
        fans.push(h.user(&format!("fan{i}")).await);
    }

    // Every fan toggles once; even-numbered fans toggle a second time.
    let star_id = star.id;
    let toggles = fans.iter().enumerate().flat_map(|(i, fan)| {
        let times = if i % 2 == 0 { 2 } else { 1 };
        std::iter::repeat_n(fan.id, times)
    });
    let results = join_all(toggles.map(|fan_id| {
        let service = h.service.clone();
        async move { service.toggle_follow(Some(fan_id), star_id).await }
    }))
    .await;
    assert!(results.iter().all(Result::is_ok));

    let profile = h.service.user(None, "star").await.unwrap();
    assert_eq!(profile.followers_count, 5);
    assert_eq!(h.store.follower_edges(star_id).await, 5);

    for (i, fan) in fans.iter().enumerate() {
        let profile = h.service.user(None, &fan.handle).await.unwrap();
        let expected = if i % 2 == 0 { 0 } else { 1 };
        assert_eq!(profile.followees_count, expected);
    }
}

#[tokio::test]
async fn test_toggle_retries_lost_races() {
    let h = Harness::with_repositories(|mut repos, store| {
        repos.relationships = Arc::new(RacingRelationships {
            inner: store,
            conflicts: AtomicU32::new(2),
        });
        repos
    });
    let ann = h.user("ann").await;
    let bob = h.user("bob").await;

    let outcome = h.service.toggle_follow(Some(ann.id), bob.id).await.unwrap();

    assert!(outcome.active);
    assert_eq!(outcome.count, 1);
}

#[tokio::test]
async fn test_lost_unlike_is_rerun_without_phantom_decrement() {
    let races = Arc::new(AtomicU32::new(0));
    let h = Harness::with_repositories({
        let races = races.clone();
        move |mut repos, store| {
            repos.relationships = Arc::new(InterleavedToggles {
                inner: store,
                races,
            });
            repos
        }
    });
    let ann = h.user("ann").await;
    let bob = h.user("bob").await;
    let post = h
        .service
        .publish_post(Some(ann.id), "hello", None, false)
        .await
        .unwrap();
    let post_id = post.post.post.id;
    h.service.toggle_post_like(Some(bob.id), post_id).await.unwrap();

    // Both toggles saw the like; the other one removed it first.
    races.store(1, Ordering::SeqCst);
    let outcome = h.service.toggle_post_like(Some(bob.id), post_id).await.unwrap();

    assert!(outcome.active);
    assert_eq!(outcome.count, 1);
    assert_eq!(h.store.post_like_edges(post_id).await, 1);
    let post = h.service.post(None, post_id).await.unwrap();
    assert_eq!(post.post.likes_count, 1);
}

#[tokio::test]
async fn test_toggle_gives_up_after_repeated_conflicts() {
    let h = Harness::with_repositories(|mut repos, store| {
        repos.relationships = Arc::new(RacingRelationships {
            inner: store,
            conflicts: AtomicU32::new(3),
        });
        repos
    });
    let ann = h.user("ann").await;
    let bob = h.user("bob").await;

    let err = h.service.toggle_follow(Some(ann.id), bob.id).await.unwrap_err();

    assert!(matches!(err, DomainError::Conflict(_)));
    assert_eq!(h.store.follower_edges(bob.id).await, 0);
}

#[tokio::test]
async fn test_self_follow_rejected_without_change() {
    let h = Harness::new();
    let ann = h.user("ann").await;

    let err = h.service.toggle_follow(Some(ann.id), ann.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let err = h
        .service
        .toggle_follow_handle(Some(ann.id), "ann")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let profile = h.service.user(Some(ann.id), "ann").await.unwrap();
    assert_eq!(profile.followers_count, 0);
    assert_eq!(profile.followees_count, 0);
    assert!(h.jobs.drain().is_empty());
}

#[tokio::test]
async fn test_anonymous_writes_are_rejected() {
    let h = Harness::new();
    let ann = h.user("ann").await;

    let err = h.service.toggle_follow(None, ann.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Unauthenticated));
    let err = h
        .service
        .publish_post(None, "hi", None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Unauthenticated));
}

#[tokio::test]
async fn test_publish_fans_out_to_every_follower() {
    let h = Harness::new();
    let ann = h.user("ann").await;
    let bob = h.user("bob").await;
    let cid = h.user("cid").await;
    h.service.toggle_follow(Some(bob.id), ann.id).await.unwrap();
    h.service.toggle_follow(Some(cid.id), ann.id).await.unwrap();
    h.settle().await;

    let published = h
        .service
        .publish_post(Some(ann.id), "news", None, false)
        .await
        .unwrap();
    let post_id = published.post.post.id;
    assert!(published.post.mine);

    // Only the author's own row exists until the background job runs.
    assert_eq!(h.store.timeline_owners(post_id).await, vec![ann.id]);
    h.settle().await;

    assert_eq!(
        h.store.timeline_owners(post_id).await,
        vec![ann.id, bob.id, cid.id]
    );
    let bob_timeline = h
        .service
        .timeline(Some(bob.id), &BackwardPage::default())
        .await
        .unwrap();
    assert_eq!(bob_timeline.len(), 1);
    assert_eq!(bob_timeline[0].post.post.id, post_id);
    assert!(!bob_timeline[0].post.mine);
}

#[tokio::test]
async fn test_fan_out_pushes_to_live_subscribers_only() {
    let h = Harness::new();
    let ann = h.user("ann").await;
    let bob = h.user("bob").await;
    let cid = h.user("cid").await;
    h.service.toggle_follow(Some(bob.id), ann.id).await.unwrap();
    h.service.toggle_follow(Some(cid.id), ann.id).await.unwrap();
    h.settle().await;

    let mut bob_stream = h.live.subscribe(bob.id, FeedFilter::Timeline);
    let cid_stream = h.live.subscribe(cid.id, FeedFilter::Timeline);
    drop(cid_stream);

    let published = h
        .service
        .publish_post(Some(ann.id), "live", None, false)
        .await
        .unwrap();
    h.settle().await;

    match bob_stream.try_recv() {
        Some(LiveEvent::TimelineItem(entry)) => {
            assert_eq!(entry.post.post.id, published.post.post.id);
            assert_eq!(entry.post.author.handle, "ann");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(bob_stream.try_recv().is_none());
    assert_eq!(h.live.connections(cid.id), 0);
}

#[tokio::test]
async fn test_timeline_pagination_has_no_gaps_or_overlap() {
    let h = Harness::new();
    let ann = h.user("ann").await;
    for i in 0..5 {
        h.service
            .publish_post(Some(ann.id), &format!("post {i}"), None, false)
            .await
            .unwrap();
    }

    let mut seen = Vec::new();
    let mut before = None;
    loop {
        let page = h
            .service
            .timeline(Some(ann.id), &BackwardPage::new(Some(2), before))
            .await
            .unwrap();
        if page.is_empty() {
            break;
        }
        assert!(page.len() <= 2);
        before = page.last().map(|entry| entry.id);
        seen.extend(page.into_iter().map(|entry| entry.post.post.content));
    }

    assert_eq!(
        seen,
        vec!["post 4", "post 3", "post 2", "post 1", "post 0"]
    );
}

#[tokio::test]
async fn test_repeated_comments_merge_into_one_notification() {
    let h = Harness::new();
    let ann = h.user("ann").await;
    let bob = h.user("bob").await;
    let dan = h.user("dan").await;
    let post = h
        .service
        .publish_post(Some(ann.id), "discuss", None, false)
        .await
        .unwrap();
    let post_id = post.post.post.id;

    h.service
        .create_comment(Some(bob.id), post_id, "first")
        .await
        .unwrap();
    h.settle().await;
    for i in 0..3 {
        h.service
            .create_comment(Some(dan.id), post_id, &format!("again {i}"))
            .await
            .unwrap();
        h.settle().await;
    }

    let ann_feed = h
        .service
        .notifications(Some(ann.id), &BackwardPage::default())
        .await
        .unwrap();
    assert_eq!(ann_feed.len(), 1);
    assert_eq!(ann_feed[0].kind, NotificationKind::Comment);
    assert_eq!(ann_feed[0].actors, vec!["dan", "bob"]);

    let bob_feed = h
        .service
        .notifications(Some(bob.id), &BackwardPage::default())
        .await
        .unwrap();
    assert_eq!(bob_feed.len(), 1);
    assert_eq!(bob_feed[0].actors, vec!["dan"]);

    let dan_feed = h
        .service
        .notifications(Some(dan.id), &BackwardPage::default())
        .await
        .unwrap();
    assert!(dan_feed.is_empty());
}

#[tokio::test]
async fn test_read_notification_is_not_merged_into() {
    let h = Harness::new();
    let ann = h.user("ann").await;
    let bob = h.user("bob").await;
    let post = h
        .service
        .publish_post(Some(ann.id), "discuss", None, false)
        .await
        .unwrap();
    let post_id = post.post.post.id;

    h.service
        .create_comment(Some(bob.id), post_id, "one")
        .await
        .unwrap();
    h.settle().await;
    assert_eq!(h.service.unread_notifications(Some(ann.id)).await.unwrap(), 1);

    let updated = h
        .service
        .mark_all_notifications_read(Some(ann.id))
        .await
        .unwrap();
    assert_eq!(updated, 1);
    assert_eq!(h.service.unread_notifications(Some(ann.id)).await.unwrap(), 0);

    h.service
        .create_comment(Some(bob.id), post_id, "two")
        .await
        .unwrap();
    h.settle().await;

    let feed = h
        .service
        .notifications(Some(ann.id), &BackwardPage::default())
        .await
        .unwrap();
    assert_eq!(feed.len(), 2);
    assert!(!feed[0].read);
    assert_eq!(feed[0].actors, vec!["bob"]);
    assert!(feed[1].read);
}

#[tokio::test]
async fn test_mark_read_is_owner_only() {
    let h = Harness::new();
    let ann = h.user("ann").await;
    let bob = h.user("bob").await;
    h.service.toggle_follow(Some(bob.id), ann.id).await.unwrap();
    h.settle().await;

    let feed = h
        .service
        .notifications(Some(ann.id), &BackwardPage::default())
        .await
        .unwrap();
    let id = feed[0].id;

    let err = h
        .service
        .mark_notification_read(Some(bob.id), id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity_type: "notification", .. }));

    h.service
        .mark_notification_read(Some(ann.id), id)
        .await
        .unwrap();
    assert_eq!(h.service.unread_notifications(Some(ann.id)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_follow_notification_is_pushed_live() {
    let h = Harness::new();
    let ann = h.user("ann").await;
    let bob = h.user("bob").await;
    let cid = h.user("cid").await;
    let mut ann_stream = h.live.subscribe(ann.id, FeedFilter::Notifications);

    h.service.toggle_follow(Some(bob.id), ann.id).await.unwrap();
    h.service.toggle_follow(Some(cid.id), ann.id).await.unwrap();
    h.settle().await;

    let mut actors = Vec::new();
    while let Some(LiveEvent::Notification(n)) = ann_stream.try_recv() {
        assert_eq!(n.kind, NotificationKind::Follow);
        actors = n.actors;
    }
    assert_eq!(actors, vec!["cid", "bob"]);

    // Unfollowing notifies nobody.
    h.service.toggle_follow(Some(bob.id), ann.id).await.unwrap();
    assert!(h.jobs.drain().is_empty());
}

#[tokio::test]
async fn test_comments_are_pushed_to_subscribers_except_commenter() {
    let h = Harness::new();
    let ann = h.user("ann").await;
    let bob = h.user("bob").await;
    let cid = h.user("cid").await;
    let post = h
        .service
        .publish_post(Some(ann.id), "thread", None, false)
        .await
        .unwrap();
    let post_id = post.post.post.id;
    h.service
        .create_comment(Some(bob.id), post_id, "hi")
        .await
        .unwrap();
    h.settle().await;

    let mut ann_stream = h.live.subscribe(ann.id, FeedFilter::Comments(post_id));
    let mut bob_stream = h.live.subscribe(bob.id, FeedFilter::Comments(post_id));
    let mut cid_stream = h.live.subscribe(cid.id, FeedFilter::Comments(post_id));

    h.service
        .create_comment(Some(cid.id), post_id, "me too")
        .await
        .unwrap();
    h.settle().await;

    for stream in [&mut ann_stream, &mut bob_stream] {
        match stream.try_recv() {
            Some(LiveEvent::Comment(view)) => {
                assert_eq!(view.comment.content, "me too");
                assert!(!view.mine);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
    assert!(cid_stream.try_recv().is_none());
}

#[tokio::test]
async fn test_mentions_notify_existing_users_except_author() {
    let h = Harness::new();
    let ann = h.user("ann").await;
    let bob = h.user("bob").await;

    h.service
        .publish_post(Some(ann.id), "hey @bob, @ghost and @ann", None, false)
        .await
        .unwrap();
    h.settle().await;

    let bob_feed = h
        .service
        .notifications(Some(bob.id), &BackwardPage::default())
        .await
        .unwrap();
    assert_eq!(bob_feed.len(), 1);
    assert_eq!(bob_feed[0].kind, NotificationKind::Mention);
    assert_eq!(bob_feed[0].actors, vec!["ann"]);
    assert!(bob_feed[0].post_id.is_some());

    let ann_feed = h
        .service
        .notifications(Some(ann.id), &BackwardPage::default())
        .await
        .unwrap();
    assert!(ann_feed.is_empty());
}

#[tokio::test]
async fn test_mentions_differing_only_in_case_reach_both_users() {
    let h = Harness::new();
    let ann = h.user("ann").await;
    let upper = h
        .service
        .create_user("robert@example.org", "Bob")
        .await
        .unwrap();
    let lower = h.user("bob").await;

    h.service
        .publish_post(Some(ann.id), "hey @Bob and @bob", None, false)
        .await
        .unwrap();
    h.settle().await;

    for user in [&upper, &lower] {
        let feed = h
            .service
            .notifications(Some(user.id), &BackwardPage::default())
            .await
            .unwrap();
        assert_eq!(feed.len(), 1, "{} was not mentioned", user.handle);
        assert_eq!(feed[0].kind, NotificationKind::Mention);
    }
}

#[tokio::test]
async fn test_comment_on_missing_post() {
    let h = Harness::new();
    let ann = h.user("ann").await;

    let err = h
        .service
        .create_comment(Some(ann.id), 4242, "hello?")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity_type: "post", .. }));

    let err = h
        .service
        .create_comment(Some(ann.id), 4242, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_invalid_post_never_reaches_storage() {
    let h = Harness::new();
    let ann = h.user("ann").await;

    let too_long = "x".repeat(481);
    let err = h
        .service
        .publish_post(Some(ann.id), &too_long, None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let posts = h
        .service
        .posts_by(None, "ann", &BackwardPage::default())
        .await
        .unwrap();
    assert!(posts.is_empty());
    assert!(h.jobs.drain().is_empty());
}

#[tokio::test]
async fn test_user_creation_conflicts() {
    let h = Harness::new();
    h.user("ann").await;

    let err = h
        .service
        .create_user("ann@example.org", "other")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(msg) if msg == "email taken"));

    let err = h
        .service
        .create_user("other@example.org", "ann")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(msg) if msg == "handle taken"));
}

#[tokio::test]
async fn test_profiles_reflect_viewer_relationships() {
    let h = Harness::new();
    let ann = h.user("ann").await;
    let bob = h.user("bob").await;
    let cid = h.user("cid").await;
    h.service.toggle_follow(Some(ann.id), bob.id).await.unwrap();
    h.service.toggle_follow(Some(cid.id), ann.id).await.unwrap();

    let me = h.service.user(Some(ann.id), "ann").await.unwrap();
    assert!(me.me);
    assert_eq!(me.email.as_deref(), Some("ann@example.org"));

    let bob_profile = h.service.user(Some(ann.id), "bob").await.unwrap();
    assert!(bob_profile.following);
    assert!(!bob_profile.followed_by);
    assert!(bob_profile.email.is_none());

    let cid_profile = h.service.user(Some(ann.id), "cid").await.unwrap();
    assert!(!cid_profile.following);
    assert!(cid_profile.followed_by);

    let anonymous = h.service.user(None, "bob").await.unwrap();
    assert!(!anonymous.following && !anonymous.me);
}

#[tokio::test]
async fn test_user_listings_page_forward_by_handle() {
    let h = Harness::new();
    let star = h.user("star").await;
    for handle in ["dora", "abe", "cleo", "bea"] {
        let fan = h.user(handle).await;
        h.service.toggle_follow(Some(fan.id), star.id).await.unwrap();
    }

    let first = h
        .service
        .followers(None, "star", &murmur_core::domain::ForwardPage::new(Some(2), None))
        .await
        .unwrap();
    let handles: Vec<_> = first.iter().map(|p| p.user.handle.clone()).collect();
    assert_eq!(handles, vec!["abe", "bea"]);

    let second = h
        .service
        .followers(
            None,
            "star",
            &murmur_core::domain::ForwardPage::new(Some(2), Some("bea".to_string())),
        )
        .await
        .unwrap();
    let handles: Vec<_> = second.iter().map(|p| p.user.handle.clone()).collect();
    assert_eq!(handles, vec!["cleo", "dora"]);

    let found = h
        .service
        .search_users(None, Some("C"), &murmur_core::domain::ForwardPage::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].user.handle, "cleo");
}

#[tokio::test]
async fn test_posts_by_marks_likes_for_viewer() {
    let h = Harness::new();
    let ann = h.user("ann").await;
    let bob = h.user("bob").await;
    let first = h
        .service
        .publish_post(Some(ann.id), "one", None, false)
        .await
        .unwrap();
    h.service
        .publish_post(Some(ann.id), "two", Some("spoiler"), true)
        .await
        .unwrap();
    h.service
        .toggle_post_like(Some(bob.id), first.post.post.id)
        .await
        .unwrap();

    let posts = h
        .service
        .posts_by(Some(bob.id), "ann", &BackwardPage::default())
        .await
        .unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].post.content, "two");
    assert_eq!(posts[0].post.spoiler_of.as_deref(), Some("spoiler"));
    assert!(!posts[0].liked);
    assert!(posts[1].liked);
    assert_eq!(posts[1].post.likes_count, 1);

    let single = h
        .service
        .post(Some(bob.id), first.post.post.id)
        .await
        .unwrap();
    assert!(single.liked);
    assert!(!single.mine);
}

#[tokio::test]
async fn test_failed_background_task_reports_failure() {
    let h = Harness::new();
    let job = Job::new(
        "fan_out_post",
        serde_json::json!({ "task": "fan_out_post", "post_id": 999 }),
    );

    let result = h.service.run_job(job).await;
    assert!(matches!(result, JobResult::Failed(_)));

    let garbage = Job::new("unknown", serde_json::json!({ "task": "nope" }));
    assert!(matches!(h.service.run_job(garbage).await, JobResult::Failed(_)));
}
