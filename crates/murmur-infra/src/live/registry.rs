//! In-memory live subscriber registry.
//!
//! Maps each user to the streaming connections they hold open. Every connection owns a
//! bounded queue and a [`FeedFilter`]; publishing never waits on a slow reader, it drops
//! the event for that connection instead. Works within a single process only; see the
//! Redis relay for multi-instance deployments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use murmur_core::domain::{FeedFilter, LiveEvent, UserId};
use murmur_core::ports::{LiveError, LivePublisher};

/// Events buffered per connection before new ones are dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

struct Subscriber {
    filter: FeedFilter,
    sender: mpsc::Sender<LiveEvent>,
}

pub struct LiveRegistry {
    subscribers: DashMap<UserId, HashMap<u64, Subscriber>>,
    next_connection: AtomicU64,
    capacity: usize,
}

impl LiveRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            next_connection: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            std::env::var("LIVE_QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_QUEUE_CAPACITY),
        )
    }

    /// Registers a connection for `user_id`. It stays registered until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe(self: &Arc<Self>, user_id: UserId, filter: FeedFilter) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let connection_id = self.next_connection.fetch_add(1, Ordering::Relaxed);

        self.subscribers
            .entry(user_id)
            .or_default()
            .insert(connection_id, Subscriber { filter, sender });
        tracing::debug!(user_id, connection_id, filter = ?filter, "Live subscriber registered");

        Subscription {
            registry: Arc::clone(self),
            user_id,
            connection_id,
            receiver,
        }
    }

    /// Offers `event` to every matching connection of `user_id` and returns how many
    /// accepted it.
    pub fn publish_local(&self, user_id: UserId, event: &LiveEvent) -> usize {
        let Some(connections) = self.subscribers.get(&user_id) else {
            return 0;
        };

        let mut delivered = 0;
        for (connection_id, subscriber) in connections.iter() {
            if !subscriber.filter.accepts(event) {
                continue;
            }
            match subscriber.sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(user_id, connection_id, "Live queue full, event dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(user_id, connection_id, "Live queue closed, event dropped");
                }
            }
        }
        delivered
    }

    /// Open connections of `user_id`.
    pub fn connections(&self, user_id: UserId) -> usize {
        self.subscribers
            .get(&user_id)
            .map(|connections| connections.len())
            .unwrap_or(0)
    }

    /// Users with at least one open connection.
    pub fn users(&self) -> usize {
        self.subscribers.len()
    }

    fn unregister(&self, user_id: UserId, connection_id: u64) {
        if let Entry::Occupied(mut entry) = self.subscribers.entry(user_id) {
            entry.get_mut().remove(&connection_id);
            if entry.get().is_empty() {
                entry.remove();
            }
        }
        tracing::debug!(user_id, connection_id, "Live subscriber unregistered");
    }
}

impl Default for LiveRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

#[async_trait]
impl LivePublisher for LiveRegistry {
    async fn publish(&self, user_id: UserId, event: LiveEvent) -> Result<(), LiveError> {
        self.publish_local(user_id, &event);
        Ok(())
    }
}

/// One registered connection. Dropping it unregisters the connection.
pub struct Subscription {
    registry: Arc<LiveRegistry>,
    user_id: UserId,
    connection_id: u64,
    receiver: mpsc::Receiver<LiveEvent>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<LiveEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<LiveEvent> {
        self.receiver.try_recv().ok()
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.unregister(self.user_id, self.connection_id);
    }
}
