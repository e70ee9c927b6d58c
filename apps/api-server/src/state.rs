//! Application state - shared across all handlers.

use std::sync::Arc;

use murmur_core::ports::{JobQueue, LivePublisher, TokenService};
use murmur_core::{Repositories, SocialService};
use murmur_infra::database::DatabaseConfig;
use murmur_infra::{InMemoryJobQueue, InMemorySocialStore, JwtTokenService, LiveRegistry};

#[cfg(feature = "postgres")]
use murmur_infra::PostgresStore;

#[cfg(feature = "redis")]
use murmur_infra::RedisLiveRelay;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SocialService>,
    pub live: Arc<LiveRegistry>,
    pub jobs: Arc<dyn JobQueue>,
    pub tokens: Arc<dyn TokenService>,
}

impl AppState {
    /// Wire the store, live delivery and background workers.
    pub async fn new(config: &AppConfig) -> Self {
        let repos = Self::repositories(config.database.as_ref()).await;
        let live = Arc::new(LiveRegistry::new(config.live_queue_capacity));
        let publisher = Self::publisher(config, live.clone()).await;

        let jobs = Arc::new(InMemoryJobQueue::new(config.jobs.clone()));
        let service = Arc::new(SocialService::new(repos, publisher, jobs.clone()));
        if let Err(e) = jobs.start_worker(service.clone().job_handler()).await {
            tracing::error!(error = %e, "Failed to start background workers");
        }

        tracing::info!("Application state initialized");

        Self {
            service,
            live,
            jobs,
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
        }
    }

    #[cfg(feature = "postgres")]
    async fn repositories(database: Option<&DatabaseConfig>) -> Repositories {
        match database {
            Some(config) => match murmur_infra::database::connect(config).await {
                Ok(db) => {
                    tracing::info!("Connected to PostgreSQL");
                    return Repositories::from_store(Arc::new(PostgresStore::new(db)));
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to connect to database. Using in-memory store.");
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running with the in-memory store.");
            }
        }
        Repositories::from_store(Arc::new(InMemorySocialStore::new()))
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(_database: Option<&DatabaseConfig>) -> Repositories {
        tracing::info!("Running without postgres feature - using in-memory store");
        Repositories::from_store(Arc::new(InMemorySocialStore::new()))
    }

    #[cfg(feature = "redis")]
    async fn publisher(config: &AppConfig, live: Arc<LiveRegistry>) -> Arc<dyn LivePublisher> {
        if let Some(redis) = config.redis.clone() {
            match RedisLiveRelay::connect(redis, live.clone()).await {
                Ok(relay) => {
                    tracing::info!("Live events relayed through Redis");
                    return Arc::new(relay);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Redis relay unavailable. Delivering live events locally.");
                }
            }
        }
        live
    }

    #[cfg(not(feature = "redis"))]
    async fn publisher(_config: &AppConfig, live: Arc<LiveRegistry>) -> Arc<dyn LivePublisher> {
        live
    }
}
