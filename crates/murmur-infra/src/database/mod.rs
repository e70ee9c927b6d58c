//! Graph & content store backed by PostgreSQL.

mod connections;
mod memory;

#[cfg(feature = "postgres")]
mod comments;
#[cfg(feature = "postgres")]
pub mod entity;
#[cfg(feature = "postgres")]
mod errors;
#[cfg(feature = "postgres")]
mod notifications;
#[cfg(feature = "postgres")]
mod posts;
#[cfg(feature = "postgres")]
mod relationships;
#[cfg(feature = "postgres")]
pub mod sql;
#[cfg(feature = "postgres")]
mod store;
#[cfg(feature = "postgres")]
mod users;

pub use connections::DatabaseConfig;
pub use memory::InMemorySocialStore;

#[cfg(feature = "postgres")]
pub use connections::connect;
#[cfg(feature = "postgres")]
pub use store::PostgresStore;
