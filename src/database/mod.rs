pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CreateAction, DeleteAction, Snapshot, UpdateAction};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// True when the store could not be reached at all, as opposed to a failing statement
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Sqlx(
                sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
            )
        )
    }
}

/// Backing store for the class site data.
///
/// A data request opens exactly one session, after authentication and
/// request validation, and drops it before the response is written.
#[async_trait]
pub trait ClassStore: Send + Sync {
    async fn open(&self) -> Result<Box<dyn StoreSession>, StoreError>;

    /// Cheap reachability check for `/health`
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// One connection's worth of work. Every write commits before returning.
#[async_trait]
pub trait StoreSession: Send {
    /// Class photo plus every collection, each ordered by ascending id
    async fn snapshot(&mut self) -> Result<Snapshot, StoreError>;

    /// Insert one row and return its generated id
    async fn create(&mut self, action: &CreateAction) -> Result<i32, StoreError>;

    /// Apply one update; returns the number of rows touched (zero for a missing id)
    async fn update(&mut self, action: &UpdateAction) -> Result<u64, StoreError>;

    /// Physically remove one row; returns the number of rows removed
    async fn delete(&mut self, action: DeleteAction) -> Result<u64, StoreError>;
}
