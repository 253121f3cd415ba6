//! Record store: one medication row per calendar day, plus the sign-in
//! allow-list.

pub mod memory;
pub mod pool;
pub mod postgres;

use futures_util::future::BoxFuture;

use crate::models::med_record::{DateKey, MedFlags, MedRecord};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Keyed persistence for daily records. `date` is unique.
pub trait MedStore: Send + Sync {
    fn get(&self, date: DateKey) -> BoxFuture<'_, StoreResult<Option<MedRecord>>>;

    /// Insert-or-update on the date key. Flags left as `None` keep their
    /// stored value, or default to false on insert.
    fn upsert(&self, date: DateKey, flags: MedFlags) -> BoxFuture<'_, StoreResult<MedRecord>>;

    /// Update an existing row only. Returns `None` when no row exists.
    fn update(
        &self,
        date: DateKey,
        flags: MedFlags,
    ) -> BoxFuture<'_, StoreResult<Option<MedRecord>>>;

    fn ping(&self) -> BoxFuture<'_, StoreResult<()>>;
}

pub trait AllowList: Send + Sync {
    fn is_allowed<'a>(&'a self, email: &'a str) -> BoxFuture<'a, StoreResult<bool>>;
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
