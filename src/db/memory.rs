use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use futures_util::future::{BoxFuture, FutureExt};
use tokio::sync::RwLock;

use super::{normalize_email, AllowList, MedStore, StoreError, StoreResult};
use crate::models::med_record::{DateKey, MedFlags, MedRecord};

/// In-process store for single-instance development and tests.
/// Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<DateKey, MedRecord>>>,
    allowed: Arc<RwLock<HashSet<String>>>,
    offline: Arc<AtomicBool>,
    operations: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allowed<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = emails
            .into_iter()
            .map(|e| normalize_email(e.as_ref()))
            .collect();
        Self {
            allowed: Arc::new(RwLock::new(allowed)),
            ..Self::default()
        }
    }

    pub async fn allow(&self, email: &str) {
        self.allowed.write().await.insert(normalize_email(email));
    }

    /// While offline every call fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of record calls (get/upsert/update) received so far.
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    fn enter(&self) -> StoreResult<()> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }
}

impl MedStore for MemoryStore {
    fn get(&self, date: DateKey) -> BoxFuture<'_, StoreResult<Option<MedRecord>>> {
        async move {
            self.enter()?;
            Ok(self.records.read().await.get(&date).cloned())
        }
        .boxed()
    }

    fn upsert(&self, date: DateKey, flags: MedFlags) -> BoxFuture<'_, StoreResult<MedRecord>> {
        async move {
            self.enter()?;
            let mut records = self.records.write().await;
            let record = records
                .entry(date)
                .or_insert_with(|| MedRecord::empty(date));
            record.apply(flags);
            Ok(record.clone())
        }
        .boxed()
    }

    fn update(
        &self,
        date: DateKey,
        flags: MedFlags,
    ) -> BoxFuture<'_, StoreResult<Option<MedRecord>>> {
        async move {
            self.enter()?;
            let mut records = self.records.write().await;
            Ok(records.get_mut(&date).map(|record| {
                record.apply(flags);
                record.clone()
            }))
        }
        .boxed()
    }

    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        async move {
            if self.offline.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("memory store is offline".into()));
            }
            Ok(())
        }
        .boxed()
    }
}

impl AllowList for MemoryStore {
    fn is_allowed<'a>(&'a self, email: &'a str) -> BoxFuture<'a, StoreResult<bool>> {
        async move {
            if self.offline.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("memory store is offline".into()));
            }
            Ok(self.allowed.read().await.contains(&normalize_email(email)))
        }
        .boxed()
    }
}
