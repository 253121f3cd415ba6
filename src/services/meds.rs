use std::sync::Arc;

use crate::day::DayResolver;
use crate::db::MedStore;
use crate::error::{AppError, AppResult, StoreAction};
use crate::models::med_record::{DateKey, MedFlags, MedPeriod, MedRecord};
use crate::models::session::RequestContext;

/// Owns the daily record lifecycle. Holds no record state between calls.
///
/// Each operation checks the caller first, then the period, and only then
/// touches the store. Writes are per-field: marking one period never rewrites
/// the other, so concurrent writers race only on the same flag, and that race
/// is last-write-wins.
#[derive(Clone)]
pub struct MedService {
    store: Arc<dyn MedStore>,
    days: DayResolver,
}

impl MedService {
    pub fn new(store: Arc<dyn MedStore>, days: DayResolver) -> Self {
        Self { store, days }
    }

    pub fn today(&self) -> DateKey {
        self.days.today()
    }

    /// Today's record, or an unsaved all-false default when none is stored.
    pub async fn fetch_today(&self, ctx: &RequestContext) -> AppResult<MedRecord> {
        ctx.require_principal()?;
        let date = self.days.today();

        let record = self
            .store
            .get(date)
            .await
            .map_err(|e| AppError::store(StoreAction::Fetch, e))?;

        Ok(record.unwrap_or_else(|| MedRecord::empty(date)))
    }

    /// Set `period` to given for today, creating the row if needed. Repeating
    /// the call is harmless.
    pub async fn mark_given(&self, ctx: &RequestContext, med_type: &str) -> AppResult<MedRecord> {
        let principal = ctx.require_principal()?;
        let period: MedPeriod = med_type.parse()?;
        let date = self.days.today();

        let record = self
            .store
            .upsert(date, MedFlags::given(period))
            .await
            .map_err(|e| AppError::store(StoreAction::Update, e))?;

        tracing::info!(
            date = %date,
            period = %period,
            principal = %principal.email,
            status = ?record.status(),
            "Medication marked as given"
        );
        Ok(record)
    }

    /// Clear `period` for today. Fails with `NotFound` rather than creating a
    /// row when nothing was recorded yet.
    pub async fn reset_given(&self, ctx: &RequestContext, med_type: &str) -> AppResult<MedRecord> {
        let principal = ctx.require_principal()?;
        let period: MedPeriod = med_type.parse()?;
        let date = self.days.today();

        let record = self
            .store
            .update(date, MedFlags::reset(period))
            .await
            .map_err(|e| AppError::store(StoreAction::Reset, e))?
            .ok_or_else(|| AppError::NotFound("No medication record found for today".into()))?;

        tracing::info!(
            date = %date,
            period = %period,
            principal = %principal.email,
            status = ?record.status(),
            "Medication reset"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::day::FixedClock;
    use crate::db::MemoryStore;
    use crate::models::session::Principal;
    use chrono::{DateTime, Utc};
    use chrono_tz::America::Los_Angeles;

    fn service_at(store: &MemoryStore, rfc3339: &str) -> MedService {
        let now = DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc);
        let days = DayResolver::new(Arc::new(FixedClock::new(now)), Los_Angeles);
        MedService::new(Arc::new(store.clone()), days)
    }

    fn owner() -> RequestContext {
        RequestContext::authenticated(Principal {
            email: "owner@example.com".into(),
        })
    }

    const NOON_PDT: &str = "2025-06-14T19:00:00Z";

    #[tokio::test]
    async fn test_fetch_absent_returns_default_without_persisting() {
        let store = MemoryStore::new();
        let svc = service_at(&store, NOON_PDT);

        let record = svc.fetch_today(&owner()).await.unwrap();
        assert_eq!(record.date.to_string(), "2025-06-14");
        assert!(!record.morning_given);
        assert!(!record.evening_given);
        assert_eq!(store.record_count().await, 0);
    }

    #[tokio::test]
    async fn test_fetch_defaults_for_many_days() {
        let store = MemoryStore::new();
        for instant in [
            "2024-02-29T20:00:00Z",
            "2025-01-01T08:00:00Z",
            "2025-12-31T12:00:00Z",
        ] {
            let svc = service_at(&store, instant);
            let expected = svc.today();
            let record = svc.fetch_today(&owner()).await.unwrap();
            assert_eq!(record, MedRecord::empty(expected));
        }
    }

    #[tokio::test]
    async fn test_mark_given_is_idempotent() {
        let store = MemoryStore::new();
        let svc = service_at(&store, NOON_PDT);

        let once = svc.mark_given(&owner(), "morning").await.unwrap();
        let twice = svc.mark_given(&owner(), "morning").await.unwrap();
        assert_eq!(once, twice);
        assert!(twice.morning_given);
        assert!(!twice.evening_given);
        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn test_periods_are_independent() {
        let store = MemoryStore::new();
        let svc = service_at(&store, NOON_PDT);

        let record = svc.mark_given(&owner(), "evening").await.unwrap();
        assert!(!record.morning_given);

        let record = svc.mark_given(&owner(), "morning").await.unwrap();
        assert!(record.morning_given);
        assert!(record.evening_given);

        let fetched = svc.fetch_today(&owner()).await.unwrap();
        assert_eq!(fetched, record);
    }

    #[tokio::test]
    async fn test_reset_without_record_is_not_found() {
        let store = MemoryStore::new();
        let svc = service_at(&store, NOON_PDT);

        let err = svc.reset_given(&owner(), "morning").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.record_count().await, 0);
    }

    #[tokio::test]
    async fn test_mark_then_reset_round_trip() {
        let store = MemoryStore::new();
        let svc = service_at(&store, NOON_PDT);

        svc.mark_given(&owner(), "evening").await.unwrap();
        let before = svc.fetch_today(&owner()).await.unwrap();

        svc.mark_given(&owner(), "morning").await.unwrap();
        let after = svc.reset_given(&owner(), "morning").await.unwrap();

        assert!(!after.morning_given);
        assert_eq!(after.evening_given, before.evening_given);
    }

    #[tokio::test]
    async fn test_records_split_at_reference_midnight() {
        let store = MemoryStore::new();
        // 23:59 PDT on the 14th, then 00:01 PDT on the 15th; same UTC day
        let late = service_at(&store, "2025-06-15T06:59:00Z");
        let early = service_at(&store, "2025-06-15T07:01:00Z");

        late.mark_given(&owner(), "evening").await.unwrap();
        let next_day = early.fetch_today(&owner()).await.unwrap();

        assert_eq!(next_day.date.to_string(), "2025-06-15");
        assert!(!next_day.evening_given);
        assert!(late.fetch_today(&owner()).await.unwrap().evening_given);
    }

    #[tokio::test]
    async fn test_anonymous_never_touches_store() {
        let store = MemoryStore::new();
        let svc = service_at(&store, NOON_PDT);
        let anon = RequestContext::anonymous();

        assert!(matches!(
            svc.fetch_today(&anon).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            svc.mark_given(&anon, "morning").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            svc.reset_given(&anon, "afternoon").await,
            Err(AppError::Unauthorized)
        ));
        assert_eq!(store.operations(), 0);
    }

    #[tokio::test]
    async fn test_invalid_period_never_touches_store() {
        let store = MemoryStore::new();
        let svc = service_at(&store, NOON_PDT);

        assert!(matches!(
            svc.mark_given(&owner(), "afternoon").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            svc.reset_given(&owner(), "afternoon").await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(store.operations(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_unavailable() {
        let store = MemoryStore::new();
        let svc = service_at(&store, NOON_PDT);
        store.set_offline(true);

        let err = svc.fetch_today(&owner()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::StoreUnavailable {
                action: StoreAction::Fetch,
                ..
            }
        ));

        let err = svc.mark_given(&owner(), "morning").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::StoreUnavailable {
                action: StoreAction::Update,
                ..
            }
        ));

        // A failed write leaves nothing behind
        store.set_offline(false);
        assert_eq!(store.record_count().await, 0);
    }
}
