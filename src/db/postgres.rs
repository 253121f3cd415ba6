use futures_util::future::{BoxFuture, FutureExt};
use sqlx::PgPool;

use super::{normalize_email, AllowList, MedStore, StoreResult};
use crate::models::med_record::{DateKey, MedFlags, MedRecord};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = super::pool::create_pool(database_url).await?;
        Ok(Self::new(pool))
    }

    pub async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl MedStore for PgStore {
    fn get(&self, date: DateKey) -> BoxFuture<'_, StoreResult<Option<MedRecord>>> {
        async move {
            let record = sqlx::query_as::<_, MedRecord>(
                "SELECT date, had_morning_meds, had_evening_meds FROM meds WHERE date = $1",
            )
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
            Ok(record)
        }
        .boxed()
    }

    fn upsert(&self, date: DateKey, flags: MedFlags) -> BoxFuture<'_, StoreResult<MedRecord>> {
        async move {
            let record = sqlx::query_as::<_, MedRecord>(
                r#"
                INSERT INTO meds (date, had_morning_meds, had_evening_meds)
                VALUES ($1, COALESCE($2, false), COALESCE($3, false))
                ON CONFLICT (date) DO UPDATE SET
                    had_morning_meds = COALESCE($2, meds.had_morning_meds),
                    had_evening_meds = COALESCE($3, meds.had_evening_meds),
                    updated_at = NOW()
                RETURNING date, had_morning_meds, had_evening_meds
                "#,
            )
            .bind(date)
            .bind(flags.morning_given)
            .bind(flags.evening_given)
            .fetch_one(&self.pool)
            .await?;
            Ok(record)
        }
        .boxed()
    }

    fn update(
        &self,
        date: DateKey,
        flags: MedFlags,
    ) -> BoxFuture<'_, StoreResult<Option<MedRecord>>> {
        async move {
            let record = sqlx::query_as::<_, MedRecord>(
                r#"
                UPDATE meds SET
                    had_morning_meds = COALESCE($2, had_morning_meds),
                    had_evening_meds = COALESCE($3, had_evening_meds),
                    updated_at = NOW()
                WHERE date = $1
                RETURNING date, had_morning_meds, had_evening_meds
                "#,
            )
            .bind(date)
            .bind(flags.morning_given)
            .bind(flags.evening_given)
            .fetch_optional(&self.pool)
            .await?;
            Ok(record)
        }
        .boxed()
    }

    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        async move {
            sqlx::query_scalar::<_, i32>("SELECT 1")
                .fetch_one(&self.pool)
                .await?;
            Ok(())
        }
        .boxed()
    }
}

impl AllowList for PgStore {
    fn is_allowed<'a>(&'a self, email: &'a str) -> BoxFuture<'a, StoreResult<bool>> {
        async move {
            let found = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM users WHERE lower(email) = $1",
            )
            .bind(normalize_email(email))
            .fetch_one(&self.pool)
            .await?;
            Ok(found > 0)
        }
        .boxed()
    }
}
