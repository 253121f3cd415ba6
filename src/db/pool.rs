use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::StoreResult;

pub async fn create_pool(database_url: &str) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await?;
    Ok(pool)
}
