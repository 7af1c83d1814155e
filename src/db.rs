use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tokio::runtime::Runtime;

use crate::store::KeyValueStore;

/// Collections kept as text rows in Postgres, for sharing one dashboard
/// between machines. Calls block on a private runtime so the ledger stays
/// synchronous.
pub struct PgStore {
    runtime: Runtime,
    pool: PgPool,
}

impl PgStore {
    pub fn connect(database_url: &str) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start database runtime")?;

        let pool = runtime
            .block_on(
                PgPoolOptions::new()
                    .max_connections(2)
                    .connect(database_url),
            )
            .context("failed to connect to Postgres")?;

        Ok(Self { runtime, pool })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        self.runtime
            .block_on(sqlx::migrate!("./migrations").run(&self.pool))
            .context("failed to run migrations")?;
        Ok(())
    }
}

impl KeyValueStore for PgStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = self
            .runtime
            .block_on(
                sqlx::query("SELECT body FROM sales_tracker.collections WHERE key = $1")
                    .bind(key)
                    .fetch_optional(&self.pool),
            )
            .with_context(|| format!("failed to read collection {key}"))?;

        Ok(row.map(|row| row.get("body")))
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.runtime
            .block_on(
                sqlx::query(
                    r#"
                    INSERT INTO sales_tracker.collections (key, body, updated_at)
                    VALUES ($1, $2, now())
                    ON CONFLICT (key) DO UPDATE
                    SET body = EXCLUDED.body, updated_at = EXCLUDED.updated_at
                    "#,
                )
                .bind(key)
                .bind(value)
                .execute(&self.pool),
            )
            .with_context(|| format!("failed to write collection {key}"))?;
        Ok(())
    }
}
