//! PostgreSQL implementation of the hash store.
//!
//! Entries live in a single `hash_entries` table keyed by `(namespace, key)`.
//! A `seq` column assigned on first insert preserves enumeration order across
//! overwrites.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::errors::StoreError;
use crate::interfaces::HashStore;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS hash_entries (\
     seq BIGSERIAL, \
     namespace TEXT NOT NULL, \
     key TEXT NOT NULL, \
     value TEXT NOT NULL, \
     PRIMARY KEY (namespace, key))";

/// PostgreSQL-backed hash store.
pub struct PostgresHashStore {
    pool: sqlx::PgPool,
}

impl PostgresHashStore {
    /// Connect to the database at `database_url`.
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn with_pool(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Create the backing table if it does not exist yet.
    ///
    /// Call once during startup before serving requests.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        info!("hash_entries table ready");
        Ok(())
    }
}

#[async_trait]
impl HashStore for PostgresHashStore {
    async fn get_all(&self, namespace: &str) -> Result<Vec<(String, String)>, StoreError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT key, value FROM hash_entries WHERE namespace = $1 ORDER BY seq",
        )
        .bind(namespace)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM hash_entries WHERE namespace = $1 AND key = $2",
        )
        .bind(namespace)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    async fn set(&self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO hash_entries (namespace, key, value) VALUES ($1, $2, $3) \
             ON CONFLICT (namespace, key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(namespace)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, namespace: &str, key: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM hash_entries WHERE namespace = $1 AND key = $2")
            .bind(namespace)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
