//! Backend selection for the record store.
//!
//! ```ignore
//! use projects_repository::StoreSource;
//!
//! // Development: in-memory store
//! let store = StoreSource::mock().into_store().await?;
//!
//! // Production: PostgreSQL
//! let store = StoreSource::live("postgres://...").into_store().await?;
//! ```

use std::sync::Arc;

use crate::errors::StoreError;
use crate::interfaces::HashStore;
use crate::memory::MockHashStore;
use crate::postgres::PostgresHashStore;

/// Which backend to build the store on.
#[derive(Debug, Clone)]
pub enum StoreSource {
    /// In-memory store; contents are lost on exit.
    Mock,

    /// PostgreSQL store.
    Live {
        /// PostgreSQL connection URL
        database_url: String,
    },
}

impl StoreSource {
    pub fn mock() -> Self {
        Self::Mock
    }

    pub fn live(database_url: impl Into<String>) -> Self {
        Self::Live {
            database_url: database_url.into(),
        }
    }

    /// Build the store, creating the PostgreSQL schema when needed.
    pub async fn into_store(self) -> Result<Arc<dyn HashStore>, StoreError> {
        match self {
            Self::Mock => Ok(Arc::new(MockHashStore::new())),
            Self::Live { database_url } => {
                let store = PostgresHashStore::new(&database_url).await?;
                store.ensure_schema().await?;
                Ok(Arc::new(store))
            }
        }
    }
}
