//! Per-project mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per project id.
///
/// Every read-modify-write of a project record holds its guard from the read
/// to the write, so concurrent mutations of the same project are linearized
/// while different projects proceed in parallel.
#[derive(Default)]
pub struct ProjectLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the project.
    pub async fn lock(&self, project_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(project_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}
