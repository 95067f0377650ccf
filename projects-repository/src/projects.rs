//! Typed access to project records.

use std::sync::Arc;

use projects_shared::Project;
use tracing::debug;

use crate::errors::StoreError;
use crate::interfaces::HashStore;

/// Namespace project records are stored under.
pub const PROJECTS_NAMESPACE: &str = "projects";

/// Reads and writes `Project` records as JSON keyed by project id.
///
/// This type performs no locking; callers that read-modify-write a project must
/// serialize on the project id themselves.
#[derive(Clone)]
pub struct ProjectRepository {
    store: Arc<dyn HashStore>,
    namespace: String,
}

impl ProjectRepository {
    pub fn new(store: Arc<dyn HashStore>) -> Self {
        Self::with_namespace(store, PROJECTS_NAMESPACE)
    }

    pub fn with_namespace(store: Arc<dyn HashStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn HashStore> {
        &self.store
    }

    /// Every project, in store enumeration order.
    pub async fn all(&self) -> Result<Vec<Project>, StoreError> {
        let entries = self.store.get_all(&self.namespace).await?;
        entries
            .into_iter()
            .map(|(key, value)| decode(&key, &value))
            .collect()
    }

    /// The project stored under `id`, if any.
    pub async fn get(&self, id: &str) -> Result<Option<Project>, StoreError> {
        match self.store.get(&self.namespace, id).await? {
            Some(value) => decode(id, &value).map(Some),
            None => Ok(None),
        }
    }

    /// Write `project` under its id.
    pub async fn put(&self, project: &Project) -> Result<(), StoreError> {
        let value = serde_json::to_string(project)?;
        self.store.set(&self.namespace, &project.id, &value).await?;
        debug!(project_id = %project.id, name = %project.name, "Project persisted");
        Ok(())
    }
}

fn decode(key: &str, value: &str) -> Result<Project, StoreError> {
    let project: Project = serde_json::from_str(value)?;
    if project.id != key {
        return Err(StoreError::corrupt(
            key,
            format!("record carries id {}", project.id),
        ));
    }
    Ok(project)
}
