//! Dependency initialization and wiring for the registry.

use std::sync::Arc;

use projects_repository::{HashStore, ProjectRepository};
use tracing::info;

use super::{RealmsConfig, Settings};
use crate::commands::Commands;
use crate::directory::Directory;
use crate::registry::ProjectRegistry;
use crate::workflow::{ApprovalEngine, ProposalBook};
use crate::StartupError;

/// Container for all initialized services.
pub struct Dependencies {
    pub registry: Arc<ProjectRegistry>,
    pub engine: Arc<ApprovalEngine>,
    pub commands: Commands,
}

impl Dependencies {
    /// Build every service from environment settings.
    ///
    /// The platform adapter supplies the directory. Proposals left pending by
    /// a previous run are restored from the store.
    pub async fn new(
        settings: Settings,
        directory: Arc<dyn Directory>,
    ) -> Result<Self, StartupError> {
        info!(
            store = ?settings.store,
            config_path = %settings.config_path.display(),
            namespace = %settings.namespace,
            "Initializing dependencies"
        );

        let realms = RealmsConfig::load(&settings.config_path)?;
        let store = settings.store.into_store().await?;
        info!("Record store ready");

        let deps = Self::wire(store, &settings.namespace, Arc::new(realms), directory);
        deps.engine.book().restore().await?;
        Ok(deps)
    }

    /// Wire services over an existing store.
    pub fn wire(
        store: Arc<dyn HashStore>,
        namespace: &str,
        realms: Arc<RealmsConfig>,
        directory: Arc<dyn Directory>,
    ) -> Self {
        let projects = ProjectRepository::with_namespace(Arc::clone(&store), namespace);
        let registry = Arc::new(ProjectRegistry::new(projects, directory));
        let book = Arc::new(ProposalBook::new(store));
        let engine = Arc::new(ApprovalEngine::new(Arc::clone(&registry), book, realms));
        let commands = Commands::new(Arc::clone(&registry), Arc::clone(&engine));

        Self {
            registry,
            engine,
            commands,
        }
    }
}
