//! The project registry.
//!
//! Owns every read-modify-write of project records and the directory mirror
//! steps that follow them. Each mutation holds the project's lock from read to
//! write; operations that can change which names are taken also hold the
//! registry-wide name guard.

mod locks;
mod mirror;
mod search;
mod sync;

pub use locks::ProjectLocks;
pub use mirror::{ensure_mirrored_role, find_mirrored_role};
pub use search::{rank, SearchMatch};
pub use sync::{MirrorFailure, SyncReport, Synced};

use std::sync::Arc;

use projects_repository::ProjectRepository;
use projects_shared::{channel_slug, DownloadChange, Project, ProjectRole, RealmId, UserId};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, instrument};

use crate::directory::Directory;
use crate::errors::RegistryError;
use search::same_text;

/// The user performing an operation and the realm it was issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user: UserId,
    pub realm: RealmId,
}

impl Actor {
    pub fn new(user: UserId, realm: RealmId) -> Self {
        Self { user, realm }
    }
}

/// Fields a leader asked to change. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifyRequest {
    pub new_name: Option<String>,
    pub description: Option<String>,
    /// Raw download link, or the clear sentinel.
    pub download: Option<String>,
    /// Whether to rewrite the channel topic. Required when the description or
    /// the download link changes.
    pub update_channel_topic: Option<bool>,
}

/// What a modify call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyOutcome {
    pub project: Project,
    /// Description and/or download were changed and persisted.
    pub metadata_updated: bool,
    /// New name to hand to the rename workflow.
    pub rename_requested: Option<String>,
}

/// CRUD, search and capability management over the project store.
pub struct ProjectRegistry {
    projects: ProjectRepository,
    directory: Arc<dyn Directory>,
    locks: ProjectLocks,
    names: AsyncMutex<()>,
}

impl ProjectRegistry {
    pub fn new(projects: ProjectRepository, directory: Arc<dyn Directory>) -> Self {
        Self {
            projects,
            directory,
            locks: ProjectLocks::new(),
            names: AsyncMutex::new(()),
        }
    }

    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    /// Persist a new project.
    ///
    /// Fails with a conflict if any existing project has the same name,
    /// ignoring case.
    #[instrument(skip(self, project), fields(project_id = %project.id, name = %project.name))]
    pub async fn create(&self, project: Project) -> Result<Project, RegistryError> {
        let _names = self.names.lock().await;
        self.ensure_name_available(&project.name, None).await?;
        self.projects.put(&project).await?;
        info!("Project created");
        Ok(project)
    }

    /// Check that `name` can be given to a project other than `except`.
    ///
    /// A name without letters or digits is a validation error; one already
    /// used by another project, ignoring case, is a conflict.
    pub async fn ensure_name_available(
        &self,
        name: &str,
        except: Option<&str>,
    ) -> Result<(), RegistryError> {
        if channel_slug(name).is_empty() {
            return Err(RegistryError::unusable_name());
        }
        let taken = self
            .projects
            .all()
            .await?
            .iter()
            .any(|p| Some(p.id.as_str()) != except && same_text(&p.name, name));
        if taken {
            return Err(RegistryError::duplicate_name());
        }
        Ok(())
    }

    /// The project with this id, compared without regard to case.
    pub async fn get(&self, id: &str) -> Result<Project, RegistryError> {
        if let Some(project) = self.projects.get(id).await? {
            return Ok(project);
        }
        self.projects
            .all()
            .await?
            .into_iter()
            .find(|p| same_text(&p.id, id))
            .ok_or_else(RegistryError::project_not_found)
    }

    /// The project with this name, compared without regard to case.
    pub async fn find_by_name(&self, name: &str) -> Result<Project, RegistryError> {
        self.projects
            .all()
            .await?
            .into_iter()
            .find(|p| same_text(&p.name, name))
            .ok_or_else(|| RegistryError::not_found("The specified project name does not exist."))
    }

    /// Resolve a free-text query to one project or a ranked list.
    pub async fn search(&self, query: &str) -> Result<SearchMatch, RegistryError> {
        match rank(self.projects.all().await?, query) {
            SearchMatch::Nothing => Err(RegistryError::not_found(
                "The specified query returns no results.",
            )),
            found => Ok(found),
        }
    }

    /// Projects on which `user` holds the leader capability.
    pub async fn list_led_by(&self, user: UserId) -> Result<Vec<Project>, RegistryError> {
        Ok(self
            .projects
            .all()
            .await?
            .into_iter()
            .filter(|p| p.is_leader(user))
            .collect())
    }

    /// Give `user` a capability on the project and mirror it in the actor's realm.
    #[instrument(skip(self, actor), fields(actor = actor.user, realm = actor.realm))]
    pub async fn assign_capability(
        &self,
        actor: Actor,
        project_id: &str,
        user: UserId,
        role: ProjectRole,
    ) -> Result<Synced<Project>, RegistryError> {
        let (_guard, mut project) = self.load_locked(project_id).await?;
        authorize(&project, actor.user)?;

        let mut sync = SyncReport::new();
        project.grant(user, role);
        let role_id = sync.record(
            "provision role",
            ensure_mirrored_role(self.directory.as_ref(), &mut project, role, actor.realm).await,
        );
        self.projects.put(&project).await?;
        info!(project_id = %project.id, user, %role, "Capability assigned");

        if let Some(role_id) = role_id {
            let member = sync.record("check membership", self.directory.is_member(actor.realm, user).await);
            if member == Some(true) {
                sync.record(
                    "grant role",
                    self.directory.grant_role(actor.realm, user, role_id).await,
                );
            }
        }

        Ok(Synced::new(project, sync))
    }

    /// Take a capability away from `user` and unmirror it in the actor's realm.
    #[instrument(skip(self, actor), fields(actor = actor.user, realm = actor.realm))]
    pub async fn revoke_capability(
        &self,
        actor: Actor,
        project_id: &str,
        user: UserId,
        role: ProjectRole,
    ) -> Result<Synced<Project>, RegistryError> {
        let (_guard, mut project) = self.load_locked(project_id).await?;
        authorize(&project, actor.user)?;

        if !project.user_roles.contains_key(&user) {
            return Err(RegistryError::conflict(
                "The specified user is not involved with the project.",
            ));
        }
        project.revoke(user, role)?;
        self.projects.put(&project).await?;
        info!(project_id = %project.id, user, %role, "Capability revoked");

        let mut sync = SyncReport::new();
        let mirrored = sync
            .record(
                "find role",
                find_mirrored_role(self.directory.as_ref(), &project, role, actor.realm).await,
            )
            .flatten();
        if let Some(role_id) = mirrored {
            let member = sync.record("check membership", self.directory.is_member(actor.realm, user).await);
            if member == Some(true) {
                sync.record(
                    "revoke role",
                    self.directory.revoke_role(actor.realm, user, role_id).await,
                );
            }
        }

        Ok(Synced::new(project, sync))
    }

    /// Update description and/or download, and validate a requested rename.
    ///
    /// Every check runs before anything is persisted. A new name is never
    /// applied here; it is returned for the rename workflow.
    #[instrument(skip(self, actor, request), fields(actor = actor.user))]
    pub async fn modify(
        &self,
        actor: Actor,
        project_id: &str,
        request: ModifyRequest,
    ) -> Result<Synced<ModifyOutcome>, RegistryError> {
        let (_guard, mut project) = self.load_locked(project_id).await?;
        authorize(&project, actor.user)?;

        let ModifyRequest {
            new_name,
            description,
            download,
            update_channel_topic,
        } = request;

        if new_name.is_none() && description.is_none() && download.is_none() {
            return Err(RegistryError::validation("There are nothing for me to modify."));
        }

        let metadata_requested = description.is_some() || download.is_some();
        let update_topic = match update_channel_topic {
            Some(flag) => flag,
            None if metadata_requested => {
                return Err(RegistryError::validation(
                    "You have specified a new download link and/or a new project description but \
                     haven't specified whether to change the channel topic. Please specify \
                     `change-channel-topic`.",
                ))
            }
            None => false,
        };

        let download = download
            .map(|raw| DownloadChange::parse(&raw))
            .transpose()
            .map_err(|_| RegistryError::validation("The specified download URL is invalid."))?;

        if let Some(name) = &new_name {
            if *name == project.name {
                return Err(RegistryError::validation(
                    "The specified new name is the same as the current name.",
                ));
            }
            self.ensure_name_available(name, Some(&project.id)).await?;
        }

        let mut sync = SyncReport::new();
        if metadata_requested {
            if let Some(description) = description {
                project.description = description;
            }
            match download {
                Some(DownloadChange::Set(link)) => project.download = Some(link),
                Some(DownloadChange::Clear) => project.download = None,
                None => {}
            }
            self.projects.put(&project).await?;
            info!(project_id = %project.id, "Project metadata updated");

            if update_topic {
                sync.record(
                    "set channel topic",
                    self.directory
                        .set_channel_topic(project.associated_channel_id, &project.channel_topic())
                        .await,
                );
            }
        }

        Ok(Synced::new(
            ModifyOutcome {
                project,
                metadata_updated: metadata_requested,
                rename_requested: new_name,
            },
            sync,
        ))
    }

    /// Apply an approved rename and carry it to the channel and mirrored roles.
    ///
    /// The channel is renamed only if it still carries the slug of the old
    /// name.
    #[instrument(skip(self))]
    pub async fn apply_rename(
        &self,
        project_id: &str,
        new_name: &str,
    ) -> Result<Synced<Project>, RegistryError> {
        let _names = self.names.lock().await;
        let (_guard, mut project) = self.load_locked(project_id).await?;
        self.ensure_name_available(new_name, Some(&project.id)).await?;

        let mut sync = SyncReport::new();
        let old_slug = project.channel_slug();
        let channel = project.associated_channel_id;
        match sync.record("read channel name", self.directory.channel_name(channel).await) {
            Some(current) if current == old_slug => {
                sync.record(
                    "rename channel",
                    self.directory
                        .rename_channel(channel, &channel_slug(new_name))
                        .await,
                );
            }
            Some(current) => {
                debug!(channel, current = %current, "Channel name drifted, leaving it");
            }
            None => {}
        }

        let old_name = std::mem::replace(&mut project.name, new_name.to_string());
        self.projects.put(&project).await?;
        info!(project_id = %project.id, old_name = %old_name, new_name, "Project renamed");

        let mirrored: Vec<_> = project.mirrored_roles().collect();
        for (role, realm, role_id) in mirrored {
            sync.record(
                "rename role",
                self.directory
                    .rename_role(realm, role_id, &project.role_name(role))
                    .await,
            );
        }

        Ok(Synced::new(project, sync))
    }

    /// Resolve `project_id`, take its lock and read the current record.
    async fn load_locked(
        &self,
        project_id: &str,
    ) -> Result<(OwnedMutexGuard<()>, Project), RegistryError> {
        let id = self.get(project_id).await?.id;
        let guard = self.locks.lock(&id).await;
        let project = self
            .projects
            .get(&id)
            .await?
            .ok_or_else(RegistryError::project_not_found)?;
        Ok((guard, project))
    }
}

fn authorize(project: &Project, user: UserId) -> Result<(), RegistryError> {
    if project.is_leader(user) {
        Ok(())
    } else {
        Err(RegistryError::unauthorized(format!(
            "You are not a leader of **{}**.",
            project.name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use projects_repository::MockHashStore;

    const REALM: RealmId = 10;
    const LEADER: UserId = 1;
    const MEMBER: UserId = 2;

    struct Fixture {
        directory: Arc<InMemoryDirectory>,
        registry: ProjectRegistry,
        project: Project,
    }

    async fn fixture() -> Fixture {
        let directory = Arc::new(InMemoryDirectory::new());
        directory.add_realm(REALM, "Community");
        directory.add_member(REALM, LEADER);
        directory.add_member(REALM, MEMBER);
        let channel = directory.add_channel(REALM, "foo", None);

        let registry = ProjectRegistry::new(
            ProjectRepository::new(Arc::new(MockHashStore::new())),
            directory.clone(),
        );
        let mut project = Project::new("Foo", "desc", LEADER, REALM);
        project.associated_channel_id = channel;
        project.grant(LEADER, ProjectRole::Leader);
        let project = registry.create(project).await.unwrap();

        Fixture {
            directory,
            registry,
            project,
        }
    }

    fn leader() -> Actor {
        Actor::new(LEADER, REALM)
    }

    #[tokio::test]
    async fn test_create_rejects_case_insensitive_duplicate() {
        let f = fixture().await;

        let err = f
            .registry
            .create(Project::new("FOO", "", 3, REALM))
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_get_ignores_case() {
        let f = fixture().await;

        let found = f.registry.get(&f.project.id.to_uppercase()).await.unwrap();

        assert_eq!(found.id, f.project.id);
        assert!(matches!(
            f.registry.get("missing").await,
            Err(RegistryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let f = fixture().await;

        assert_eq!(f.registry.find_by_name("fOo").await.unwrap().id, f.project.id);
        assert!(f.registry.find_by_name("bar").await.is_err());
    }

    #[tokio::test]
    async fn test_search_nothing_is_not_found() {
        let f = fixture().await;

        let err = f.registry.search("zzz").await.unwrap_err();

        assert_eq!(err.to_string(), "The specified query returns no results.");
    }

    #[tokio::test]
    async fn test_assign_mirrors_and_grants() {
        let f = fixture().await;

        let synced = f
            .registry
            .assign_capability(leader(), &f.project.id, MEMBER, ProjectRole::Developer)
            .await
            .unwrap();

        assert!(synced.sync.is_clean());
        let role_id = synced
            .value
            .mirrored_role(ProjectRole::Developer, REALM)
            .unwrap();
        assert_eq!(f.directory.role(role_id).unwrap().name, "Foo Developer");
        assert!(f.directory.has_role(MEMBER, role_id));
        let stored = f.registry.get(&f.project.id).await.unwrap();
        assert!(stored.has_capability(MEMBER, ProjectRole::Developer));
    }

    #[tokio::test]
    async fn test_assign_skips_grant_for_non_member() {
        let f = fixture().await;

        let synced = f
            .registry
            .assign_capability(leader(), &f.project.id, 99, ProjectRole::Designer)
            .await
            .unwrap();

        assert!(synced.sync.is_clean());
        let role_id = synced.value.mirrored_role(ProjectRole::Designer, REALM).unwrap();
        assert!(!f.directory.has_role(99, role_id));
    }

    #[tokio::test]
    async fn test_assign_survives_directory_failure() {
        let f = fixture().await;
        f.directory.fail_role_operations(true);

        let synced = f
            .registry
            .assign_capability(leader(), &f.project.id, MEMBER, ProjectRole::Translator)
            .await
            .unwrap();

        assert!(!synced.sync.is_clean());
        assert_eq!(synced.sync.failures()[0].step, "provision role");
        let stored = f.registry.get(&f.project.id).await.unwrap();
        assert!(stored.has_capability(MEMBER, ProjectRole::Translator));
    }

    #[tokio::test]
    async fn test_revoke_unknown_user_is_conflict() {
        let f = fixture().await;

        let err = f
            .registry
            .revoke_capability(leader(), &f.project.id, 77, ProjectRole::Developer)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "The specified user is not involved with the project."
        );
    }

    #[tokio::test]
    async fn test_revoke_removes_directory_role() {
        let f = fixture().await;
        let assigned = f
            .registry
            .assign_capability(leader(), &f.project.id, MEMBER, ProjectRole::Developer)
            .await
            .unwrap();
        let role_id = assigned.value.mirrored_role(ProjectRole::Developer, REALM).unwrap();

        let synced = f
            .registry
            .revoke_capability(leader(), &f.project.id, MEMBER, ProjectRole::Developer)
            .await
            .unwrap();

        assert!(synced.sync.is_clean());
        assert!(!synced.value.user_roles.contains_key(&MEMBER));
        assert!(!f.directory.has_role(MEMBER, role_id));
    }

    #[tokio::test]
    async fn test_modify_requires_topic_flag() {
        let f = fixture().await;
        let request = ModifyRequest {
            description: Some("new".to_string()),
            ..ModifyRequest::default()
        };

        let err = f
            .registry
            .modify(leader(), &f.project.id, request)
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::Validation(_)));
        assert_eq!(f.registry.get(&f.project.id).await.unwrap().description, "desc");
    }

    #[tokio::test]
    async fn test_modify_nothing() {
        let f = fixture().await;

        let err = f
            .registry
            .modify(leader(), &f.project.id, ModifyRequest::default())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "There are nothing for me to modify.");
    }

    #[tokio::test]
    async fn test_modify_updates_download_and_topic() {
        let f = fixture().await;
        let request = ModifyRequest {
            download: Some("https://example.com/foo".to_string()),
            update_channel_topic: Some(true),
            ..ModifyRequest::default()
        };

        let synced = f
            .registry
            .modify(leader(), &f.project.id, request)
            .await
            .unwrap();

        assert!(synced.value.metadata_updated);
        assert_eq!(synced.value.rename_requested, None);
        let channel = f.directory.channel(f.project.associated_channel_id).unwrap();
        assert_eq!(channel.topic, "desc\n\n**Download link:** https://example.com/foo");

        let cleared = f
            .registry
            .modify(
                leader(),
                &f.project.id,
                ModifyRequest {
                    download: Some("REMOVE".to_string()),
                    update_channel_topic: Some(false),
                    ..ModifyRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.value.project.download, None);
    }

    #[tokio::test]
    async fn test_modify_rename_is_not_applied() {
        let f = fixture().await;
        let request = ModifyRequest {
            new_name: Some("Bar".to_string()),
            ..ModifyRequest::default()
        };

        let synced = f
            .registry
            .modify(leader(), &f.project.id, request)
            .await
            .unwrap();

        assert_eq!(synced.value.rename_requested.as_deref(), Some("Bar"));
        assert!(!synced.value.metadata_updated);
        assert_eq!(f.registry.get(&f.project.id).await.unwrap().name, "Foo");
    }

    #[tokio::test]
    async fn test_modify_rejects_same_name() {
        let f = fixture().await;
        let request = ModifyRequest {
            new_name: Some("Foo".to_string()),
            ..ModifyRequest::default()
        };

        let err = f
            .registry
            .modify(leader(), &f.project.id, request)
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::Validation(_)));
    }

    #[tokio::test]
    async fn test_apply_rename_updates_channel_and_roles() {
        let f = fixture().await;
        let assigned = f
            .registry
            .assign_capability(leader(), &f.project.id, MEMBER, ProjectRole::Developer)
            .await
            .unwrap();
        let role_id = assigned.value.mirrored_role(ProjectRole::Developer, REALM).unwrap();

        let synced = f.registry.apply_rename(&f.project.id, "Bar Baz").await.unwrap();

        assert!(synced.sync.is_clean());
        assert_eq!(synced.value.name, "Bar Baz");
        assert_eq!(
            f.directory.channel(f.project.associated_channel_id).unwrap().name,
            "bar-baz"
        );
        assert_eq!(f.directory.role(role_id).unwrap().name, "Bar Baz Developer");
    }

    #[tokio::test]
    async fn test_apply_rename_conflict() {
        let f = fixture().await;
        f.registry
            .create(Project::new("Bar", "", 3, REALM))
            .await
            .unwrap();

        let err = f.registry.apply_rename(&f.project.id, "bar").await.unwrap_err();

        assert!(matches!(err, RegistryError::Conflict(_)));
        assert_eq!(f.registry.get(&f.project.id).await.unwrap().name, "Foo");
    }
}
