//! Provisioning of mirrored directory roles.

use projects_shared::{Project, ProjectRole, RealmId, RoleId};
use tracing::{debug, info};

use crate::directory::{Directory, DirectoryError};

/// Return the directory role mirroring `role` for `project` in `realm`,
/// creating it only if no usable one exists.
///
/// Lookup order: the id stored on the project (if the role still exists),
/// then a role carrying the derived name, then a new role. Whatever is found
/// or created is recorded on `project`; the caller persists it.
pub async fn ensure_mirrored_role(
    directory: &dyn Directory,
    project: &mut Project,
    role: ProjectRole,
    realm: RealmId,
) -> Result<RoleId, DirectoryError> {
    if let Some(stored) = project.mirrored_role(role, realm) {
        if directory.role_exists(realm, stored).await? {
            return Ok(stored);
        }
        debug!(role_id = stored, "Stored mirror role no longer exists");
    }

    let name = project.role_name(role);
    let role_id = match directory.find_role(realm, &name).await? {
        Some(existing) => {
            debug!(role_id = existing, role_name = %name, "Reusing mirror role by name");
            existing
        }
        None => {
            let created = directory.create_role(realm, &name).await?;
            info!(role_id = created, role_name = %name, realm, "Created mirror role");
            created
        }
    };

    project.record_mirrored_role(role, realm, role_id);
    Ok(role_id)
}

/// The directory role currently mirroring `role` in `realm`, without creating one.
pub async fn find_mirrored_role(
    directory: &dyn Directory,
    project: &Project,
    role: ProjectRole,
    realm: RealmId,
) -> Result<Option<RoleId>, DirectoryError> {
    match project.mirrored_role(role, realm) {
        Some(stored) => Ok(Some(stored)),
        None => directory.find_role(realm, &project.role_name(role)).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;

    const REALM: RealmId = 5;

    fn setup() -> (InMemoryDirectory, Project) {
        let directory = InMemoryDirectory::new();
        directory.add_realm(REALM, "Community");
        let project = Project::new("Foo", "desc", 1, REALM);
        (directory, project)
    }

    #[tokio::test]
    async fn test_creates_once_then_reuses_stored_id() {
        let (directory, mut project) = setup();

        let first = ensure_mirrored_role(&directory, &mut project, ProjectRole::Developer, REALM)
            .await
            .unwrap();
        let second = ensure_mirrored_role(&directory, &mut project, ProjectRole::Developer, REALM)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(directory.role_creations(), 1);
        assert_eq!(directory.role(first).unwrap().name, "Foo Developer");
        assert_eq!(project.mirrored_role(ProjectRole::Developer, REALM), Some(first));
    }

    #[tokio::test]
    async fn test_reuses_role_by_derived_name() {
        let (directory, mut project) = setup();
        let existing = directory.add_role(REALM, "Foo Leader");

        let role = ensure_mirrored_role(&directory, &mut project, ProjectRole::Leader, REALM)
            .await
            .unwrap();

        assert_eq!(role, existing);
        assert_eq!(directory.role_creations(), 0);
    }

    #[tokio::test]
    async fn test_replaces_deleted_stored_role() {
        let (directory, mut project) = setup();
        let first = ensure_mirrored_role(&directory, &mut project, ProjectRole::Leader, REALM)
            .await
            .unwrap();
        directory.delete_role(first);

        let second = ensure_mirrored_role(&directory, &mut project, ProjectRole::Leader, REALM)
            .await
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(project.mirrored_role(ProjectRole::Leader, REALM), Some(second));
    }

    #[tokio::test]
    async fn test_find_falls_back_to_name() {
        let (directory, project) = setup();
        let existing = directory.add_role(REALM, "Foo Designer");

        let found = find_mirrored_role(&directory, &project, ProjectRole::Designer, REALM)
            .await
            .unwrap();

        assert_eq!(found, Some(existing));
        assert_eq!(
            find_mirrored_role(&directory, &project, ProjectRole::Translator, REALM)
                .await
                .unwrap(),
            None
        );
    }
}
