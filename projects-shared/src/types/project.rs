//! The persisted project record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::capability::{Capability, ProjectRole};
use super::ids::{ChannelId, RealmId, RoleId, UserId};
use super::links::{channel_slug, channel_topic};

/// Why a capability could not be revoked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevokeError {
    /// The user does not hold the capability (or holds nothing on the project).
    #[error("The specified user does not have the {0} role.")]
    NotHeld(ProjectRole),

    /// Removing the bit would leave the project without a leader.
    #[error(
        "All projects need to have at least one leader. Please give another user the leader \
         role before removing it."
    )]
    LastLeader,
}

/// A registered project.
///
/// Stored as JSON keyed by `id`. `name` is unique registry-wide
/// (case-insensitive) and only changes through an accepted rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub registrant: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<String>,
    pub associated_channel_id: ChannelId,
    pub associated_guild: RealmId,
    /// Mirrored directory role per capability, per realm.
    #[serde(default)]
    pub associated_discord_roles: BTreeMap<ProjectRole, BTreeMap<RealmId, RoleId>>,
    #[serde(default)]
    pub user_roles: BTreeMap<UserId, Capability>,
}

impl Project {
    /// Create a project with a fresh id and no members.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        registrant: UserId,
        realm: RealmId,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            registrant,
            download: None,
            associated_channel_id: 0,
            associated_guild: realm,
            associated_discord_roles: BTreeMap::new(),
            user_roles: BTreeMap::new(),
        }
    }

    /// Capabilities `user` holds on this project.
    pub fn capabilities_of(&self, user: UserId) -> Capability {
        self.user_roles
            .get(&user)
            .copied()
            .unwrap_or_else(Capability::empty)
    }

    pub fn has_capability(&self, user: UserId, role: ProjectRole) -> bool {
        self.capabilities_of(user).contains(role.bit())
    }

    pub fn is_leader(&self, user: UserId) -> bool {
        self.has_capability(user, ProjectRole::Leader)
    }

    /// Number of users holding the leader bit.
    pub fn leader_count(&self) -> usize {
        self.user_roles
            .values()
            .filter(|mask| mask.contains(Capability::LEADER))
            .count()
    }

    /// Give `user` the capability. Granting a held bit is a no-op.
    pub fn grant(&mut self, user: UserId, role: ProjectRole) {
        *self.user_roles.entry(user).or_insert_with(Capability::empty) |= role.bit();
    }

    /// Take the capability away from `user`.
    ///
    /// A user left with no capabilities is dropped from the member map.
    pub fn revoke(&mut self, user: UserId, role: ProjectRole) -> Result<(), RevokeError> {
        let held = self.capabilities_of(user);
        if !held.contains(role.bit()) {
            return Err(RevokeError::NotHeld(role));
        }
        if role == ProjectRole::Leader && self.leader_count() <= 1 {
            return Err(RevokeError::LastLeader);
        }

        let remaining = held.difference(role.bit());
        if remaining.is_empty() {
            self.user_roles.remove(&user);
        } else {
            self.user_roles.insert(user, remaining);
        }
        Ok(())
    }

    /// Mirrored role id for a capability in a realm, if one was provisioned.
    pub fn mirrored_role(&self, role: ProjectRole, realm: RealmId) -> Option<RoleId> {
        self.associated_discord_roles
            .get(&role)
            .and_then(|realms| realms.get(&realm))
            .copied()
    }

    /// Remember the directory role mirroring `role` in `realm`.
    pub fn record_mirrored_role(&mut self, role: ProjectRole, realm: RealmId, role_id: RoleId) {
        self.associated_discord_roles
            .entry(role)
            .or_default()
            .insert(realm, role_id);
    }

    /// Every mirrored role as `(capability, realm, role id)`.
    pub fn mirrored_roles(&self) -> impl Iterator<Item = (ProjectRole, RealmId, RoleId)> + '_ {
        self.associated_discord_roles.iter().flat_map(|(role, realms)| {
            realms
                .iter()
                .map(move |(realm, role_id)| (*role, *realm, *role_id))
        })
    }

    /// Directory role name for a capability of this project.
    pub fn role_name(&self, role: ProjectRole) -> String {
        role.mirrored_role_name(&self.name)
    }

    pub fn channel_slug(&self) -> String {
        channel_slug(&self.name)
    }

    pub fn channel_topic(&self) -> String {
        channel_topic(&self.description, self.download.as_deref())
    }

    /// Holders of each capability, for every capability with at least one holder.
    pub fn members_by_role(&self) -> Vec<(ProjectRole, Vec<UserId>)> {
        ProjectRole::ALL
            .into_iter()
            .filter_map(|role| {
                let holders: Vec<UserId> = self
                    .user_roles
                    .iter()
                    .filter(|(_, mask)| mask.contains(role.bit()))
                    .map(|(user, _)| *user)
                    .collect();
                (!holders.is_empty()).then_some((role, holders))
            })
            .collect()
    }
}
