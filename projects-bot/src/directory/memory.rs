//! In-memory directory for testing and local development.
//!
//! Realms, roles, channels and messages are plain records behind a mutex.
//! Failures can be injected per concern so tests can exercise best-effort
//! paths and notification fallbacks.
//!
//! ```ignore
//! let directory = InMemoryDirectory::new();
//! directory.add_realm(10, "Community");
//! directory.add_member(10, 42);
//! directory.block_direct_messages(42);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use projects_shared::{ChannelId, MessageId, RealmId, RoleId, UserId};

use super::{Card, Directory, DirectoryError, NewChannel};

/// First id handed out for created objects.
const FIRST_ID: u64 = 1_000_000;

/// A role held in the in-memory directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    pub realm: RealmId,
    pub name: String,
    pub members: HashSet<UserId>,
}

/// A channel held in the in-memory directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    pub realm: RealmId,
    pub name: String,
    pub parent: Option<ChannelId>,
    pub topic: String,
    /// Roles allowed to manage the channel.
    pub managers: Vec<RoleId>,
    /// Plain messages posted to the channel, oldest first.
    pub messages: Vec<String>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    realms: HashMap<RealmId, String>,
    members: HashMap<RealmId, HashSet<UserId>>,
    roles: BTreeMap<RoleId, RoleRecord>,
    channels: BTreeMap<ChannelId, ChannelRecord>,
    cards: HashMap<MessageId, (ChannelId, Card)>,
    direct_messages: Vec<(UserId, String)>,
    role_creations: usize,
    channel_creations: usize,
    dm_blocked: HashSet<UserId>,
    fail_role_operations: bool,
    fail_channel_messages: bool,
}

impl State {
    fn allocate(&mut self) -> u64 {
        if self.next_id < FIRST_ID {
            self.next_id = FIRST_ID;
        }
        self.next_id += 1;
        self.next_id
    }

    fn check_roles(&self) -> Result<(), DirectoryError> {
        if self.fail_role_operations {
            return Err(DirectoryError::unavailable("role operations are failing"));
        }
        Ok(())
    }

    fn realm(&self, realm: RealmId) -> Result<(), DirectoryError> {
        if self.realms.contains_key(&realm) {
            Ok(())
        } else {
            Err(DirectoryError::not_found(format!("realm {}", realm)))
        }
    }

    fn role_mut(&mut self, realm: RealmId, role: RoleId) -> Result<&mut RoleRecord, DirectoryError> {
        self.roles
            .get_mut(&role)
            .filter(|r| r.realm == realm)
            .ok_or_else(|| DirectoryError::not_found(format!("role {}", role)))
    }

    fn channel_mut(&mut self, channel: ChannelId) -> Result<&mut ChannelRecord, DirectoryError> {
        self.channels
            .get_mut(&channel)
            .ok_or_else(|| DirectoryError::not_found(format!("channel {}", channel)))
    }

    fn member(&self, realm: RealmId, user: UserId) -> Result<(), DirectoryError> {
        let present = self
            .members
            .get(&realm)
            .is_some_and(|members| members.contains(&user));
        if present {
            Ok(())
        } else {
            Err(DirectoryError::not_found(format!("member {} in realm {}", user, realm)))
        }
    }
}

/// Directory implementation backed by in-process records.
pub struct InMemoryDirectory {
    state: Mutex<State>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    pub fn add_realm(&self, realm: RealmId, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.realms.insert(realm, name.to_string());
        state.members.entry(realm).or_default();
    }

    pub fn add_member(&self, realm: RealmId, user: UserId) {
        let mut state = self.state.lock().unwrap();
        state.members.entry(realm).or_default().insert(user);
    }

    pub fn remove_member(&self, realm: RealmId, user: UserId) {
        let mut state = self.state.lock().unwrap();
        if let Some(members) = state.members.get_mut(&realm) {
            members.remove(&user);
        }
        for role in state.roles.values_mut().filter(|r| r.realm == realm) {
            role.members.remove(&user);
        }
    }

    /// Register a channel that already exists on the platform.
    pub fn add_channel(&self, realm: RealmId, name: &str, parent: Option<ChannelId>) -> ChannelId {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate();
        state.channels.insert(
            id,
            ChannelRecord {
                realm,
                name: name.to_string(),
                parent,
                topic: String::new(),
                managers: Vec::new(),
                messages: Vec::new(),
            },
        );
        id
    }

    /// Register a role that already exists on the platform.
    pub fn add_role(&self, realm: RealmId, name: &str) -> RoleId {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate();
        state.roles.insert(
            id,
            RoleRecord {
                realm,
                name: name.to_string(),
                members: HashSet::new(),
            },
        );
        id
    }

    /// Delete a role as a realm administrator would.
    pub fn delete_role(&self, role: RoleId) {
        self.state.lock().unwrap().roles.remove(&role);
    }

    /// Rename a channel out-of-band, as a channel manager would.
    pub fn set_channel_name(&self, channel: ChannelId, name: &str) {
        if let Some(record) = self.state.lock().unwrap().channels.get_mut(&channel) {
            record.name = name.to_string();
        }
    }

    /// Make direct messages to `user` fail.
    pub fn block_direct_messages(&self, user: UserId) {
        self.state.lock().unwrap().dm_blocked.insert(user);
    }

    /// Make every role create/rename/grant/revoke fail.
    pub fn fail_role_operations(&self, fail: bool) {
        self.state.lock().unwrap().fail_role_operations = fail;
    }

    /// Make every plain channel message fail.
    pub fn fail_channel_messages(&self, fail: bool) {
        self.state.lock().unwrap().fail_channel_messages = fail;
    }

    pub fn role(&self, role: RoleId) -> Option<RoleRecord> {
        self.state.lock().unwrap().roles.get(&role).cloned()
    }

    /// Ids of every role in `realm` named `name`.
    pub fn roles_named(&self, realm: RealmId, name: &str) -> Vec<RoleId> {
        self.state
            .lock()
            .unwrap()
            .roles
            .iter()
            .filter(|(_, r)| r.realm == realm && r.name == name)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn has_role(&self, user: UserId, role: RoleId) -> bool {
        self.role(role).is_some_and(|r| r.members.contains(&user))
    }

    pub fn channel(&self, channel: ChannelId) -> Option<ChannelRecord> {
        self.state.lock().unwrap().channels.get(&channel).cloned()
    }

    /// Ids of every channel in `realm` named `name`.
    pub fn channels_named(&self, realm: RealmId, name: &str) -> Vec<ChannelId> {
        self.state
            .lock()
            .unwrap()
            .channels
            .iter()
            .filter(|(_, c)| c.realm == realm && c.name == name)
            .map(|(id, _)| *id)
            .collect()
    }

    /// The card carried by a posted message.
    pub fn card(&self, message: MessageId) -> Option<Card> {
        self.state
            .lock()
            .unwrap()
            .cards
            .get(&message)
            .map(|(_, card)| card.clone())
    }

    /// Direct messages delivered to `user`, oldest first.
    pub fn direct_messages(&self, user: UserId) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .direct_messages
            .iter()
            .filter(|(to, _)| *to == user)
            .map(|(_, content)| content.clone())
            .collect()
    }

    /// Plain messages posted to `channel`, oldest first.
    pub fn channel_messages(&self, channel: ChannelId) -> Vec<String> {
        self.channel(channel).map(|c| c.messages).unwrap_or_default()
    }

    /// Number of `create_role` calls that succeeded.
    pub fn role_creations(&self) -> usize {
        self.state.lock().unwrap().role_creations
    }

    /// Number of `create_channel` calls that succeeded.
    pub fn channel_creations(&self) -> usize {
        self.state.lock().unwrap().channel_creations
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn realm_name(&self, realm: RealmId) -> Result<String, DirectoryError> {
        let state = self.state.lock().unwrap();
        state
            .realms
            .get(&realm)
            .cloned()
            .ok_or_else(|| DirectoryError::not_found(format!("realm {}", realm)))
    }

    async fn is_member(&self, realm: RealmId, user: UserId) -> Result<bool, DirectoryError> {
        let state = self.state.lock().unwrap();
        state.realm(realm)?;
        Ok(state.member(realm, user).is_ok())
    }

    async fn role_exists(&self, realm: RealmId, role: RoleId) -> Result<bool, DirectoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.roles.get(&role).is_some_and(|r| r.realm == realm))
    }

    async fn find_role(&self, realm: RealmId, name: &str) -> Result<Option<RoleId>, DirectoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .roles
            .iter()
            .find(|(_, r)| r.realm == realm && r.name == name)
            .map(|(id, _)| *id))
    }

    async fn create_role(&self, realm: RealmId, name: &str) -> Result<RoleId, DirectoryError> {
        let mut state = self.state.lock().unwrap();
        state.check_roles()?;
        state.realm(realm)?;
        let id = state.allocate();
        state.roles.insert(
            id,
            RoleRecord {
                realm,
                name: name.to_string(),
                members: HashSet::new(),
            },
        );
        state.role_creations += 1;
        Ok(id)
    }

    async fn rename_role(&self, realm: RealmId, role: RoleId, name: &str) -> Result<(), DirectoryError> {
        let mut state = self.state.lock().unwrap();
        state.check_roles()?;
        state.role_mut(realm, role)?.name = name.to_string();
        Ok(())
    }

    async fn grant_role(&self, realm: RealmId, user: UserId, role: RoleId) -> Result<(), DirectoryError> {
        let mut state = self.state.lock().unwrap();
        state.check_roles()?;
        state.member(realm, user)?;
        state.role_mut(realm, role)?.members.insert(user);
        Ok(())
    }

    async fn revoke_role(&self, realm: RealmId, user: UserId, role: RoleId) -> Result<(), DirectoryError> {
        let mut state = self.state.lock().unwrap();
        state.check_roles()?;
        state.member(realm, user)?;
        state.role_mut(realm, role)?.members.remove(&user);
        Ok(())
    }

    async fn find_channel(
        &self,
        realm: RealmId,
        parent: ChannelId,
        name: &str,
    ) -> Result<Option<ChannelId>, DirectoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .channels
            .iter()
            .find(|(_, c)| c.realm == realm && c.parent == Some(parent) && c.name == name)
            .map(|(id, _)| *id))
    }

    async fn create_channel(&self, realm: RealmId, channel: &NewChannel) -> Result<ChannelId, DirectoryError> {
        let mut state = self.state.lock().unwrap();
        state.realm(realm)?;
        let id = state.allocate();
        state.channels.insert(
            id,
            ChannelRecord {
                realm,
                name: channel.name.clone(),
                parent: Some(channel.parent),
                topic: channel.topic.clone(),
                managers: Vec::new(),
                messages: Vec::new(),
            },
        );
        state.channel_creations += 1;
        Ok(id)
    }

    async fn allow_manage_channel(&self, channel: ChannelId, role: RoleId) -> Result<(), DirectoryError> {
        let mut state = self.state.lock().unwrap();
        let record = state.channel_mut(channel)?;
        if !record.managers.contains(&role) {
            record.managers.push(role);
        }
        Ok(())
    }

    async fn channel_name(&self, channel: ChannelId) -> Result<String, DirectoryError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.channel_mut(channel)?.name.clone())
    }

    async fn rename_channel(&self, channel: ChannelId, name: &str) -> Result<(), DirectoryError> {
        let mut state = self.state.lock().unwrap();
        state.channel_mut(channel)?.name = name.to_string();
        Ok(())
    }

    async fn set_channel_topic(&self, channel: ChannelId, topic: &str) -> Result<(), DirectoryError> {
        let mut state = self.state.lock().unwrap();
        state.channel_mut(channel)?.topic = topic.to_string();
        Ok(())
    }

    async fn send_direct_message(&self, user: UserId, content: &str) -> Result<(), DirectoryError> {
        let mut state = self.state.lock().unwrap();
        if state.dm_blocked.contains(&user) {
            return Err(DirectoryError::delivery(format!(
                "user {} does not accept direct messages",
                user
            )));
        }
        state.direct_messages.push((user, content.to_string()));
        Ok(())
    }

    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<MessageId, DirectoryError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_channel_messages {
            return Err(DirectoryError::delivery(format!("channel {} rejected the message", channel)));
        }
        let id = state.allocate();
        state.channel_mut(channel)?.messages.push(content.to_string());
        Ok(id)
    }

    async fn post_card(&self, channel: ChannelId, card: &Card) -> Result<MessageId, DirectoryError> {
        let mut state = self.state.lock().unwrap();
        state.channel_mut(channel)?;
        let id = state.allocate();
        state.cards.insert(id, (channel, card.clone()));
        Ok(id)
    }

    async fn edit_card(&self, channel: ChannelId, message: MessageId, card: &Card) -> Result<(), DirectoryError> {
        let mut state = self.state.lock().unwrap();
        match state.cards.get_mut(&message) {
            Some((posted_in, existing)) if *posted_in == channel => {
                *existing = card.clone();
                Ok(())
            }
            _ => Err(DirectoryError::not_found(format!("message {}", message))),
        }
    }
}
