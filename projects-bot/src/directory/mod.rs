//! The external directory service.
//!
//! Realms, channels, roles and message delivery belong to the platform the
//! registry is mirrored onto. `Directory` is the seam the platform adapter
//! implements; [`InMemoryDirectory`] implements it for tests and local runs.

mod card;
mod memory;

pub use card::{ActionStyle, Card, CardAction, CardField};
pub use memory::{ChannelRecord, InMemoryDirectory, RoleRecord};

use async_trait::async_trait;
use projects_shared::{ChannelId, MessageId, RealmId, RoleId, UserId};
use thiserror::Error;

/// Errors reported by a directory implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// The referenced realm, channel, role, member or message does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The platform refused the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A message could not be delivered.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// The platform could not be reached.
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl DirectoryError {
    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a forbidden error.
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create a delivery error.
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    /// Create an unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// A text channel to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChannel {
    pub name: String,
    /// Category the channel is created under.
    pub parent: ChannelId,
    pub topic: String,
}

/// Mention markup for a user.
pub fn user_mention(user: UserId) -> String {
    format!("<@{}>", user)
}

/// Mention markup for a channel.
pub fn channel_mention(channel: ChannelId) -> String {
    format!("<#{}>", channel)
}

/// Operations the registry performs against the platform directory.
///
/// None of these calls are transactional with the record store. Callers make
/// them idempotent by reusing objects by stored id or by derived name before
/// creating new ones.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Display name of a realm.
    async fn realm_name(&self, realm: RealmId) -> Result<String, DirectoryError>;

    /// Whether `user` is currently a member of `realm`.
    async fn is_member(&self, realm: RealmId, user: UserId) -> Result<bool, DirectoryError>;

    /// Whether a role with this id still exists in the realm.
    async fn role_exists(&self, realm: RealmId, role: RoleId) -> Result<bool, DirectoryError>;

    /// A role in the realm with exactly this name, if any.
    async fn find_role(&self, realm: RealmId, name: &str) -> Result<Option<RoleId>, DirectoryError>;

    async fn create_role(&self, realm: RealmId, name: &str) -> Result<RoleId, DirectoryError>;

    async fn rename_role(&self, realm: RealmId, role: RoleId, name: &str)
        -> Result<(), DirectoryError>;

    /// Add `user` to the role.
    async fn grant_role(&self, realm: RealmId, user: UserId, role: RoleId)
        -> Result<(), DirectoryError>;

    /// Remove `user` from the role.
    async fn revoke_role(&self, realm: RealmId, user: UserId, role: RoleId)
        -> Result<(), DirectoryError>;

    /// A channel under `parent` with exactly this name, if any.
    async fn find_channel(
        &self,
        realm: RealmId,
        parent: ChannelId,
        name: &str,
    ) -> Result<Option<ChannelId>, DirectoryError>;

    async fn create_channel(
        &self,
        realm: RealmId,
        channel: &NewChannel,
    ) -> Result<ChannelId, DirectoryError>;

    /// Let holders of `role` manage `channel`.
    async fn allow_manage_channel(
        &self,
        channel: ChannelId,
        role: RoleId,
    ) -> Result<(), DirectoryError>;

    async fn channel_name(&self, channel: ChannelId) -> Result<String, DirectoryError>;

    async fn rename_channel(&self, channel: ChannelId, name: &str) -> Result<(), DirectoryError>;

    async fn set_channel_topic(&self, channel: ChannelId, topic: &str)
        -> Result<(), DirectoryError>;

    /// Deliver a private message to a user.
    async fn send_direct_message(&self, user: UserId, content: &str)
        -> Result<(), DirectoryError>;

    /// Post a plain message to a channel.
    async fn send_message(&self, channel: ChannelId, content: &str)
        -> Result<MessageId, DirectoryError>;

    /// Post a card and return the id of the message carrying it.
    async fn post_card(&self, channel: ChannelId, card: &Card) -> Result<MessageId, DirectoryError>;

    /// Replace a previously posted card.
    async fn edit_card(
        &self,
        channel: ChannelId,
        message: MessageId,
        card: &Card,
    ) -> Result<(), DirectoryError>;
}
