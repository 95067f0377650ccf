//! Per-realm configuration.

use serde::{Deserialize, Serialize};

use super::ids::ChannelId;

/// Channels a realm has designated for the registry.
///
/// Loaded once at startup and shared read-only for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RealmConfig {
    /// Channel where registration and rename proposals are posted.
    pub requests_channel_id: ChannelId,
    /// Category under which new project channels are created.
    pub projects_category_id: ChannelId,
    /// Channel used when a direct message to a user cannot be delivered.
    #[serde(alias = "FallbackNotifyChannelId")]
    pub fallback_notify_channel: ChannelId,
}
