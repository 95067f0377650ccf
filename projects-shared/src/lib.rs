//! # Projects Shared
//!
//! This crate defines the data structures shared across the project registry:
//! the persisted `Project` record, the capability bitmask and its static
//! display table, per-realm configuration, and the small pure helpers that
//! derive channel names and topics from project metadata.

pub mod types;

pub use types::capability::{Capability, ProjectRole, UnknownRole};
pub use types::ids::{ChannelId, MessageId, RealmId, RoleId, UserId};
pub use types::links::{
    channel_slug, channel_topic, validate_download, DownloadChange, InvalidDownload,
    DOWNLOAD_CLEAR_SENTINEL,
};
pub use types::project::{Project, RevokeError};
pub use types::realm::RealmConfig;
