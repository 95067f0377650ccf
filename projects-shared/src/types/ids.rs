//! Identifiers of objects owned by the external directory service.
//!
//! All directory objects are addressed by 64-bit snowflakes. Project ids are
//! opaque strings and live on [`crate::Project`].

pub type UserId = u64;
pub type RealmId = u64;
pub type ChannelId = u64;
pub type RoleId = u64;
pub type MessageId = u64;
