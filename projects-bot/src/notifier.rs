//! Notification delivery with channel fallback.

use std::sync::Arc;

use projects_shared::{ChannelId, UserId};
use tracing::{debug, instrument, warn};

use crate::directory::{user_mention, Directory, DirectoryError};

/// Which path delivered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Direct,
    Fallback,
}

/// Sends user notifications, falling back to a realm channel.
#[derive(Clone)]
pub struct Notifier {
    directory: Arc<dyn Directory>,
}

impl Notifier {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    /// Deliver `message` to `user` directly, or post it to `fallback_channel`
    /// prefixed with a mention when direct delivery fails for any reason.
    ///
    /// An error means neither path worked.
    #[instrument(skip(self, message))]
    pub async fn notify(
        &self,
        user: UserId,
        fallback_channel: ChannelId,
        message: &str,
    ) -> Result<Delivery, DirectoryError> {
        match self.directory.send_direct_message(user, message).await {
            Ok(()) => {
                debug!("Notification delivered directly");
                Ok(Delivery::Direct)
            }
            Err(e) => {
                warn!(error = %e, "Direct message failed, using fallback channel");
                self.directory
                    .send_message(fallback_channel, &fallback_text(user, message))
                    .await?;
                Ok(Delivery::Fallback)
            }
        }
    }
}

/// `"Your project..."` becomes `"<@user>, your project..."`.
fn fallback_text(user: UserId, message: &str) -> String {
    let mut chars = message.chars();
    let body: String = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("{}, {}", user_mention(user), body)
}
