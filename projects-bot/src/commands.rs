//! Command handlers: the operations the platform adapter routes user commands
//! and card actions to, with their replies.
//!
//! Errors caused by the request come back as [`Reply::Error`] so the adapter
//! can show them to the user. Only infrastructure failures are returned as
//! `Err`.

use std::sync::Arc;

use projects_shared::{MessageId, Project, ProjectRole, RealmId, UserId};
use tracing::{error, instrument, warn};

use crate::directory::{channel_mention, user_mention, Card};
use crate::errors::RegistryError;
use crate::registry::{Actor, ModifyRequest, ProjectRegistry, SearchMatch};
use crate::workflow::{ApprovalEngine, Registration};

/// What the adapter shows the user who issued a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Card(Card),
    /// A request-level failure, shown verbatim.
    Error(String),
}

impl Reply {
    pub fn text(message: impl Into<String>) -> Self {
        Self::Text(message.into())
    }

    /// The text of a plain or error reply.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Text(message) | Self::Error(message) => Some(message),
            Self::Card(_) => None,
        }
    }

    pub fn card(&self) -> Option<&Card> {
        match self {
            Self::Card(card) => Some(card),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Render as a card, wrapping text replies.
    pub fn into_card(self) -> Card {
        match self {
            Self::Card(card) => card,
            Self::Text(message) => Card::default().with_content(message),
            Self::Error(message) => Card::error(message),
        }
    }
}

fn into_reply(result: Result<Reply, RegistryError>) -> Result<Reply, RegistryError> {
    match result {
        Err(e) if e.is_user_error() => {
            warn!(error = %e, "Command rejected");
            Ok(Reply::Error(e.to_string()))
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            Err(e)
        }
        ok => ok,
    }
}

/// Entry points for every registry command.
pub struct Commands {
    registry: Arc<ProjectRegistry>,
    engine: Arc<ApprovalEngine>,
}

impl Commands {
    pub fn new(registry: Arc<ProjectRegistry>, engine: Arc<ApprovalEngine>) -> Self {
        Self { registry, engine }
    }

    /// Submit a project for moderator approval.
    #[instrument(skip(self, registration))]
    pub async fn register(
        &self,
        realm: RealmId,
        applicant: UserId,
        registration: Registration,
    ) -> Result<Reply, RegistryError> {
        into_reply(
            self.engine
                .submit_registration(realm, applicant, registration)
                .await
                .map(|_| {
                    Reply::text(
                        "Your registration request has been sent. If you haven't already, please \
                         turn on DMs for this server so the bot can notify you if your request is \
                         accepted or rejected.",
                    )
                }),
        )
    }

    /// Show one project, or the names of every project matching the query.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Reply, RegistryError> {
        let result = match self.registry.search(query).await {
            Ok(SearchMatch::Resolved(project)) => Ok(Reply::Card(self.project_card(&project).await)),
            Ok(SearchMatch::Ambiguous(projects)) => {
                let names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();
                Ok(Reply::Card(
                    Card::new("Multiple searches found").with_description(names.join("\n")),
                ))
            }
            Ok(SearchMatch::Nothing) => Err(RegistryError::not_found(
                "The specified query returns no results.",
            )),
            Err(e) => Err(e),
        };
        into_reply(result)
    }

    /// Give a user a capability on a project the actor leads.
    #[instrument(skip(self))]
    pub async fn assign(
        &self,
        actor: Actor,
        project_id: &str,
        user: UserId,
        role: ProjectRole,
    ) -> Result<Reply, RegistryError> {
        into_reply(
            self.registry
                .assign_capability(actor, project_id, user, role)
                .await
                .map(|_| Reply::text("Role assigned successfully.")),
        )
    }

    /// Take a capability away from a user on a project the actor leads.
    #[instrument(skip(self))]
    pub async fn remove_role(
        &self,
        actor: Actor,
        project_id: &str,
        user: UserId,
        role: ProjectRole,
    ) -> Result<Reply, RegistryError> {
        into_reply(
            self.registry
                .revoke_capability(actor, project_id, user, role)
                .await
                .map(|_| Reply::text("Role removed successfully.")),
        )
    }

    /// Update a project's description or download and request a rename.
    #[instrument(skip(self, request))]
    pub async fn modify(
        &self,
        actor: Actor,
        project_id: &str,
        request: ModifyRequest,
    ) -> Result<Reply, RegistryError> {
        into_reply(self.modify_inner(actor, project_id, request).await)
    }

    async fn modify_inner(
        &self,
        actor: Actor,
        project_id: &str,
        request: ModifyRequest,
    ) -> Result<Reply, RegistryError> {
        if request.new_name.is_some() {
            self.engine.realm(actor.realm)?;
        }
        let outcome = self.registry.modify(actor, project_id, request).await?.value;

        let rename_submitted = match &outcome.rename_requested {
            Some(new_name) => {
                self.engine
                    .submit_rename(actor.realm, actor.user, &outcome.project, new_name)
                    .await?;
                true
            }
            None => false,
        };

        let message = match (outcome.metadata_updated, rename_submitted) {
            (true, true) => {
                "The description and/or download link has been updated. Awaiting name change. \
                 Make sure you allowed DMs from server members for the bot to notify you whether \
                 the project name change has been approved."
            }
            (false, true) => {
                "Awaiting name change. Make sure you allowed DMs from server members for the bot \
                 to notify you whether the project name change has been approved."
            }
            _ => "The description and/or download link has been updated.",
        };
        Ok(Reply::text(message))
    }

    /// List the projects `user` leads.
    #[instrument(skip(self))]
    pub async fn mine(&self, user: UserId) -> Result<Reply, RegistryError> {
        let result = self.registry.list_led_by(user).await.map(|projects| {
            if projects.is_empty() {
                return Reply::text("You are not a leader of any projects.");
            }
            let card = projects
                .iter()
                .fold(Card::new("Projects led by you."), |card, project| {
                    card.field(&project.name, format!("ID: {}", project.id))
                });
            Reply::Card(card)
        });
        into_reply(result)
    }

    /// A moderator pressed accept or reject on a proposal card.
    #[instrument(skip(self))]
    pub async fn handle_action(
        &self,
        realm: RealmId,
        moderator: UserId,
        message_id: MessageId,
        action_id: &str,
    ) -> Result<Reply, RegistryError> {
        into_reply(
            self.engine
                .decide(realm, moderator, message_id, action_id)
                .await
                .map(|outcome| Reply::text(outcome.reply)),
        )
    }

    /// Full view of a project: metadata and members grouped by capability.
    async fn project_card(&self, project: &Project) -> Card {
        let realm_name = match self
            .registry
            .directory()
            .realm_name(project.associated_guild)
            .await
        {
            Ok(name) => name,
            Err(e) => {
                warn!(error = %e, realm = project.associated_guild, "Realm name unavailable");
                project.associated_guild.to_string()
            }
        };

        let mut card = Card::new(&project.name)
            .with_description(&project.description)
            .inline_field("ID", &project.id);
        if let Some(download) = &project.download {
            card = card.inline_field("Download", download);
        }
        card = card
            .field(
                "Discussion channel",
                format!("{} ({})", channel_mention(project.associated_channel_id), realm_name),
            )
            .field("Registrant", user_mention(project.registrant));

        project
            .members_by_role()
            .into_iter()
            .fold(card, |card, (role, holders)| {
                let mentions: Vec<String> = holders.into_iter().map(user_mention).collect();
                card.field(role.plural(), mentions.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_accessors() {
        let text = Reply::text("ok");
        let error = Reply::Error("bad".to_string());

        assert_eq!(text.message(), Some("ok"));
        assert!(!text.is_error());
        assert!(error.is_error());
        assert!(error.clone().into_card().is_error);
        assert_eq!(Reply::Card(Card::new("T")).message(), None);
    }

    #[test]
    fn test_user_errors_become_replies() {
        let reply = into_reply(Err(RegistryError::unauthorized("no"))).unwrap();
        assert_eq!(reply, Reply::Error("no".to_string()));

        let failure = into_reply(Err(RegistryError::Notification(
            crate::directory::DirectoryError::delivery("down"),
        )));
        assert!(failure.is_err());
    }
}
