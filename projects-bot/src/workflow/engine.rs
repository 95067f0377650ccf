//! Submission and moderation of registration and rename proposals.

use std::sync::Arc;

use chrono::Utc;
use projects_shared::{
    validate_download, ChannelId, MessageId, Project, ProjectRole, RealmConfig, RealmId, UserId,
};
use tracing::{info, instrument, warn};

use super::book::{ClaimError, ProposalBook};
use super::proposal::{
    Decision, DecisionAction, Proposal, ProposalKind, RegistrationRequest, RenameRequest,
    UnknownAction,
};
use crate::config::RealmsConfig;
use crate::directory::{Directory, NewChannel};
use crate::errors::RegistryError;
use crate::notifier::{Delivery, Notifier};
use crate::registry::{ensure_mirrored_role, ProjectRegistry, SyncReport};

/// A new project as submitted by its applicant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub description: String,
    pub download: Option<String>,
    pub associated_channel: Option<ChannelId>,
}

/// Result of a moderator decision.
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub decision: Decision,
    /// The created or renamed project, for accepted proposals.
    pub project: Option<Project>,
    pub delivery: Delivery,
    pub sync: SyncReport,
    /// Confirmation shown to the moderator.
    pub reply: &'static str,
}

impl From<ClaimError> for RegistryError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::NotFound => Self::not_found(err.to_string()),
            ClaimError::InProgress | ClaimError::AlreadyDecided(_) => Self::conflict(err.to_string()),
        }
    }
}

impl From<UnknownAction> for RegistryError {
    fn from(err: UnknownAction) -> Self {
        Self::validation(err.to_string())
    }
}

/// Drives proposals from submission through a moderator decision.
pub struct ApprovalEngine {
    registry: Arc<ProjectRegistry>,
    directory: Arc<dyn Directory>,
    notifier: Notifier,
    book: Arc<ProposalBook>,
    realms: Arc<RealmsConfig>,
}

impl ApprovalEngine {
    pub fn new(
        registry: Arc<ProjectRegistry>,
        book: Arc<ProposalBook>,
        realms: Arc<RealmsConfig>,
    ) -> Self {
        let directory = Arc::clone(registry.directory());
        Self {
            registry,
            notifier: Notifier::new(Arc::clone(&directory)),
            directory,
            book,
            realms,
        }
    }

    pub fn book(&self) -> &Arc<ProposalBook> {
        &self.book
    }

    /// Channels configured for `realm`.
    pub fn realm(&self, realm: RealmId) -> Result<RealmConfig, RegistryError> {
        self.realms
            .realm(realm)
            .copied()
            .ok_or_else(|| RegistryError::not_found("This server is not configured for projects."))
    }

    /// Post a registration proposal to the realm's requests channel.
    #[instrument(skip(self, registration), fields(name = %registration.name))]
    pub async fn submit_registration(
        &self,
        realm: RealmId,
        applicant: UserId,
        registration: Registration,
    ) -> Result<Proposal, RegistryError> {
        let config = self.realm(realm)?;
        self.registry
            .ensure_name_available(&registration.name, None)
            .await?;
        let download = registration
            .download
            .as_deref()
            .map(validate_download)
            .transpose()?;

        let kind = ProposalKind::Registration(RegistrationRequest {
            applicant,
            name: registration.name,
            description: registration.description,
            download,
            associated_channel: registration.associated_channel,
        });
        self.post(realm, config.requests_channel_id, kind).await
    }

    /// Post a rename proposal for a project the requester leads.
    #[instrument(skip(self, project), fields(project_id = %project.id))]
    pub async fn submit_rename(
        &self,
        realm: RealmId,
        requester: UserId,
        project: &Project,
        new_name: &str,
    ) -> Result<Proposal, RegistryError> {
        let config = self.realm(realm)?;
        if new_name == project.name {
            return Err(RegistryError::validation(
                "The specified new name is the same as the current name.",
            ));
        }
        self.registry
            .ensure_name_available(new_name, Some(&project.id))
            .await?;

        let kind = ProposalKind::Rename(RenameRequest {
            requester,
            project_id: project.id.clone(),
            previous_name: project.name.clone(),
            new_name: new_name.to_string(),
        });
        self.post(realm, config.requests_channel_id, kind).await
    }

    async fn post(
        &self,
        realm: RealmId,
        channel_id: ChannelId,
        kind: ProposalKind,
    ) -> Result<Proposal, RegistryError> {
        let mut proposal = Proposal {
            message_id: 0,
            realm,
            channel_id,
            submitted_at: Utc::now(),
            kind,
        };
        proposal.message_id = self
            .directory
            .post_card(channel_id, &proposal.pending_card())
            .await?;
        self.book.insert(proposal.clone()).await?;
        info!(message_id = proposal.message_id, "Proposal submitted");
        Ok(proposal)
    }

    /// Apply a moderator's accept or reject to the proposal on `message_id`.
    ///
    /// Only one decision per proposal goes through. If a required step fails
    /// the proposal stays pending and can be decided again.
    #[instrument(skip(self))]
    pub async fn decide(
        &self,
        realm: RealmId,
        moderator: UserId,
        message_id: MessageId,
        action_id: &str,
    ) -> Result<DecisionOutcome, RegistryError> {
        let action: DecisionAction = action_id.parse()?;
        let config = self.realm(realm)?;
        let claim = self.book.claim(message_id)?;
        let proposal = claim.proposal().clone();
        if !action.applies_to(&proposal.kind) {
            return Err(RegistryError::validation(
                "This action does not belong to the request.",
            ));
        }

        let decision = action.decision();
        let mut sync = SyncReport::new();
        let (project, message, reply) = match (&proposal.kind, decision) {
            (ProposalKind::Registration(request), Decision::Accept) => {
                let project = self
                    .accept_registration(realm, &config, request, &mut sync)
                    .await?;
                let message = format!(
                    "Your project **{}** has been accepted!\n**Project ID:** {}",
                    project.name, project.id
                );
                (Some(project), message, "Request accepted and applicant notified.")
            }
            (ProposalKind::Registration(request), Decision::Reject) => (
                None,
                format!("Your project **{}** has been rejected.", request.name),
                "Request rejected and applicant notified.",
            ),
            (ProposalKind::Rename(request), Decision::Accept) => {
                let renamed = self
                    .registry
                    .apply_rename(&request.project_id, &request.new_name)
                    .await?;
                sync.merge(renamed.sync);
                let message = format!("Your project **{}** has been renamed!", renamed.value.name);
                (
                    Some(renamed.value),
                    message,
                    "Project renamed and responsible leader notified.",
                )
            }
            (ProposalKind::Rename(request), Decision::Reject) => {
                let name = match self.registry.get(&request.project_id).await {
                    Ok(project) => project.name,
                    Err(RegistryError::NotFound(_)) => request.previous_name.clone(),
                    Err(e) => return Err(e),
                };
                (
                    None,
                    format!("Your project **{}** has been denied from being renamed.", name),
                    "Project rename request rejected and responsible leader notified.",
                )
            }
        };

        if let Err(e) = claim.complete(decision).await {
            warn!(message_id, error = %e, "Decided proposal left in store");
        }
        info!(message_id, moderator, decision = decision.past_tense(), "Proposal decided");

        sync.record(
            "edit request card",
            self.directory
                .edit_card(
                    proposal.channel_id,
                    message_id,
                    &proposal.decided_card(decision, moderator),
                )
                .await,
        );

        let delivery = self
            .notifier
            .notify(proposal.requester(), config.fallback_notify_channel, &message)
            .await
            .map_err(RegistryError::Notification)?;

        Ok(DecisionOutcome {
            decision,
            project,
            delivery,
            sync,
            reply,
        })
    }

    /// Create the project, its leader role and its channel.
    ///
    /// Every directory object is reused if it already exists, so a retry after
    /// a failure does not duplicate anything.
    async fn accept_registration(
        &self,
        realm: RealmId,
        config: &RealmConfig,
        request: &RegistrationRequest,
        sync: &mut SyncReport,
    ) -> Result<Project, RegistryError> {
        self.registry
            .ensure_name_available(&request.name, None)
            .await?;

        let mut project = Project::new(
            request.name.as_str(),
            request.description.as_str(),
            request.applicant,
            realm,
        );
        project.download = request.download.clone();
        project.grant(request.applicant, ProjectRole::Leader);

        let role_id =
            ensure_mirrored_role(self.directory.as_ref(), &mut project, ProjectRole::Leader, realm)
                .await?;

        project.associated_channel_id = match request.associated_channel {
            Some(channel) => channel,
            None => {
                let slug = project.channel_slug();
                let existing = self
                    .directory
                    .find_channel(realm, config.projects_category_id, &slug)
                    .await?;
                let channel = match existing {
                    Some(channel) => channel,
                    None => {
                        self.directory
                            .create_channel(
                                realm,
                                &NewChannel {
                                    name: slug,
                                    parent: config.projects_category_id,
                                    topic: project.channel_topic(),
                                },
                            )
                            .await?
                    }
                };
                self.directory.allow_manage_channel(channel, role_id).await?;
                channel
            }
        };

        let project = self.registry.create(project).await?;

        let member = sync.record(
            "check membership",
            self.directory.is_member(realm, request.applicant).await,
        );
        if member == Some(true) {
            sync.record(
                "grant role",
                self.directory
                    .grant_role(realm, request.applicant, role_id)
                    .await,
            );
        }

        Ok(project)
    }
}
