//! Pending requests and the decision actions moderators take on them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use projects_shared::{ChannelId, MessageId, RealmId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::directory::{channel_mention, user_mention, ActionStyle, Card};

const ACCEPT_REGISTRATION: &str = "acceptRequest";
const REJECT_REGISTRATION: &str = "rejectRequest";
const ACCEPT_RENAME_PREFIX: &str = "acceptRename_";
const REJECT_RENAME_PREFIX: &str = "rejectRename_";

/// A member's request to add a project to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub applicant: UserId,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<String>,
    /// Existing channel to use instead of creating one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_channel: Option<ChannelId>,
}

/// A leader's request to rename a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRequest {
    pub requester: UserId,
    pub project_id: String,
    pub previous_name: String,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProposalKind {
    Registration(RegistrationRequest),
    Rename(RenameRequest),
}

/// A request awaiting a moderator decision.
///
/// Keyed by the id of the message carrying its card. The stored proposal is
/// authoritative; the card only displays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub message_id: MessageId,
    pub realm: RealmId,
    /// Channel the card was posted to.
    pub channel_id: ChannelId,
    pub submitted_at: DateTime<Utc>,
    pub kind: ProposalKind,
}

impl Proposal {
    /// The user notified of the outcome.
    pub fn requester(&self) -> UserId {
        match &self.kind {
            ProposalKind::Registration(request) => request.applicant,
            ProposalKind::Rename(request) => request.requester,
        }
    }

    /// Card shown while the proposal waits for a decision.
    pub fn pending_card(&self) -> Card {
        match &self.kind {
            ProposalKind::Registration(request) => registration_card(request)
                .action(ACCEPT_REGISTRATION, "Accept", ActionStyle::Success)
                .action(REJECT_REGISTRATION, "Reject", ActionStyle::Danger),
            ProposalKind::Rename(request) => {
                let accept = DecisionAction::rename(Decision::Accept, request);
                let reject = DecisionAction::rename(Decision::Reject, request);
                rename_card(request)
                    .with_content("New project rename request.")
                    .action(accept.to_string(), "Accept", ActionStyle::Success)
                    .action(reject.to_string(), "Reject", ActionStyle::Danger)
            }
        }
    }

    /// Card shown once a moderator decided, without actions.
    pub fn decided_card(&self, decision: Decision, moderator: UserId) -> Card {
        let (card, subject) = match &self.kind {
            ProposalKind::Registration(request) => (registration_card(request), "Request"),
            ProposalKind::Rename(request) => (rename_card(request), "Rename request"),
        };
        card.with_content(format!(
            "{} {} by {}.",
            subject,
            decision.past_tense(),
            user_mention(moderator)
        ))
    }
}

fn registration_card(request: &RegistrationRequest) -> Card {
    let mut card = Card::new("New project registration request")
        .field("Name", &request.name)
        .field("Applicant", user_mention(request.applicant));
    if let Some(download) = &request.download {
        card = card.field("Download link", download);
    }
    if let Some(channel) = request.associated_channel {
        card = card.field("Associated channel", channel_mention(channel));
    }
    card.field("Description", &request.description)
}

fn rename_card(request: &RenameRequest) -> Card {
    Card::new("Project rename request")
        .field("Previous name", &request.previous_name)
        .field("New name", &request.new_name)
}

/// A moderator's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Accept => "accepted",
            Self::Reject => "rejected",
        }
    }
}

/// Returned for an action id no proposal card carries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown request action: {0}")]
pub struct UnknownAction(pub String);

/// The action attached to a card's accept or reject button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionAction {
    Registration(Decision),
    Rename {
        decision: Decision,
        requester: UserId,
        project_id: String,
    },
}

impl DecisionAction {
    pub fn rename(decision: Decision, request: &RenameRequest) -> Self {
        Self::Rename {
            decision,
            requester: request.requester,
            project_id: request.project_id.clone(),
        }
    }

    pub fn decision(&self) -> Decision {
        match self {
            Self::Registration(decision) | Self::Rename { decision, .. } => *decision,
        }
    }

    /// Whether this action was issued for `kind`.
    pub fn applies_to(&self, kind: &ProposalKind) -> bool {
        match (self, kind) {
            (Self::Registration(_), ProposalKind::Registration(_)) => true,
            (
                Self::Rename {
                    requester,
                    project_id,
                    ..
                },
                ProposalKind::Rename(request),
            ) => *requester == request.requester && *project_id == request.project_id,
            _ => false,
        }
    }
}

impl fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registration(Decision::Accept) => f.write_str(ACCEPT_REGISTRATION),
            Self::Registration(Decision::Reject) => f.write_str(REJECT_REGISTRATION),
            Self::Rename {
                decision,
                requester,
                project_id,
            } => {
                let prefix = match decision {
                    Decision::Accept => ACCEPT_RENAME_PREFIX,
                    Decision::Reject => REJECT_RENAME_PREFIX,
                };
                write!(f, "{}{}_{}", prefix, requester, project_id)
            }
        }
    }
}

impl FromStr for DecisionAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ACCEPT_REGISTRATION => return Ok(Self::Registration(Decision::Accept)),
            REJECT_REGISTRATION => return Ok(Self::Registration(Decision::Reject)),
            _ => {}
        }

        let (decision, token) = if let Some(token) = s.strip_prefix(ACCEPT_RENAME_PREFIX) {
            (Decision::Accept, token)
        } else if let Some(token) = s.strip_prefix(REJECT_RENAME_PREFIX) {
            (Decision::Reject, token)
        } else {
            return Err(UnknownAction(s.to_string()));
        };

        let (requester, project_id) = token
            .split_once('_')
            .filter(|(_, id)| !id.is_empty())
            .ok_or_else(|| UnknownAction(s.to_string()))?;
        let requester = requester
            .parse()
            .map_err(|_| UnknownAction(s.to_string()))?;

        Ok(Self::Rename {
            decision,
            requester,
            project_id: project_id.to_string(),
        })
    }
}
