//! The approval workflow for registrations and renames.
//!
//! A submission posts a proposal card to the realm's requests channel and
//! records the proposal in the [`ProposalBook`]. A moderator's accept or reject
//! claims the proposal, applies the outcome and notifies the requester.

mod book;
mod engine;
mod proposal;

pub use book::{ClaimError, ProposalBook, ProposalClaim, PROPOSALS_NAMESPACE};
pub use engine::{ApprovalEngine, DecisionOutcome, Registration};
pub use proposal::{
    Decision, DecisionAction, Proposal, ProposalKind, RegistrationRequest, RenameRequest,
    UnknownAction,
};
