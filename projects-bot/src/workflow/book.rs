//! The proposal book: every pending request, keyed by card message id.
//!
//! Proposals are written through to the hash store so they survive restarts.
//! Deciding one starts with [`ProposalBook::claim`], a single atomic transition
//! out of `Pending`; a claim that is dropped without being completed puts the
//! proposal back so the decision can be retried.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use projects_repository::{HashStore, StoreError};
use projects_shared::MessageId;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::proposal::{Decision, Proposal};

/// Namespace pending proposals are stored under.
pub const PROPOSALS_NAMESPACE: &str = "proposals";

/// Number of decided proposals remembered for late clicks.
pub const DEFAULT_DECIDED_RETENTION: usize = 1024;

/// Why a proposal could not be claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClaimError {
    #[error("This request no longer exists.")]
    NotFound,

    #[error("This request is already being decided.")]
    InProgress,

    #[error("This request has already been {}.", .0.past_tense())]
    AlreadyDecided(Decision),
}

enum Entry {
    Pending(Proposal),
    Deciding(Proposal),
    Decided(Decision),
}

#[derive(Default)]
struct BookState {
    entries: HashMap<MessageId, Entry>,
    /// Decided message ids, oldest first.
    decided: VecDeque<MessageId>,
}

impl BookState {
    fn mark_decided(&mut self, message_id: MessageId, decision: Decision, retention: usize) {
        self.entries.insert(message_id, Entry::Decided(decision));
        self.decided.push_back(message_id);
        while self.decided.len() > retention {
            let Some(oldest) = self.decided.pop_front() else {
                break;
            };
            if matches!(self.entries.get(&oldest), Some(Entry::Decided(_))) {
                self.entries.remove(&oldest);
                debug!(message_id = oldest, "Decided proposal forgotten");
            }
        }
    }
}

pub struct ProposalBook {
    store: Arc<dyn HashStore>,
    state: Mutex<BookState>,
    decided_retention: usize,
}

impl ProposalBook {
    pub fn new(store: Arc<dyn HashStore>) -> Self {
        Self {
            store,
            state: Mutex::new(BookState::default()),
            decided_retention: DEFAULT_DECIDED_RETENTION,
        }
    }

    /// Remember at most `retention` decided proposals. Older ones answer
    /// claims with [`ClaimError::NotFound`].
    pub fn with_decided_retention(mut self, retention: usize) -> Self {
        self.decided_retention = retention;
        self
    }

    fn state(&self) -> MutexGuard<'_, BookState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a newly posted proposal.
    pub async fn insert(&self, proposal: Proposal) -> Result<(), StoreError> {
        let value = serde_json::to_string(&proposal)?;
        self.store
            .set(PROPOSALS_NAMESPACE, &proposal.message_id.to_string(), &value)
            .await?;
        debug!(message_id = proposal.message_id, "Proposal recorded");
        self.state()
            .entries
            .insert(proposal.message_id, Entry::Pending(proposal));
        Ok(())
    }

    /// Load the proposals left pending by a previous run.
    ///
    /// Returns how many were restored. Undecodable records are skipped.
    pub async fn restore(&self) -> Result<usize, StoreError> {
        let stored = self.store.get_all(PROPOSALS_NAMESPACE).await?;
        let mut state = self.state();
        let mut restored = 0;
        for (key, value) in stored {
            match serde_json::from_str::<Proposal>(&value) {
                Ok(proposal) => {
                    state
                        .entries
                        .entry(proposal.message_id)
                        .or_insert(Entry::Pending(proposal));
                    restored += 1;
                }
                Err(e) => warn!(key = %key, error = %e, "Skipping undecodable proposal"),
            }
        }
        info!(restored, "Pending proposals restored");
        Ok(restored)
    }

    /// Proposals still waiting for a decision, oldest first.
    pub fn pending(&self) -> Vec<Proposal> {
        let mut pending: Vec<Proposal> = self
            .state()
            .entries
            .values()
            .filter_map(|entry| match entry {
                Entry::Pending(proposal) => Some(proposal.clone()),
                _ => None,
            })
            .collect();
        pending.sort_by_key(|p| (p.submitted_at, p.message_id));
        pending
    }

    /// Take exclusive right to decide the proposal carried by `message_id`.
    pub fn claim(self: &Arc<Self>, message_id: MessageId) -> Result<ProposalClaim, ClaimError> {
        let mut state = self.state();
        let entry = state
            .entries
            .get_mut(&message_id)
            .ok_or(ClaimError::NotFound)?;
        let proposal = match entry {
            Entry::Pending(proposal) => proposal.clone(),
            Entry::Deciding(_) => return Err(ClaimError::InProgress),
            Entry::Decided(decision) => return Err(ClaimError::AlreadyDecided(*decision)),
        };
        *entry = Entry::Deciding(proposal.clone());
        debug!(message_id, "Proposal claimed");

        Ok(ProposalClaim {
            book: Arc::clone(self),
            proposal,
            completed: false,
        })
    }

    fn release(&self, message_id: MessageId) {
        let mut state = self.state();
        if let Some(entry) = state.entries.get_mut(&message_id) {
            if let Entry::Deciding(proposal) = entry {
                *entry = Entry::Pending(proposal.clone());
                debug!(message_id, "Proposal claim released");
            }
        }
    }
}

/// Exclusive right to decide one proposal.
///
/// Dropping the claim without calling [`ProposalClaim::complete`] returns the
/// proposal to pending.
pub struct ProposalClaim {
    book: Arc<ProposalBook>,
    proposal: Proposal,
    completed: bool,
}

impl ProposalClaim {
    pub fn proposal(&self) -> &Proposal {
        &self.proposal
    }

    /// Record the decision and drop the proposal from the store.
    ///
    /// The proposal counts as decided even if the store removal fails; the
    /// error is returned so the caller can report it.
    pub async fn complete(mut self, decision: Decision) -> Result<(), StoreError> {
        let message_id = self.proposal.message_id;
        let retention = self.book.decided_retention;
        self.book
            .state()
            .mark_decided(message_id, decision, retention);
        self.completed = true;

        self.book
            .store
            .remove(PROPOSALS_NAMESPACE, &message_id.to_string())
            .await?;
        debug!(message_id, "Decided proposal removed from store");
        Ok(())
    }
}

impl Drop for ProposalClaim {
    fn drop(&mut self) {
        if !self.completed {
            self.book.release(self.proposal.message_id);
        }
    }
}
