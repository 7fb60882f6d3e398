//! Nomination and trial sessions
//!
//! Each session owns a one-shot resolver; `end` takes it, so a session
//! resolves at most once however many paths race to close it.

use super::{Verdict, VoteAck, VoteError};
use crate::game::{GameStore, ParticipantId, Role};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Votes needed to put someone on trial: ceil(alive / 2.4)
pub fn nomination_threshold(alive: usize) -> u32 {
    u32::try_from((alive * 5 + 11) / 12).unwrap_or(u32::MAX)
}

/// A revealed, living Mayor counts twice
pub fn vote_weight(store: &GameStore, voter: ParticipantId) -> u32 {
    let revealed_mayor = store.role_of(voter) == Some(Role::Mayor)
        && store.is_alive(voter)
        && store.roles.mayor.has_revealed;
    if revealed_mayor {
        2
    } else {
        1
    }
}

fn check_voter(store: &GameStore, voter: ParticipantId) -> Result<(), VoteError> {
    match store.participant(voter) {
        Some(p) if p.can_vote() => Ok(()),
        _ => Err(VoteError::Ineligible(voter)),
    }
}

// ============================================================================
// Nomination
// ============================================================================

pub struct NominationSession {
    threshold: u32,
    /// voter -> nominee; a later vote replaces an earlier one
    ballots: BTreeMap<ParticipantId, ParticipantId>,
    deadline: Instant,
    resolver: Option<oneshot::Sender<Option<ParticipantId>>>,
}

impl NominationSession {
    pub fn open(alive: usize, timeout: Duration) -> (Self, oneshot::Receiver<Option<ParticipantId>>) {
        let (tx, rx) = oneshot::channel();
        let session = Self {
            threshold: nomination_threshold(alive),
            ballots: BTreeMap::new(),
            deadline: Instant::now() + timeout,
            resolver: Some(tx),
        };
        (session, rx)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_open(&self) -> bool {
        self.resolver.is_some()
    }

    pub fn cast(
        &mut self,
        store: &GameStore,
        voter: ParticipantId,
        nominee: ParticipantId,
    ) -> Result<VoteAck, VoteError> {
        if !self.is_open() {
            return Err(VoteError::NoActiveSession);
        }
        check_voter(store, voter)?;
        if voter == nominee {
            return Err(VoteError::SelfVote);
        }
        if !store.is_alive(nominee) {
            return Err(VoteError::InvalidTarget(nominee));
        }

        self.ballots.insert(voter, nominee);
        let resolved = match self.leader(store) {
            Some(leader) => self.end(Some(leader)),
            None => false,
        };
        Ok(VoteAck {
            weight: vote_weight(store, voter),
            resolved,
        })
    }

    /// Weighted votes per nominee
    pub fn tally(&self, store: &GameStore) -> BTreeMap<ParticipantId, u32> {
        let mut tally = BTreeMap::new();
        for (voter, nominee) in &self.ballots {
            *tally.entry(*nominee).or_insert(0) += vote_weight(store, *voter);
        }
        tally
    }

    /// The unique front-runner, once at or past the threshold
    pub fn leader(&self, store: &GameStore) -> Option<ParticipantId> {
        let tally = self.tally(store);
        let top = tally.values().copied().max()?;
        let mut leaders = tally.iter().filter(|(_, votes)| **votes == top);
        let (leader, _) = leaders.next()?;
        if leaders.next().is_some() || top < self.threshold.max(1) {
            return None;
        }
        Some(*leader)
    }

    pub fn end(&mut self, result: Option<ParticipantId>) -> bool {
        match self.resolver.take() {
            Some(tx) => {
                // The runtime may have stopped listening (force end)
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Trial
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerdictOutcome {
    pub nominee: ParticipantId,
    pub guilty: u32,
    pub innocent: u32,
}

impl VerdictOutcome {
    /// Strict majority of weighted votes; ties acquit
    pub fn executes(&self) -> bool {
        self.guilty > self.innocent
    }
}

pub struct ExecutionSession {
    nominee: ParticipantId,
    ballots: BTreeMap<ParticipantId, Verdict>,
    deadline: Instant,
    resolver: Option<oneshot::Sender<Option<VerdictOutcome>>>,
}

impl ExecutionSession {
    pub fn open(nominee: ParticipantId, timeout: Duration) -> (Self, oneshot::Receiver<Option<VerdictOutcome>>) {
        let (tx, rx) = oneshot::channel();
        let session = Self {
            nominee,
            ballots: BTreeMap::new(),
            deadline: Instant::now() + timeout,
            resolver: Some(tx),
        };
        (session, rx)
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_open(&self) -> bool {
        self.resolver.is_some()
    }

    pub fn cast(
        &mut self,
        store: &GameStore,
        voter: ParticipantId,
        verdict: Verdict,
    ) -> Result<VoteAck, VoteError> {
        if !self.is_open() {
            return Err(VoteError::NoActiveSession);
        }
        if voter == self.nominee {
            return Err(VoteError::NomineeVoting);
        }
        check_voter(store, voter)?;
        self.ballots.insert(voter, verdict);
        Ok(VoteAck {
            weight: vote_weight(store, voter),
            resolved: false,
        })
    }

    pub fn count(&self, store: &GameStore) -> VerdictOutcome {
        let mut outcome = VerdictOutcome {
            nominee: self.nominee,
            guilty: 0,
            innocent: 0,
        };
        for (voter, verdict) in &self.ballots {
            let weight = vote_weight(store, *voter);
            match verdict {
                Verdict::Guilty => outcome.guilty += weight,
                Verdict::Innocent => outcome.innocent += weight,
            }
        }
        outcome
    }

    pub fn end(&mut self, result: Option<VerdictOutcome>) -> bool {
        match self.resolver.take() {
            Some(tx) => {
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }
}
