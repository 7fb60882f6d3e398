//! Voting engine
//!
//! At most one day session (nomination or trial) is active at a time. Votes
//! arriving with no matching session are rejected.

pub mod session;

pub use session::{nomination_threshold, vote_weight, ExecutionSession, NominationSession, VerdictOutcome};

use crate::game::{GameStore, ParticipantId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Guilty,
    Innocent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vote {
    Nominate(ParticipantId),
    Verdict(Verdict),
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vote::Nominate(id) => write!(f, "nominate:{id}"),
            Vote::Verdict(Verdict::Guilty) => f.write_str("guilty"),
            Vote::Verdict(Verdict::Innocent) => f.write_str("innocent"),
        }
    }
}

impl FromStr for Vote {
    type Err = VoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guilty" => Ok(Vote::Verdict(Verdict::Guilty)),
            "innocent" => Ok(Vote::Verdict(Verdict::Innocent)),
            other => other
                .strip_prefix("nominate:")
                .and_then(|id| id.parse().ok())
                .map(Vote::Nominate)
                .ok_or_else(|| VoteError::Malformed(other.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VoteError {
    #[error("No matching vote is open")]
    NoActiveSession,
    #[error("Participant {0} cannot vote right now")]
    Ineligible(ParticipantId),
    #[error("You cannot nominate yourself")]
    SelfVote,
    #[error("The accused cannot vote in their own trial")]
    NomineeVoting,
    #[error("Participant {0} cannot be nominated")]
    InvalidTarget(ParticipantId),
    #[error("Unrecognised vote: {0}")]
    Malformed(String),
}

/// Accepted vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteAck {
    pub weight: u32,
    /// This vote closed the session
    pub resolved: bool,
}

pub enum ActiveSession {
    Idle,
    Nomination(NominationSession),
    Execution(ExecutionSession),
}

pub struct VotingEngine {
    active: ActiveSession,
}

impl Default for VotingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl VotingEngine {
    pub fn new() -> Self {
        Self {
            active: ActiveSession::Idle,
        }
    }

    #[cfg(test)]
    pub fn is_idle(&self) -> bool {
        matches!(self.active, ActiveSession::Idle)
    }

    /// Opens a nomination; the receiver yields the nominee, or `None` when
    /// nobody reached the threshold.
    pub fn open_nomination(
        &mut self,
        store: &GameStore,
        timeout: Duration,
    ) -> oneshot::Receiver<Option<ParticipantId>> {
        self.cancel();
        let (session, rx) = NominationSession::open(store.alive_count(), timeout);
        tracing::info!(threshold = session.threshold(), "Nomination opened");
        self.active = ActiveSession::Nomination(session);
        rx
    }

    /// Opens a guilty/innocent trial. The receiver yields `None` only if the
    /// trial was cancelled.
    pub fn open_trial(
        &mut self,
        nominee: ParticipantId,
        timeout: Duration,
    ) -> oneshot::Receiver<Option<VerdictOutcome>> {
        self.cancel();
        let (session, rx) = ExecutionSession::open(nominee, timeout);
        tracing::info!(%nominee, "Trial opened");
        self.active = ActiveSession::Execution(session);
        rx
    }

    pub fn submit(&mut self, store: &GameStore, voter: ParticipantId, vote: Vote) -> Result<VoteAck, VoteError> {
        let result = match (&mut self.active, vote) {
            (ActiveSession::Nomination(session), Vote::Nominate(nominee)) => {
                session.cast(store, voter, nominee)
            }
            (ActiveSession::Execution(session), Vote::Verdict(verdict)) => {
                session.cast(store, voter, verdict)
            }
            _ => Err(VoteError::NoActiveSession),
        };
        if let Err(e) = &result {
            tracing::debug!(%voter, %vote, error = %e, "Vote rejected");
        }
        result
    }

    /// Live weighted tally of the open nomination
    pub fn nomination_tally(&self, store: &GameStore) -> BTreeMap<ParticipantId, u32> {
        match &self.active {
            ActiveSession::Nomination(session) => session.tally(store),
            _ => BTreeMap::new(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        match &self.active {
            ActiveSession::Idle => None,
            ActiveSession::Nomination(session) => session.is_open().then(|| session.deadline()),
            ActiveSession::Execution(session) => session.is_open().then(|| session.deadline()),
        }
    }

    /// Deadline reached: resolve with whatever the ballots say.
    pub fn expire(&mut self, store: &GameStore) -> bool {
        match &mut self.active {
            ActiveSession::Idle => false,
            ActiveSession::Nomination(session) => {
                let leader = session.leader(store);
                session.end(leader)
            }
            ActiveSession::Execution(session) => {
                let outcome = session.count(store);
                session.end(Some(outcome))
            }
        }
    }

    /// Ends any open session with a null result and goes idle.
    pub fn cancel(&mut self) -> bool {
        let ended = match &mut self.active {
            ActiveSession::Idle => false,
            ActiveSession::Nomination(session) => session.end(None),
            ActiveSession::Execution(session) => session.end(None),
        };
        self.active = ActiveSession::Idle;
        ended
    }

    /// Drops a session whose result has been consumed.
    pub fn close(&mut self) {
        self.active = ActiveSession::Idle;
    }
}
