//! Runtime for running a game
//!
//! One task owns the game; everything else talks to it through a
//! [`GameHandle`]. Prompt responses skip the command queue and resolve
//! pending actions directly.

pub mod announce;
mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::GameRuntime;
pub use traits::*;

use crate::config::GameSettings;
use crate::game::{AccessSnapshot, GameSnapshot, LobbyError, ParticipantId};
use crate::night::Choice;
use crate::pending::{ActionKey, PendingActions, ResponseStatus};
use crate::state_machine::TransitionError;
use crate::voting::{Vote, VoteAck, VoteError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

const COMMAND_BUFFER: usize = 64;

/// Requests served by the game task
#[derive(Debug)]
pub enum Command {
    Join {
        id: ParticipantId,
        name: String,
        reply: oneshot::Sender<Result<(), CommandError>>,
    },
    Leave {
        id: ParticipantId,
        reply: oneshot::Sender<Result<Option<ParticipantId>, CommandError>>,
    },
    AddWill {
        id: ParticipantId,
        line: String,
        reply: oneshot::Sender<Result<(), CommandError>>,
    },
    Start {
        reply: oneshot::Sender<Result<(), CommandError>>,
    },
    Vote {
        voter: ParticipantId,
        vote: Vote,
        reply: oneshot::Sender<Result<VoteAck, CommandError>>,
    },
    ForceEnd {
        reply: oneshot::Sender<Result<(), CommandError>>,
    },
    Snapshot {
        reply: oneshot::Sender<GameSnapshot>,
    },
    Access {
        reply: oneshot::Sender<AccessSnapshot>,
    },
}

/// Why a command was refused
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error(transparent)]
    Lobby(#[from] LobbyError),
    #[error(transparent)]
    Vote(#[from] VoteError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("The game engine has stopped")]
    EngineGone,
}

/// Failures that abort the running game
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Game state is inconsistent: {0}")]
    Inconsistent(String),
}

/// Cheap, cloneable way in to a running game
#[derive(Clone)]
pub struct GameHandle {
    commands: mpsc::Sender<Command>,
    pending: Arc<PendingActions<Choice>>,
}

impl GameHandle {
    async fn request<R>(
        &self,
        make: impl FnOnce(oneshot::Sender<R>) -> Command,
    ) -> Result<R, CommandError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| CommandError::EngineGone)?;
        rx.await.map_err(|_| CommandError::EngineGone)
    }

    pub async fn join(&self, id: ParticipantId, name: impl Into<String>) -> Result<(), CommandError> {
        let name = name.into();
        self.request(|reply| Command::Join { id, name, reply }).await?
    }

    /// Returns the new host when the leaver held the role
    pub async fn leave(&self, id: ParticipantId) -> Result<Option<ParticipantId>, CommandError> {
        self.request(|reply| Command::Leave { id, reply }).await?
    }

    pub async fn add_will_line(&self, id: ParticipantId, line: impl Into<String>) -> Result<(), CommandError> {
        let line = line.into();
        self.request(|reply| Command::AddWill { id, line, reply }).await?
    }

    pub async fn start(&self) -> Result<(), CommandError> {
        self.request(|reply| Command::Start { reply }).await?
    }

    pub async fn submit_vote(&self, voter: ParticipantId, vote: &str) -> Result<VoteAck, CommandError> {
        let vote: Vote = vote.parse()?;
        self.request(|reply| Command::Vote { voter, vote, reply }).await?
    }

    /// Ends the running game. Cleanup runs on the game task in order.
    pub async fn force_end(&self) -> Result<(), CommandError> {
        self.request(|reply| Command::ForceEnd { reply }).await?
    }

    pub async fn snapshot(&self) -> Result<GameSnapshot, CommandError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn access(&self) -> Result<AccessSnapshot, CommandError> {
        self.request(|reply| Command::Access { reply }).await
    }

    /// Routes a prompt response straight to its waiting collector.
    pub fn respond(&self, session_key: &str, value: &str) -> ResponseStatus {
        let Ok(key) = session_key.parse::<ActionKey>() else {
            tracing::debug!(session_key, "Response for unknown key format");
            return ResponseStatus::Malformed;
        };
        let Ok(choice) = value.parse::<Choice>() else {
            tracing::debug!(%key, value, "Unparseable response value");
            return ResponseStatus::Malformed;
        };
        let status = self.pending.resolve(&key, choice);
        tracing::debug!(%key, ?status, "Prompt response");
        status
    }
}

/// Spawns the game task and returns its handle.
pub fn spawn_game<T: Transport + 'static>(settings: GameSettings, transport: Arc<T>) -> GameHandle {
    let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
    let pending = Arc::new(PendingActions::new());
    let runtime = GameRuntime::new(settings, transport, pending.clone(), rx);
    tokio::spawn(runtime.run());
    GameHandle { commands, pending }
}
