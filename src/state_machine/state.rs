//! Game phase types

use crate::win::GameOutcome;
use serde::Serialize;
use std::fmt;

/// Where the game is
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// Gathering players; also where every finished game returns to
    Lobby,
    Night { round: u32 },
    Day { round: u32 },
    /// Terminal for one game; cleanup runs, then back to `Lobby`
    Ended { reason: EndReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EndReason {
    Finished { outcome: GameOutcome },
    /// Host (or shutdown) ended the game early
    Forced,
    /// A fatal error stopped the round
    Aborted { message: String },
}

impl Phase {
    pub fn is_lobby(&self) -> bool {
        matches!(self, Phase::Lobby)
    }

    pub fn in_game(&self) -> bool {
        matches!(self, Phase::Night { .. } | Phase::Day { .. })
    }

    pub fn round(&self) -> Option<u32> {
        match self {
            Phase::Night { round } | Phase::Day { round } => Some(*round),
            Phase::Lobby | Phase::Ended { .. } => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Lobby => f.write_str("lobby"),
            Phase::Night { round } => write!(f, "night {round}"),
            Phase::Day { round } => write!(f, "day {round}"),
            Phase::Ended { .. } => f.write_str("ended"),
        }
    }
}

/// Static limits the transition function checks against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseContext {
    pub min_players: usize,
    pub max_players: usize,
}
