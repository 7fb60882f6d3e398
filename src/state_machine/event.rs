//! Events that drive phase transitions

use crate::game::{ParticipantId, RoundActions};
use crate::voting::VerdictOutcome;
use crate::win::GameOutcome;

#[derive(Debug, Clone)]
pub enum PhaseEvent {
    /// Host asked to start with this many seated participants
    Start { participants: usize },

    /// Every night prompt has been answered or timed out
    NightCollected { actions: RoundActions },

    /// Night effects applied; `outcome` is set if someone won
    NightResolved { outcome: Option<GameOutcome> },

    /// Nomination closed with a nominee, or inconclusively
    NominationClosed { nominee: Option<ParticipantId> },

    /// Trial closed
    VerdictClosed {
        verdict: VerdictOutcome,
        outcome: Option<GameOutcome>,
    },

    /// Host ended the game
    ForceEnd,

    /// Fatal error inside a round
    Abort { message: String },

    /// Cleanup done; back to the lobby
    Reopen,
}
