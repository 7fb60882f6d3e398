//! Effects produced by phase transitions

use crate::game::{ParticipantId, RoundActions};
use crate::win::GameOutcome;

/// Effects the runtime executes, in order, after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Deal roles and tell everyone theirs
    AssignRoles,

    /// Advance the round and roll per-round flags
    BeginNight,

    /// Jail stage, then prompts for everyone with an ability
    CollectNightActions,

    /// Apply the night and check for a winner
    ResolveNight { actions: RoundActions },

    /// Publish the night's event log
    AnnounceNight,

    OpenNomination,

    OpenTrial { nominee: ParticipantId },

    AnnounceOutcome { outcome: GameOutcome },

    /// Drop every outstanding night prompt
    ClearPending,

    /// End any open voting session with a null result
    CancelVoting,

    NotifyTerminated { message: String },

    /// Queue the return to the lobby
    ReopenLobby,

    /// Wipe per-game state, keeping the seated participants
    ResetStore,

    /// Tell the group which phase has begun
    NotifyPhase,
}

impl Effect {
    /// The ordered cleanup run on every path out of a game
    pub fn teardown(message: Option<String>) -> Vec<Effect> {
        let mut effects = vec![Effect::ClearPending, Effect::CancelVoting];
        if let Some(message) = message {
            effects.push(Effect::NotifyTerminated { message });
        }
        effects.push(Effect::ReopenLobby);
        effects
    }
}
