//! Pure phase transition function
//!
//! Given the same phase, context and event it always yields the same next
//! phase and effects. All I/O happens in the runtime that executes them.

use super::{Effect, EndReason, Phase, PhaseContext, PhaseEvent};
use crate::game::LobbyError;
use thiserror::Error;

/// Result of a phase transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_phase: Phase,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(phase: Phase) -> Self {
        Self {
            new_phase: phase,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error(transparent)]
    Lobby(#[from] LobbyError),
    #[error("No game is in progress")]
    NoGameInProgress,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

fn night(round: u32) -> TransitionResult {
    TransitionResult::new(Phase::Night { round }).with_effects([
        Effect::BeginNight,
        Effect::NotifyPhase,
        Effect::CollectNightActions,
    ])
}

fn ended(reason: EndReason) -> TransitionResult {
    TransitionResult::new(Phase::Ended { reason })
}

pub fn transition(
    phase: &Phase,
    context: &PhaseContext,
    event: PhaseEvent,
) -> Result<TransitionResult, TransitionError> {
    match (phase, event) {
        // ====================================================================
        // Lobby
        // ====================================================================
        (Phase::Lobby, PhaseEvent::Start { participants }) => {
            if participants < context.min_players {
                return Err(LobbyError::NotEnoughPlayers {
                    needed: context.min_players,
                    have: participants,
                }
                .into());
            }
            if participants > context.max_players {
                return Err(LobbyError::LobbyFull(context.max_players).into());
            }
            let first = night(1);
            Ok(TransitionResult::new(first.new_phase)
                .with_effect(Effect::AssignRoles)
                .with_effects(first.effects))
        }

        (Phase::Lobby, PhaseEvent::ForceEnd | PhaseEvent::Abort { .. }) => {
            Err(TransitionError::NoGameInProgress)
        }

        // ====================================================================
        // Night
        // ====================================================================
        (Phase::Night { round }, PhaseEvent::NightCollected { actions }) => {
            Ok(TransitionResult::new(Phase::Night { round: *round })
                .with_effect(Effect::ResolveNight { actions }))
        }

        (Phase::Night { round }, PhaseEvent::NightResolved { outcome: None }) => {
            Ok(TransitionResult::new(Phase::Day { round: *round }).with_effects([
                Effect::NotifyPhase,
                Effect::AnnounceNight,
                Effect::OpenNomination,
            ]))
        }

        (Phase::Night { .. }, PhaseEvent::NightResolved { outcome: Some(outcome) }) => {
            Ok(ended(EndReason::Finished {
                outcome: outcome.clone(),
            })
            .with_effects([Effect::AnnounceNight, Effect::AnnounceOutcome { outcome }])
            .with_effects(Effect::teardown(None)))
        }

        // ====================================================================
        // Day
        // ====================================================================
        (Phase::Day { round }, PhaseEvent::NominationClosed { nominee: Some(nominee) }) => {
            Ok(TransitionResult::new(Phase::Day { round: *round })
                .with_effect(Effect::OpenTrial { nominee }))
        }

        (Phase::Day { round }, PhaseEvent::NominationClosed { nominee: None }) => Ok(night(round + 1)),

        (Phase::Day { .. }, PhaseEvent::VerdictClosed { outcome: Some(outcome), .. }) => {
            Ok(ended(EndReason::Finished {
                outcome: outcome.clone(),
            })
            .with_effect(Effect::AnnounceOutcome { outcome })
            .with_effects(Effect::teardown(None)))
        }

        (Phase::Day { round }, PhaseEvent::VerdictClosed { outcome: None, .. }) => Ok(night(round + 1)),

        // ====================================================================
        // Leaving a game early
        // ====================================================================
        (Phase::Night { .. } | Phase::Day { .. }, PhaseEvent::ForceEnd) => Ok(ended(EndReason::Forced)
            .with_effects(Effect::teardown(Some(
                "The game was ended by the host.".to_string(),
            )))),

        (Phase::Night { .. } | Phase::Day { .. }, PhaseEvent::Abort { message }) => {
            Ok(ended(EndReason::Aborted {
                message: message.clone(),
            })
            .with_effects(Effect::teardown(Some(format!(
                "The game was stopped by an error: {message}"
            )))))
        }

        // ====================================================================
        // Ended
        // ====================================================================
        (Phase::Ended { .. }, PhaseEvent::Reopen) => Ok(TransitionResult::new(Phase::Lobby)
            .with_effects([Effect::ResetStore, Effect::NotifyPhase])),

        (Phase::Ended { .. }, PhaseEvent::ForceEnd) => Err(TransitionError::NoGameInProgress),

        (phase, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} in {phase}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Alignment, ParticipantId, RoundActions};
    use crate::voting::VerdictOutcome;
    use crate::win::{GameOutcome, Winner};

    fn context() -> PhaseContext {
        PhaseContext {
            min_players: 4,
            max_players: 17,
        }
    }

    fn village_win() -> GameOutcome {
        GameOutcome {
            winner: Winner::Faction {
                alignment: Alignment::Village,
            },
            co_winners: vec![],
            exclusive: false,
        }
    }

    #[test]
    fn test_start_needs_enough_players() {
        let err = transition(&Phase::Lobby, &context(), PhaseEvent::Start { participants: 3 })
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::Lobby(LobbyError::NotEnoughPlayers { needed: 4, have: 3 })
        );
    }

    #[test]
    fn test_start_deals_roles_then_opens_night_one() {
        let result =
            transition(&Phase::Lobby, &context(), PhaseEvent::Start { participants: 5 }).unwrap();
        assert_eq!(result.new_phase, Phase::Night { round: 1 });
        assert_eq!(
            result.effects,
            vec![
                Effect::AssignRoles,
                Effect::BeginNight,
                Effect::NotifyPhase,
                Effect::CollectNightActions
            ]
        );
    }

    #[test]
    fn test_collected_night_is_resolved() {
        let result = transition(
            &Phase::Night { round: 2 },
            &context(),
            PhaseEvent::NightCollected {
                actions: RoundActions::new(),
            },
        )
        .unwrap();
        assert_eq!(result.new_phase, Phase::Night { round: 2 });
        assert!(matches!(result.effects[..], [Effect::ResolveNight { .. }]));
    }

    #[test]
    fn test_quiet_night_leads_to_day() {
        let result = transition(
            &Phase::Night { round: 2 },
            &context(),
            PhaseEvent::NightResolved { outcome: None },
        )
        .unwrap();
        assert_eq!(result.new_phase, Phase::Day { round: 2 });
        assert_eq!(result.effects.last(), Some(&Effect::OpenNomination));
    }

    #[test]
    fn test_winning_night_ends_the_game() {
        let result = transition(
            &Phase::Night { round: 1 },
            &context(),
            PhaseEvent::NightResolved {
                outcome: Some(village_win()),
            },
        )
        .unwrap();
        assert!(matches!(
            result.new_phase,
            Phase::Ended {
                reason: EndReason::Finished { .. }
            }
        ));
        assert_eq!(result.effects.last(), Some(&Effect::ReopenLobby));
    }

    #[test]
    fn test_inconclusive_day_starts_next_night() {
        let result = transition(
            &Phase::Day { round: 3 },
            &context(),
            PhaseEvent::NominationClosed { nominee: None },
        )
        .unwrap();
        assert_eq!(result.new_phase, Phase::Night { round: 4 });

        let acquitted = VerdictOutcome {
            nominee: ParticipantId(2),
            guilty: 1,
            innocent: 3,
        };
        let result = transition(
            &Phase::Day { round: 3 },
            &context(),
            PhaseEvent::VerdictClosed {
                verdict: acquitted,
                outcome: None,
            },
        )
        .unwrap();
        assert_eq!(result.new_phase, Phase::Night { round: 4 });
    }

    #[test]
    fn test_force_end_cleans_up_in_order() {
        for phase in [Phase::Night { round: 1 }, Phase::Day { round: 1 }] {
            let result = transition(&phase, &context(), PhaseEvent::ForceEnd).unwrap();
            assert_eq!(
                result.new_phase,
                Phase::Ended {
                    reason: EndReason::Forced
                }
            );
            assert!(matches!(
                result.effects[..],
                [
                    Effect::ClearPending,
                    Effect::CancelVoting,
                    Effect::NotifyTerminated { .. },
                    Effect::ReopenLobby
                ]
            ));
        }
    }

    #[test]
    fn test_force_end_without_a_game() {
        let err = transition(&Phase::Lobby, &context(), PhaseEvent::ForceEnd).unwrap_err();
        assert_eq!(err, TransitionError::NoGameInProgress);
    }

    #[test]
    fn test_reopen_resets() {
        let result = transition(
            &Phase::Ended {
                reason: EndReason::Forced,
            },
            &context(),
            PhaseEvent::Reopen,
        )
        .unwrap();
        assert_eq!(result.new_phase, Phase::Lobby);
        assert_eq!(result.effects, vec![Effect::ResetStore, Effect::NotifyPhase]);
    }

    #[test]
    fn test_cannot_start_twice() {
        let err = transition(
            &Phase::Day { round: 1 },
            &context(),
            PhaseEvent::Start { participants: 5 },
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::InvalidTransition(_)));
    }
}
