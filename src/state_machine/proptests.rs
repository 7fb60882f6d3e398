//! Property-based tests for the phase machine
//!
//! Arbitrary event sequences from the lobby: every accepted transition must
//! follow the round order, and every exit from a game must clean up.

use super::*;
use crate::game::{Alignment, ParticipantId, RoundActions};
use crate::voting::VerdictOutcome;
use crate::win::{GameOutcome, Winner};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_outcome() -> impl Strategy<Value = Option<GameOutcome>> {
    prop::option::of(prop_oneof![
        Just(Winner::Faction { alignment: Alignment::Mafia }),
        Just(Winner::Faction { alignment: Alignment::Village }),
        (1u64..10).prop_map(|id| Winner::Jester { id: ParticipantId(id) }),
        Just(Winner::Nobody),
    ])
    .prop_map(|winner| {
        winner.map(|winner| GameOutcome {
            winner,
            co_winners: vec![],
            exclusive: false,
        })
    })
}

fn arb_event() -> impl Strategy<Value = PhaseEvent> {
    prop_oneof![
        (0usize..20).prop_map(|participants| PhaseEvent::Start { participants }),
        Just(PhaseEvent::NightCollected { actions: RoundActions::new() }),
        arb_outcome().prop_map(|outcome| PhaseEvent::NightResolved { outcome }),
        prop::option::of(1u64..10)
            .prop_map(|n| PhaseEvent::NominationClosed { nominee: n.map(ParticipantId) }),
        (1u64..10, 0u32..5, 0u32..5, arb_outcome()).prop_map(|(n, guilty, innocent, outcome)| {
            PhaseEvent::VerdictClosed {
                verdict: VerdictOutcome {
                    nominee: ParticipantId(n),
                    guilty,
                    innocent,
                },
                outcome,
            }
        }),
        Just(PhaseEvent::ForceEnd),
        "[a-z ]{1,20}".prop_map(|message| PhaseEvent::Abort { message }),
        Just(PhaseEvent::Reopen),
    ]
}

fn context() -> PhaseContext {
    PhaseContext {
        min_players: 4,
        max_players: 17,
    }
}

/// Phase pairs the machine may move between
fn allowed(from: &Phase, to: &Phase) -> bool {
    match (from, to) {
        (Phase::Lobby, Phase::Night { round: 1 }) => true,
        (Phase::Night { round: a }, Phase::Night { round: b })
        | (Phase::Night { round: a }, Phase::Day { round: b })
        | (Phase::Day { round: a }, Phase::Day { round: b }) => a == b,
        (Phase::Day { round: a }, Phase::Night { round: b }) => *b == a + 1,
        (Phase::Night { .. } | Phase::Day { .. }, Phase::Ended { .. }) => true,
        (Phase::Ended { .. }, Phase::Lobby) => true,
        _ => false,
    }
}

proptest! {
    #[test]
    fn transitions_follow_round_order(events in prop::collection::vec(arb_event(), 1..60)) {
        let mut phase = Phase::Lobby;
        for event in events {
            if let Ok(result) = transition(&phase, &context(), event) {
                prop_assert!(
                    allowed(&phase, &result.new_phase),
                    "{} -> {}", phase, result.new_phase
                );
                phase = result.new_phase;
            }
        }
    }

    #[test]
    fn every_exit_from_a_game_tears_down(events in prop::collection::vec(arb_event(), 1..60)) {
        let mut phase = Phase::Lobby;
        for event in events {
            if let Ok(result) = transition(&phase, &context(), event) {
                if matches!(result.new_phase, Phase::Ended { .. }) {
                    let position = |wanted: &Effect| result.effects.iter().position(|e| e == wanted);
                    let clear = position(&Effect::ClearPending);
                    let cancel = position(&Effect::CancelVoting);
                    let reopen = position(&Effect::ReopenLobby);
                    prop_assert!(clear.is_some() && cancel.is_some() && reopen.is_some());
                    prop_assert!(clear < cancel && cancel < reopen);
                    prop_assert_eq!(reopen, Some(result.effects.len() - 1));
                }
                phase = result.new_phase;
            }
        }
    }

    #[test]
    fn lobby_only_accepts_valid_starts(participants in 0usize..30) {
        let result = transition(&Phase::Lobby, &context(), PhaseEvent::Start { participants });
        let valid = (4..=17).contains(&participants);
        prop_assert_eq!(result.is_ok(), valid);
    }
}
