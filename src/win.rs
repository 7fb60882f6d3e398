//! Win evaluator
//!
//! Runs after every night resolution and every day execution. Exclusive
//! neutral wins are checked before the faction majority rule.

use crate::game::{Alignment, GameStore, ParticipantId, Role};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Winner {
    Faction { alignment: Alignment },
    Jester { id: ParticipantId },
    Executioner { id: ParticipantId },
    Arsonist { id: ParticipantId },
    /// Everyone died
    Nobody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameOutcome {
    pub winner: Winner,
    pub co_winners: Vec<ParticipantId>,
    /// No one else shares an exclusive win
    pub exclusive: bool,
}

impl GameOutcome {
    fn exclusive(winner: Winner) -> Self {
        Self {
            winner,
            co_winners: Vec::new(),
            exclusive: true,
        }
    }
}

/// What triggered the check
#[derive(Debug, Clone, Copy)]
pub enum Trigger<'a> {
    Night { deaths: &'a [ParticipantId] },
    Execution { executed: ParticipantId },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WinCheck {
    pub outcome: Option<GameOutcome>,
    /// Executioner switched to jester mode by this check
    pub converted: Option<ParticipantId>,
}

pub fn evaluate(store: &mut GameStore, trigger: Trigger<'_>) -> WinCheck {
    let mut check = WinCheck::default();
    match trigger {
        Trigger::Night { deaths } => {
            check.converted = convert_executioner(store, deaths);
        }
        Trigger::Execution { executed } => {
            if let Some(outcome) = voted_out(store, executed) {
                check.outcome = Some(outcome);
                return check;
            }
        }
    }
    check.outcome = sole_arsonist(store).or_else(|| majority(store));
    check
}

/// The executioner whose target died at night becomes a jester, once.
fn convert_executioner(store: &mut GameStore, deaths: &[ParticipantId]) -> Option<ParticipantId> {
    let executioner = store.living_holder_of(Role::Executioner)?;
    let state = &mut store.roles.executioner;
    if state.converted_to_jester || !state.target.is_some_and(|t| deaths.contains(&t)) {
        return None;
    }
    state.converted_to_jester = true;
    Some(executioner)
}

fn voted_out(store: &GameStore, executed: ParticipantId) -> Option<GameOutcome> {
    let executioner = &store.roles.executioner;
    match store.role_of(executed)? {
        Role::Jester => return Some(GameOutcome::exclusive(Winner::Jester { id: executed })),
        Role::Executioner if executioner.converted_to_jester => {
            return Some(GameOutcome::exclusive(Winner::Jester { id: executed }));
        }
        _ => {}
    }

    let hunter = store.living_holder_of(Role::Executioner)?;
    if !executioner.converted_to_jester && executioner.target == Some(executed) {
        return Some(GameOutcome::exclusive(Winner::Executioner { id: hunter }));
    }
    None
}

fn sole_arsonist(store: &GameStore) -> Option<GameOutcome> {
    let mut living = store.living();
    let survivor = living.next()?;
    if living.next().is_some() || survivor.role != Some(Role::Arsonist) {
        return None;
    }
    Some(GameOutcome::exclusive(Winner::Arsonist { id: survivor.id }))
}

fn majority(store: &GameStore) -> Option<GameOutcome> {
    let alive = store.alive_count();
    if alive == 0 {
        return Some(GameOutcome {
            winner: Winner::Nobody,
            co_winners: Vec::new(),
            exclusive: false,
        });
    }

    let mafia = store
        .living()
        .filter(|p| p.alignment() == Some(Alignment::Mafia))
        .count();
    let alignment = if mafia == 0 {
        Alignment::Village
    } else if mafia >= alive - mafia {
        Alignment::Mafia
    } else {
        return None;
    };

    Some(GameOutcome {
        winner: Winner::Faction { alignment },
        co_winners: baiter_co_winner(store).into_iter().collect(),
        exclusive: false,
    })
}

fn baiter_co_winner(store: &GameStore) -> Option<ParticipantId> {
    let baiter = store.living_holder_of(Role::Baiter)?;
    (store.roles.baiter.visit_count >= store.settings().baiter_win_visits).then_some(baiter)
}
