//! Property-based tests for night resolution
//!
//! Random tables and random (not necessarily legal) action sets: the
//! resolver must keep the roster consistent whatever it is handed.

use super::options::ability_for;
use super::report::Cause;
use super::resolve_night;
use crate::config::GameSettings;
use crate::game::setup::lineup;
use crate::game::{Ability, ActionKind, GameStore, ParticipantId, Role, RoundAction, RoundActions};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn id(index: usize) -> ParticipantId {
    ParticipantId(index as u64 + 1)
}

fn seat(roles: &[Role]) -> GameStore {
    let mut store = GameStore::new(GameSettings::default());
    for (i, role) in roles.iter().enumerate() {
        store.join(id(i), role.name()).unwrap();
        store.assign_role(id(i), *role);
    }
    store.begin_night();
    store
}

fn action_for(store: &GameStore, actor: ParticipantId, first: usize, second: usize) -> Option<RoundAction> {
    let kind = match ability_for(store, actor)? {
        Ability::Execute => ActionKind::Execute {
            prisoner: store.roles.jailer.current_prisoner?,
        },
        Ability::Distract => ActionKind::Distract { target: id(first) },
        Ability::Silence => ActionKind::Silence { target: id(first) },
        Ability::Frame => ActionKind::Frame { target: id(first) },
        Ability::Kill => ActionKind::Kill { target: id(first) },
        Ability::Shoot => ActionKind::Shoot { target: id(first) },
        Ability::Heal => ActionKind::Heal { target: id(first) },
        Ability::Arson if first == second => ActionKind::Ignite,
        Ability::Arson => ActionKind::Douse { target: id(first) },
        Ability::Check => ActionKind::Check { target: id(first) },
        Ability::Compare => ActionKind::Compare {
            first: id(first),
            second: id(second),
        },
        Ability::Track => ActionKind::Track { target: id(first) },
        Ability::Reveal => ActionKind::Reveal,
    };
    Some(RoundAction { actor, kind })
}

type Night = (Vec<Role>, Vec<(usize, usize, usize)>, Option<usize>, Vec<usize>);

fn arb_night() -> impl Strategy<Value = Night> {
    (4usize..=17).prop_flat_map(|n| {
        (
            Just(lineup(n)).prop_shuffle(),
            prop::collection::vec((0..n, 0..n, 0..n), 0..16),
            prop::option::of(0..n),
            prop::collection::vec(0..n, 0..3),
        )
    })
}

proptest! {
    #[test]
    fn roster_survives_any_night((roles, picks, prisoner, marked) in arb_night()) {
        let mut store = seat(&roles);
        if let (Some(p), Some(jailer)) = (prisoner, store.living_holder_of(Role::Jailer)) {
            if id(p) != jailer {
                store.jail(id(p));
            }
        }
        store.roles.arsonist.marked_targets.extend(marked.into_iter().map(id));

        let actions: RoundActions = picks
            .into_iter()
            .filter_map(|(actor, first, second)| action_for(&store, id(actor), first, second))
            .collect();
        for action in actions.in_priority_order() {
            store.record_intent(action);
        }
        let jailed = store.roles.jailer.current_prisoner;
        let before: BTreeSet<ParticipantId> = store.alive_ids().clone();

        let report = resolve_night(&mut store, &actions);

        prop_assert!(store.roster_consistent());
        prop_assert_eq!(store.alive_count(), store.alive_ids().len());
        prop_assert!(store.alive_ids().is_subset(&before));

        let deaths = report.deaths();
        let unique: BTreeSet<ParticipantId> = deaths.iter().copied().collect();
        prop_assert_eq!(unique.len(), deaths.len());
        for death in &deaths {
            prop_assert!(!store.is_alive(*death));
        }
        for gone in before.difference(store.alive_ids()) {
            prop_assert!(unique.contains(gone));
        }
        if let Some(prisoner) = jailed {
            let executed = report
                .events
                .iter()
                .any(|e| e.subject == prisoner && e.cause == Cause::JailExecution);
            prop_assert_eq!(store.is_alive(prisoner), !executed);
        }
    }

    #[test]
    fn jailed_participants_get_no_ability((roles, _picks, prisoner, _marked) in arb_night()) {
        let mut store = seat(&roles);
        if let Some(p) = prisoner {
            store.jail(id(p));
            prop_assert_eq!(ability_for(&store, id(p)), None);
            for participant in store.living() {
                if let Some(ability) = ability_for(&store, participant.id) {
                    let targets = super::options::legal_targets(&store, participant.id, ability);
                    prop_assert!(!targets.contains(&id(p)));
                }
            }
        }
    }
}
