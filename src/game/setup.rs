//! Role lineup and assignment at game start

use super::participant::{Alignment, ParticipantId};
use super::role::Role;
use super::store::GameStore;
use rand::seq::SliceRandom;
use rand::Rng;

/// Roles enter the lineup in this order as the table grows
pub const LINEUP_ORDER: [Role; 17] = [
    Role::Godfather,
    Role::Doctor,
    Role::Detective,
    Role::Villager,
    Role::Mafioso,
    Role::Jailer,
    Role::Jester,
    Role::Framer,
    Role::Mayor,
    Role::Vigilante,
    Role::Executioner,
    Role::Silencer,
    Role::Tracker,
    Role::Distractor,
    Role::Investigator,
    Role::Arsonist,
    Role::Baiter,
];

/// Roles for a table of `players`, padded with Villagers past the catalogue
pub fn lineup(players: usize) -> Vec<Role> {
    LINEUP_ORDER
        .iter()
        .copied()
        .chain(std::iter::repeat(Role::Villager))
        .take(players)
        .collect()
}

/// Result of dealing roles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub dealt: Vec<(ParticipantId, Role)>,
    pub executioner_target: Option<ParticipantId>,
}

impl Assignment {
    /// Mafia members, for introducing them to each other
    pub fn mafia(&self) -> Vec<ParticipantId> {
        self.dealt
            .iter()
            .filter(|(_, role)| role.alignment() == Alignment::Mafia)
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Deals roles to everyone seated and picks the Executioner's target.
pub fn assign_roles<R: Rng + ?Sized>(store: &mut GameStore, rng: &mut R) -> Assignment {
    let seats: Vec<ParticipantId> = store.participants().iter().map(|p| p.id).collect();

    let mut roles = match &store.settings().roles {
        Some(explicit) if explicit.len() == seats.len() => explicit.clone(),
        Some(explicit) => {
            tracing::warn!(
                configured = explicit.len(),
                players = seats.len(),
                "Configured lineup does not fit the table, using the default lineup"
            );
            lineup(seats.len())
        }
        None => lineup(seats.len()),
    };
    if store.settings().random_roles {
        roles.shuffle(rng);
    }

    let dealt: Vec<(ParticipantId, Role)> = seats.into_iter().zip(roles).collect();
    for (id, role) in &dealt {
        store.assign_role(*id, *role);
    }

    let executioner_target = store.holder_of(Role::Executioner).and_then(|executioner| {
        let candidates: Vec<ParticipantId> = store
            .living()
            .filter(|p| p.id != executioner && p.alignment() == Some(Alignment::Village))
            .map(|p| p.id)
            .collect();
        candidates.choose(rng).copied()
    });
    store.roles.executioner.target = executioner_target;

    Assignment {
        dealt,
        executioner_target,
    }
}
