//! Legal choices for each nightly ability

use crate::game::{Ability, ActionKind, GameStore, ParticipantId, Role};
use crate::runtime::traits::PromptOption;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A selectable answer to a night prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Choice {
    Target(ParticipantId),
    Execute,
    Ignite,
    Reveal,
    Skip,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Target(id) => write!(f, "target:{id}"),
            Choice::Execute => f.write_str("execute"),
            Choice::Ignite => f.write_str("ignite"),
            Choice::Reveal => f.write_str("reveal"),
            Choice::Skip => f.write_str("skip"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unrecognised choice: {0}")]
pub struct ParseChoiceError(String);

impl FromStr for Choice {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "execute" => Ok(Choice::Execute),
            "ignite" => Ok(Choice::Ignite),
            "reveal" => Ok(Choice::Reveal),
            "skip" => Ok(Choice::Skip),
            other => other
                .strip_prefix("target:")
                .and_then(|id| id.parse().ok())
                .map(Choice::Target)
                .ok_or_else(|| ParseChoiceError(other.to_string())),
        }
    }
}

impl Choice {
    pub fn to_option(self, store: &GameStore) -> PromptOption {
        let label = match self {
            Choice::Target(id) => store.name_of(id).to_string(),
            Choice::Execute => "Execute the prisoner".to_string(),
            Choice::Ignite => "Ignite everyone doused".to_string(),
            Choice::Reveal => "Reveal".to_string(),
            Choice::Skip => "Do nothing".to_string(),
        };
        PromptOption {
            value: self.to_string(),
            label,
        }
    }
}

/// The ability a participant exercises tonight, if any. The active Mafia
/// leader gets the kill in place of their own ability.
pub fn ability_for(store: &GameStore, id: ParticipantId) -> Option<Ability> {
    let participant = store.participant(id)?;
    if !participant.is_alive() || participant.is_blocked() {
        return None;
    }
    if store.mafia_leader() == Some(id) {
        return Some(Ability::Kill);
    }

    let ability = participant.role?.ability()?;
    let roles = &store.roles;
    let available = match ability {
        Ability::Silence => !roles.silencer.cooled_down,
        Ability::Distract => !roles.distractor.cooled_down,
        Ability::Execute => {
            roles.jailer.executions_remaining > 0
                && roles.jailer.current_prisoner.is_some_and(|p| store.is_alive(p))
        }
        Ability::Reveal => !roles.mayor.has_revealed,
        _ => true,
    };
    available.then_some(ability)
}

/// Participants the actor may aim `ability` at.
///
/// Dead and jailed participants are never offered.
pub fn legal_targets(store: &GameStore, actor: ParticipantId, ability: Ability) -> Vec<ParticipantId> {
    let own_side = store.alignment_of(actor);
    let previous = store.previous_target(actor);

    store
        .living()
        .filter(|p| !p.is_shielded())
        .filter(|p| ability == Ability::Heal || p.id != actor)
        .filter(|p| !(ability.spares_own_side() && p.alignment() == own_side))
        .filter(|p| match ability {
            Ability::Heal => store.roles.doctor.last_healed != Some(p.id),
            Ability::Arson => !store.roles.arsonist.marked_targets.contains(&p.id),
            Ability::Track => previous != Some(p.id),
            _ => true,
        })
        .map(|p| p.id)
        .collect()
}

/// Candidates for the jailer's nightly prisoner
pub fn jail_targets(store: &GameStore, jailer: ParticipantId) -> Vec<ParticipantId> {
    store.living().filter(|p| p.id != jailer).map(|p| p.id).collect()
}

/// Every acceptable answer to the ability's prompt, `Skip` excluded
pub fn choices_for(store: &GameStore, actor: ParticipantId, ability: Ability) -> Vec<Choice> {
    match ability {
        Ability::Execute => vec![Choice::Execute],
        Ability::Reveal => vec![Choice::Reveal],
        Ability::Arson => {
            let mut choices: Vec<Choice> = legal_targets(store, actor, ability)
                .into_iter()
                .map(Choice::Target)
                .collect();
            let anything_doused = store
                .roles
                .arsonist
                .marked_targets
                .iter()
                .any(|id| store.is_alive(*id));
            if anything_doused {
                choices.push(Choice::Ignite);
            }
            choices
        }
        _ => legal_targets(store, actor, ability)
            .into_iter()
            .map(Choice::Target)
            .collect(),
    }
}

/// Turns the chosen answer(s) into an action. `None` means no action.
pub fn into_action(
    ability: Ability,
    choice: Choice,
    second: Option<ParticipantId>,
    prisoner: Option<ParticipantId>,
) -> Option<ActionKind> {
    let kind = match (ability, choice) {
        (_, Choice::Skip) => return None,
        (Ability::Execute, Choice::Execute) => ActionKind::Execute { prisoner: prisoner? },
        (Ability::Reveal, Choice::Reveal) => ActionKind::Reveal,
        (Ability::Arson, Choice::Ignite) => ActionKind::Ignite,
        (Ability::Arson, Choice::Target(target)) => ActionKind::Douse { target },
        (Ability::Compare, Choice::Target(first)) => ActionKind::Compare {
            first,
            second: second?,
        },
        (Ability::Distract, Choice::Target(target)) => ActionKind::Distract { target },
        (Ability::Silence, Choice::Target(target)) => ActionKind::Silence { target },
        (Ability::Frame, Choice::Target(target)) => ActionKind::Frame { target },
        (Ability::Kill, Choice::Target(target)) => ActionKind::Kill { target },
        (Ability::Shoot, Choice::Target(target)) => ActionKind::Shoot { target },
        (Ability::Heal, Choice::Target(target)) => ActionKind::Heal { target },
        (Ability::Check, Choice::Target(target)) => ActionKind::Check { target },
        (Ability::Track, Choice::Target(target)) => ActionKind::Track { target },
        _ => return None,
    };
    Some(kind)
}

/// Prompt text for an ability
pub fn prompt_text(store: &GameStore, actor: ParticipantId, ability: Ability) -> String {
    let round = store.round();
    match (ability, store.role_of(actor)) {
        (Ability::Kill, Some(role)) if role != Role::Godfather && role != Role::Mafioso => format!(
            "Night {round}: you now lead the Mafia. Who do you want to kill?"
        ),
        (Ability::Execute, _) => {
            let prisoner = store
                .roles
                .jailer
                .current_prisoner
                .map_or("your prisoner", |p| store.name_of(p));
            format!("Night {round}: execute {prisoner}?")
        }
        (Ability::Reveal, _) => format!("Night {round}: reveal yourself as Mayor at dawn?"),
        (Ability::Arson, _) => format!("Night {round}: douse someone, or ignite everyone doused?"),
        (Ability::Compare, _) => format!("Night {round}: pick the first person to compare."),
        (ability, _) => format!("Night {round}: who do you want to {}?", ability.verb()),
    }
}
