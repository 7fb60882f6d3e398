//! Closed set of roles and the nightly abilities they map to

use super::participant::Alignment;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Godfather,
    Mafioso,
    Framer,
    Silencer,
    Villager,
    Doctor,
    Detective,
    Investigator,
    Tracker,
    Jailer,
    Distractor,
    Mayor,
    Vigilante,
    Jester,
    Executioner,
    Arsonist,
    Baiter,
}

impl Role {
    /// Order in which Mafia members inherit leadership (and the kill)
    pub const MAFIA_SUCCESSION: [Role; 4] =
        [Role::Godfather, Role::Mafioso, Role::Framer, Role::Silencer];

    pub const ALL: [Role; 17] = [
        Role::Godfather,
        Role::Mafioso,
        Role::Framer,
        Role::Silencer,
        Role::Villager,
        Role::Doctor,
        Role::Detective,
        Role::Investigator,
        Role::Tracker,
        Role::Jailer,
        Role::Distractor,
        Role::Mayor,
        Role::Vigilante,
        Role::Jester,
        Role::Executioner,
        Role::Arsonist,
        Role::Baiter,
    ];

    pub fn alignment(self) -> Alignment {
        match self {
            Role::Godfather | Role::Mafioso | Role::Framer | Role::Silencer => Alignment::Mafia,
            Role::Jester | Role::Executioner | Role::Arsonist | Role::Baiter => Alignment::Neutral,
            Role::Villager
            | Role::Doctor
            | Role::Detective
            | Role::Investigator
            | Role::Tracker
            | Role::Jailer
            | Role::Distractor
            | Role::Mayor
            | Role::Vigilante => Alignment::Village,
        }
    }

    /// Alignment shown to investigations before framing is considered.
    /// The Godfather reads as Village.
    pub fn apparent_alignment(self) -> Alignment {
        match self {
            Role::Godfather => Alignment::Village,
            other => other.alignment(),
        }
    }

    /// The role's own nightly ability. The kill belongs to whoever currently
    /// leads the Mafia and is granted by the store, not here.
    pub fn ability(self) -> Option<Ability> {
        match self {
            Role::Framer => Some(Ability::Frame),
            Role::Silencer => Some(Ability::Silence),
            Role::Doctor => Some(Ability::Heal),
            Role::Detective => Some(Ability::Check),
            Role::Investigator => Some(Ability::Compare),
            Role::Tracker => Some(Ability::Track),
            Role::Jailer => Some(Ability::Execute),
            Role::Distractor => Some(Ability::Distract),
            Role::Mayor => Some(Ability::Reveal),
            Role::Vigilante => Some(Ability::Shoot),
            Role::Arsonist => Some(Ability::Arson),
            Role::Godfather
            | Role::Mafioso
            | Role::Villager
            | Role::Jester
            | Role::Executioner
            | Role::Baiter => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Godfather => "Godfather",
            Role::Mafioso => "Mafioso",
            Role::Framer => "Framer",
            Role::Silencer => "Silencer",
            Role::Villager => "Villager",
            Role::Doctor => "Doctor",
            Role::Detective => "Detective",
            Role::Investigator => "Investigator",
            Role::Tracker => "Tracker",
            Role::Jailer => "Jailer",
            Role::Distractor => "Distractor",
            Role::Mayor => "Mayor",
            Role::Vigilante => "Vigilante",
            Role::Jester => "Jester",
            Role::Executioner => "Executioner",
            Role::Arsonist => "Arsonist",
            Role::Baiter => "Baiter",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Nightly abilities.
///
/// Declaration order is resolution priority: the derived `Ord` is what the
/// resolver iterates by, so reordering variants changes game rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    Execute,
    Distract,
    Silence,
    Frame,
    Kill,
    Shoot,
    Heal,
    Arson,
    Check,
    Compare,
    Track,
    Reveal,
}

impl Ability {
    /// Prompt wording
    pub fn verb(self) -> &'static str {
        match self {
            Ability::Execute => "execute your prisoner",
            Ability::Distract => "distract",
            Ability::Silence => "silence",
            Ability::Frame => "frame",
            Ability::Kill => "kill",
            Ability::Shoot => "shoot",
            Ability::Heal => "heal",
            Ability::Arson => "douse",
            Ability::Check => "investigate",
            Ability::Compare => "compare",
            Ability::Track => "track",
            Ability::Reveal => "reveal yourself as Mayor",
        }
    }

    /// Abilities that may not be aimed at members of the actor's own side
    pub fn spares_own_side(self) -> bool {
        matches!(self, Ability::Kill | Ability::Silence | Ability::Frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let mut abilities = vec![Ability::Reveal, Ability::Heal, Ability::Kill, Ability::Execute];
        abilities.sort();
        assert_eq!(
            abilities,
            vec![Ability::Execute, Ability::Kill, Ability::Heal, Ability::Reveal]
        );
        assert!(Ability::Distract < Ability::Silence);
        assert!(Ability::Shoot < Ability::Heal);
        assert!(Ability::Check < Ability::Track);
    }

    #[test]
    fn test_godfather_reads_as_village() {
        assert_eq!(Role::Godfather.alignment(), Alignment::Mafia);
        assert_eq!(Role::Godfather.apparent_alignment(), Alignment::Village);
        assert_eq!(Role::Framer.apparent_alignment(), Alignment::Mafia);
    }

    #[test]
    fn test_role_names_round_trip_through_from_str() {
        for role in Role::ALL {
            assert_eq!(role.name().to_lowercase().parse::<Role>(), Ok(role));
        }
        assert!("wizard".parse::<Role>().is_err());
    }
}
