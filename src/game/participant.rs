//! Participants and their per-round flags

use super::role::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport-level identity of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ParticipantId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(ParticipantId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Mafia,
    Village,
    Neutral,
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Alignment::Mafia => "Mafia",
            Alignment::Village => "Village",
            Alignment::Neutral => "Neutral",
        })
    }
}

/// Flags that live for a single round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoundFlags {
    pub silenced_this_round: bool,
    /// Read by day voting: set at dawn when silenced during the night just resolved
    pub silenced_last_round: bool,
    pub distracted: bool,
    pub was_framed: bool,
    pub jailed: bool,
}

impl RoundFlags {
    /// Clears every flag, including the previous day's voting ban.
    pub fn begin_night(&mut self) {
        *self = Self::default();
    }

    /// Carries this night's silence over to the day that follows it.
    pub fn dawn(&mut self) {
        self.silenced_last_round = self.silenced_this_round;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub role: Option<Role>,
    pub(super) alive: bool,
    pub is_host: bool,
    pub will: Vec<String>,
    pub flags: RoundFlags,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            role: None,
            alive: true,
            is_host: false,
            will: Vec::new(),
            flags: RoundFlags::default(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn alignment(&self) -> Option<Alignment> {
        self.role.map(Role::alignment)
    }

    /// Jailed participants cannot be reached by any other ability
    pub fn is_shielded(&self) -> bool {
        self.flags.jailed
    }

    /// Blocked participants have their own action skipped
    pub fn is_blocked(&self) -> bool {
        self.flags.distracted || self.flags.jailed
    }

    /// Eligible to cast day votes
    pub fn can_vote(&self) -> bool {
        self.alive && !self.flags.silenced_last_round
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_covers_the_following_day_only() {
        let mut flags = RoundFlags::default();
        flags.begin_night();
        flags.silenced_this_round = true;
        flags.distracted = true;
        flags.was_framed = true;
        flags.jailed = true;

        flags.dawn();
        assert!(flags.silenced_last_round);

        flags.begin_night();
        assert_eq!(flags, RoundFlags::default());

        // A quiet night leaves the next day free
        flags.dawn();
        assert!(!flags.silenced_last_round);
    }

    #[test]
    fn test_jailed_is_blocked_and_shielded() {
        let mut p = Participant::new(ParticipantId(1), "Ann");
        assert!(!p.is_blocked() && !p.is_shielded());
        p.flags.jailed = true;
        assert!(p.is_blocked() && p.is_shielded());
        p.flags.jailed = false;
        p.flags.distracted = true;
        assert!(p.is_blocked() && !p.is_shielded());
    }
}
