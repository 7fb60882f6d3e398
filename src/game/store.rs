//! Game state store
//!
//! Single owner of participants, phase, round counter, the alive roster and
//! role memory. `kill` and `revive` are the only paths that flip a
//! participant's alive flag, and they update the roster in the same step.

use super::action::{RoundAction, RoundActions};
use super::participant::{Alignment, Participant, ParticipantId};
use super::role::{Ability, Role};
use super::role_state::RoleStates;
use crate::config::GameSettings;
use crate::state_machine::Phase;
use crate::win::GameOutcome;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;

/// Longest will a participant can leave
pub const MAX_WILL_LINES: usize = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LobbyError {
    #[error("A game is already in progress")]
    GameInProgress,
    #[error("Participant {0} has already joined")]
    AlreadyJoined(ParticipantId),
    #[error("Participant {0} is not in this game")]
    NotJoined(ParticipantId),
    #[error("The lobby is full ({0} players)")]
    LobbyFull(usize),
    #[error("Need at least {needed} players to start, have {have}")]
    NotEnoughPlayers { needed: usize, have: usize },
    #[error("Dead participants cannot edit their will")]
    Dead(ParticipantId),
    #[error("A will holds at most {MAX_WILL_LINES} lines")]
    WillFull,
}

/// Public view of a participant. Roles are shown only once public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantView {
    pub id: ParticipantId,
    pub name: String,
    pub alive: bool,
    pub is_host: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub phase: Phase,
    pub game: u32,
    pub round: u32,
    pub alive_count: usize,
    pub host: Option<ParticipantId>,
    pub participants: Vec<ParticipantView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_outcome: Option<GameOutcome>,
}

/// Who holds privileged seats right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessSnapshot {
    pub host: Option<ParticipantId>,
    pub mafia_leader: Option<ParticipantId>,
}

#[derive(Debug, Clone)]
pub struct GameStore {
    settings: GameSettings,
    /// Seat order
    participants: Vec<Participant>,
    players_alive: BTreeSet<ParticipantId>,
    phase: Phase,
    /// Bumped on every reset so prompts from an earlier game never match
    game: u32,
    round: u32,
    pub roles: RoleStates,
    previous_actions: RoundActions,
    last_outcome: Option<GameOutcome>,
}

impl GameStore {
    pub fn new(settings: GameSettings) -> Self {
        let roles = RoleStates::new(settings.jailer_executions);
        Self {
            settings,
            participants: Vec::new(),
            players_alive: BTreeSet::new(),
            phase: Phase::Lobby,
            game: 1,
            round: 0,
            roles,
            previous_actions: RoundActions::new(),
            last_outcome: None,
        }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn game(&self) -> u32 {
        self.game
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    // ========================================================================
    // Lobby
    // ========================================================================

    pub fn join(&mut self, id: ParticipantId, name: impl Into<String>) -> Result<(), LobbyError> {
        if !self.phase.is_lobby() {
            return Err(LobbyError::GameInProgress);
        }
        if self.participant(id).is_some() {
            return Err(LobbyError::AlreadyJoined(id));
        }
        if self.participants.len() >= self.settings.max_players {
            return Err(LobbyError::LobbyFull(self.settings.max_players));
        }

        let mut participant = Participant::new(id, name);
        participant.is_host = self.participants.is_empty();
        self.players_alive.insert(id);
        self.participants.push(participant);
        Ok(())
    }

    /// Removes a participant from the lobby. If the host left, a random
    /// remaining member becomes host and is returned.
    pub fn leave<R: Rng + ?Sized>(
        &mut self,
        id: ParticipantId,
        rng: &mut R,
    ) -> Result<Option<ParticipantId>, LobbyError> {
        if !self.phase.is_lobby() {
            return Err(LobbyError::GameInProgress);
        }
        let index = self
            .participants
            .iter()
            .position(|p| p.id == id)
            .ok_or(LobbyError::NotJoined(id))?;
        let departed = self.participants.remove(index);
        self.players_alive.remove(&id);

        if !departed.is_host {
            return Ok(None);
        }
        let Some(successor) = self.participants.choose_mut(rng) else {
            return Ok(None);
        };
        successor.is_host = true;
        Ok(Some(successor.id))
    }

    pub fn add_will_line(&mut self, id: ParticipantId, line: impl Into<String>) -> Result<(), LobbyError> {
        let participant = self.participant_mut(id).ok_or(LobbyError::NotJoined(id))?;
        if !participant.is_alive() {
            return Err(LobbyError::Dead(id));
        }
        if participant.will.len() >= MAX_WILL_LINES {
            return Err(LobbyError::WillFull);
        }
        participant.will.push(line.into());
        Ok(())
    }

    // ========================================================================
    // Roster
    // ========================================================================

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Mutable access for flags and wills. Alive state is not reachable from
    /// here; use `kill` and `revive`.
    pub fn participant_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    pub fn name_of(&self, id: ParticipantId) -> &str {
        self.participant(id).map_or("someone", |p| p.name.as_str())
    }

    pub fn living(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.alive)
    }

    pub fn alive_ids(&self) -> &BTreeSet<ParticipantId> {
        &self.players_alive
    }

    pub fn alive_count(&self) -> usize {
        self.players_alive.len()
    }

    pub fn is_alive(&self, id: ParticipantId) -> bool {
        self.players_alive.contains(&id)
    }

    /// Marks a participant dead. Returns false if they were not alive.
    pub fn kill(&mut self, id: ParticipantId) -> bool {
        match self.participants.iter_mut().find(|p| p.id == id) {
            Some(p) if p.alive => {
                p.alive = false;
                self.players_alive.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Brings a participant back. Returns false if they were not dead.
    pub fn revive(&mut self, id: ParticipantId) -> bool {
        match self.participants.iter_mut().find(|p| p.id == id) {
            Some(p) if !p.alive => {
                p.alive = true;
                self.players_alive.insert(id);
                true
            }
            _ => false,
        }
    }

    /// The roster matches the participants' alive flags exactly
    pub fn roster_consistent(&self) -> bool {
        let flagged: BTreeSet<ParticipantId> =
            self.participants.iter().filter(|p| p.alive).map(|p| p.id).collect();
        flagged == self.players_alive
    }

    // ========================================================================
    // Roles
    // ========================================================================

    pub fn assign_role(&mut self, id: ParticipantId, role: Role) -> bool {
        match self.participant_mut(id) {
            Some(p) => {
                p.role = Some(role);
                true
            }
            None => false,
        }
    }

    pub fn role_of(&self, id: ParticipantId) -> Option<Role> {
        self.participant(id).and_then(|p| p.role)
    }

    pub fn alignment_of(&self, id: ParticipantId) -> Option<Alignment> {
        self.role_of(id).map(Role::alignment)
    }

    /// Holder of a role, dead or alive
    pub fn holder_of(&self, role: Role) -> Option<ParticipantId> {
        self.participants.iter().find(|p| p.role == Some(role)).map(|p| p.id)
    }

    pub fn living_holder_of(&self, role: Role) -> Option<ParticipantId> {
        self.living().find(|p| p.role == Some(role)).map(|p| p.id)
    }

    /// First living holder along a succession order
    pub fn active_leader(&self, succession: &[Role]) -> Option<ParticipantId> {
        succession.iter().find_map(|role| self.living_holder_of(*role))
    }

    /// Who wields the Mafia kill this night
    pub fn mafia_leader(&self) -> Option<ParticipantId> {
        self.active_leader(&Role::MAFIA_SUCCESSION)
    }

    pub fn host(&self) -> Option<ParticipantId> {
        self.participants.iter().find(|p| p.is_host).map(|p| p.id)
    }

    pub fn access(&self) -> AccessSnapshot {
        AccessSnapshot {
            host: self.host(),
            mafia_leader: self.mafia_leader(),
        }
    }

    // ========================================================================
    // Round lifecycle
    // ========================================================================

    /// Advances the round counter and rolls every participant's flags.
    pub fn begin_night(&mut self) -> u32 {
        self.round += 1;
        for participant in &mut self.participants {
            participant.flags.begin_night();
        }
        self.round
    }

    /// Locks a prisoner up for the night: shielded and blocked.
    pub fn jail(&mut self, prisoner: ParticipantId) -> bool {
        if !self.is_alive(prisoner) {
            return false;
        }
        let Some(participant) = self.participant_mut(prisoner) else {
            return false;
        };
        participant.flags.jailed = true;
        self.roles.jailer.current_prisoner = Some(prisoner);
        true
    }

    /// Bookkeeping done the moment an action is collected, before resolution
    pub fn record_intent(&mut self, action: &RoundAction) {
        if action.kind.ability() == Ability::Reveal {
            self.roles.mayor.has_revealed = true;
        }
    }

    /// Dawn: applies end-of-night role memory, carries silence into the
    /// day and remembers the night's actions.
    pub fn end_night(&mut self, actions: RoundActions) {
        self.roles.end_night();
        for participant in &mut self.participants {
            participant.flags.dawn();
        }
        self.previous_actions = actions;
    }

    /// What the actor aimed at during the previous night
    pub fn previous_target(&self, actor: ParticipantId) -> Option<ParticipantId> {
        self.previous_actions
            .by_actor(actor)
            .and_then(|a| a.kind.primary_target())
    }

    pub fn set_outcome(&mut self, outcome: GameOutcome) {
        self.last_outcome = Some(outcome);
    }

    /// Back to an empty lobby. With `carry_over` the seated participants stay
    /// (alive, roleless, blank wills); otherwise the lobby is emptied.
    pub fn reset(&mut self, carry_over: bool) {
        if carry_over {
            for participant in &mut self.participants {
                participant.role = None;
                participant.alive = true;
                participant.will.clear();
                participant.flags = Default::default();
            }
        } else {
            self.participants.clear();
        }
        self.players_alive = self.participants.iter().map(|p| p.id).collect();
        self.phase = Phase::Lobby;
        self.game = self.game.wrapping_add(1);
        self.round = 0;
        self.roles = RoleStates::new(self.settings.jailer_executions);
        self.previous_actions = RoundActions::new();
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let participants = self
            .participants
            .iter()
            .map(|p| {
                let revealed_mayor =
                    p.role == Some(Role::Mayor) && self.roles.mayor.has_revealed && p.alive;
                ParticipantView {
                    id: p.id,
                    name: p.name.clone(),
                    alive: p.alive,
                    is_host: p.is_host,
                    role: if !p.alive || revealed_mayor { p.role } else { None },
                }
            })
            .collect();

        GameSnapshot {
            phase: self.phase.clone(),
            game: self.game,
            round: self.round,
            alive_count: self.alive_count(),
            host: self.host(),
            participants,
            last_outcome: self.last_outcome.clone(),
        }
    }
}
