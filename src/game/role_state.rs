//! Multi-round memory for stateful roles
//!
//! Stored per role kind on the game store rather than on a participant, so
//! the record is found by role and survives nothing but `reset`.

use super::participant::ParticipantId;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DoctorState {
    pub last_healed: Option<ParticipantId>,
    pub healed_tonight: Option<ParticipantId>,
}

/// Alternate-night abilities: usable only if not used the night before
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CooldownState {
    pub cooled_down: bool,
    pub used_tonight: bool,
}

impl CooldownState {
    fn end_night(&mut self) {
        self.cooled_down = self.used_tonight;
        self.used_tonight = false;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JailerState {
    pub can_act_tonight: bool,
    pub current_prisoner: Option<ParticipantId>,
    pub executions_remaining: u8,
    pub executed_tonight: bool,
}

impl JailerState {
    pub fn new(executions: u8) -> Self {
        Self {
            can_act_tonight: true,
            current_prisoner: None,
            executions_remaining: executions,
            executed_tonight: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MayorState {
    pub has_revealed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionerState {
    pub target: Option<ParticipantId>,
    /// Set once, when the target dies at night
    pub converted_to_jester: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BaiterState {
    pub visit_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArsonistState {
    pub marked_targets: BTreeSet<ParticipantId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleStates {
    pub doctor: DoctorState,
    pub silencer: CooldownState,
    pub distractor: CooldownState,
    pub jailer: JailerState,
    pub mayor: MayorState,
    pub executioner: ExecutionerState,
    pub baiter: BaiterState,
    pub arsonist: ArsonistState,
}

impl RoleStates {
    pub fn new(jailer_executions: u8) -> Self {
        Self {
            doctor: DoctorState::default(),
            silencer: CooldownState::default(),
            distractor: CooldownState::default(),
            jailer: JailerState::new(jailer_executions),
            mayor: MayorState::default(),
            executioner: ExecutionerState::default(),
            baiter: BaiterState::default(),
            arsonist: ArsonistState::default(),
        }
    }

    /// End-of-night transition for every role kind.
    pub fn end_night(&mut self) {
        self.doctor.last_healed = self.doctor.healed_tonight.take();
        self.silencer.end_night();
        self.distractor.end_night();

        self.jailer.can_act_tonight = !self.jailer.executed_tonight;
        self.jailer.executed_tonight = false;
        self.jailer.current_prisoner = None;

        // Mayor, Executioner, Baiter and Arsonist memory carries over as is
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_alternates() {
        let mut states = RoleStates::new(3);
        states.silencer.used_tonight = true;
        states.end_night();
        assert!(states.silencer.cooled_down);
        assert!(!states.silencer.used_tonight);

        // Sat out the night on cooldown, so it is available again
        states.end_night();
        assert!(!states.silencer.cooled_down);
    }

    #[test]
    fn test_doctor_remembers_only_last_night() {
        let mut states = RoleStates::new(3);
        states.doctor.healed_tonight = Some(ParticipantId(4));
        states.end_night();
        assert_eq!(states.doctor.last_healed, Some(ParticipantId(4)));
        states.end_night();
        assert_eq!(states.doctor.last_healed, None);
    }

    #[test]
    fn test_jailer_rests_after_execution() {
        let mut states = RoleStates::new(3);
        states.jailer.current_prisoner = Some(ParticipantId(2));
        states.jailer.executed_tonight = true;
        states.end_night();
        assert!(!states.jailer.can_act_tonight);
        assert_eq!(states.jailer.current_prisoner, None);
        states.end_night();
        assert!(states.jailer.can_act_tonight);
    }

    #[test]
    fn test_persistent_memory_untouched() {
        let mut states = RoleStates::new(3);
        states.mayor.has_revealed = true;
        states.executioner.target = Some(ParticipantId(9));
        states.baiter.visit_count = 2;
        states.arsonist.marked_targets.insert(ParticipantId(5));
        let before = states.clone();
        states.end_night();
        assert_eq!(states.mayor, before.mayor);
        assert_eq!(states.executioner, before.executioner);
        assert_eq!(states.baiter, before.baiter);
        assert_eq!(states.arsonist, before.arsonist);
    }
}
