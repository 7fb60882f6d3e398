//! Actions collected during a night

use super::participant::ParticipantId;
use super::role::Ability;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    Execute { prisoner: ParticipantId },
    Distract { target: ParticipantId },
    Silence { target: ParticipantId },
    Frame { target: ParticipantId },
    Kill { target: ParticipantId },
    Shoot { target: ParticipantId },
    Heal { target: ParticipantId },
    Douse { target: ParticipantId },
    Ignite,
    Check { target: ParticipantId },
    Compare { first: ParticipantId, second: ParticipantId },
    Track { target: ParticipantId },
    Reveal,
}

impl ActionKind {
    pub fn ability(self) -> Ability {
        match self {
            ActionKind::Execute { .. } => Ability::Execute,
            ActionKind::Distract { .. } => Ability::Distract,
            ActionKind::Silence { .. } => Ability::Silence,
            ActionKind::Frame { .. } => Ability::Frame,
            ActionKind::Kill { .. } => Ability::Kill,
            ActionKind::Shoot { .. } => Ability::Shoot,
            ActionKind::Heal { .. } => Ability::Heal,
            ActionKind::Douse { .. } | ActionKind::Ignite => Ability::Arson,
            ActionKind::Check { .. } => Ability::Check,
            ActionKind::Compare { .. } => Ability::Compare,
            ActionKind::Track { .. } => Ability::Track,
            ActionKind::Reveal => Ability::Reveal,
        }
    }

    /// Participants whose home the actor physically goes to. Executions
    /// happen inside the jail, and ignition and reveals go nowhere.
    pub fn visited(self) -> Vec<ParticipantId> {
        match self {
            ActionKind::Execute { .. } | ActionKind::Ignite | ActionKind::Reveal => Vec::new(),
            ActionKind::Compare { first, second } => vec![first, second],
            ActionKind::Distract { target }
            | ActionKind::Silence { target }
            | ActionKind::Frame { target }
            | ActionKind::Kill { target }
            | ActionKind::Shoot { target }
            | ActionKind::Heal { target }
            | ActionKind::Douse { target }
            | ActionKind::Check { target }
            | ActionKind::Track { target } => vec![target],
        }
    }

    /// The participant the action is aimed at, if any
    pub fn primary_target(self) -> Option<ParticipantId> {
        match self {
            ActionKind::Execute { prisoner } => Some(prisoner),
            ActionKind::Compare { first, .. } => Some(first),
            ActionKind::Ignite | ActionKind::Reveal => None,
            other => other.visited().first().copied(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundAction {
    pub actor: ParticipantId,
    #[serde(flatten)]
    pub kind: ActionKind,
}

/// The night's actions, keyed by ability and iterated in priority order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundActions {
    by_ability: BTreeMap<Ability, RoundAction>,
}

impl RoundActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an action, replacing any earlier one for the same ability.
    pub fn insert(&mut self, action: RoundAction) -> Option<RoundAction> {
        self.by_ability.insert(action.kind.ability(), action)
    }

    pub fn get(&self, ability: Ability) -> Option<&RoundAction> {
        self.by_ability.get(&ability)
    }

    pub fn in_priority_order(&self) -> impl Iterator<Item = &RoundAction> {
        self.by_ability.values()
    }

    pub fn by_actor(&self, actor: ParticipantId) -> Option<&RoundAction> {
        self.by_ability.values().find(|a| a.actor == actor)
    }

    pub fn len(&self) -> usize {
        self.by_ability.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ability.is_empty()
    }
}

impl FromIterator<RoundAction> for RoundActions {
    fn from_iter<I: IntoIterator<Item = RoundAction>>(iter: I) -> Self {
        let mut actions = Self::new();
        for action in iter {
            actions.insert(action);
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> ParticipantId {
        ParticipantId(n)
    }

    #[test]
    fn test_iterates_in_priority_order() {
        let actions: RoundActions = [
            RoundAction { actor: id(1), kind: ActionKind::Reveal },
            RoundAction { actor: id(2), kind: ActionKind::Heal { target: id(3) } },
            RoundAction { actor: id(3), kind: ActionKind::Kill { target: id(4) } },
            RoundAction { actor: id(5), kind: ActionKind::Execute { prisoner: id(3) } },
        ]
        .into_iter()
        .collect();

        let order: Vec<Ability> = actions.in_priority_order().map(|a| a.kind.ability()).collect();
        assert_eq!(
            order,
            vec![Ability::Execute, Ability::Kill, Ability::Heal, Ability::Reveal]
        );
    }

    #[test]
    fn test_douse_and_ignite_share_a_slot() {
        let mut actions = RoundActions::new();
        actions.insert(RoundAction { actor: id(1), kind: ActionKind::Douse { target: id(2) } });
        let replaced = actions.insert(RoundAction { actor: id(1), kind: ActionKind::Ignite });
        assert!(replaced.is_some());
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_visits() {
        assert!(ActionKind::Execute { prisoner: id(1) }.visited().is_empty());
        assert!(ActionKind::Ignite.visited().is_empty());
        assert_eq!(
            ActionKind::Compare { first: id(1), second: id(2) }.visited(),
            vec![id(1), id(2)]
        );
        assert_eq!(ActionKind::Execute { prisoner: id(7) }.primary_target(), Some(id(7)));
    }
}
