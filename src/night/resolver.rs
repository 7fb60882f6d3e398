//! Effect resolver
//!
//! Applies one night's actions to the store in priority order and produces
//! the event log and private notices. Synchronous; performs no I/O.

use super::report::{Cause, NightReport, Notice};
use crate::game::{
    Ability, ActionKind, Alignment, GameStore, Participant, ParticipantId, Role, RoundAction,
    RoundActions,
};
use std::collections::{BTreeMap, BTreeSet};

type Handler = fn(&mut Resolution<'_>, &RoundAction);

/// The single ability-to-handler dispatch table
fn handler(ability: Ability) -> Handler {
    match ability {
        Ability::Execute => execute,
        Ability::Distract => distract,
        Ability::Silence => silence,
        Ability::Frame => frame,
        Ability::Kill => kill,
        Ability::Shoot => shoot,
        Ability::Heal => heal,
        Ability::Arson => arson,
        Ability::Check => check,
        Ability::Compare => compare,
        Ability::Track => track,
        Ability::Reveal => reveal,
    }
}

struct Resolution<'a> {
    store: &'a mut GameStore,
    report: NightReport,
    /// Victim of the Mafia kill, until the protection step has run
    killed: Option<ParticipantId>,
    /// Where each participant physically went tonight
    visits: BTreeMap<ParticipantId, ParticipantId>,
    notified_blocked: BTreeSet<ParticipantId>,
}

pub fn resolve_night(store: &mut GameStore, actions: &RoundActions) -> NightReport {
    let mut night = Resolution::new(store);
    night.apply_all(actions);

    debug_assert!(
        night.store.roster_consistent(),
        "alive roster drifted during night resolution"
    );
    tracing::debug!(
        round = night.store.round(),
        events = night.report.events.len(),
        notices = night.report.notices.len(),
        "Night resolved"
    );
    night.report
}

impl<'a> Resolution<'a> {
    fn new(store: &'a mut GameStore) -> Self {
        Self {
            store,
            report: NightReport::default(),
            killed: None,
            visits: BTreeMap::new(),
            notified_blocked: BTreeSet::new(),
        }
    }
}

impl Resolution<'_> {
    fn apply_all(&mut self, actions: &RoundActions) {
        for action in actions.in_priority_order() {
            self.apply(action);
            // The protection step is over even if the doctor never acted
            if action.kind.ability() == Ability::Heal {
                self.killed = None;
            }
        }
    }

    fn apply(&mut self, action: &RoundAction) {
        if self.is_blocked(action.actor) {
            if self.notified_blocked.insert(action.actor) {
                self.report.notify(action.actor, Notice::Blocked);
            }
            self.abandon(action);
            return;
        }
        if !self.store.is_alive(action.actor) && !self.self_save_in_flight(action) {
            self.abandon(action);
            return;
        }

        let visitor = self.visitor(action);
        let visited = action.kind.visited();
        if let Some(first) = visited.first() {
            self.visits.insert(visitor, *first);
        }
        if let Some(baiter) = visited
            .into_iter()
            .find(|target| *target != visitor && self.is_armed_trap(*target))
        {
            self.spring_trap(visitor, baiter);
            return;
        }

        handler(action.kind.ability())(self, action);
    }

    fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.store.participant(id)
    }

    fn is_blocked(&self, id: ParticipantId) -> bool {
        self.participant(id).is_some_and(Participant::is_blocked)
    }

    fn is_shielded(&self, id: ParticipantId) -> bool {
        self.participant(id).is_some_and(Participant::is_shielded)
    }

    /// Alive and not behind bars
    fn can_reach(&self, id: ParticipantId) -> bool {
        self.store.is_alive(id) && !self.is_shielded(id)
    }

    /// A doctor killed earlier tonight may still heal themselves
    fn self_save_in_flight(&self, action: &RoundAction) -> bool {
        matches!(action.kind, ActionKind::Heal { target } if target == action.actor)
            && self.killed == Some(action.actor)
    }

    /// Whoever physically carries the Mafia kill: the Mafioso stands in for
    /// a Godfather leader when free to move.
    fn kill_carrier(&self, leader: ParticipantId) -> ParticipantId {
        if self.store.role_of(leader) != Some(Role::Godfather) {
            return leader;
        }
        match self.store.living_holder_of(Role::Mafioso) {
            Some(mafioso) if !self.is_blocked(mafioso) => mafioso,
            _ => leader,
        }
    }

    fn visitor(&self, action: &RoundAction) -> ParticipantId {
        match action.kind {
            ActionKind::Kill { .. } => self.kill_carrier(action.actor),
            _ => action.actor,
        }
    }

    fn is_armed_trap(&self, id: ParticipantId) -> bool {
        self.store.role_of(id) == Some(Role::Baiter) && self.can_reach(id)
    }

    fn spring_trap(&mut self, visitor: ParticipantId, baiter: ParticipantId) {
        if self.store.kill(visitor) {
            self.report.log(visitor, Cause::Ambushed, Some(baiter));
            self.store.roles.baiter.visit_count += 1;
            self.report.notify(baiter, Notice::Ambushed { visitor });
        }
    }

    /// Undo intent recorded at collection for an action that never ran
    fn abandon(&mut self, action: &RoundAction) {
        if action.kind == ActionKind::Reveal {
            self.store.roles.mayor.has_revealed = false;
        }
    }

    fn apparent_alignment(&self, id: ParticipantId) -> Option<Alignment> {
        let participant = self.participant(id)?;
        if participant.flags.was_framed {
            return Some(Alignment::Mafia);
        }
        participant.role.map(Role::apparent_alignment)
    }
}

// ============================================================================
// Handlers
// ============================================================================

fn execute(night: &mut Resolution<'_>, action: &RoundAction) {
    let ActionKind::Execute { prisoner } = action.kind else {
        return;
    };
    if night.store.roles.jailer.current_prisoner != Some(prisoner) {
        return;
    }
    if night.store.kill(prisoner) {
        night.report.log(prisoner, Cause::JailExecution, Some(action.actor));
    }
    let jailer = &mut night.store.roles.jailer;
    jailer.executions_remaining = jailer.executions_remaining.saturating_sub(1);
    jailer.executed_tonight = true;
}

fn distract(night: &mut Resolution<'_>, action: &RoundAction) {
    let ActionKind::Distract { target } = action.kind else {
        return;
    };
    night.store.roles.distractor.used_tonight = true;
    if !night.can_reach(target) {
        return;
    }
    if let Some(p) = night.store.participant_mut(target) {
        p.flags.distracted = true;
    }
}

fn silence(night: &mut Resolution<'_>, action: &RoundAction) {
    let ActionKind::Silence { target } = action.kind else {
        return;
    };
    night.store.roles.silencer.used_tonight = true;
    if !night.can_reach(target) {
        return;
    }
    if let Some(p) = night.store.participant_mut(target) {
        p.flags.silenced_this_round = true;
        night.report.log(target, Cause::Silenced, None);
        night.report.notify(target, Notice::Silenced);
    }
}

fn frame(night: &mut Resolution<'_>, action: &RoundAction) {
    let ActionKind::Frame { target } = action.kind else {
        return;
    };
    if !night.can_reach(target) {
        return;
    }
    if let Some(p) = night.store.participant_mut(target) {
        p.flags.was_framed = true;
    }
}

fn kill(night: &mut Resolution<'_>, action: &RoundAction) {
    let ActionKind::Kill { target } = action.kind else {
        return;
    };
    let carrier = night.kill_carrier(action.actor);
    if carrier != action.actor {
        night.report.notify(carrier, Notice::CarryOutKill { target });
    }
    if night.can_reach(target) && night.store.kill(target) {
        night.report.log(target, Cause::Mafia, Some(carrier));
        night.killed = Some(target);
    }
}

fn shoot(night: &mut Resolution<'_>, action: &RoundAction) {
    let ActionKind::Shoot { target } = action.kind else {
        return;
    };
    if !night.can_reach(target) || !night.store.kill(target) {
        return;
    }
    night.report.log(target, Cause::Vigilante, Some(action.actor));
    if night.store.alignment_of(target) == Some(Alignment::Village) && night.store.kill(action.actor) {
        night.report.log(action.actor, Cause::Remorse, Some(target));
    }
}

fn heal(night: &mut Resolution<'_>, action: &RoundAction) {
    let ActionKind::Heal { target } = action.kind else {
        return;
    };
    night.store.roles.doctor.healed_tonight = Some(target);

    // Only the Mafia victim can be saved, and only by this step
    let killed = night.killed.take();
    if killed != Some(target) || !night.store.revive(target) {
        return;
    }
    night.report.retag(target, Cause::Mafia, Cause::Saved);
    if target != action.actor {
        night.report.notify(action.actor, Notice::PatientAttacked { patient: target });
    }
    night.report.notify(target, Notice::SurvivedAttack);
}

fn arson(night: &mut Resolution<'_>, action: &RoundAction) {
    match action.kind {
        ActionKind::Douse { target } => {
            if night.can_reach(target) {
                night.store.roles.arsonist.marked_targets.insert(target);
            }
        }
        ActionKind::Ignite => {
            let marked: Vec<ParticipantId> =
                night.store.roles.arsonist.marked_targets.iter().copied().collect();
            for id in &marked {
                if night.can_reach(*id) && night.store.kill(*id) {
                    night.report.log(*id, Cause::Burned, Some(action.actor));
                }
            }
            // Whoever escaped the fire (jailed tonight) is no longer doused
            let still_marked: BTreeSet<ParticipantId> =
                marked.into_iter().filter(|id| night.can_reach(*id)).collect();
            night.store.roles.arsonist.marked_targets = still_marked;
        }
        _ => {}
    }
}

fn check(night: &mut Resolution<'_>, action: &RoundAction) {
    let ActionKind::Check { target } = action.kind else {
        return;
    };
    if night.is_shielded(target) {
        return;
    }
    let alignment = night.apparent_alignment(target);
    night
        .report
        .notify(action.actor, Notice::CheckResult { target, alignment });
}

fn compare(night: &mut Resolution<'_>, action: &RoundAction) {
    let ActionKind::Compare { first, second } = action.kind else {
        return;
    };
    if night.is_shielded(first) || night.is_shielded(second) {
        return;
    }
    let same_side = night.apparent_alignment(first) == night.apparent_alignment(second);
    night.report.notify(
        action.actor,
        Notice::CompareResult {
            first,
            second,
            same_side,
        },
    );
}

fn track(night: &mut Resolution<'_>, action: &RoundAction) {
    let ActionKind::Track { target } = action.kind else {
        return;
    };
    if night.is_shielded(target) {
        return;
    }
    let visited = night.visits.get(&target).copied();
    night
        .report
        .notify(action.actor, Notice::TrackResult { target, visited });
}

fn reveal(night: &mut Resolution<'_>, action: &RoundAction) {
    let silenced = night
        .participant(action.actor)
        .is_some_and(|p| p.flags.silenced_this_round);
    if silenced {
        night.store.roles.mayor.has_revealed = false;
        night.report.notify(action.actor, Notice::RevealSuppressed);
    } else {
        night.store.roles.mayor.has_revealed = true;
        night.report.reveals.push(action.actor);
    }
}
