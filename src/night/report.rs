//! What a resolved night produced: the public event log and private notices

use crate::game::{Alignment, ParticipantId};
use serde::Serialize;

/// Why an event-log entry exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
    Mafia,
    JailExecution,
    Vigilante,
    /// The vigilante, after shooting a villager
    Remorse,
    Burned,
    Ambushed,
    Saved,
    Silenced,
}

impl Cause {
    pub fn is_death(self) -> bool {
        !matches!(self, Cause::Saved | Cause::Silenced)
    }

    /// Cause as the group sees it. Being saved and being silenced are
    /// indistinguishable from the outside.
    pub fn public(self) -> PublicCause {
        match self {
            Cause::Saved | Cause::Silenced => PublicCause::AttackedButSurvived,
            Cause::Mafia => PublicCause::KilledByMafia,
            Cause::JailExecution => PublicCause::ExecutedInJail,
            Cause::Vigilante => PublicCause::Shot,
            Cause::Remorse => PublicCause::Remorse,
            Cause::Burned => PublicCause::Burned,
            Cause::Ambushed => PublicCause::Ambushed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicCause {
    KilledByMafia,
    ExecutedInJail,
    Shot,
    Remorse,
    Burned,
    Ambushed,
    AttackedButSurvived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub subject: ParticipantId,
    pub cause: Cause,
    /// Responsible party (killer, shooter, baiter...) when there is one
    pub extra: Option<ParticipantId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    Blocked,
    /// Sent to a stand-in who physically carried out the leader's kill
    CarryOutKill { target: ParticipantId },
    PatientAttacked { patient: ParticipantId },
    SurvivedAttack,
    Silenced,
    Ambushed { visitor: ParticipantId },
    CheckResult { target: ParticipantId, alignment: Option<Alignment> },
    CompareResult { first: ParticipantId, second: ParticipantId, same_side: bool },
    TrackResult { target: ParticipantId, visited: Option<ParticipantId> },
    RevealSuppressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrivateNotice {
    pub recipient: ParticipantId,
    pub notice: Notice,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NightReport {
    pub events: Vec<LogEntry>,
    pub notices: Vec<PrivateNotice>,
    /// Mayors who revealed at dawn
    pub reveals: Vec<ParticipantId>,
}

impl NightReport {
    pub fn deaths(&self) -> Vec<ParticipantId> {
        self.events
            .iter()
            .filter(|e| e.cause.is_death())
            .map(|e| e.subject)
            .collect()
    }

    pub fn log(&mut self, subject: ParticipantId, cause: Cause, extra: Option<ParticipantId>) {
        self.events.push(LogEntry {
            subject,
            cause,
            extra,
        });
    }

    pub fn notify(&mut self, recipient: ParticipantId, notice: Notice) {
        self.notices.push(PrivateNotice { recipient, notice });
    }

    /// Rewrites the most recent `from` entry for `subject` to `to`.
    pub fn retag(&mut self, subject: ParticipantId, from: Cause, to: Cause) -> bool {
        match self
            .events
            .iter_mut()
            .rev()
            .find(|e| e.subject == subject && e.cause == from)
        {
            Some(entry) => {
                entry.cause = to;
                true
            }
            None => false,
        }
    }

    pub fn notices_for(&self, recipient: ParticipantId) -> impl Iterator<Item = &Notice> {
        self.notices
            .iter()
            .filter(move |n| n.recipient == recipient)
            .map(|n| &n.notice)
    }
}
