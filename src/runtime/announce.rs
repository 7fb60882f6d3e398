//! Wording for group announcements and private notices

use crate::game::{Alignment, GameStore, ParticipantId, Role};
use crate::night::report::PublicCause;
use crate::night::{NightReport, Notice};
use crate::state_machine::Phase;
use crate::voting::VerdictOutcome;
use crate::win::{GameOutcome, Winner};

pub fn role_intro(store: &GameStore, id: ParticipantId, role: Role, mafia: &[ParticipantId]) -> String {
    let mut text = format!("You are the {role} ({} side).", role.alignment());
    if role.alignment() == Alignment::Mafia {
        let partners: Vec<&str> = mafia
            .iter()
            .filter(|m| **m != id)
            .map(|m| store.name_of(*m))
            .collect();
        if !partners.is_empty() {
            text.push_str(&format!(" Your partners: {}.", partners.join(", ")));
        }
    }
    if role == Role::Executioner {
        if let Some(target) = store.roles.executioner.target {
            text.push_str(&format!(" Get {} voted out to win.", store.name_of(target)));
        }
    }
    text
}

pub fn phase_banner(phase: &Phase) -> String {
    match phase {
        Phase::Lobby => "Back in the lobby. Join up for the next game.".to_string(),
        Phase::Night { round } => format!("Night {round} falls. Check your private messages."),
        Phase::Day { round } => format!("Day {round} begins."),
        Phase::Ended { .. } => "The game is over.".to_string(),
    }
}

pub fn night_summary(store: &GameStore, report: &NightReport) -> String {
    let mut lines = Vec::new();

    for entry in &report.events {
        let name = store.name_of(entry.subject);
        lines.push(match entry.cause.public() {
            PublicCause::KilledByMafia => format!("{name} was killed by the Mafia."),
            PublicCause::ExecutedInJail => format!("{name} was executed in jail."),
            PublicCause::Shot => format!("{name} was shot in the night."),
            PublicCause::Remorse => format!("{name} died of remorse after shooting a fellow villager."),
            PublicCause::Burned => format!("{name} burned to death."),
            PublicCause::Ambushed => format!("{name} was ambushed while out visiting."),
            PublicCause::AttackedButSurvived => format!("{name} was attacked but survived."),
        });
        if entry.cause.is_death() {
            lines.extend(obituary(store, entry.subject));
        }
    }

    for mayor in &report.reveals {
        lines.push(format!("{} has revealed themselves as the Mayor!", store.name_of(*mayor)));
    }

    if lines.is_empty() {
        return "The night passed quietly.".to_string();
    }
    lines.join("\n")
}

/// Role and will of someone who just died
fn obituary(store: &GameStore, id: ParticipantId) -> Vec<String> {
    let Some(participant) = store.participant(id) else {
        return Vec::new();
    };
    let mut lines = Vec::new();
    if let Some(role) = participant.role {
        lines.push(format!("{} was the {role}.", participant.name));
    }
    if !participant.will.is_empty() {
        lines.push("Their will read:".to_string());
        lines.extend(participant.will.iter().map(|line| format!("  {line}")));
    }
    lines
}

pub fn notice_text(store: &GameStore, notice: &Notice) -> String {
    match notice {
        Notice::Blocked => "You were occupied tonight and could not act.".to_string(),
        Notice::CarryOutKill { target } => {
            format!("On the Godfather's orders you went after {}.", store.name_of(*target))
        }
        Notice::PatientAttacked { patient } => {
            format!("{} was attacked tonight, and you saved them.", store.name_of(*patient))
        }
        Notice::SurvivedAttack => "You were attacked tonight, but someone nursed you back to health.".to_string(),
        Notice::Silenced => "You have been silenced.".to_string(),
        Notice::Ambushed { visitor } => {
            format!("{} walked into your trap.", store.name_of(*visitor))
        }
        Notice::CheckResult { target, alignment } => match alignment {
            Some(alignment) => format!("{} sides with the {alignment}.", store.name_of(*target)),
            None => format!("You could not learn anything about {}.", store.name_of(*target)),
        },
        Notice::CompareResult {
            first,
            second,
            same_side,
        } => {
            let verdict = if *same_side { "are on the same side" } else { "are on different sides" };
            format!("{} and {} {verdict}.", store.name_of(*first), store.name_of(*second))
        }
        Notice::TrackResult { target, visited } => match visited {
            Some(visited) => format!(
                "{} visited {} tonight.",
                store.name_of(*target),
                store.name_of(*visited)
            ),
            None => format!("{} stayed home tonight.", store.name_of(*target)),
        },
        Notice::RevealSuppressed => {
            "You were silenced, so your reveal did not happen. You can try again.".to_string()
        }
    }
}

pub fn conversion_text() -> &'static str {
    "Your target died in the night. You now win only by getting yourself voted out."
}

pub fn nomination_text(store: &GameStore, threshold: u32) -> String {
    format!(
        "Day {}: who should stand trial? {threshold} votes put someone on trial.",
        store.round()
    )
}

pub fn nomination_result(store: &GameStore, nominee: Option<ParticipantId>) -> String {
    match nominee {
        Some(nominee) => format!("{} is put on trial.", store.name_of(nominee)),
        None => "The town could not agree on anyone today.".to_string(),
    }
}

pub fn trial_text(store: &GameStore, nominee: ParticipantId) -> String {
    format!("{} is on trial. Guilty or innocent?", store.name_of(nominee))
}

pub fn verdict_text(store: &GameStore, verdict: &VerdictOutcome) -> String {
    let name = store.name_of(verdict.nominee);
    let tally = format!("({} guilty, {} innocent)", verdict.guilty, verdict.innocent);
    if verdict.executes() {
        let role = store
            .role_of(verdict.nominee)
            .map(|r| format!(" {name} was the {r}."))
            .unwrap_or_default();
        format!("{name} has been executed {tally}.{role}")
    } else {
        format!("{name} was spared {tally}.")
    }
}

pub fn outcome_text(store: &GameStore, outcome: &GameOutcome) -> String {
    let headline = match &outcome.winner {
        Winner::Faction { alignment } => format!("The {alignment} wins!"),
        Winner::Jester { id } => format!("{} the Jester fooled everyone and wins!", store.name_of(*id)),
        Winner::Executioner { id } => {
            format!("{} the Executioner got their target hanged and wins!", store.name_of(*id))
        }
        Winner::Arsonist { id } => format!("{} the Arsonist watched the town burn and wins!", store.name_of(*id)),
        Winner::Nobody => "Nobody survived. Nobody wins.".to_string(),
    };
    if outcome.co_winners.is_empty() {
        return headline;
    }
    let co: Vec<&str> = outcome.co_winners.iter().map(|id| store.name_of(*id)).collect();
    format!("{headline} Also winning: {}.", co.join(", "))
}
