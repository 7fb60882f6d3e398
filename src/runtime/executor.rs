//! Game runtime executor
//!
//! Owns all mutable game state. Feeds phase events through the pure
//! transition function and executes the resulting effects; commands from
//! callers are drained while any round is waiting on players.

use super::announce;
use super::traits::{Prompt, PromptHandle, PromptOption, Recipient, Transport};
use super::{Command, CommandError, EngineError};
use crate::config::GameSettings;
use crate::game::setup::assign_roles;
use crate::game::{GameStore, LobbyError, ParticipantId};
use crate::night::{plan_jail, plan_night, resolve_night, ActionCollector, Choice, NightReport};
use crate::pending::PendingActions;
use crate::state_machine::{
    transition, Effect, PhaseContext, PhaseEvent, TransitionError, TransitionResult,
};
use crate::voting::{Verdict, Vote, VotingEngine};
use crate::win::{self, Trigger};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// What a command did to the round being waited on
enum Flow {
    Continue,
    /// A vote was accepted
    Voted,
    /// Stop waiting: the game is being ended
    Interrupt,
}

/// Sleeps until the deadline, or forever without one
async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

pub struct GameRuntime<T: Transport + 'static> {
    store: GameStore,
    voting: VotingEngine,
    pending: Arc<PendingActions<Choice>>,
    transport: Arc<T>,
    commands: mpsc::Receiver<Command>,
    rng: StdRng,
    /// Last night's log, kept for the dawn announcement
    last_report: Option<NightReport>,
}

impl<T: Transport + 'static> GameRuntime<T> {
    pub fn new(
        settings: GameSettings,
        transport: Arc<T>,
        pending: Arc<PendingActions<Choice>>,
        commands: mpsc::Receiver<Command>,
    ) -> Self {
        Self {
            store: GameStore::new(settings),
            voting: VotingEngine::new(),
            pending,
            transport,
            commands,
            rng: StdRng::from_entropy(),
            last_report: None,
        }
    }

    fn context(&self) -> PhaseContext {
        let settings = self.store.settings();
        PhaseContext {
            min_players: settings.min_players,
            max_players: settings.max_players,
        }
    }

    /// Main loop: serve lobby commands until every handle is dropped
    pub async fn run(mut self) {
        tracing::info!("Game runtime started");
        while let Some(command) = self.commands.recv().await {
            self.handle_idle(command).await;
        }
        tracing::info!("Game runtime stopped");
    }

    async fn handle_idle(&mut self, command: Command) {
        match command {
            Command::Start { reply } => {
                let event = PhaseEvent::Start {
                    participants: self.store.participants().len(),
                };
                match transition(self.store.phase(), &self.context(), event) {
                    Ok(result) => {
                        let _ = reply.send(Ok(()));
                        self.drive(result).await;
                    }
                    Err(e) => {
                        tracing::info!(error = %e, "Start rejected");
                        let _ = reply.send(Err(e.into()));
                    }
                }
            }
            other => self.handle_common(other),
        }
    }

    /// Commands that mean the same thing whatever the phase
    fn handle_common(&mut self, command: Command) {
        match command {
            Command::Join { id, name, reply } => {
                let result = self.store.join(id, name);
                if result.is_ok() {
                    tracing::info!(participant = %id, "Participant joined");
                }
                let _ = reply.send(result.map_err(CommandError::from));
            }
            Command::Leave { id, reply } => {
                let result = self.store.leave(id, &mut self.rng);
                if let Ok(new_host) = &result {
                    tracing::info!(participant = %id, new_host = ?new_host, "Participant left");
                }
                let _ = reply.send(result.map_err(CommandError::from));
            }
            Command::AddWill { id, line, reply } => {
                let _ = reply.send(self.store.add_will_line(id, line).map_err(CommandError::from));
            }
            Command::Vote { voter, vote, reply } => {
                let result = self.voting.submit(&self.store, voter, vote);
                let _ = reply.send(result.map_err(CommandError::from));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.store.snapshot());
            }
            Command::Access { reply } => {
                let _ = reply.send(self.store.access());
            }
            Command::Start { reply } => {
                let _ = reply.send(Err(LobbyError::GameInProgress.into()));
            }
            Command::ForceEnd { reply } => {
                let _ = reply.send(Err(TransitionError::NoGameInProgress.into()));
            }
        }
    }

    /// Handles a command that arrived while a round waits on players.
    fn handle_in_round(&mut self, command: Option<Command>) -> Flow {
        match command {
            None => {
                tracing::warn!("All handles dropped mid-game, ending the game");
                Flow::Interrupt
            }
            Some(Command::ForceEnd { reply }) => {
                tracing::info!(phase = %self.store.phase(), "Game force-ended");
                let _ = reply.send(Ok(()));
                Flow::Interrupt
            }
            Some(Command::Vote { voter, vote, reply }) => {
                let result = self.voting.submit(&self.store, voter, vote);
                let accepted = result.is_ok();
                let _ = reply.send(result.map_err(CommandError::from));
                if accepted {
                    Flow::Voted
                } else {
                    Flow::Continue
                }
            }
            Some(other) => {
                self.handle_common(other);
                Flow::Continue
            }
        }
    }

    /// Awaits `fut` while serving commands. `None` means the game was ended.
    async fn while_waiting<F: Future>(&mut self, fut: F) -> Option<F::Output> {
        tokio::pin!(fut);
        loop {
            tokio::select! {
                biased;
                output = &mut fut => return Some(output),
                command = self.commands.recv() => {
                    if let Flow::Interrupt = self.handle_in_round(command) {
                        return None;
                    }
                }
            }
        }
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// Applies a transition and keeps going until no effect yields an event.
    async fn drive(&mut self, first: TransitionResult) {
        let mut next = Some(first);
        while let Some(result) = next.take() {
            let event = match self.apply(result).await {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!(phase = %self.store.phase(), error = %e, "Round aborted");
                    Some(PhaseEvent::Abort {
                        message: e.to_string(),
                    })
                }
            };
            next = event.and_then(|event| self.next_transition(event));
        }
    }

    fn next_transition(&self, event: PhaseEvent) -> Option<TransitionResult> {
        let phase = self.store.phase();
        match transition(phase, &self.context(), event) {
            Ok(result) => Some(result),
            Err(e) if phase.in_game() => {
                tracing::error!(%phase, error = %e, "Phase event rejected mid-game");
                transition(
                    phase,
                    &self.context(),
                    PhaseEvent::Abort {
                        message: e.to_string(),
                    },
                )
                .ok()
            }
            Err(e) => {
                tracing::error!(%phase, error = %e, "Phase event rejected");
                None
            }
        }
    }

    async fn apply(&mut self, result: TransitionResult) -> Result<Option<PhaseEvent>, EngineError> {
        let from = self.store.phase().clone();
        self.store.set_phase(result.new_phase);
        if from != *self.store.phase() {
            tracing::info!(from = %from, to = %self.store.phase(), "Phase transition");
        }

        let mut follow_up = None;
        for effect in result.effects {
            if let Some(event) = self.execute_effect(effect).await? {
                follow_up = Some(event);
            }
        }
        Ok(follow_up)
    }

    async fn execute_effect(&mut self, effect: Effect) -> Result<Option<PhaseEvent>, EngineError> {
        match effect {
            Effect::AssignRoles => {
                self.assign_roles().await;
                Ok(None)
            }

            Effect::BeginNight => {
                let round = self.store.begin_night();
                self.last_report = None;
                if self.store.phase().round() != Some(round) {
                    return Err(EngineError::Inconsistent(format!(
                        "store is on round {round} but the phase is {}",
                        self.store.phase()
                    )));
                }
                Ok(None)
            }

            Effect::CollectNightActions => Ok(Some(self.collect_night().await)),

            Effect::ResolveNight { actions } => {
                let report = resolve_night(&mut self.store, &actions);
                self.store.end_night(actions);
                if !self.store.roster_consistent() {
                    return Err(EngineError::Inconsistent(
                        "alive roster drifted from participant flags".to_string(),
                    ));
                }

                for notice in &report.notices {
                    let text = announce::notice_text(&self.store, &notice.notice);
                    self.notify(Recipient::Participant(notice.recipient), &text).await;
                }
                let deaths = report.deaths();
                let check = win::evaluate(&mut self.store, Trigger::Night { deaths: &deaths });
                if let Some(executioner) = check.converted {
                    self.notify(Recipient::Participant(executioner), announce::conversion_text())
                        .await;
                }
                tracing::info!(
                    round = self.store.round(),
                    deaths = deaths.len(),
                    finished = check.outcome.is_some(),
                    "Night resolved"
                );
                self.last_report = Some(report);
                Ok(Some(PhaseEvent::NightResolved {
                    outcome: check.outcome,
                }))
            }

            Effect::AnnounceNight => {
                if let Some(report) = &self.last_report {
                    let text = announce::night_summary(&self.store, report);
                    self.notify(Recipient::Group, &text).await;
                }
                Ok(None)
            }

            Effect::OpenNomination => self.run_nomination().await.map(Some),

            Effect::OpenTrial { nominee } => self.run_trial(nominee).await.map(Some),

            Effect::AnnounceOutcome { outcome } => {
                let mut text = announce::outcome_text(&self.store, &outcome);
                let roles: Vec<String> = self
                    .store
                    .participants()
                    .iter()
                    .filter_map(|p| p.role.map(|role| format!("{} ({role})", p.name)))
                    .collect();
                if !roles.is_empty() {
                    text = format!("{text}\nRoles: {}", roles.join(", "));
                }
                tracing::info!(winner = ?outcome.winner, "Game finished");
                self.store.set_outcome(outcome);
                self.notify(Recipient::Group, &text).await;
                Ok(None)
            }

            Effect::ClearPending => {
                let dropped = self.pending.clear();
                tracing::debug!(dropped, "Pending prompts cleared");
                Ok(None)
            }

            Effect::CancelVoting => {
                self.voting.cancel();
                Ok(None)
            }

            Effect::NotifyTerminated { message } => {
                self.notify(Recipient::Group, &message).await;
                Ok(None)
            }

            Effect::ReopenLobby => Ok(Some(PhaseEvent::Reopen)),

            Effect::ResetStore => {
                self.store.reset(true);
                self.last_report = None;
                Ok(None)
            }

            Effect::NotifyPhase => {
                let text = announce::phase_banner(self.store.phase());
                self.notify(Recipient::Group, &text).await;
                Ok(None)
            }
        }
    }

    // ========================================================================
    // Effects that talk to players
    // ========================================================================

    async fn notify(&self, recipient: Recipient, text: &str) {
        if let Err(e) = self.transport.notify(recipient, text).await {
            tracing::warn!(%recipient, error = %e, "Notice not delivered");
        }
    }

    async fn disable_prompt(&self, handle: Option<PromptHandle>) {
        let Some(handle) = handle else {
            return;
        };
        if let Err(e) = self.transport.edit_prompt_options(&handle, &[]).await {
            tracing::warn!(error = %e, "Failed to disable closed prompt");
        }
    }

    async fn assign_roles(&mut self) {
        let assignment = assign_roles(&mut self.store, &mut self.rng);
        let mafia = assignment.mafia();
        for (id, role) in &assignment.dealt {
            let text = announce::role_intro(&self.store, *id, *role, &mafia);
            self.notify(Recipient::Participant(*id), &text).await;
        }
        tracing::info!(players = assignment.dealt.len(), "Roles assigned");
        tracing::debug!(executioner_target = ?assignment.executioner_target, "Executioner target drawn");
    }

    /// Jail stage, then every other prompt of the night
    async fn collect_night(&mut self) -> PhaseEvent {
        let collector = ActionCollector::new(
            self.transport.clone(),
            self.pending.clone(),
            self.store.settings(),
        );

        if let Some(plan) = plan_jail(&self.store) {
            let Some(prisoner) = self.while_waiting(collector.collect_jail(&plan)).await else {
                return PhaseEvent::ForceEnd;
            };
            if let Some(prisoner) = prisoner.filter(|p| self.store.jail(*p)) {
                tracing::info!(round = self.store.round(), %prisoner, "Prisoner jailed");
                self.notify(
                    Recipient::Participant(prisoner),
                    "You have been hauled off to jail for the night.",
                )
                .await;
            }
        }

        let plans = plan_night(&self.store, &mut self.rng);
        tracing::info!(round = self.store.round(), prompts = plans.len(), "Collecting night actions");
        let Some(actions) = self.while_waiting(collector.collect_all(plans)).await else {
            return PhaseEvent::ForceEnd;
        };
        for action in actions.in_priority_order() {
            self.store.record_intent(action);
        }
        PhaseEvent::NightCollected { actions }
    }

    fn nomination_options(&self, candidates: &[ParticipantId]) -> Vec<PromptOption> {
        let tally = self.voting.nomination_tally(&self.store);
        candidates
            .iter()
            .map(|id| {
                let votes = tally.get(id).copied().unwrap_or(0);
                let name = self.store.name_of(*id);
                PromptOption {
                    value: Vote::Nominate(*id).to_string(),
                    label: if votes == 0 {
                        name.to_string()
                    } else {
                        format!("{name} ({votes})")
                    },
                }
            })
            .collect()
    }

    async fn run_nomination(&mut self) -> Result<PhaseEvent, EngineError> {
        let timeout = self.store.settings().nomination_timeout;
        let mut rx = self.voting.open_nomination(&self.store, timeout);
        let threshold = crate::voting::nomination_threshold(self.store.alive_count());
        let candidates: Vec<ParticipantId> = self.store.living().map(|p| p.id).collect();

        let prompt = Prompt {
            session_key: format!("nomination:{}:{}", self.store.game(), self.store.round()),
            text: announce::nomination_text(&self.store, threshold),
            options: self.nomination_options(&candidates),
        };
        let handle = match self.transport.send_prompt(Recipient::Group, &prompt).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "Nomination prompt not delivered");
                None
            }
        };

        let nominee = loop {
            let deadline = self.voting.deadline();
            tokio::select! {
                biased;
                result = &mut rx => break result.ok().flatten(),
                () = until(deadline) => {
                    self.voting.expire(&self.store);
                }
                command = self.commands.recv() => match self.handle_in_round(command) {
                    Flow::Interrupt => {
                        self.voting.cancel();
                        return Ok(PhaseEvent::ForceEnd);
                    }
                    Flow::Voted => {
                        if let Some(handle) = &handle {
                            let options = self.nomination_options(&candidates);
                            if let Err(e) = self.transport.edit_prompt_options(handle, &options).await {
                                tracing::warn!(error = %e, "Failed to update tally");
                            }
                        }
                    }
                    Flow::Continue => {}
                },
            }
        };

        self.voting.close();
        self.disable_prompt(handle).await;
        tracing::info!(round = self.store.round(), nominee = ?nominee, "Nomination closed");
        let text = announce::nomination_result(&self.store, nominee);
        self.notify(Recipient::Group, &text).await;
        Ok(PhaseEvent::NominationClosed { nominee })
    }

    async fn run_trial(&mut self, nominee: ParticipantId) -> Result<PhaseEvent, EngineError> {
        let timeout = self.store.settings().trial_timeout;
        let mut rx = self.voting.open_trial(nominee, timeout);

        let prompt = Prompt {
            session_key: format!("trial:{}:{}", self.store.game(), self.store.round()),
            text: announce::trial_text(&self.store, nominee),
            options: [Verdict::Guilty, Verdict::Innocent]
                .into_iter()
                .map(|verdict| {
                    let vote = Vote::Verdict(verdict);
                    PromptOption {
                        value: vote.to_string(),
                        label: if verdict == Verdict::Guilty { "Guilty" } else { "Innocent" }
                            .to_string(),
                    }
                })
                .collect(),
        };
        let handle = match self.transport.send_prompt(Recipient::Group, &prompt).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "Trial prompt not delivered");
                None
            }
        };

        let result = loop {
            let deadline = self.voting.deadline();
            tokio::select! {
                biased;
                result = &mut rx => break result,
                () = until(deadline) => {
                    self.voting.expire(&self.store);
                }
                command = self.commands.recv() => {
                    if let Flow::Interrupt = self.handle_in_round(command) {
                        self.voting.cancel();
                        return Ok(PhaseEvent::ForceEnd);
                    }
                }
            }
        };
        self.voting.close();
        self.disable_prompt(handle).await;

        let verdict = result
            .ok()
            .flatten()
            .ok_or_else(|| EngineError::Inconsistent("trial closed without a verdict".to_string()))?;

        let mut outcome = None;
        if verdict.executes() {
            self.store.kill(nominee);
            outcome = win::evaluate(&mut self.store, Trigger::Execution { executed: nominee }).outcome;
        }
        tracing::info!(
            round = self.store.round(),
            %nominee,
            guilty = verdict.guilty,
            innocent = verdict.innocent,
            "Trial closed"
        );
        let text = announce::verdict_text(&self.store, &verdict);
        self.notify(Recipient::Group, &text).await;
        Ok(PhaseEvent::VerdictClosed { verdict, outcome })
    }
}

