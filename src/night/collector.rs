//! Action collector
//!
//! Sends one prompt per eligible actor and races each against its own
//! timeout. All prompts of a night are awaited together on the calling task.

use super::options::{ability_for, choices_for, into_action, jail_targets, prompt_text, Choice};
use crate::config::GameSettings;
use crate::game::{Ability, GameStore, ParticipantId, Role, RoundAction, RoundActions};
use crate::pending::{ActionKey, ActionNamespace, PendingActions, Resolver};
use crate::runtime::traits::{Prompt, PromptHandle, PromptOption, Recipient, Transport};
use futures::future::join_all;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

const TIME_UP: &str = "Time is up. Your chance to act tonight has passed.";

/// One prompt: its key, wording and the choices it accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub key: ActionKey,
    pub text: String,
    choices: Vec<Choice>,
    /// Labels for `choices`, then one for `Skip`
    labels: Vec<PromptOption>,
}

impl Question {
    pub fn new(store: &GameStore, key: ActionKey, text: String, choices: Vec<Choice>) -> Self {
        let labels = choices
            .iter()
            .chain(std::iter::once(&Choice::Skip))
            .map(|c| c.to_option(store))
            .collect();
        Self {
            key,
            text,
            choices,
            labels,
        }
    }

    #[cfg(test)]
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    /// Every value a response may carry
    pub fn accepted(&self) -> Vec<Choice> {
        let mut accepted = self.choices.clone();
        accepted.push(Choice::Skip);
        accepted
    }

    fn without(&self, excluded: Choice) -> Self {
        let (choices, mut labels): (Vec<Choice>, Vec<PromptOption>) = self
            .choices
            .iter()
            .zip(&self.labels)
            .filter(|(c, _)| **c != excluded)
            .map(|(c, l)| (*c, l.clone()))
            .unzip();
        labels.extend(self.labels.last().cloned());
        Self {
            key: self.key,
            text: self.text.clone(),
            choices,
            labels,
        }
    }

    pub fn prompt(&self) -> Prompt {
        Prompt {
            session_key: self.key.to_string(),
            text: self.text.clone(),
            options: self.labels.clone(),
        }
    }
}

/// Everything needed to collect one actor's action
#[derive(Debug, Clone)]
pub struct PromptPlan {
    pub actor: ParticipantId,
    pub ability: Ability,
    pub question: Question,
    /// Second step of a two-step ability
    pub follow_up: Option<Question>,
    pub prisoner: Option<ParticipantId>,
    /// Applied when the actor lets the prompt time out
    pub fallback: Option<Choice>,
}

#[derive(Debug, Clone)]
pub struct JailPlan {
    pub jailer: ParticipantId,
    pub question: Question,
}

/// How a single prompt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Chosen(Choice),
    TimedOut,
    Undeliverable,
    /// The pending entry was dropped from under us (game reset)
    Cancelled,
}

/// The jailer's prisoner prompt, if the jailer can act tonight
pub fn plan_jail(store: &GameStore) -> Option<JailPlan> {
    let jailer = store.living_holder_of(Role::Jailer)?;
    if !store.roles.jailer.can_act_tonight {
        return None;
    }
    let candidates = jail_targets(store, jailer);
    if candidates.is_empty() {
        return None;
    }
    let round = store.round();
    Some(JailPlan {
        jailer,
        question: Question::new(
            store,
            ActionKey::new(ActionNamespace::Jail, store.game(), round, jailer),
            format!("Night {round}: who do you want to hold in jail tonight?"),
            candidates.into_iter().map(Choice::Target).collect(),
        ),
    })
}

/// Prompt plans for every participant with an ability tonight
pub fn plan_night<R: Rng + ?Sized>(store: &GameStore, rng: &mut R) -> Vec<PromptPlan> {
    let round = store.round();
    let mut plans = Vec::new();

    for participant in store.living() {
        let Some(ability) = ability_for(store, participant.id) else {
            continue;
        };
        let choices = choices_for(store, participant.id, ability);
        let needed = if ability == Ability::Compare { 2 } else { 1 };
        if choices.len() < needed {
            tracing::debug!(actor = %participant.id, ?ability, "No legal choices tonight");
            continue;
        }

        let fallback = if ability == Ability::Arson {
            let targets: Vec<Choice> = choices
                .iter()
                .copied()
                .filter(|c| matches!(c, Choice::Target(_)))
                .collect();
            targets.choose(rng).copied()
        } else {
            None
        };
        let follow_up = (ability == Ability::Compare).then(|| {
            Question::new(
                store,
                ActionKey::new(ActionNamespace::FollowUp, store.game(), round, participant.id),
                format!("Night {round}: now pick the second person to compare."),
                choices.clone(),
            )
        });
        let prisoner = if ability == Ability::Execute {
            store.roles.jailer.current_prisoner
        } else {
            None
        };

        plans.push(PromptPlan {
            actor: participant.id,
            ability,
            question: Question::new(
                store,
                ActionKey::new(ActionNamespace::Night, store.game(), round, participant.id),
                prompt_text(store, participant.id, ability),
                choices,
            ),
            follow_up,
            prisoner,
            fallback,
        });
    }
    plans
}

pub struct ActionCollector<T: Transport> {
    transport: Arc<T>,
    pending: Arc<PendingActions<Choice>>,
    action_timeout: Duration,
    second_step_timeout: Duration,
    jail_timeout: Duration,
}

impl<T: Transport> ActionCollector<T> {
    pub fn new(transport: Arc<T>, pending: Arc<PendingActions<Choice>>, settings: &GameSettings) -> Self {
        Self {
            transport,
            pending,
            action_timeout: settings.action_timeout,
            second_step_timeout: settings.second_step_timeout,
            jail_timeout: settings.jail_timeout,
        }
    }

    /// Asks the jailer for a prisoner. `None` when nobody is jailed.
    pub async fn collect_jail(&self, plan: &JailPlan) -> Option<ParticipantId> {
        match self.ask(plan.jailer, &plan.question, self.jail_timeout).await {
            Answer::Chosen(Choice::Target(prisoner)) => Some(prisoner),
            _ => None,
        }
    }

    /// Collects every plan concurrently.
    pub async fn collect_all(&self, plans: Vec<PromptPlan>) -> RoundActions {
        join_all(plans.into_iter().map(|plan| self.collect(plan)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    pub async fn collect(&self, plan: PromptPlan) -> Option<RoundAction> {
        let first = match self.ask(plan.actor, &plan.question, self.action_timeout).await {
            Answer::Chosen(choice) => choice,
            Answer::TimedOut => plan.fallback?,
            Answer::Undeliverable | Answer::Cancelled => return None,
        };

        let second = match (&plan.follow_up, first) {
            (Some(question), Choice::Target(_)) => {
                let question = question.without(first);
                match self.ask(plan.actor, &question, self.second_step_timeout).await {
                    Answer::Chosen(Choice::Target(second)) => Some(second),
                    _ => return None,
                }
            }
            _ => None,
        };

        let kind = into_action(plan.ability, first, second, plan.prisoner)?;
        Some(RoundAction {
            actor: plan.actor,
            kind,
        })
    }

    /// Registers, sends and awaits one prompt against `timeout`.
    pub async fn ask(&self, actor: ParticipantId, question: &Question, timeout: Duration) -> Answer {
        let key = question.key;
        let (resolver, mut rx) = Resolver::new(question.accepted());
        // Registered before sending so an instant reply is never lost
        self.pending.register(key, resolver);

        let handle = match self
            .transport
            .send_prompt(Recipient::Participant(actor), &question.prompt())
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(%key, error = %e, "Prompt undeliverable, treating as no action");
                self.pending.deregister(&key);
                return Answer::Undeliverable;
            }
        };
        tracing::debug!(%key, "Prompt dispatched");

        tokio::select! {
            biased;
            answer = &mut rx => match answer {
                Ok(choice) => Answer::Chosen(choice),
                Err(_) => Answer::Cancelled,
            },
            () = tokio::time::sleep(timeout) => {
                if !self.pending.deregister(&key) {
                    // A response landed between the timer and deregistration
                    return match rx.try_recv() {
                        Ok(choice) => Answer::Chosen(choice),
                        Err(_) => Answer::Cancelled,
                    };
                }
                tracing::info!(%key, "Prompt timed out");
                self.expire(actor, &handle).await;
                Answer::TimedOut
            }
        }
    }

    async fn expire(&self, actor: ParticipantId, handle: &PromptHandle) {
        if let Err(e) = self.transport.edit_prompt_options(handle, &[]).await {
            tracing::warn!(%actor, error = %e, "Failed to disable expired prompt");
        }
        if let Err(e) = self.transport.notify(Recipient::Participant(actor), TIME_UP).await {
            tracing::warn!(%actor, error = %e, "Failed to send timeout notice");
        }
    }
}
