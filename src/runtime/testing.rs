//! Mock implementations for testing
//!
//! A recording transport plus a harness that drives a whole game through
//! its handle, the way a chat adapter would.

use super::traits::*;
use crate::game::ParticipantId;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Mock Transport
// ============================================================================

#[derive(Debug, Clone)]
pub struct SentPrompt {
    pub recipient: Recipient,
    pub prompt: Prompt,
    pub handle: PromptHandle,
}

/// Records everything the engine sends. Participants marked unreachable
/// fail every delivery.
#[derive(Default)]
pub struct MockTransport {
    prompts: Mutex<Vec<SentPrompt>>,
    edits: Mutex<Vec<(PromptHandle, Vec<PromptOption>)>>,
    notices: Mutex<Vec<(Recipient, String)>>,
    unreachable: Mutex<HashSet<ParticipantId>>,
    next_handle: AtomicU64,
    sent: Notify,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unreachable(&self, id: ParticipantId) {
        self.unreachable.lock().unwrap().insert(id);
    }

    pub fn prompts(&self) -> Vec<SentPrompt> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<(PromptHandle, Vec<PromptOption>)> {
        self.edits.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<(Recipient, String)> {
        self.notices.lock().unwrap().clone()
    }

    pub fn notices_to(&self, recipient: Recipient) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| *to == recipient)
            .map(|(_, text)| text.clone())
            .collect()
    }

    fn find_prompt(&self, session_key: &str) -> Option<SentPrompt> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|p| p.prompt.session_key == session_key)
            .cloned()
    }

    fn find_notice(&self, recipient: Recipient, needle: &str) -> Option<String> {
        self.notices_to(recipient)
            .into_iter()
            .find(|text| text.contains(needle))
    }

    /// Waits until a prompt with this session key has been sent
    pub async fn wait_for_prompt(&self, session_key: &str, timeout: Duration) -> Option<SentPrompt> {
        tokio::time::timeout(timeout, async {
            loop {
                let sent = self.sent.notified();
                if let Some(prompt) = self.find_prompt(session_key) {
                    return prompt;
                }
                sent.await;
            }
        })
        .await
        .ok()
    }

    /// Waits until a notice containing `needle` reaches `recipient`
    pub async fn wait_for_notice(
        &self,
        recipient: Recipient,
        needle: &str,
        timeout: Duration,
    ) -> Option<String> {
        tokio::time::timeout(timeout, async {
            loop {
                let sent = self.sent.notified();
                if let Some(text) = self.find_notice(recipient, needle) {
                    return text;
                }
                sent.await;
            }
        })
        .await
        .ok()
    }

    fn check_reachable(&self, recipient: Recipient) -> Result<(), TransportError> {
        match recipient {
            Recipient::Participant(id) if self.unreachable.lock().unwrap().contains(&id) => {
                Err(TransportError::Delivery {
                    recipient,
                    reason: "blocked direct messages".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_prompt(
        &self,
        recipient: Recipient,
        prompt: &Prompt,
    ) -> Result<PromptHandle, TransportError> {
        self.check_reachable(recipient)?;
        let handle = PromptHandle(format!(
            "mock-{}",
            self.next_handle.fetch_add(1, Ordering::Relaxed)
        ));
        self.prompts.lock().unwrap().push(SentPrompt {
            recipient,
            prompt: prompt.clone(),
            handle: handle.clone(),
        });
        self.sent.notify_waiters();
        Ok(handle)
    }

    async fn edit_prompt_options(
        &self,
        handle: &PromptHandle,
        options: &[PromptOption],
    ) -> Result<(), TransportError> {
        if !self.prompts.lock().unwrap().iter().any(|p| p.handle == *handle) {
            return Err(TransportError::UnknownPrompt(handle.0.clone()));
        }
        self.edits
            .lock()
            .unwrap()
            .push((handle.clone(), options.to_vec()));
        Ok(())
    }

    async fn notify(&self, recipient: Recipient, text: &str) -> Result<(), TransportError> {
        self.check_reachable(recipient)?;
        self.notices
            .lock()
            .unwrap()
            .push((recipient, text.to_string()));
        self.sent.notify_waiters();
        Ok(())
    }
}

// ============================================================================
// Whole-game tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameSettings;
    use crate::game::{Alignment, LobbyError, Role};
    use crate::pending::ResponseStatus;
    use crate::runtime::{spawn_game, CommandError, GameHandle};
    use crate::state_machine::{Phase, TransitionError};
    use crate::voting::VoteError;
    use crate::win::Winner;
    use std::sync::Arc;

    const WAIT: Duration = Duration::from_secs(3);
    const NAMES: [&str; 6] = ["Ann", "Bo", "Cy", "Di", "Ed", "Flo"];

    fn id(n: u64) -> ParticipantId {
        ParticipantId(n)
    }

    struct TestGame {
        handle: GameHandle,
        transport: Arc<MockTransport>,
    }

    impl TestGame {
        /// Seats one participant per role, dealt in joining order
        async fn seated(roles: &[Role]) -> Self {
            let settings = GameSettings {
                action_timeout: Duration::from_millis(200),
                second_step_timeout: Duration::from_millis(200),
                jail_timeout: Duration::from_millis(200),
                nomination_timeout: Duration::from_millis(400),
                trial_timeout: Duration::from_millis(300),
                roles: Some(roles.to_vec()),
                random_roles: false,
                ..GameSettings::default()
            };
            let transport = Arc::new(MockTransport::new());
            let handle = spawn_game(settings, transport.clone());
            for (i, name) in NAMES.iter().take(roles.len()).enumerate() {
                handle.join(id(i as u64 + 1), *name).await.unwrap();
            }
            Self { handle, transport }
        }

        async fn started(roles: &[Role]) -> Self {
            let game = Self::seated(roles).await;
            game.handle.start().await.unwrap();
            game
        }

        async fn prompt(&self, session_key: &str) -> SentPrompt {
            self.transport
                .wait_for_prompt(session_key, WAIT)
                .await
                .unwrap_or_else(|| panic!("no prompt {session_key}"))
        }

        async fn group_notice(&self, needle: &str) -> String {
            self.transport
                .wait_for_notice(Recipient::Group, needle, WAIT)
                .await
                .unwrap_or_else(|| panic!("no group notice containing {needle:?}"))
        }

        async fn answer(&self, session_key: &str, value: &str) {
            self.prompt(session_key).await;
            assert_eq!(self.handle.respond(session_key, value), ResponseStatus::Accepted);
        }
    }

    #[tokio::test]
    async fn test_start_needs_four_players() {
        let game = TestGame::seated(&[Role::Godfather, Role::Doctor, Role::Villager]).await;
        let err = game.handle.start().await.unwrap_err();
        assert_eq!(
            err,
            CommandError::Transition(TransitionError::Lobby(LobbyError::NotEnoughPlayers {
                needed: 4,
                have: 3
            }))
        );
    }

    #[tokio::test]
    async fn test_vote_with_no_session() {
        let game = TestGame::seated(&[Role::Godfather, Role::Doctor, Role::Villager, Role::Villager]).await;
        let err = game.handle.submit_vote(id(1), "nominate:2").await.unwrap_err();
        assert_eq!(err, CommandError::Vote(VoteError::NoActiveSession));
        let err = game.handle.submit_vote(id(1), "abstain").await.unwrap_err();
        assert!(matches!(err, CommandError::Vote(VoteError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_saved_victim_and_detective_result() {
        let game = TestGame::started(&[
            Role::Godfather,
            Role::Doctor,
            Role::Detective,
            Role::Villager,
            Role::Villager,
        ])
        .await;

        // Roles arrive privately before the night opens
        let intro = game.transport.notices_to(Recipient::Participant(id(2)));
        assert!(intro.iter().any(|t| t.starts_with("You are the Doctor")));

        game.answer("night:1:1:1", "target:4").await;
        game.answer("night:1:1:2", "target:4").await;
        game.answer("night:1:1:3", "target:1").await;

        let summary = game.group_notice("Di was attacked but survived.").await;
        assert!(!summary.contains("killed"));
        let result = game
            .transport
            .wait_for_notice(Recipient::Participant(id(3)), "Ann sides with", WAIT)
            .await
            .unwrap();
        // The Godfather passes for a villager
        assert_eq!(result, "Ann sides with the Village.");

        game.prompt("nomination:1:1").await;
        let snapshot = game.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, Phase::Day { round: 1 });
        assert_eq!(snapshot.alive_count, 5);

        game.handle.force_end().await.unwrap();
    }

    #[tokio::test]
    async fn test_silent_night_times_out() {
        let game = TestGame::started(&[Role::Godfather, Role::Doctor, Role::Villager, Role::Villager]).await;

        game.prompt("nomination:1:1").await;
        game.group_notice("The night passed quietly.").await;
        let to_doctor = game.transport.notices_to(Recipient::Participant(id(2)));
        assert!(to_doctor.iter().any(|t| t.starts_with("Time is up")));
        // Expired prompts lose their buttons
        let night_handles: Vec<PromptHandle> = game
            .transport
            .prompts()
            .into_iter()
            .filter(|p| p.prompt.session_key.starts_with("night:"))
            .map(|p| p.handle)
            .collect();
        assert_eq!(night_handles.len(), 2);
        for handle in night_handles {
            assert!(game
                .transport
                .edits()
                .iter()
                .any(|(edited, options)| *edited == handle && options.is_empty()));
        }

        assert_eq!(game.handle.respond("night:1:1:2", "target:3"), ResponseStatus::Stale);
        game.handle.force_end().await.unwrap();
    }

    #[tokio::test]
    async fn test_force_end_mid_night() {
        let game = TestGame::started(&[Role::Godfather, Role::Doctor, Role::Villager, Role::Villager]).await;
        game.prompt("night:1:1:1").await;

        let err = game.handle.join(id(9), "Late").await.unwrap_err();
        assert_eq!(err, CommandError::Lobby(LobbyError::GameInProgress));

        game.handle.force_end().await.unwrap();
        let snapshot = game.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, Phase::Lobby);
        assert_eq!(snapshot.participants.len(), 4);
        assert!(snapshot.participants.iter().all(|p| p.alive && p.role.is_none()));

        assert_eq!(game.handle.respond("night:1:1:1", "target:3"), ResponseStatus::Stale);
        game.group_notice("The game was ended by the host.").await;

        let err = game.handle.force_end().await.unwrap_err();
        assert_eq!(err, CommandError::Transition(TransitionError::NoGameInProgress));

        // Same table, new deal
        game.handle.start().await.unwrap();
        game.prompt("night:2:1:1").await;
        game.handle.force_end().await.unwrap();
    }

    #[tokio::test]
    async fn test_button_from_previous_game_is_stale() {
        let game = TestGame::started(&[Role::Godfather, Role::Doctor, Role::Villager, Role::Villager]).await;
        game.prompt("night:1:1:1").await;
        game.handle.force_end().await.unwrap();

        game.handle.start().await.unwrap();
        game.prompt("night:2:1:1").await;
        assert_eq!(game.handle.snapshot().await.unwrap().game, 2);

        // Same seat, same night number, earlier game
        assert_eq!(game.handle.respond("night:1:1:1", "target:3"), ResponseStatus::Stale);
        assert_eq!(game.handle.respond("night:2:1:1", "target:3"), ResponseStatus::Accepted);
        game.handle.force_end().await.unwrap();
    }

    #[tokio::test]
    async fn test_mafia_parity_wins_at_night() {
        let game = TestGame::started(&[Role::Godfather, Role::Mafioso, Role::Villager, Role::Villager]).await;
        game.answer("night:1:1:1", "target:3").await;

        game.group_notice("The Mafia wins!").await;
        let snapshot = game.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, Phase::Lobby);
        let outcome = snapshot.last_outcome.expect("outcome kept after reset");
        assert_eq!(
            outcome.winner,
            Winner::Faction {
                alignment: Alignment::Mafia
            }
        );
    }

    #[tokio::test]
    async fn test_jester_voted_out_wins() {
        let game = TestGame::started(&[
            Role::Godfather,
            Role::Jester,
            Role::Villager,
            Role::Villager,
            Role::Villager,
        ])
        .await;

        game.prompt("nomination:1:1").await;
        // Five alive: three votes put someone on trial
        let ack = game.handle.submit_vote(id(1), "nominate:2").await.unwrap();
        assert!(!ack.resolved);
        assert_eq!(
            game.handle.submit_vote(id(2), "nominate:2").await.unwrap_err(),
            CommandError::Vote(VoteError::SelfVote)
        );
        game.handle.submit_vote(id(3), "nominate:2").await.unwrap();
        let ack = game.handle.submit_vote(id(4), "nominate:2").await.unwrap();
        assert!(ack.resolved);

        game.prompt("trial:1:1").await;
        assert_eq!(
            game.handle.submit_vote(id(2), "innocent").await.unwrap_err(),
            CommandError::Vote(VoteError::NomineeVoting)
        );
        for voter in [1, 3, 4] {
            game.handle.submit_vote(id(voter), "guilty").await.unwrap();
        }

        game.group_notice("Bo has been executed (3 guilty, 0 innocent).").await;
        game.group_notice("Bo the Jester fooled everyone and wins!").await;
        let snapshot = game.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, Phase::Lobby);
        assert_eq!(snapshot.last_outcome.unwrap().winner, Winner::Jester { id: id(2) });
    }

    #[tokio::test]
    async fn test_acquittal_leads_to_next_night() {
        let game = TestGame::started(&[Role::Godfather, Role::Doctor, Role::Villager, Role::Villager]).await;

        game.prompt("nomination:1:1").await;
        // Four alive: two votes are enough
        game.handle.submit_vote(id(2), "nominate:1").await.unwrap();
        let ack = game.handle.submit_vote(id(3), "nominate:1").await.unwrap();
        assert!(ack.resolved);
        game.prompt("trial:1:1").await;
        game.handle.submit_vote(id(2), "guilty").await.unwrap();
        game.handle.submit_vote(id(3), "innocent").await.unwrap();
        game.handle.submit_vote(id(4), "innocent").await.unwrap();

        game.group_notice("Ann was spared").await;
        game.prompt("night:1:2:1").await;
        let snapshot = game.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, Phase::Night { round: 2 });
        game.handle.force_end().await.unwrap();
    }
}
