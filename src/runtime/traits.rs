//! Trait abstractions for the chat transport
//!
//! The engine never talks to a chat service directly; everything outbound
//! goes through `Transport` so the executor can be tested against a mock.

use crate::game::ParticipantId;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Private channel to one participant, or the shared group channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "to", content = "id", rename_all = "snake_case")]
pub enum Recipient {
    Participant(ParticipantId),
    Group,
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Participant(id) => write!(f, "participant {id}"),
            Recipient::Group => f.write_str("group"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptOption {
    /// Echoed back verbatim as the response value
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub session_key: String,
    pub text: String,
    pub options: Vec<PromptOption>,
}

/// Transport-assigned handle used to edit a prompt after it was sent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PromptHandle(pub String);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Delivery to {recipient} failed: {reason}")]
    Delivery { recipient: Recipient, reason: String },
    #[error("Unknown prompt handle: {0}")]
    UnknownPrompt(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a prompt with selectable options
    async fn send_prompt(
        &self,
        recipient: Recipient,
        prompt: &Prompt,
    ) -> Result<PromptHandle, TransportError>;

    /// Replace a sent prompt's options (empty disables it)
    async fn edit_prompt_options(
        &self,
        handle: &PromptHandle,
        options: &[PromptOption],
    ) -> Result<(), TransportError>;

    /// Plain text message
    async fn notify(&self, recipient: Recipient, text: &str) -> Result<(), TransportError>;
}

// ============================================================================
// Arc implementation for shared transports
// ============================================================================

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send_prompt(
        &self,
        recipient: Recipient,
        prompt: &Prompt,
    ) -> Result<PromptHandle, TransportError> {
        (**self).send_prompt(recipient, prompt).await
    }

    async fn edit_prompt_options(
        &self,
        handle: &PromptHandle,
        options: &[PromptOption],
    ) -> Result<(), TransportError> {
        (**self).edit_prompt_options(handle, options).await
    }

    async fn notify(&self, recipient: Recipient, text: &str) -> Result<(), TransportError> {
        (**self).notify(recipient, text).await
    }
}

// ============================================================================
// Production Adapter
// ============================================================================

/// Everything the engine says, as published to connected clients
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Prompt {
        handle: PromptHandle,
        recipient: Recipient,
        prompt: Prompt,
    },
    PromptEdited {
        handle: PromptHandle,
        options: Vec<PromptOption>,
    },
    Notice {
        recipient: Recipient,
        text: String,
    },
}

/// Publishes outbound traffic on a broadcast channel. Clients (the SSE
/// stream) filter by recipient; responses come back through the HTTP API.
#[derive(Debug, Clone)]
pub struct BroadcastTransport {
    tx: broadcast::Sender<OutboundMessage>,
}

impl BroadcastTransport {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OutboundMessage> {
        self.tx.subscribe()
    }

    fn publish(&self, recipient: Recipient, message: OutboundMessage) -> Result<(), TransportError> {
        self.tx
            .send(message)
            .map(|_| ())
            .map_err(|_| TransportError::Delivery {
                recipient,
                reason: "no connected clients".to_string(),
            })
    }
}

#[async_trait]
impl Transport for BroadcastTransport {
    async fn send_prompt(
        &self,
        recipient: Recipient,
        prompt: &Prompt,
    ) -> Result<PromptHandle, TransportError> {
        let handle = PromptHandle(uuid::Uuid::new_v4().to_string());
        self.publish(
            recipient,
            OutboundMessage::Prompt {
                handle: handle.clone(),
                recipient,
                prompt: prompt.clone(),
            },
        )?;
        Ok(handle)
    }

    async fn edit_prompt_options(
        &self,
        handle: &PromptHandle,
        options: &[PromptOption],
    ) -> Result<(), TransportError> {
        self.publish(
            Recipient::Group,
            OutboundMessage::PromptEdited {
                handle: handle.clone(),
                options: options.to_vec(),
            },
        )
    }

    async fn notify(&self, recipient: Recipient, text: &str) -> Result<(), TransportError> {
        self.publish(
            recipient,
            OutboundMessage::Notice {
                recipient,
                text: text.to_string(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_publishes_prompts() {
        let transport = BroadcastTransport::new(8);
        let mut rx = transport.subscribe();
        let prompt = Prompt {
            session_key: "night:1:1:2".to_string(),
            text: "Pick".to_string(),
            options: vec![PromptOption {
                value: "skip".to_string(),
                label: "Skip".to_string(),
            }],
        };

        let handle = transport
            .send_prompt(Recipient::Participant(ParticipantId(2)), &prompt)
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            OutboundMessage::Prompt { handle: h, recipient, prompt: p } => {
                assert_eq!(h, handle);
                assert_eq!(recipient, Recipient::Participant(ParticipantId(2)));
                assert_eq!(p, prompt);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_listeners_is_a_delivery_failure() {
        let transport = BroadcastTransport::new(8);
        let result = transport.notify(Recipient::Group, "hello").await;
        assert!(matches!(result, Err(TransportError::Delivery { .. })));
    }
}
