//! Server-Sent Events support
//!
//! Streams outbound prompts and notices. A stream opened for a participant
//! only carries group traffic plus what was addressed to them.

use crate::game::ParticipantId;
use crate::runtime::{OutboundMessage, Recipient};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream
pub fn sse_stream(
    broadcast_rx: broadcast::Receiver<OutboundMessage>,
    viewer: Option<ParticipantId>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = BroadcastStream::new(broadcast_rx).filter_map(move |result| match result {
        Ok(message) if visible_to(&message, viewer) => Some(Ok(to_event(&message))),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "SSE client lagged, messages skipped");
            None
        }
    });

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Unfiltered streams see everything; edits follow their prompt's audience
/// client-side, so they always pass.
fn visible_to(message: &OutboundMessage, viewer: Option<ParticipantId>) -> bool {
    let Some(viewer) = viewer else {
        return true;
    };
    match message {
        OutboundMessage::Prompt { recipient, .. } | OutboundMessage::Notice { recipient, .. } => {
            match recipient {
                Recipient::Group => true,
                Recipient::Participant(id) => *id == viewer,
            }
        }
        OutboundMessage::PromptEdited { .. } => true,
    }
}

fn to_event(message: &OutboundMessage) -> Event {
    let event_type = match message {
        OutboundMessage::Prompt { .. } => "prompt",
        OutboundMessage::PromptEdited { .. } => "prompt_edited",
        OutboundMessage::Notice { .. } => "notice",
    };
    Event::default()
        .event(event_type)
        .json_data(message)
        .unwrap_or_else(|_| Event::default().event("error").data("unserializable message"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::PromptHandle;

    fn notice(recipient: Recipient) -> OutboundMessage {
        OutboundMessage::Notice {
            recipient,
            text: "hi".to_string(),
        }
    }

    #[test]
    fn test_private_traffic_is_filtered() {
        let me = Some(ParticipantId(1));
        assert!(visible_to(&notice(Recipient::Group), me));
        assert!(visible_to(&notice(Recipient::Participant(ParticipantId(1))), me));
        assert!(!visible_to(&notice(Recipient::Participant(ParticipantId(2))), me));
        assert!(visible_to(&notice(Recipient::Participant(ParticipantId(2))), None));

        let edit = OutboundMessage::PromptEdited {
            handle: PromptHandle("h".to_string()),
            options: vec![],
        };
        assert!(visible_to(&edit, me));
    }
}
