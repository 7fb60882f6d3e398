//! API request and response types

use crate::game::ParticipantId;
use crate::pending::ResponseStatus;
use serde::{Deserialize, Serialize};

/// Request to take a seat in the lobby
#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub id: ParticipantId,
    pub name: String,
}

/// Request naming a single participant
#[derive(Debug, Deserialize)]
pub struct ParticipantRequest {
    pub id: ParticipantId,
}

/// Request to append a line to a will
#[derive(Debug, Deserialize)]
pub struct WillRequest {
    pub id: ParticipantId,
    pub line: String,
}

/// A button press on a prompt
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub session_key: String,
    pub value: String,
}

/// A day vote, e.g. `nominate:3` or `guilty`
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub voter: ParticipantId,
    pub choice: String,
}

/// Narrows the event stream to one participant's view
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub participant: Option<ParticipantId>,
}

#[derive(Debug, Serialize)]
pub struct LeaveResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_host: Option<ParticipantId>,
}

#[derive(Debug, Serialize)]
pub struct RespondResponse {
    pub status: ResponseStatus,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
