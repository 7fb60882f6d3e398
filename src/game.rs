//! Game state: participants, roles, role memory and the store that owns them

pub mod action;
pub mod participant;
pub mod role;
pub mod role_state;
pub mod setup;
pub mod store;

pub use action::{ActionKind, RoundAction, RoundActions};
pub use participant::{Alignment, Participant, ParticipantId, RoundFlags};
pub use role::{Ability, Role};
pub use role_state::RoleStates;
pub use store::{AccessSnapshot, GameSnapshot, GameStore, LobbyError, ParticipantView};
