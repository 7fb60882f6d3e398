//! HTTP API for the game
//!
//! Reference transport: prompts and notices go out over SSE, button
//! presses and votes come back as JSON posts.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::runtime::{BroadcastTransport, GameHandle};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub game: GameHandle,
    pub transport: Arc<BroadcastTransport>,
}
