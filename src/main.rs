//! Mafia engine - chat-driven social deduction game server
//!
//! A Rust backend running one game of Mafia as a phase state machine,
//! exposed over HTTP with an SSE stream for prompts and notices.

mod api;
mod config;
mod game;
mod night;
mod pending;
mod runtime;
mod state_machine;
mod voting;
mod win;

use api::{create_router, AppState};
use config::ServerConfig;
use runtime::{spawn_game, BroadcastTransport};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Outbound messages buffered per SSE client before it starts lagging
const BROADCAST_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mafia_engine=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ServerConfig::from_env();
    tracing::info!(
        port = config.port,
        min_players = config.settings.min_players,
        max_players = config.settings.max_players,
        random_roles = config.settings.random_roles,
        "Configuration loaded"
    );

    // One game per server
    let transport = Arc::new(BroadcastTransport::new(BROADCAST_CAPACITY));
    let game = spawn_game(config.settings, transport.clone());
    let state = AppState { game, transport };

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Mafia engine listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
