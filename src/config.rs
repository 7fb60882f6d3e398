//! Process and per-game configuration
//!
//! Everything is read from the environment with defaults, so a bare
//! `cargo run` starts a playable server.

use crate::game::Role;
use std::time::Duration;

/// Knobs that shape a single game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    pub min_players: usize,
    pub max_players: usize,
    pub action_timeout: Duration,
    /// Second step of two-step abilities (Investigator's comparison)
    pub second_step_timeout: Duration,
    pub jail_timeout: Duration,
    pub nomination_timeout: Duration,
    pub trial_timeout: Duration,
    /// Ambushed visitors a living Baiter needs to share the win
    pub baiter_win_visits: u32,
    pub jailer_executions: u8,
    /// Explicit lineup; used only when its length matches the player count
    pub roles: Option<Vec<Role>>,
    /// When false, roles are handed out in seat order (debugging and tests)
    pub random_roles: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            min_players: 4,
            max_players: 17,
            action_timeout: Duration::from_secs(45),
            second_step_timeout: Duration::from_secs(20),
            jail_timeout: Duration::from_secs(30),
            nomination_timeout: Duration::from_secs(60),
            trial_timeout: Duration::from_secs(45),
            baiter_win_visits: 3,
            jailer_executions: 3,
            roles: None,
            random_roles: true,
        }
    }
}

impl GameSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_players: env_parse("MAFIA_MIN_PLAYERS").unwrap_or(defaults.min_players),
            max_players: env_parse("MAFIA_MAX_PLAYERS").unwrap_or(defaults.max_players),
            action_timeout: env_secs("MAFIA_ACTION_TIMEOUT_SECS")
                .unwrap_or(defaults.action_timeout),
            second_step_timeout: env_secs("MAFIA_SECOND_STEP_TIMEOUT_SECS")
                .unwrap_or(defaults.second_step_timeout),
            jail_timeout: env_secs("MAFIA_JAIL_TIMEOUT_SECS").unwrap_or(defaults.jail_timeout),
            nomination_timeout: env_secs("MAFIA_NOMINATION_TIMEOUT_SECS")
                .unwrap_or(defaults.nomination_timeout),
            trial_timeout: env_secs("MAFIA_TRIAL_TIMEOUT_SECS").unwrap_or(defaults.trial_timeout),
            baiter_win_visits: env_parse("MAFIA_BAITER_WIN_VISITS")
                .unwrap_or(defaults.baiter_win_visits),
            jailer_executions: env_parse("MAFIA_JAILER_EXECUTIONS")
                .unwrap_or(defaults.jailer_executions),
            roles: std::env::var("MAFIA_ROLES").ok().and_then(|raw| parse_roles(&raw)),
            random_roles: env_parse("MAFIA_RANDOM_ROLES").unwrap_or(defaults.random_roles),
        }
    }
}

/// Server-level configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub settings: GameSettings,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_parse("MAFIA_PORT").unwrap_or(8000),
            settings: GameSettings::from_env(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "Ignoring unparseable setting");
            None
        }
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    env_parse::<u64>(name).map(Duration::from_secs)
}

/// Comma-separated role names, e.g. `godfather,doctor,detective,villager`
fn parse_roles(raw: &str) -> Option<Vec<Role>> {
    let parsed: Result<Vec<Role>, _> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect();
    match parsed {
        Ok(roles) if !roles.is_empty() => Some(roles),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring MAFIA_ROLES");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roles() {
        assert_eq!(
            parse_roles("godfather, doctor,villager"),
            Some(vec![Role::Godfather, Role::Doctor, Role::Villager])
        );
        assert_eq!(parse_roles(""), None);
        assert_eq!(parse_roles("godfather,wizard"), None);
    }

    #[test]
    fn test_defaults_are_playable() {
        let settings = GameSettings::default();
        assert!(settings.min_players <= settings.max_players);
        assert!(settings.second_step_timeout < settings.action_timeout);
        assert!(settings.random_roles);
    }
}
