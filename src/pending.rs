//! Pending-action table
//!
//! Maps a prompt's session key to the one-shot resolver awaiting its answer.
//! `resolve` and `deregister` both remove the entry under the same lock, so
//! whichever reaches it first wins and the other becomes a no-op.

use crate::game::ParticipantId;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionNamespace {
    /// Jailer choosing a prisoner
    Jail,
    Night,
    /// Second step of a two-step ability
    FollowUp,
}

impl ActionNamespace {
    fn as_str(self) -> &'static str {
        match self {
            ActionNamespace::Jail => "jail",
            ActionNamespace::Night => "night",
            ActionNamespace::FollowUp => "followup",
        }
    }
}

/// Identifies one outstanding prompt: `namespace:game:round:actor`
///
/// The game number keeps a button left over from a reset game from
/// matching the same seat's prompt in the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionKey {
    pub namespace: ActionNamespace,
    pub game: u32,
    pub round: u32,
    pub actor: ParticipantId,
}

impl ActionKey {
    pub fn new(namespace: ActionNamespace, game: u32, round: u32, actor: ParticipantId) -> Self {
        Self {
            namespace,
            game,
            round,
            actor,
        }
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.namespace.as_str(),
            self.game,
            self.round,
            self.actor
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Malformed session key: {0}")]
pub struct MalformedKey(String);

impl FromStr for ActionKey {
    type Err = MalformedKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || MalformedKey(s.to_string());
        let mut parts = s.splitn(4, ':');
        let namespace = match parts.next() {
            Some("jail") => ActionNamespace::Jail,
            Some("night") => ActionNamespace::Night,
            Some("followup") => ActionNamespace::FollowUp,
            _ => return Err(malformed()),
        };
        let game = parts.next().and_then(|g| g.parse().ok()).ok_or_else(malformed)?;
        let round = parts.next().and_then(|r| r.parse().ok()).ok_or_else(malformed)?;
        let actor = parts.next().and_then(|a| a.parse().ok()).ok_or_else(malformed)?;
        Ok(Self::new(namespace, game, round, actor))
    }
}

/// What became of an incoming response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Accepted,
    /// Nothing is waiting on this key any more (timed out, answered, or the
    /// game was reset)
    Stale,
    /// The value is not one of the prompt's options
    Malformed,
}

/// One-shot completion for a prompt plus the values it accepts
pub struct Resolver<V> {
    sender: oneshot::Sender<V>,
    accepts: Vec<V>,
}

impl<V> Resolver<V> {
    /// An empty `accepts` list takes any value.
    pub fn new(accepts: Vec<V>) -> (Self, oneshot::Receiver<V>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender, accepts }, receiver)
    }
}

pub struct PendingActions<V> {
    entries: Mutex<HashMap<ActionKey, Resolver<V>>>,
}

impl<V: PartialEq> Default for PendingActions<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: PartialEq> PendingActions<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ActionKey, Resolver<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Installs a resolver. An existing entry under the same key is dropped,
    /// which completes its receiver with an error.
    pub fn register(&self, key: ActionKey, resolver: Resolver<V>) {
        if self.lock().insert(key, resolver).is_some() {
            tracing::warn!(%key, "Replaced an outstanding prompt");
        }
    }

    /// Completes the entry for `key` with `value` and removes it.
    pub fn resolve(&self, key: &ActionKey, value: V) -> ResponseStatus {
        let resolver = {
            let mut entries = self.lock();
            match entries.get(key) {
                None => return ResponseStatus::Stale,
                Some(r) if !r.accepts.is_empty() && !r.accepts.contains(&value) => {
                    return ResponseStatus::Malformed;
                }
                Some(_) => {}
            }
            match entries.remove(key) {
                Some(resolver) => resolver,
                None => return ResponseStatus::Stale,
            }
        };

        // The waiting side may already have given up
        match resolver.sender.send(value) {
            Ok(()) => ResponseStatus::Accepted,
            Err(_) => ResponseStatus::Stale,
        }
    }

    /// Removes the entry without completing it. Returns false if a response
    /// (or a clear) got there first.
    pub fn deregister(&self, key: &ActionKey) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Drops every outstanding entry; returns how many there were.
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    #[cfg(test)]
    pub fn contains(&self, key: &ActionKey) -> bool {
        self.lock().contains_key(key)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
