use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registry::player::PlayerId;

/// Generated match identifier
pub type MatchId = Uuid;

/// Match negotiation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchState {
    /// Slot 1 filled, waiting for an opponent
    WaitingForPlayers,
    /// Both slots filled
    Ready,
}

impl MatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchState::WaitingForPlayers => "WAITING_FOR_PLAYERS",
            MatchState::Ready => "READY",
        }
    }
}

impl fmt::Display for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pairing of two player slots.
///
/// Slots hold ids only; the player data itself lives in the registry.
#[derive(Debug, Clone)]
pub struct Match {
    pub id: MatchId,
    /// Slot 1, filled at creation
    pub player: PlayerId,
    /// Slot 2
    pub enemy: Option<PlayerId>,
    pub state: MatchState,
    pub created_at: Instant,
    /// Registry-assigned creation order, used for listing
    pub(crate) sequence: u64,
}

impl Match {
    pub fn new(player: PlayerId, sequence: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            player,
            enemy: None,
            state: MatchState::WaitingForPlayers,
            created_at: Instant::now(),
            sequence,
        }
    }

    /// Fill slot 2. No validation here; the registry checks preconditions.
    pub fn add_player(&mut self, enemy: PlayerId) {
        self.enemy = Some(enemy);
    }

    /// Whether `id` occupies either slot
    pub fn contains(&self, id: &str) -> bool {
        self.player == id || self.enemy.as_deref() == Some(id)
    }

    /// Id in the other slot from `id`'s point of view
    pub fn opponent_of(&self, id: &str) -> Option<&PlayerId> {
        if self.player == id {
            self.enemy.as_ref()
        } else if self.enemy.as_deref() == Some(id) {
            Some(&self.player)
        } else {
            None
        }
    }

    /// Ids of all filled slots
    pub fn player_ids(&self) -> impl Iterator<Item = &PlayerId> {
        std::iter::once(&self.player).chain(self.enemy.iter())
    }

    pub fn is_full(&self) -> bool {
        self.enemy.is_some()
    }

    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }
}
