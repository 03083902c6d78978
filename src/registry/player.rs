use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::registry::game_match::MatchId;
use crate::util::vec2::Vec2;

/// Caller-supplied opaque player identifier
pub type PlayerId = String;

/// Player matchmaking state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerState {
    /// Connected, not part of any match
    NotInMatch,
    /// Created a match and is waiting for an opponent
    WaitingForPlayers,
    /// Paired with an opponent
    InMatch,
}

impl PlayerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerState::NotInMatch => "NOT_IN_MATCH",
            PlayerState::WaitingForPlayers => "WAITING_FOR_PLAYERS",
            PlayerState::InMatch => "IN_MATCH",
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connected player and its last known position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub address: IpAddr,
    pub position: Vec2,
    pub state: PlayerState,
    /// Match this player currently occupies
    pub match_id: Option<MatchId>,
}

impl Player {
    pub fn new(id: PlayerId, address: IpAddr, name: String) -> Self {
        Self {
            id,
            name,
            address,
            position: Vec2::ZERO,
            state: PlayerState::NotInMatch,
            match_id: None,
        }
    }

    /// Whether the player may create or join a match
    pub fn is_available(&self) -> bool {
        self.state == PlayerState::NotInMatch
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }
}

/// Position report for one tick. Only `position` is copied into the stored player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerUpdate {
    pub id: PlayerId,
    pub position: Vec2,
}

impl PlayerUpdate {
    pub fn new(id: impl Into<PlayerId>, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            position: Vec2::new(x, y),
        }
    }
}
