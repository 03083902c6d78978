//! Player and match registry
//!
//! Tracks connected players, pairs them into two-player matches, and relays
//! per-tick positions between opponents.

pub mod game_match;
pub mod manager;
pub mod player;

pub use game_match::{Match, MatchId, MatchState};
pub use manager::{MatchTableRow, Registry, RegistryError, RegistryGauges, WAITING_PLACEHOLDER};
pub use player::{Player, PlayerId, PlayerState, PlayerUpdate};
