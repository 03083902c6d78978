use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::metrics::RegistryMetrics;
use crate::registry::game_match::{Match, MatchId, MatchState};
use crate::registry::player::{Player, PlayerId, PlayerState, PlayerUpdate};

/// Shown in the enemy column while slot 2 is empty
pub const WAITING_PLACEHOLDER: &str = "Waiting for player";

/// Store of connected players and their matches.
///
/// Lock order is always players, then matches. Operations that check a state
/// and then mutate it hold both write guards for the whole sequence.
pub struct Registry {
    config: RegistryConfig,
    players: RwLock<HashMap<PlayerId, Player>>,
    matches: RwLock<HashMap<MatchId, Match>>,
    next_sequence: AtomicU64,
    metrics: Arc<RegistryMetrics>,
}

impl Registry {
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_metrics(config, Arc::new(RegistryMetrics::new()))
    }

    pub fn with_metrics(config: RegistryConfig, metrics: Arc<RegistryMetrics>) -> Self {
        Self {
            config,
            players: RwLock::new(HashMap::new()),
            matches: RwLock::new(HashMap::new()),
            next_sequence: AtomicU64::new(0),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<RegistryMetrics> {
        &self.metrics
    }

    /// Register a newly connected player. Duplicate ids are rejected, never overwritten.
    pub fn create_player(
        &self,
        id: impl Into<PlayerId>,
        address: IpAddr,
    ) -> Result<(), RegistryError> {
        let id = id.into();
        let mut players = self.players.write();

        if players.contains_key(&id) {
            return Err(self.reject(RegistryError::DuplicatePlayer(id)));
        }
        if players.len() >= self.config.max_players {
            return Err(self.reject(RegistryError::TooManyPlayers));
        }

        let player = Player::new(id.clone(), address, self.config.default_player_name.clone());
        players.insert(id.clone(), player);
        drop(players);

        self.metrics.players_connected.fetch_add(1, Ordering::Relaxed);
        info!("Player {} connected from {}", id, address);
        Ok(())
    }

    /// Set a player's display name
    pub fn rename_player(&self, id: &str, name: &str) -> Result<(), RegistryError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > self.config.max_name_len {
            return Err(self.reject(RegistryError::InvalidName));
        }

        let mut players = self.players.write();
        let player = players
            .get_mut(id)
            .ok_or_else(|| self.reject(RegistryError::PlayerNotFound(id.to_string())))?;
        player.name = name.to_string();
        Ok(())
    }

    /// Open a new match with `player_id` in slot 1
    pub fn create_match(&self, player_id: &str) -> Result<MatchId, RegistryError> {
        let mut players = self.players.write();
        let mut matches = self.matches.write();

        let player = players
            .get_mut(player_id)
            .ok_or_else(|| self.reject(RegistryError::PlayerNotFound(player_id.to_string())))?;

        self.open_match(&mut matches, player)
            .map_err(|e| self.reject(e))
    }

    /// Fill slot 2 of a waiting match
    pub fn join_match(&self, match_id: MatchId, player_id: &str) -> Result<(), RegistryError> {
        let mut players = self.players.write();
        let mut matches = self.matches.write();

        let game = matches
            .get_mut(&match_id)
            .ok_or_else(|| self.reject(RegistryError::MatchNotFound(match_id)))?;
        let enemy_state = players
            .get(player_id)
            .map(|p| p.state)
            .ok_or_else(|| self.reject(RegistryError::PlayerNotFound(player_id.to_string())))?;

        if game.state != MatchState::WaitingForPlayers {
            return Err(self.reject(RegistryError::InvalidMatchState {
                id: match_id,
                state: game.state,
            }));
        }
        if enemy_state != PlayerState::NotInMatch {
            return Err(self.reject(RegistryError::InvalidPlayerState {
                id: player_id.to_string(),
                state: enemy_state,
            }));
        }

        self.pair(game, &mut players, player_id);
        Ok(())
    }

    /// Quick play: join the oldest waiting match, or open a new one
    pub fn find_or_create_match(&self, player_id: &str) -> Result<MatchId, RegistryError> {
        let mut players = self.players.write();
        let mut matches = self.matches.write();

        let player = players
            .get_mut(player_id)
            .ok_or_else(|| self.reject(RegistryError::PlayerNotFound(player_id.to_string())))?;
        if !player.is_available() {
            return Err(self.reject(RegistryError::InvalidPlayerState {
                id: player_id.to_string(),
                state: player.state,
            }));
        }

        let waiting = matches
            .values()
            .filter(|m| m.state == MatchState::WaitingForPlayers)
            .min_by_key(|m| m.sequence)
            .map(|m| m.id);

        match waiting.and_then(|id| matches.get_mut(&id)) {
            Some(game) => {
                let match_id = game.id;
                self.pair(game, &mut players, player_id);
                Ok(match_id)
            }
            None => self
                .open_match(&mut matches, player)
                .map_err(|e| self.reject(e)),
        }
    }

    /// Remove a disconnected player. Any match they occupy is removed too and
    /// the opponent goes back to `NotInMatch`.
    pub fn remove_player(&self, id: &str) -> Option<Player> {
        let mut players = self.players.write();
        let mut matches = self.matches.write();

        let removed = players.remove(id)?;
        if let Some(game) = removed.match_id.and_then(|match_id| matches.remove(&match_id)) {
            Self::release(&mut players, &game);
            self.metrics.matches_removed.fetch_add(1, Ordering::Relaxed);
            info!("Match {} closed: player {} disconnected", game.id, id);
        }
        drop(matches);
        drop(players);

        self.metrics.players_disconnected.fetch_add(1, Ordering::Relaxed);
        info!("Player {} disconnected", id);
        Some(removed)
    }

    /// Remove a match and free its occupants
    pub fn remove_match(&self, id: MatchId) -> Option<Match> {
        let mut players = self.players.write();
        let mut matches = self.matches.write();

        let game = matches.remove(&id)?;
        Self::release(&mut players, &game);
        drop(matches);
        drop(players);

        self.metrics.matches_removed.fetch_add(1, Ordering::Relaxed);
        info!("Match {} removed after {:?}", id, game.age());
        Some(game)
    }

    pub fn get_match_by_id(&self, id: MatchId) -> Option<Match> {
        self.matches.read().get(&id).cloned()
    }

    pub fn get_player_by_id(&self, id: &str) -> Option<Player> {
        self.players.read().get(id).cloned()
    }

    /// Display rows for every match, in creation order
    pub fn get_match_data_for_table(&self) -> Vec<MatchTableRow> {
        let players = self.players.read();
        let matches = self.matches.read();

        let name_of = |id: &PlayerId| {
            players
                .get(id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| id.clone())
        };

        let mut ordered: Vec<&Match> = matches.values().collect();
        ordered.sort_by_key(|m| m.sequence);

        ordered
            .into_iter()
            .map(|m| MatchTableRow {
                id: m.id,
                player: name_of(&m.player),
                enemy: m
                    .enemy
                    .as_ref()
                    .map(&name_of)
                    .unwrap_or_else(|| WAITING_PLACEHOLDER.to_string()),
                state: m.state,
            })
            .collect()
    }

    /// The player in the other slot of `match_id`, from `player_id`'s side
    pub fn get_opponent_data(&self, match_id: MatchId, player_id: &str) -> Option<Player> {
        let players = self.players.read();
        let matches = self.matches.read();

        if !players.contains_key(player_id) {
            return None;
        }
        let opponent = matches.get(&match_id)?.opponent_of(player_id)?;
        players.get(opponent).cloned()
    }

    /// Copy the reported position into whichever slot `update.id` occupies
    pub fn update_player(
        &self,
        match_id: MatchId,
        update: &PlayerUpdate,
    ) -> Result<(), RegistryError> {
        if !update.position.is_finite() {
            return Err(self.reject(RegistryError::InvalidPosition));
        }

        let mut players = self.players.write();
        let matches = self.matches.read();

        let game = matches
            .get(&match_id)
            .ok_or_else(|| self.reject(RegistryError::MatchNotFound(match_id)))?;
        if !game.contains(&update.id) {
            return Err(self.reject(RegistryError::NotInMatch {
                match_id,
                player_id: update.id.clone(),
            }));
        }

        let player = players
            .get_mut(&update.id)
            .ok_or_else(|| self.reject(RegistryError::PlayerNotFound(update.id.clone())))?;
        player.set_position(update.position);

        self.metrics.position_updates.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn player_count(&self) -> usize {
        self.players.read().len()
    }

    pub fn match_count(&self) -> usize {
        self.matches.read().len()
    }

    /// Point-in-time sizes for metrics rendering
    pub fn gauges(&self) -> RegistryGauges {
        let players = self.players.read().len();
        let matches = self.matches.read();
        let matches_ready = matches
            .values()
            .filter(|m| m.state == MatchState::Ready)
            .count();

        RegistryGauges {
            players,
            matches_waiting: matches.len() - matches_ready,
            matches_ready,
        }
    }

    fn open_match(
        &self,
        matches: &mut HashMap<MatchId, Match>,
        player: &mut Player,
    ) -> Result<MatchId, RegistryError> {
        if !player.is_available() {
            return Err(RegistryError::InvalidPlayerState {
                id: player.id.clone(),
                state: player.state,
            });
        }
        if matches.len() >= self.config.max_matches {
            return Err(RegistryError::TooManyMatches);
        }

        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let game = Match::new(player.id.clone(), sequence);
        let match_id = game.id;

        player.state = PlayerState::WaitingForPlayers;
        player.match_id = Some(match_id);
        matches.insert(match_id, game);

        self.metrics.matches_created.fetch_add(1, Ordering::Relaxed);
        info!("Match {} created by player {}", match_id, player.id);
        Ok(match_id)
    }

    /// Seat `enemy_id` in slot 2. Callers have checked both states.
    fn pair(&self, game: &mut Match, players: &mut HashMap<PlayerId, Player>, enemy_id: &str) {
        game.add_player(enemy_id.to_string());
        game.state = MatchState::Ready;

        for id in game.player_ids() {
            if let Some(p) = players.get_mut(id) {
                p.state = PlayerState::InMatch;
                p.match_id = Some(game.id);
            }
        }

        self.metrics.matches_joined.fetch_add(1, Ordering::Relaxed);
        info!("Player {} joined match {} against {}", enemy_id, game.id, game.player);
    }

    fn release(players: &mut HashMap<PlayerId, Player>, game: &Match) {
        for id in game.player_ids() {
            if let Some(p) = players.get_mut(id) {
                p.state = PlayerState::NotInMatch;
                p.match_id = None;
            }
        }
    }

    fn reject(&self, err: RegistryError) -> RegistryError {
        self.metrics.rejected_operations.fetch_add(1, Ordering::Relaxed);
        debug!("Registry rejected operation: {}", err);
        err
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

/// Match listing row for the admin table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchTableRow {
    pub id: MatchId,
    pub player: String,
    pub enemy: String,
    pub state: MatchState,
}

/// Registry sizes at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryGauges {
    pub players: usize,
    pub matches_waiting: usize,
    pub matches_ready: usize,
}

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Player {0} already exists")]
    DuplicatePlayer(PlayerId),
    #[error("Player {0} not found")]
    PlayerNotFound(PlayerId),
    #[error("Match {0} not found")]
    MatchNotFound(MatchId),
    #[error("Player {id} is {state}")]
    InvalidPlayerState { id: PlayerId, state: PlayerState },
    #[error("Match {id} is {state}")]
    InvalidMatchState { id: MatchId, state: MatchState },
    #[error("Player {player_id} is not in match {match_id}")]
    NotInMatch { match_id: MatchId, player_id: PlayerId },
    #[error("Too many players")]
    TooManyPlayers,
    #[error("Too many matches")]
    TooManyMatches,
    #[error("Invalid player name")]
    InvalidName,
    #[error("NaN or Infinity in position")]
    InvalidPosition,
}
