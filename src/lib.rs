//! Duel Registry Library
//!
//! Matchmaking and session registry for a two-player real-time game.
//!
//! # Features
//!
//! - `admin` - HTTP admin endpoint serving metrics and the match table (enabled by default)

pub mod config;
pub mod metrics;
pub mod registry;
pub mod util;
