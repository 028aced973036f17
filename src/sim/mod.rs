//! Deterministic rules engine
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only (the stream travels with the state)
//! - One action at a time through `dispatch`
//! - No rendering, storage or clock dependencies

pub mod dispatch;
pub mod grid;
pub mod hint;
pub mod levels;
pub mod scoring;
pub mod state;
pub mod tile;

pub use dispatch::{Action, dispatch};
pub use grid::{add_row, generate_grid};
pub use hint::{available_matches, find_match};
pub use levels::{Difficulty, LevelConfig, LevelError, MAX_LEVEL, NumberRange, level_config};
pub use scoring::{calculate_score, is_level_complete, score_with_rows, star_rating};
pub use state::{GameEvent, GameState, GameStatus, MatchFeedback};
pub use tile::{Grid, Tile, TileId, tiles_match};
