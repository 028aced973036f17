//! Game state and core session types
//!
//! Everything a restored session needs lives here, including the RNG stream,
//! so a saved game resumes with the same upcoming rows.

use std::collections::HashSet;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::grid::generate_grid;
use super::levels::{LevelConfig, LevelError, first_level, level_config};
use super::scoring::star_rating;
use super::tile::{Grid, PAIR_SUM, Tile, TileId};

/// Lifecycle of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// No level started yet
    #[default]
    Menu,
    /// Clock running, input accepted
    Playing,
    /// Clock frozen
    Paused,
    /// Target matches reached
    Completed,
    /// Clock ran out
    Failed,
}

/// Feedback from the last pairing attempt (consumed by the presentation layer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFeedback {
    pub tile1: Tile,
    pub tile2: Tile,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub invalid: bool,
}

/// Something that happened during a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Started { level: u32 },
    Selected(TileId),
    Deselected(TileId),
    Matched { tile1: TileId, tile2: TileId },
    InvalidMatch { tile1: TileId, tile2: TileId },
    RowAdded { row: usize },
    Ticked { time_remaining: u32 },
    Completed { level: u32, score: u64, stars: u8 },
    Failed { level: u32, score: u64 },
    Paused,
    Resumed,
}

/// Complete session state (serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub level: u32,
    /// Configuration the session was started with
    pub config: LevelConfig,
    pub grid: Grid,
    pub selected_tile: Option<TileId>,
    pub matches: u32,
    pub score: u64,
    /// Seconds left on the clock
    pub time_remaining: u32,
    pub add_rows_used: u32,
    #[serde(rename = "gameStatus")]
    pub status: GameStatus,
    pub last_match_animation: Option<MatchFeedback>,
    /// Seed this session was created from
    pub seed: u64,
    /// Stream for appended rows and the next session's seed
    pub(crate) rng: Pcg32,
}

impl GameState {
    /// Idle state shown before any level is started
    pub fn menu(seed: u64) -> Self {
        let mut state = Self::from_grid(first_level(), Grid::default(), seed);
        state.status = GameStatus::Menu;
        state
    }

    /// Fresh playing state for `level`
    pub fn new(level: u32, seed: u64) -> Result<Self, LevelError> {
        Ok(Self::with_config(level_config(level)?, seed))
    }

    /// Fresh playing state with a generated grid for `config`
    pub fn with_config(config: LevelConfig, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let grid = generate_grid(&config, &mut rng);
        Self::build(config, grid, seed, rng)
    }

    /// Fresh playing state over a prepared grid
    pub fn from_grid(config: LevelConfig, grid: Grid, seed: u64) -> Self {
        Self::build(config, grid, seed, Pcg32::seed_from_u64(seed))
    }

    fn build(config: LevelConfig, grid: Grid, seed: u64, rng: Pcg32) -> Self {
        Self {
            level: config.level,
            time_remaining: config.time_limit,
            config,
            grid,
            selected_tile: None,
            matches: 0,
            score: 0,
            add_rows_used: 0,
            status: GameStatus::Playing,
            last_match_animation: None,
            seed,
            rng,
        }
    }

    /// The currently selected tile, if any
    pub fn selected(&self) -> Option<&Tile> {
        self.selected_tile.and_then(|id| self.grid.get(id))
    }

    pub fn add_rows_remaining(&self) -> u32 {
        self.config.add_rows_allowed.saturating_sub(self.add_rows_used)
    }

    pub fn can_add_row(&self) -> bool {
        self.status == GameStatus::Playing && self.add_rows_remaining() > 0
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, GameStatus::Completed | GameStatus::Failed)
    }

    /// Stars earned so far
    pub fn stars(&self) -> u8 {
        star_rating(
            self.matches,
            self.time_remaining,
            self.add_rows_used,
            &self.config,
        )
    }

    /// Check the structural invariants, e.g. after loading from storage
    pub fn validate(&self) -> Result<(), String> {
        if self.level != self.config.level {
            return Err(format!(
                "level {} does not match config level {}",
                self.level, self.config.level
            ));
        }
        if self.add_rows_used > self.config.add_rows_allowed {
            return Err(format!(
                "{} rows added, only {} allowed",
                self.add_rows_used, self.config.add_rows_allowed
            ));
        }
        if self.time_remaining > self.config.time_limit {
            return Err(format!(
                "{}s remaining exceeds the {}s limit",
                self.time_remaining, self.config.time_limit
            ));
        }
        if self.status == GameStatus::Failed && self.time_remaining > 0 {
            // Failing only happens on the tick that reaches zero
            return Err("failed with time on the clock".to_string());
        }
        if matches!(self.status, GameStatus::Playing | GameStatus::Paused)
            && self.time_remaining == 0
        {
            // The tick that reaches zero always fails the level
            return Err(format!("{:?} with no time left", self.status));
        }
        if self.status != GameStatus::Menu {
            let expected = self.config.rows + self.add_rows_used as usize;
            if self.grid.len() != expected {
                return Err(format!(
                    "grid has {} rows, expected {expected}",
                    self.grid.len()
                ));
            }
        }

        let range = self.config.value_range().as_range();

        let mut seen = HashSet::with_capacity(self.grid.tile_count());
        for (r, row) in self.grid.rows().iter().enumerate() {
            if row.len() != self.config.cols {
                return Err(format!(
                    "row {r} has {} tiles, expected {}",
                    row.len(),
                    self.config.cols
                ));
            }
            for (c, tile) in row.iter().enumerate() {
                if tile.id != TileId::new(r, c) || (tile.row, tile.col) != (r, c) {
                    return Err(format!("tile {} stored at {r}-{c}", tile.id));
                }
                // Seeded sum pairs may fall outside a narrow range
                if !range.contains(&tile.value) && !(1..PAIR_SUM).contains(&tile.value) {
                    return Err(format!("tile {} has out-of-range value {}", tile.id, tile.value));
                }
                if !seen.insert(tile.id) {
                    return Err(format!("duplicate tile id {}", tile.id));
                }
            }
        }

        if self.grid.matched_count() != self.matches as usize * 2 {
            return Err(format!(
                "{} matched tiles for {} matches",
                self.grid.matched_count(),
                self.matches
            ));
        }

        if let Some(id) = self.selected_tile {
            match self.grid.get(id) {
                Some(tile) if !tile.matched => {}
                _ => return Err(format!("selected tile {id} is missing or matched")),
            }
        }

        Ok(())
    }
}
