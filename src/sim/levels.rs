//! Level registry
//!
//! Levels 1-5 are authored by hand. Every level past that is extrapolated
//! from level 5 so difficulty keeps climbing until the caps are reached.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest level a session can be started on
pub const MAX_LEVEL: u32 = 50;

/// Last level of the authored table
pub const LAST_AUTHORED_LEVEL: u32 = 5;

/// Grid size used by every level
pub const GRID_ROWS: usize = 9;
pub const GRID_COLS: usize = 9;

// Extrapolation bounds for levels past the authored table
const BASE_ADD_ROWS: u32 = 2;
const MAX_ADD_ROWS: u32 = 5;
const BASE_TIME_LIMIT: u32 = 120;
const MIN_TIME_LIMIT: u32 = 90;
const TIME_STEP: u32 = 5;
const BASE_TARGET_MATCHES: u32 = 20;
const BASE_RANGE_MAX: u32 = 15;
const RANGE_MAX_CAP: u32 = 20;
const BASE_MATCH_RATE: f32 = 0.5;
const MIN_MATCH_RATE: f32 = 0.3;
const MATCH_RATE_STEP: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("level {level} out of range (1..={max})")]
    OutOfRange { level: u32, max: u32 },
}

/// Difficulty tier of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// Tier for a level number
    pub fn for_level(level: u32) -> Self {
        match level {
            0..=2 => Difficulty::Easy,
            3..=4 => Difficulty::Medium,
            5..=7 => Difficulty::Hard,
            _ => Difficulty::Expert,
        }
    }

    /// Tile values used when a level has no explicit number range
    pub fn default_range(&self) -> NumberRange {
        match self {
            Difficulty::Easy => NumberRange::new(1, 9),
            Difficulty::Medium => NumberRange::new(1, 12),
            Difficulty::Hard | Difficulty::Expert => NumberRange::new(1, 15),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }
}

/// Inclusive range of tile values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRange {
    pub min: u32,
    pub max: u32,
}

impl NumberRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn as_range(&self) -> RangeInclusive<u32> {
        self.min..=self.max.max(self.min)
    }
}

/// Parameters of one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelConfig {
    pub level: u32,
    pub rows: usize,
    pub cols: usize,
    pub add_rows_allowed: u32,
    /// Seconds on the clock at level start
    pub time_limit: u32,
    pub target_matches: u32,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub number_range: Option<NumberRange>,
    pub guaranteed_match_rate: f32,
    #[serde(default)]
    pub description: String,
}

impl LevelConfig {
    /// Range tile values are drawn from
    pub fn value_range(&self) -> NumberRange {
        self.number_range
            .unwrap_or_else(|| self.difficulty.default_range())
    }
}

struct Authored {
    add_rows_allowed: u32,
    time_limit: u32,
    target_matches: u32,
    difficulty: Difficulty,
    range_max: u32,
    guaranteed_match_rate: f32,
    description: &'static str,
}

const AUTHORED_LEVELS: [Authored; LAST_AUTHORED_LEVEL as usize] = [
    Authored {
        add_rows_allowed: 0,
        time_limit: 180,
        target_matches: 8,
        difficulty: Difficulty::Easy,
        range_max: 9,
        guaranteed_match_rate: 0.7,
        description: "Learn the basics - no add rows!",
    },
    Authored {
        add_rows_allowed: 1,
        time_limit: 150,
        target_matches: 12,
        difficulty: Difficulty::Easy,
        range_max: 10,
        guaranteed_match_rate: 0.65,
        description: "Now you can add 1 row!",
    },
    Authored {
        add_rows_allowed: 1,
        time_limit: 140,
        target_matches: 15,
        difficulty: Difficulty::Medium,
        range_max: 12,
        guaranteed_match_rate: 0.6,
        description: "Getting harder...",
    },
    Authored {
        add_rows_allowed: 2,
        time_limit: 130,
        target_matches: 18,
        difficulty: Difficulty::Medium,
        range_max: 12,
        guaranteed_match_rate: 0.55,
        description: "Two add rows available",
    },
    Authored {
        add_rows_allowed: 2,
        time_limit: 120,
        target_matches: 20,
        difficulty: Difficulty::Hard,
        range_max: 15,
        guaranteed_match_rate: 0.5,
        description: "Expert level!",
    },
];

/// Look up the configuration for a level
pub fn level_config(level: u32) -> Result<LevelConfig, LevelError> {
    if !(1..=MAX_LEVEL).contains(&level) {
        return Err(LevelError::OutOfRange {
            level,
            max: MAX_LEVEL,
        });
    }

    if level <= LAST_AUTHORED_LEVEL {
        return Ok(authored(&AUTHORED_LEVELS[(level - 1) as usize], level));
    }

    Ok(extrapolated(level))
}

/// Configuration of level 1
pub fn first_level() -> LevelConfig {
    authored(&AUTHORED_LEVELS[0], 1)
}

fn authored(a: &Authored, level: u32) -> LevelConfig {
    LevelConfig {
        level,
        rows: GRID_ROWS,
        cols: GRID_COLS,
        add_rows_allowed: a.add_rows_allowed,
        time_limit: a.time_limit,
        target_matches: a.target_matches,
        difficulty: a.difficulty,
        number_range: Some(NumberRange::new(1, a.range_max)),
        guaranteed_match_rate: a.guaranteed_match_rate,
        description: a.description.to_string(),
    }
}

fn extrapolated(level: u32) -> LevelConfig {
    let increment = level - LAST_AUTHORED_LEVEL;
    LevelConfig {
        level,
        rows: GRID_ROWS,
        cols: GRID_COLS,
        add_rows_allowed: (BASE_ADD_ROWS + increment / 3).min(MAX_ADD_ROWS),
        time_limit: BASE_TIME_LIMIT
            .saturating_sub(increment * TIME_STEP)
            .max(MIN_TIME_LIMIT),
        target_matches: BASE_TARGET_MATCHES + increment * 2,
        difficulty: Difficulty::for_level(level),
        number_range: Some(NumberRange::new(
            1,
            (BASE_RANGE_MAX + increment).min(RANGE_MAX_CAP),
        )),
        guaranteed_match_rate: (BASE_MATCH_RATE - increment as f32 * MATCH_RATE_STEP)
            .max(MIN_MATCH_RATE),
        description: format!("Level {level} - Challenge mode"),
    }
}

/// Level after `level`, capped at the last playable one
pub fn next_level(level: u32) -> u32 {
    (level + 1).min(MAX_LEVEL)
}
