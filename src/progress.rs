//! Level progression across sessions
//!
//! Tracks the current level, which levels were cleared, and the best result
//! on each. Serializable so the host can store it wherever it likes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sim::{GameState, GameStatus, LevelConfig, LevelError, MAX_LEVEL, level_config};

/// Best result recorded for one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRecord {
    pub best_score: u64,
    pub stars: u8,
}

/// Outcome of recording a cleared level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub level: u32,
    pub score: u64,
    pub stars: u8,
    pub new_best: bool,
    pub next_level: u32,
    pub can_progress: bool,
}

/// Summary for level-select screens
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    pub current_level: u32,
    pub completed_levels: Vec<u32>,
    pub total_completed: usize,
    /// Share of all levels cleared, 0-100
    pub percent: f32,
    pub max_level: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub current_level: u32,
    #[serde(default)]
    pub completed: BTreeMap<u32, LevelRecord>,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    pub fn new() -> Self {
        Self {
            current_level: 1,
            completed: BTreeMap::new(),
        }
    }

    pub fn current_config(&self) -> Result<LevelConfig, LevelError> {
        level_config(self.current_level)
    }

    pub fn is_completed(&self, level: u32) -> bool {
        self.completed.contains_key(&level)
    }

    pub fn record(&self, level: u32) -> Option<&LevelRecord> {
        self.completed.get(&level)
    }

    /// Record a finished session. Returns `None` unless the level was cleared.
    pub fn record_session(&mut self, state: &GameState) -> Option<Completion> {
        if state.status != GameStatus::Completed {
            return None;
        }
        Some(self.record_completion(state.level, state.score, state.stars()))
    }

    /// Mark `level` cleared with the given result, keeping the best one
    pub fn record_completion(&mut self, level: u32, score: u64, stars: u8) -> Completion {
        let new_best = match self.completed.get_mut(&level) {
            Some(record) => {
                let better = score > record.best_score;
                if better {
                    record.best_score = score;
                }
                record.stars = record.stars.max(stars);
                better
            }
            None => {
                self.completed.insert(
                    level,
                    LevelRecord {
                        best_score: score,
                        stars,
                    },
                );
                true
            }
        };

        if new_best {
            log::info!("Level {level}: new best score {score} ({stars} stars)");
        }

        Completion {
            level,
            score,
            stars,
            new_best,
            next_level: (level + 1).min(MAX_LEVEL),
            can_progress: level < MAX_LEVEL,
        }
    }

    /// Advance to the next level, if there is one
    pub fn advance(&mut self) -> Option<LevelConfig> {
        if self.current_level >= MAX_LEVEL {
            return None;
        }
        self.current_level += 1;
        level_config(self.current_level).ok()
    }

    /// Jump to a specific level
    pub fn go_to_level(&mut self, level: u32) -> Result<LevelConfig, LevelError> {
        let config = level_config(level)?;
        self.current_level = level;
        Ok(config)
    }

    /// Forget everything and return to level 1
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn total_stars(&self) -> u32 {
        self.completed.values().map(|r| r.stars as u32).sum()
    }

    pub fn stats(&self) -> ProgressStats {
        let completed_levels: Vec<u32> = self.completed.keys().copied().collect();
        ProgressStats {
            current_level: self.current_level,
            total_completed: completed_levels.len(),
            percent: completed_levels.len() as f32 / MAX_LEVEL as f32 * 100.0,
            completed_levels,
            max_level: MAX_LEVEL,
        }
    }
}
