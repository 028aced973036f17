//! Score and star rating
//!
//! One formula is used everywhere: matches and leftover seconds earn points,
//! every extra row costs points, and the total scales with the level.

use super::levels::LevelConfig;

pub const POINTS_PER_MATCH: i64 = 100;
pub const POINTS_PER_SECOND: i64 = 10;
pub const ADD_ROW_PENALTY: i64 = 50;

/// Score for a level, never below zero
pub fn score_with_rows(matches: u32, time_remaining: u32, add_rows_used: u32, level: u32) -> u64 {
    let base = matches as i64 * POINTS_PER_MATCH + time_remaining as i64 * POINTS_PER_SECOND
        - add_rows_used as i64 * ADD_ROW_PENALTY;
    base.saturating_mul(level as i64).max(0) as u64
}

/// Score when no rows were added
pub fn calculate_score(matches: u32, time_remaining: u32, level: u32) -> u64 {
    score_with_rows(matches, time_remaining, 0, level)
}

/// Level is done once enough pairs have been cleared
pub fn is_level_complete(matches: u32, config: &LevelConfig) -> bool {
    matches >= config.target_matches
}

/// 1 to 3 stars from match, time and add-row efficiency
pub fn star_rating(matches: u32, time_remaining: u32, add_rows_used: u32, config: &LevelConfig) -> u8 {
    let efficiency = matches as f32 / config.target_matches.max(1) as f32;
    let time_efficiency = time_remaining as f32 / config.time_limit.max(1) as f32;
    let add_row_efficiency = 1.0 - add_rows_used as f32 / config.add_rows_allowed.max(1) as f32;

    let overall = (efficiency + time_efficiency + add_row_efficiency) / 3.0;
    if overall >= 0.9 {
        3
    } else if overall >= 0.7 {
        2
    } else {
        1
    }
}
