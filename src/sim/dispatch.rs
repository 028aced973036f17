//! Level state machine
//!
//! Every input reaches the state through `dispatch`, one action at a time.
//! Guards are checked before any effect, so a rejected action leaves the
//! state exactly as it was.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::add_row;
use super::levels::{level_config, next_level};
use super::scoring::{is_level_complete, score_with_rows};
use super::state::{GameEvent, GameState, GameStatus, MatchFeedback};
use super::tile::TileId;

/// Input to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    StartGame {
        level: u32,
    },
    SelectTile {
        tile: TileId,
    },
    AddRow,
    TickTimer,
    NextLevel,
    ResetGame {
        #[serde(default)]
        level: Option<u32>,
    },
    PauseGame,
    ResumeGame,
    /// Action kind this build does not recognise
    #[serde(other)]
    Unknown,
}

/// Apply one action to the state, returning what happened
pub fn dispatch(state: &mut GameState, action: Action) -> Vec<GameEvent> {
    let mut events = Vec::new();

    match action {
        Action::StartGame { level } => restart(state, level, &mut events),

        Action::SelectTile { tile } => {
            if state.status == GameStatus::Playing {
                select_tile(state, tile, &mut events);
            } else {
                log::debug!("Ignoring select of {tile} while {:?}", state.status);
            }
        }

        Action::AddRow => {
            if state.can_add_row() {
                state.grid = add_row(&state.grid, &state.config, &mut state.rng);
                state.add_rows_used += 1;
                events.push(GameEvent::RowAdded {
                    row: state.grid.len() - 1,
                });
            } else {
                log::debug!(
                    "Add row rejected ({}/{} used, {:?})",
                    state.add_rows_used,
                    state.config.add_rows_allowed,
                    state.status
                );
            }
        }

        Action::TickTimer => {
            if state.status == GameStatus::Playing && state.time_remaining > 0 {
                state.time_remaining -= 1;
                events.push(GameEvent::Ticked {
                    time_remaining: state.time_remaining,
                });
                if state.time_remaining == 0 {
                    state.status = GameStatus::Failed;
                    state.selected_tile = None;
                    log::info!("Level {} failed: out of time", state.level);
                    events.push(GameEvent::Failed {
                        level: state.level,
                        score: state.score,
                    });
                }
            }
        }

        Action::NextLevel => {
            if state.is_finished() {
                restart(state, next_level(state.level), &mut events);
            } else {
                log::debug!("Next level ignored while {:?}", state.status);
            }
        }

        Action::ResetGame { level } => {
            if state.is_finished() {
                restart(state, level.unwrap_or(state.level), &mut events);
            } else {
                log::debug!("Reset ignored while {:?}", state.status);
            }
        }

        Action::PauseGame => {
            if state.status == GameStatus::Playing {
                state.status = GameStatus::Paused;
                events.push(GameEvent::Paused);
            }
        }

        Action::ResumeGame => {
            if state.status == GameStatus::Paused {
                state.status = GameStatus::Playing;
                events.push(GameEvent::Resumed);
            }
        }

        Action::Unknown => {
            log::warn!("Unknown action kind dispatched; state left unchanged");
        }
    }

    events
}

/// Replace the state wholesale with a fresh session for `level`
fn restart(state: &mut GameState, level: u32, events: &mut Vec<GameEvent>) {
    let config = match level_config(level) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("Cannot start level: {err}");
            return;
        }
    };

    let seed = state.rng.random::<u64>();
    *state = GameState::with_config(config, seed);
    log::info!(
        "Level {} ({}) started: {}x{}, target {}, {}s",
        state.level,
        state.config.difficulty.as_str(),
        state.config.rows,
        state.config.cols,
        state.config.target_matches,
        state.config.time_limit
    );
    events.push(GameEvent::Started { level: state.level });
}

fn select_tile(state: &mut GameState, id: TileId, events: &mut Vec<GameEvent>) {
    let Some(tile) = state.grid.get(id).copied() else {
        log::debug!("Select of unknown tile {id}");
        return;
    };
    if tile.matched {
        return;
    }

    let Some(first) = state.selected().copied() else {
        state.selected_tile = Some(id);
        events.push(GameEvent::Selected(id));
        return;
    };

    if first.id == id {
        state.selected_tile = None;
        events.push(GameEvent::Deselected(id));
        return;
    }

    state.selected_tile = None;

    if !first.pairs_with(&tile) {
        state.last_match_animation = Some(MatchFeedback {
            tile1: first,
            tile2: tile,
            invalid: true,
        });
        events.push(GameEvent::InvalidMatch {
            tile1: first.id,
            tile2: id,
        });
        return;
    }

    state.grid.mark_matched(first.id);
    state.grid.mark_matched(id);
    state.matches += 1;
    state.score = score_with_rows(
        state.matches,
        state.time_remaining,
        state.add_rows_used,
        state.level,
    );
    state.last_match_animation = Some(MatchFeedback {
        tile1: first,
        tile2: tile,
        invalid: false,
    });
    events.push(GameEvent::Matched {
        tile1: first.id,
        tile2: id,
    });

    if is_level_complete(state.matches, &state.config) {
        state.status = GameStatus::Completed;
        let stars = state.stars();
        log::info!(
            "Level {} complete: score {}, {} stars",
            state.level,
            state.score,
            stars
        );
        events.push(GameEvent::Completed {
            level: state.level,
            score: state.score,
            stars,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::levels::{LevelConfig, MAX_LEVEL, NumberRange, level_config};
    use crate::sim::tile::{Grid, Tile};

    /// 3x4 level with 8 target matches and 2 spare rows
    fn small_config() -> LevelConfig {
        LevelConfig {
            rows: 3,
            cols: 4,
            add_rows_allowed: 2,
            time_limit: 120,
            target_matches: 8,
            number_range: Some(NumberRange::new(1, 15)),
            ..level_config(1).unwrap()
        }
    }

    fn grid(values: &[&[u32]]) -> Grid {
        Grid::from_rows(
            values
                .iter()
                .enumerate()
                .map(|(r, row)| {
                    row.iter()
                        .enumerate()
                        .map(|(c, &v)| Tile::new(r, c, v))
                        .collect()
                })
                .collect(),
        )
    }

    fn small_state() -> GameState {
        let g = grid(&[&[5, 5, 2, 8], &[3, 7, 4, 4], &[1, 11, 13, 6]]);
        GameState::from_grid(small_config(), g, 1)
    }

    fn select(state: &mut GameState, row: usize, col: usize) -> Vec<GameEvent> {
        dispatch(
            state,
            Action::SelectTile {
                tile: TileId::new(row, col),
            },
        )
    }

    #[test]
    fn test_first_match_scores() {
        let mut state = small_state();
        select(&mut state, 0, 0);
        assert_eq!(state.selected_tile, Some(TileId::new(0, 0)));

        let events = select(&mut state, 0, 1);
        assert_eq!(state.matches, 1);
        assert!(state.grid.get(TileId::new(0, 0)).unwrap().matched);
        assert!(state.grid.get(TileId::new(0, 1)).unwrap().matched);
        assert_eq!(state.score, 1300);
        assert!(state.selected_tile.is_none());
        let feedback = state.last_match_animation.unwrap();
        assert!(!feedback.invalid);
        assert_eq!(feedback.tile1.id, TileId::new(0, 0));
        assert_eq!(feedback.tile2.id, TileId::new(0, 1));
        assert_eq!(
            events,
            vec![GameEvent::Matched {
                tile1: TileId::new(0, 0),
                tile2: TileId::new(0, 1)
            }]
        );
        assert!(state.validate().is_ok());
    }

    #[test]
    fn test_sum_to_ten_across_rows() {
        let mut state = small_state();
        select(&mut state, 0, 2);
        select(&mut state, 1, 1);
        // 2 + 7 is not ten
        assert_eq!(state.matches, 0);
        select(&mut state, 2, 3);
        select(&mut state, 1, 2);
        assert_eq!(state.matches, 1);
        assert!(state.grid.get(TileId::new(2, 3)).unwrap().matched);
    }

    #[test]
    fn test_invalid_pair_feedback() {
        let mut state = small_state();
        select(&mut state, 0, 0);
        let events = select(&mut state, 2, 1);
        assert_eq!(state.matches, 0);
        assert!(state.selected_tile.is_none());
        let feedback = state.last_match_animation.unwrap();
        assert!(feedback.invalid);
        assert_eq!(feedback.tile1.value, 5);
        assert_eq!(feedback.tile2.value, 11);
        assert!(matches!(events[0], GameEvent::InvalidMatch { .. }));
        assert!(state.grid.tiles().all(|t| !t.matched));
    }

    #[test]
    fn test_deselect_restores_state() {
        let mut state = small_state();
        let before = state.clone();
        select(&mut state, 1, 2);
        let events = select(&mut state, 1, 2);
        assert_eq!(events, vec![GameEvent::Deselected(TileId::new(1, 2))]);
        assert_eq!(state, before);
    }

    #[test]
    fn test_matched_tile_ignored() {
        let mut state = small_state();
        select(&mut state, 0, 0);
        select(&mut state, 0, 1);
        let before = state.clone();
        assert!(select(&mut state, 0, 0).is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn test_unknown_tile_ignored() {
        let mut state = small_state();
        let before = state.clone();
        assert!(select(&mut state, 7, 7).is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn test_completion_on_the_matching_dispatch() {
        let mut config = small_config();
        config.target_matches = 2;
        let mut state = GameState::from_grid(config, small_state().grid, 1);

        select(&mut state, 0, 0);
        select(&mut state, 0, 1);
        assert_eq!(state.status, GameStatus::Playing);

        select(&mut state, 1, 2);
        let events = select(&mut state, 1, 3);
        assert_eq!(state.status, GameStatus::Completed);
        assert!(matches!(events.last(), Some(GameEvent::Completed { level: 1, .. })));

        // Clock is frozen once the level is done
        let before = state.clone();
        assert!(dispatch(&mut state, Action::TickTimer).is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn test_clock_runs_out_exactly_at_zero() {
        let mut state = small_state();
        for remaining in (1..120).rev() {
            dispatch(&mut state, Action::TickTimer);
            assert_eq!(state.time_remaining, remaining);
            assert_eq!(state.status, GameStatus::Playing);
        }
        let events = dispatch(&mut state, Action::TickTimer);
        assert_eq!(state.time_remaining, 0);
        assert_eq!(state.status, GameStatus::Failed);
        assert!(matches!(events.last(), Some(GameEvent::Failed { .. })));

        dispatch(&mut state, Action::TickTimer);
        assert_eq!(state.time_remaining, 0);
    }

    #[test]
    fn test_score_uses_time_at_match() {
        let mut state = small_state();
        for _ in 0..20 {
            dispatch(&mut state, Action::TickTimer);
        }
        select(&mut state, 0, 0);
        select(&mut state, 0, 1);
        assert_eq!(state.score, (100 + 1000) as u64);
    }

    #[test]
    fn test_add_row_until_allowance_spent() {
        let mut state = small_state();
        let events = dispatch(&mut state, Action::AddRow);
        assert_eq!(events, vec![GameEvent::RowAdded { row: 3 }]);
        dispatch(&mut state, Action::AddRow);
        assert_eq!(state.add_rows_used, 2);
        assert_eq!(state.grid.len(), 5);

        let before = state.clone();
        assert!(dispatch(&mut state, Action::AddRow).is_empty());
        assert_eq!(state, before);
        assert!(state.validate().is_ok());
    }

    #[test]
    fn test_add_row_costs_score_on_next_match() {
        let mut state = small_state();
        dispatch(&mut state, Action::AddRow);
        select(&mut state, 0, 0);
        select(&mut state, 0, 1);
        assert_eq!(state.score, (100 + 1200 - 50) as u64);
    }

    #[test]
    fn test_pause_freezes_input_and_clock() {
        let mut state = small_state();
        select(&mut state, 0, 0);
        assert_eq!(dispatch(&mut state, Action::PauseGame), vec![GameEvent::Paused]);

        let before = state.clone();
        dispatch(&mut state, Action::TickTimer);
        select(&mut state, 0, 1);
        dispatch(&mut state, Action::AddRow);
        dispatch(&mut state, Action::PauseGame);
        assert_eq!(state, before);

        assert_eq!(dispatch(&mut state, Action::ResumeGame), vec![GameEvent::Resumed]);
        assert_eq!(state.status, GameStatus::Playing);
        select(&mut state, 0, 1);
        assert_eq!(state.matches, 1);
    }

    #[test]
    fn test_resume_only_from_pause() {
        let mut state = small_state();
        assert!(dispatch(&mut state, Action::ResumeGame).is_empty());
        assert_eq!(state.status, GameStatus::Playing);
    }

    #[test]
    fn test_start_from_menu() {
        let mut state = GameState::menu(3);
        let events = dispatch(&mut state, Action::StartGame { level: 2 });
        assert_eq!(events, vec![GameEvent::Started { level: 2 }]);
        assert_eq!(state.status, GameStatus::Playing);
        assert_eq!(state.level, 2);
        assert_eq!(state.grid.len(), 9);
        assert_eq!(state.time_remaining, 150);
    }

    #[test]
    fn test_start_bad_level_is_noop() {
        let mut state = GameState::menu(3);
        let before = state.clone();
        assert!(dispatch(&mut state, Action::StartGame { level: 0 }).is_empty());
        assert!(dispatch(&mut state, Action::StartGame { level: MAX_LEVEL + 1 }).is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn test_start_replaces_session_mid_game() {
        let mut state = small_state();
        select(&mut state, 0, 0);
        select(&mut state, 0, 1);
        dispatch(&mut state, Action::TickTimer);
        dispatch(&mut state, Action::StartGame { level: 1 });
        assert_eq!(state.matches, 0);
        assert_eq!(state.score, 0);
        assert_eq!(state.time_remaining, 180);
        assert!(state.last_match_animation.is_none());
        assert!(state.selected_tile.is_none());
    }

    #[test]
    fn test_reset_and_next_level_only_when_finished() {
        let mut state = small_state();
        let before = state.clone();
        assert!(dispatch(&mut state, Action::NextLevel).is_empty());
        assert!(dispatch(&mut state, Action::ResetGame { level: None }).is_empty());
        assert_eq!(state, before);

        for _ in 0..120 {
            dispatch(&mut state, Action::TickTimer);
        }
        assert_eq!(state.status, GameStatus::Failed);

        dispatch(&mut state, Action::ResetGame { level: None });
        assert_eq!(state.status, GameStatus::Playing);
        assert_eq!(state.level, 1);
        assert_eq!(state.time_remaining, 180);
    }

    #[test]
    fn test_next_level_caps_at_max() {
        let mut state = GameState::new(MAX_LEVEL, 9).unwrap();
        while state.status == GameStatus::Playing {
            dispatch(&mut state, Action::TickTimer);
        }
        dispatch(&mut state, Action::NextLevel);
        assert_eq!(state.level, MAX_LEVEL);
        assert_eq!(state.status, GameStatus::Playing);
    }

    #[test]
    fn test_next_level_advances() {
        let mut state = GameState::new(1, 9).unwrap();
        state.status = GameStatus::Completed;
        dispatch(&mut state, Action::NextLevel);
        assert_eq!(state.level, 2);
        assert_eq!(state.config, level_config(2).unwrap());
    }

    #[test]
    fn test_unknown_action_is_noop() {
        let mut state = small_state();
        let before = state.clone();
        let action: Action = serde_json::from_str(r#"{"type":"MATCH_TILES"}"#).unwrap();
        assert_eq!(action, Action::Unknown);
        assert!(dispatch(&mut state, action).is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn test_action_wire_form() {
        let action: Action =
            serde_json::from_str(r#"{"type":"SELECT_TILE","tile":"2-3"}"#).unwrap();
        assert_eq!(
            action,
            Action::SelectTile {
                tile: TileId::new(2, 3)
            }
        );
        let reset: Action = serde_json::from_str(r#"{"type":"RESET_GAME"}"#).unwrap();
        assert_eq!(reset, Action::ResetGame { level: None });
        assert_eq!(
            serde_json::to_string(&Action::StartGame { level: 4 }).unwrap(),
            r#"{"type":"START_GAME","level":4}"#
        );
    }

    #[test]
    fn test_same_seed_same_rows() {
        let mut a = GameState::new(2, 1234).unwrap();
        let mut b = a.clone();
        dispatch(&mut a, Action::AddRow);
        dispatch(&mut b, Action::AddRow);
        assert_eq!(a.grid, b.grid);
    }
}
