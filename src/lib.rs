//! Number Master - rules engine for a timed tile-matching number puzzle
//!
//! Core modules:
//! - `sim`: Deterministic rules (grid generation, pairing, scoring, level state machine)
//! - `session`: Live session with the level timer and event callbacks
//! - `progress`: Cleared levels and best results
//! - `persistence`: Save/load with validation
//! - `settings`: Runtime configuration

pub mod persistence;
pub mod progress;
pub mod session;
pub mod settings;
pub mod sim;

pub use progress::Progress;
pub use session::{Command, Session};
pub use settings::Settings;
pub use sim::{Action, GameEvent, GameState, GameStatus, LevelConfig, dispatch, level_config};
