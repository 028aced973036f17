//! Save/load with validation
//!
//! Features:
//! - Versioned JSON envelope
//! - Invariant checks on load (a corrupt save never becomes the live state)
//! - File helpers for native hosts

pub mod envelope;

use std::path::Path;

use thiserror::Error;

use crate::progress::Progress;
use crate::sim::GameState;

pub use envelope::{Envelope, SAVE_VERSION, decode, encode};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("save data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported save version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("expected a {expected} save, found {found}")]
    WrongKind { expected: String, found: String },
    #[error("save data is inconsistent: {0}")]
    Invalid(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

const GAME_KIND: &str = "game";
const PROGRESS_KIND: &str = "progress";

/// Serialize a game state to plain JSON
pub fn serialize(state: &GameState) -> Result<String, PersistError> {
    encode(GAME_KIND, state)
}

/// Rebuild a game state from `serialize` output
pub fn restore(json: &str) -> Result<GameState, PersistError> {
    let state: GameState = decode(json, GAME_KIND)?;
    state.validate().map_err(PersistError::Invalid)?;
    log::info!(
        "Restored level {} ({:?}, {}s left)",
        state.level,
        state.status,
        state.time_remaining
    );
    Ok(state)
}

pub fn serialize_progress(progress: &Progress) -> Result<String, PersistError> {
    encode(PROGRESS_KIND, progress)
}

pub fn restore_progress(json: &str) -> Result<Progress, PersistError> {
    let progress: Progress = decode(json, PROGRESS_KIND)?;
    if crate::sim::level_config(progress.current_level).is_err() {
        return Err(PersistError::Invalid(format!(
            "current level {} out of range",
            progress.current_level
        )));
    }
    Ok(progress)
}

/// Write a game state to `path`
pub fn save_to(path: &Path, state: &GameState) -> Result<(), PersistError> {
    std::fs::write(path, serialize(state)?)?;
    log::info!("Game saved to {} (level {})", path.display(), state.level);
    Ok(())
}

/// Read a game state from `path`
pub fn load_from(path: &Path) -> Result<GameState, PersistError> {
    restore(&std::fs::read_to_string(path)?)
}

pub fn save_progress_to(path: &Path, progress: &Progress) -> Result<(), PersistError> {
    std::fs::write(path, serialize_progress(progress)?)?;
    log::info!(
        "Progress saved to {} ({} levels cleared)",
        path.display(),
        progress.completed.len()
    );
    Ok(())
}

pub fn load_progress_from(path: &Path) -> Result<Progress, PersistError> {
    restore_progress(&std::fs::read_to_string(path)?)
}
