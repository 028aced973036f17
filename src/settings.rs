//! Runtime settings
//!
//! Loaded from a JSON file by native hosts. Missing fields take their
//! defaults, and an unreadable file falls back to defaults entirely.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sim::MAX_LEVEL;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// RNG seed for the first session (time-based when absent)
    pub seed: Option<u64>,
    /// Level the driver starts on
    pub start_level: u32,
    /// Wall time per timer tick
    pub tick_interval_ms: u64,
    /// How long match/invalid feedback stays up before the host clears it
    pub feedback_window_ms: u64,
    /// Delay between moves of the demo auto-player
    pub autoplay_move_ms: u64,
    /// Play on into the next level after a win (demo driver)
    pub auto_advance: bool,
    /// Stop the demo driver after this many levels
    pub max_sessions: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: None,
            start_level: 1,
            tick_interval_ms: 1000,
            feedback_window_ms: 1000,
            autoplay_move_ms: 400,
            auto_advance: true,
            max_sessions: 3,
        }
    }
}

impl Settings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn feedback_window(&self) -> Duration {
        Duration::from_millis(self.feedback_window_ms)
    }

    pub fn autoplay_move(&self) -> Duration {
        Duration::from_millis(self.autoplay_move_ms)
    }

    /// Start level clamped into the playable range
    pub fn effective_start_level(&self) -> u32 {
        self.start_level.clamp(1, MAX_LEVEL)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    return settings;
                }
                Err(err) => log::warn!("Ignoring malformed settings {}: {err}", path.display()),
            },
            Err(err) => log::info!("No settings at {} ({err}), using defaults", path.display()),
        }
        Self::default()
    }

    /// Save settings to `path`
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
