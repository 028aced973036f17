//! Live game session
//!
//! Owns the one `GameState`, the level timer, progress, and the callbacks
//! the presentation layer registers. All mutation goes through `&mut self`,
//! so dispatches are serialized by construction. Producers on other threads
//! talk to the session through a `Command` channel drained by one loop.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::persistence::{self, PersistError};
use crate::progress::Progress;
use crate::settings::Settings;
use crate::sim::{
    Action, GameEvent, GameState, GameStatus, LevelError, MatchFeedback, TileId, dispatch,
    level_config,
};

/// Callback invoked after every event, with the state as it stands after the dispatch
pub type Listener = Box<dyn FnMut(&GameEvent, &GameState)>;

/// Turns elapsed wall time into whole timer ticks
#[derive(Debug, Clone)]
pub struct SessionTimer {
    interval: Duration,
    pending: Duration,
}

impl SessionTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            pending: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Add elapsed time, returning how many ticks are now due
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.pending += elapsed;
        let mut due = 0;
        while self.pending >= self.interval {
            self.pending -= self.interval;
            due += 1;
        }
        due
    }

    /// Drop any partial interval
    pub fn reset(&mut self) {
        self.pending = Duration::ZERO;
    }
}

/// Input for a session loop
#[derive(Debug, Clone)]
pub enum Command {
    Dispatch(Action),
    /// Wall time passed since the previous `Elapsed`
    Elapsed(Duration),
    ClearFeedback,
    Shutdown,
}

pub struct Session {
    state: GameState,
    timer: SessionTimer,
    progress: Progress,
    listeners: Vec<Listener>,
}

impl Session {
    /// Session sitting on the menu
    pub fn new(settings: &Settings, seed: u64) -> Self {
        Self::with_state(GameState::menu(seed), settings.tick_interval())
    }

    /// Session resuming an existing state
    pub fn with_state(state: GameState, tick_interval: Duration) -> Self {
        Self {
            state,
            timer: SessionTimer::new(tick_interval),
            progress: Progress::new(),
            listeners: Vec::new(),
        }
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Register a callback for every event this session produces
    pub fn on_event<F>(&mut self, listener: F)
    where
        F: FnMut(&GameEvent, &GameState) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Read-only view for rendering
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Owned copy for renderers that outlive the borrow
    pub fn snapshot(&self) -> GameState {
        self.state.clone()
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn status(&self) -> GameStatus {
        self.state.status
    }

    /// Apply one action and notify listeners
    pub fn dispatch(&mut self, action: Action) -> Vec<GameEvent> {
        let status_before = self.state.status;
        let events = dispatch(&mut self.state, action);

        let replaced = events
            .iter()
            .any(|e| matches!(e, GameEvent::Started { .. }));
        if replaced || self.state.status != status_before {
            self.timer.reset();
        }

        for event in &events {
            match event {
                GameEvent::Started { level } => {
                    self.progress.current_level = *level;
                }
                GameEvent::Completed { .. } => {
                    self.progress.record_session(&self.state);
                }
                _ => {}
            }
            for listener in self.listeners.iter_mut() {
                listener(event, &self.state);
            }
        }

        events
    }

    /// Feed wall time to the level timer, dispatching any ticks that are due
    pub fn advance(&mut self, elapsed: Duration) -> Vec<GameEvent> {
        if self.state.status != GameStatus::Playing {
            self.timer.reset();
            return Vec::new();
        }

        let due = self.timer.advance(elapsed);
        let mut events = Vec::new();
        for _ in 0..due {
            events.extend(self.dispatch(Action::TickTimer));
            if self.state.status != GameStatus::Playing {
                break;
            }
        }
        events
    }

    pub fn start(&mut self, level: u32) -> Result<Vec<GameEvent>, LevelError> {
        level_config(level)?;
        Ok(self.dispatch(Action::StartGame { level }))
    }

    pub fn select(&mut self, tile: TileId) -> Vec<GameEvent> {
        self.dispatch(Action::SelectTile { tile })
    }

    pub fn add_row(&mut self) -> Vec<GameEvent> {
        self.dispatch(Action::AddRow)
    }

    pub fn pause(&mut self) -> Vec<GameEvent> {
        self.dispatch(Action::PauseGame)
    }

    pub fn resume(&mut self) -> Vec<GameEvent> {
        self.dispatch(Action::ResumeGame)
    }

    pub fn next_level(&mut self) -> Vec<GameEvent> {
        self.dispatch(Action::NextLevel)
    }

    pub fn reset(&mut self, level: Option<u32>) -> Vec<GameEvent> {
        self.dispatch(Action::ResetGame { level })
    }

    /// Take the pending match feedback once the host has shown it
    pub fn clear_feedback(&mut self) -> Option<MatchFeedback> {
        self.state.last_match_animation.take()
    }

    pub fn serialize(&self) -> Result<String, PersistError> {
        persistence::serialize(&self.state)
    }

    /// Replace the live state with a saved one
    pub fn restore(&mut self, json: &str) -> Result<(), PersistError> {
        self.state = persistence::restore(json)?;
        self.timer.reset();
        Ok(())
    }

    /// Apply one command. Returns `false` once the loop should stop.
    pub fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Dispatch(action) => {
                self.dispatch(action);
            }
            Command::Elapsed(elapsed) => {
                self.advance(elapsed);
            }
            Command::ClearFeedback => {
                self.clear_feedback();
            }
            Command::Shutdown => return false,
        }
        true
    }

    /// Drain commands until shutdown or until every sender is gone.
    ///
    /// `idle` runs once every `poll`, however busy the channel is, with the
    /// session borrowed mutably; returning `false` from it stops the loop.
    pub fn run<F>(&mut self, commands: &Receiver<Command>, poll: Duration, mut idle: F)
    where
        F: FnMut(&mut Session) -> bool,
    {
        let mut next_idle = Instant::now() + poll;
        loop {
            let wait = next_idle.saturating_duration_since(Instant::now());
            match commands.recv_timeout(wait) {
                Ok(command) => {
                    if !self.handle(command) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if Instant::now() >= next_idle {
                if !idle(self) {
                    break;
                }
                next_idle = Instant::now() + poll;
            }
        }
    }
}
