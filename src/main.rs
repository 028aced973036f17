//! Number Master native entry point
//!
//! Runs the rules engine headless with a simple auto-player so a full
//! session (clock, matches, add rows, level changes) can be watched from a
//! terminal. Arguments: an optional settings JSON path, then an optional
//! progress file that is loaded at start and written back on exit.

use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

use number_master::persistence;
use number_master::progress::Progress;
use number_master::session::{Command, Session};
use number_master::settings::Settings;
use number_master::sim::{GameEvent, GameState, GameStatus, find_match};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let settings = match args.next() {
        Some(path) => Settings::load(&path),
        None => Settings::default(),
    };
    let progress_path = args.next();
    let progress = match &progress_path {
        Some(path) if path.exists() => persistence::load_progress_from(path)
            .with_context(|| format!("loading progress from {}", path.display()))?,
        _ => Progress::new(),
    };
    let seed = settings.seed.unwrap_or_else(clock_seed);
    log::info!("Number Master (native) starting, seed {seed}");

    let mut session = Session::new(&settings, seed).with_progress(progress);
    session.on_event(log_event);
    session
        .start(settings.effective_start_level())
        .context("starting first level")?;

    let (tx, rx) = mpsc::channel();
    let ticker = spawn_ticker(tx, settings.tick_interval());

    let mut player = AutoPlayer::new(&settings);
    session.run(&rx, settings.autoplay_move(), |session| player.step(session));
    drop(rx);
    if ticker.join().is_err() {
        log::warn!("Ticker thread panicked");
    }

    let final_state = session.state();
    println!(
        "Stopped on level {} ({:?}): {} matches, score {}",
        final_state.level, final_state.status, final_state.matches, final_state.score
    );
    let stats = session.progress().stats();
    println!(
        "Cleared {} of {} levels, {} stars",
        stats.total_completed,
        stats.max_level,
        session.progress().total_stars()
    );
    match &progress_path {
        Some(path) => persistence::save_progress_to(path, session.progress())
            .with_context(|| format!("saving progress to {}", path.display()))?,
        None => println!(
            "{}",
            persistence::serialize_progress(session.progress()).context("encoding progress")?
        ),
    }
    Ok(())
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Sends elapsed wall time to the session loop until the loop goes away
fn spawn_ticker(tx: Sender<Command>, interval: Duration) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut last = Instant::now();
        loop {
            thread::sleep(interval);
            let now = Instant::now();
            if tx.send(Command::Elapsed(now - last)).is_err() {
                break;
            }
            last = now;
        }
    })
}

fn log_event(event: &GameEvent, state: &GameState) {
    match event {
        GameEvent::Matched { tile1, tile2 } => log::info!(
            "Matched {tile1} + {tile2} ({}/{}, score {})",
            state.matches,
            state.config.target_matches,
            state.score
        ),
        GameEvent::RowAdded { row } => log::info!(
            "Row {row} added ({} left)",
            state.add_rows_remaining()
        ),
        GameEvent::Ticked { time_remaining } if time_remaining % 10 == 0 => {
            log::info!("{time_remaining}s left")
        }
        GameEvent::InvalidMatch { tile1, tile2 } => log::debug!("No pair: {tile1} / {tile2}"),
        _ => log::debug!("{event:?}"),
    }
}

/// Greedy player: takes the first pair it sees, adds rows when stuck
struct AutoPlayer {
    feedback_window: Duration,
    feedback_since: Option<Instant>,
    auto_advance: bool,
    sessions_left: u32,
}

impl AutoPlayer {
    fn new(settings: &Settings) -> Self {
        Self {
            feedback_window: settings.feedback_window(),
            feedback_since: None,
            auto_advance: settings.auto_advance,
            sessions_left: settings.max_sessions.saturating_sub(1),
        }
    }

    /// One move. Returns `false` when the demo is over.
    fn step(&mut self, session: &mut Session) -> bool {
        self.expire_feedback(session);

        match session.status() {
            GameStatus::Playing => {
                if let Some((a, b)) = find_match(&session.state().grid) {
                    session.select(a);
                    session.select(b);
                } else if session.state().can_add_row() {
                    session.add_row();
                }
                true
            }
            GameStatus::Completed if self.auto_advance && self.sessions_left > 0 => {
                self.sessions_left -= 1;
                session.next_level();
                true
            }
            GameStatus::Failed if self.sessions_left > 0 => {
                self.sessions_left -= 1;
                session.reset(None);
                true
            }
            GameStatus::Paused => {
                session.resume();
                true
            }
            GameStatus::Menu | GameStatus::Completed | GameStatus::Failed => false,
        }
    }

    fn expire_feedback(&mut self, session: &mut Session) {
        if session.state().last_match_animation.is_none() {
            self.feedback_since = None;
            return;
        }
        let since = *self.feedback_since.get_or_insert_with(Instant::now);
        if since.elapsed() >= self.feedback_window {
            session.clear_feedback();
            self.feedback_since = None;
        }
    }
}
