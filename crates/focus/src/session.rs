//! Focus and rest session state
//!
//! `Session` is the single owner of the persisted settings and of the
//! in-memory mode. Every transition goes through its methods; nothing else
//! mutates the flags or the focus credit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;

use crate::settings::{Settings, SettingsCommand};

/// Why a start request was refused. The display text is the user notice.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRejected {
    #[error("正在休息中，请先结束休息再开始专注")]
    Resting,

    #[error("正在专注中，请先结束专注再开始休息")]
    Focusing,

    #[error("已经开始了")]
    AlreadyActive,
}

/// What the session is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Focusing { started: Instant },
    Resting { started: Instant },
}

/// Kind of a finished stint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Focus,
    Rest,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Focus => "focus",
            SessionKind::Rest => "rest",
        }
    }
}

/// A stint that just ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stint {
    pub kind: SessionKind,
    /// Elapsed minutes, already credited (focus) or debited (rest)
    pub minutes: f64,
}

/// Session controller over the persisted settings
#[derive(Debug)]
pub struct Session {
    settings: Settings,
    mode: Mode,
}

impl Session {
    /// Wrap loaded settings.
    ///
    /// Start instants are never persisted, so `isRunning`/`isGaming` left
    /// set by a process that died mid-session are cleared here.
    pub fn new(mut settings: Settings) -> Self {
        settings.is_running = false;
        settings.is_gaming = false;
        Self {
            settings,
            mode: Mode::Idle,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_focusing(&self) -> bool {
        matches!(self.mode, Mode::Focusing { .. })
    }

    pub fn is_resting(&self) -> bool {
        matches!(self.mode, Mode::Resting { .. })
    }

    pub fn sound_enabled(&self) -> bool {
        self.settings.sound_enabled
    }

    /// Minutes elapsed in the active stint, if any
    pub fn elapsed_minutes(&self, now: Instant) -> Option<f64> {
        match self.mode {
            Mode::Idle => None,
            Mode::Focusing { started } | Mode::Resting { started } => {
                Some(minutes_between(started, now))
            }
        }
    }

    pub fn start_focus(&mut self, now: Instant) -> Result<(), StartRejected> {
        match self.mode {
            Mode::Resting { .. } => Err(StartRejected::Resting),
            Mode::Focusing { .. } => Err(StartRejected::AlreadyActive),
            Mode::Idle => {
                self.settings.is_running = true;
                self.mode = Mode::Focusing { started: now };
                Ok(())
            }
        }
    }

    /// End focus mode and credit the elapsed minutes
    pub fn stop_focus(&mut self, now: Instant) -> Option<Stint> {
        let Mode::Focusing { started } = self.mode else {
            return None;
        };

        let minutes = minutes_between(started, now);
        self.settings.is_running = false;
        self.settings.focus_time += minutes;
        self.mode = Mode::Idle;

        Some(Stint {
            kind: SessionKind::Focus,
            minutes,
        })
    }

    pub fn start_rest(&mut self, now: Instant) -> Result<(), StartRejected> {
        match self.mode {
            Mode::Focusing { .. } => Err(StartRejected::Focusing),
            Mode::Resting { .. } => Err(StartRejected::AlreadyActive),
            Mode::Idle => {
                self.settings.is_gaming = true;
                self.mode = Mode::Resting { started: now };
                Ok(())
            }
        }
    }

    /// End rest mode and deduct the elapsed minutes from the focus credit.
    /// The credit is not clamped at zero.
    pub fn stop_rest(&mut self, now: Instant) -> Option<Stint> {
        let Mode::Resting { started } = self.mode else {
            return None;
        };

        let minutes = minutes_between(started, now);
        self.settings.is_gaming = false;
        self.settings.focus_time -= minutes;
        self.mode = Mode::Idle;

        Some(Stint {
            kind: SessionKind::Rest,
            minutes,
        })
    }

    /// Apply a settings panel change, returning true if anything changed
    pub fn apply(&mut self, command: &SettingsCommand) -> bool {
        self.settings.apply(command)
    }
}

fn minutes_between(started: Instant, now: Instant) -> f64 {
    now.saturating_duration_since(started).as_secs_f64() / 60.0
}

/// A finished stint as written to the daily session log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub kind: SessionKind,
    /// When the stint started (Unix timestamp)
    pub start: i64,
    /// When the stint ended (Unix timestamp)
    pub end: i64,
    /// Elapsed minutes
    pub minutes: f64,
    /// Set when the stint was ended by the long-break cycle
    #[serde(default)]
    pub long_break: bool,
}

impl SessionRecord {
    /// Build a record for a stint that ended at `end`
    pub fn from_stint(stint: &Stint, end: DateTime<Utc>, long_break: bool) -> Self {
        let start = end - chrono::Duration::milliseconds((stint.minutes * 60_000.0) as i64);
        Self {
            kind: stint.kind,
            start: start.timestamp(),
            end: end.timestamp(),
            minutes: stint.minutes,
            long_break,
        }
    }

    /// Get the start time as a DateTime
    pub fn start_time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.start, 0).unwrap_or_else(Utc::now)
    }
}
