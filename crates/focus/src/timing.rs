//! Timer configuration
//!
//! Loaded from `timing.json` in the config directory. Missing fields fall
//! back to the defaults: a reminder every 3-5 minutes, a 10 second short
//! break, a long break of 20 minutes after 90 minutes of focus.

use anyhow::{ensure, Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Durations driving the schedulers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    /// Shortest delay before a short-break reminder, in seconds
    #[serde(default = "default_reminder_min_secs")]
    pub reminder_min_secs: f64,

    /// Upper bound (exclusive) of the reminder delay, in seconds
    #[serde(default = "default_reminder_max_secs")]
    pub reminder_max_secs: f64,

    /// Length of the short break, in seconds
    #[serde(default = "default_short_break_secs")]
    pub short_break_secs: u64,

    /// Continuous focus before a long break, in minutes
    #[serde(default = "default_cycle_minutes")]
    pub cycle_minutes: u64,

    /// Length of the long break, in minutes
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u64,

    /// Status bar refresh period, in milliseconds
    #[serde(default = "default_status_tick_ms")]
    pub status_tick_ms: u64,
}

/// Longest accepted reminder delay, in seconds
const MAX_REMINDER_SECS: f64 = 24.0 * 60.0 * 60.0;
/// Longest accepted cycle or long break, in minutes
const MAX_MINUTES: u64 = 24 * 60;
const MAX_SHORT_BREAK_SECS: u64 = 60 * 60;
const STATUS_TICK_MS: std::ops::RangeInclusive<u64> = 50..=60_000;

fn default_reminder_min_secs() -> f64 {
    180.0
}
fn default_reminder_max_secs() -> f64 {
    300.0
}
fn default_short_break_secs() -> u64 {
    10
}
fn default_cycle_minutes() -> u64 {
    90
}
fn default_long_break_minutes() -> u64 {
    20
}
fn default_status_tick_ms() -> u64 {
    1000
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            reminder_min_secs: default_reminder_min_secs(),
            reminder_max_secs: default_reminder_max_secs(),
            short_break_secs: default_short_break_secs(),
            cycle_minutes: default_cycle_minutes(),
            long_break_minutes: default_long_break_minutes(),
            status_tick_ms: default_status_tick_ms(),
        }
    }
}

impl Timing {
    /// Load timing from a JSON file, using defaults if it does not exist.
    /// Out-of-range values are an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read timing config: {}", path.display()))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let timing: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse timing config: {}", path.display()))?;
        timing
            .validate()
            .with_context(|| format!("Invalid timing config: {}", path.display()))?;
        Ok(timing)
    }

    /// Check every duration is positive and bounded
    pub fn validate(&self) -> Result<()> {
        let reminder = 1.0..=MAX_REMINDER_SECS;
        ensure!(
            reminder.contains(&self.reminder_min_secs),
            "reminder_min_secs must be between 1 and {}, got {}",
            MAX_REMINDER_SECS,
            self.reminder_min_secs
        );
        ensure!(
            reminder.contains(&self.reminder_max_secs),
            "reminder_max_secs must be between 1 and {}, got {}",
            MAX_REMINDER_SECS,
            self.reminder_max_secs
        );
        ensure!(
            self.reminder_max_secs >= self.reminder_min_secs,
            "reminder_max_secs ({}) is below reminder_min_secs ({})",
            self.reminder_max_secs,
            self.reminder_min_secs
        );
        ensure!(
            (1..=MAX_SHORT_BREAK_SECS).contains(&self.short_break_secs),
            "short_break_secs must be between 1 and {}, got {}",
            MAX_SHORT_BREAK_SECS,
            self.short_break_secs
        );
        ensure!(
            (1..=MAX_MINUTES).contains(&self.cycle_minutes),
            "cycle_minutes must be between 1 and {}, got {}",
            MAX_MINUTES,
            self.cycle_minutes
        );
        ensure!(
            (1..=MAX_MINUTES).contains(&self.long_break_minutes),
            "long_break_minutes must be between 1 and {}, got {}",
            MAX_MINUTES,
            self.long_break_minutes
        );
        ensure!(
            STATUS_TICK_MS.contains(&self.status_tick_ms),
            "status_tick_ms must be between {} and {}, got {}",
            STATUS_TICK_MS.start(),
            STATUS_TICK_MS.end(),
            self.status_tick_ms
        );
        Ok(())
    }

    /// Draw the delay until the next short-break reminder.
    ///
    /// Uniform over `[reminder_min_secs, reminder_max_secs)`; a degenerate
    /// range yields the minimum.
    pub fn reminder_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min = self.reminder_min_secs.clamp(0.0, MAX_REMINDER_SECS);
        let max = self.reminder_max_secs.min(MAX_REMINDER_SECS);
        let secs = if max > min { rng.gen_range(min..max) } else { min };
        Duration::from_secs_f64(secs)
    }

    pub fn short_break(&self) -> Duration {
        Duration::from_secs(self.short_break_secs)
    }

    pub fn cycle(&self) -> Duration {
        Duration::from_secs(self.cycle_minutes.saturating_mul(60))
    }

    pub fn long_break(&self) -> Duration {
        Duration::from_secs(self.long_break_minutes.saturating_mul(60))
    }

    pub fn status_tick(&self) -> Duration {
        Duration::from_millis(self.status_tick_ms.max(1))
    }
}
