//! Persisted settings and the settings panel commands
//!
//! The settings file is a flat JSON record. Every field has a default so
//! files written by older versions (or edited by hand) merge over the
//! defaults instead of failing to load.

use serde::{Deserialize, Serialize};

/// The persisted settings record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// True while focus mode is active
    #[serde(default)]
    pub is_running: bool,
    /// True while rest (game) mode is active
    #[serde(default)]
    pub is_gaming: bool,
    /// Whether the break cues are played
    #[serde(default = "default_sound_enabled")]
    pub sound_enabled: bool,
    /// Cumulative focus credit in minutes; rest is deducted and may drive it negative
    #[serde(default)]
    pub focus_time: f64,
}

fn default_sound_enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            is_running: false,
            is_gaming: false,
            sound_enabled: default_sound_enabled(),
            focus_time: 0.0,
        }
    }
}

/// A change made through the settings panel
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsCommand {
    /// Turn the break cues on or off
    Sound(bool),
    /// Raw text typed into the focus-time field
    FocusTime(String),
}

impl Settings {
    /// Apply a settings panel change. Returns true when a value changed.
    ///
    /// Focus-time input that is not a finite number is ignored without
    /// any error.
    pub fn apply(&mut self, command: &SettingsCommand) -> bool {
        match command {
            SettingsCommand::Sound(enabled) => {
                let changed = self.sound_enabled != *enabled;
                self.sound_enabled = *enabled;
                changed
            }
            SettingsCommand::FocusTime(input) => match parse_focus_time(input) {
                Some(value) => {
                    self.focus_time = value;
                    true
                }
                None => false,
            },
        }
    }
}

/// Parse the focus-time field as a floating point minute count
pub fn parse_focus_time(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
