//! focusplay-notify - Desktop notices and audio cues for Focusplay
//!
//! Notices go through whatever the platform offers (notify-send, osascript,
//! terminal-notifier, kdialog, WSL toast) and fall back to plain text.
//! The two break cues ship inside the binary and are played through the
//! platform's command-line audio player.

mod backend;
pub mod sound;

pub use backend::{Backend, Notification, Urgency};
pub use sound::{Cue, Player, SoundError};

use std::process::Command;

/// Default notification title
pub const DEFAULT_TITLE: &str = "Focusplay";

/// Check if a command exists on PATH
pub(crate) fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
