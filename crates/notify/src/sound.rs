//! Audio cues for the start and end of a short break
//!
//! The cues are embedded WAV files. Playback hands the file to a
//! command-line player and returns immediately; the caller never waits for
//! the sound to finish.

use std::collections::HashMap;
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Mutex;

use tempfile::TempPath;
use thiserror::Error;

use crate::command_exists;

/// Errors raised while playing a cue
#[derive(Error, Debug)]
pub enum SoundError {
    #[error("No audio player found (tried afplay, paplay, aplay)")]
    NoPlayer,

    #[error("Failed to stage {cue} cue: {source}")]
    Stage {
        cue: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start {player}: {source}")]
    Spawn {
        player: String,
        #[source]
        source: std::io::Error,
    },
}

/// One of the two embedded sounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Played when a short break starts
    Begin,
    /// Played when a short break is over
    End,
}

impl Cue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cue::Begin => "begin",
            Cue::End => "end",
        }
    }

    /// Raw WAV bytes of the cue
    pub fn bytes(&self) -> &'static [u8] {
        match self {
            Cue::Begin => include_bytes!("../assets/begin.wav"),
            Cue::End => include_bytes!("../assets/end.wav"),
        }
    }
}

/// Plays cues through an external audio player
pub struct Player {
    program: Option<String>,
    staged: Mutex<HashMap<Cue, TempPath>>,
}

impl Player {
    /// Pick the first audio player available on this platform
    pub fn detect() -> Self {
        let candidates: &[&str] = if cfg!(target_os = "macos") {
            &["afplay"]
        } else {
            &["paplay", "aplay"]
        };

        let program = candidates
            .iter()
            .find(|p| command_exists(p))
            .map(|p| p.to_string());

        match &program {
            Some(p) => tracing::debug!(player = %p, "audio player detected"),
            None => tracing::debug!("no audio player detected"),
        }

        Self::with_program(program)
    }

    /// Use a specific player program, or none at all
    pub fn with_program(program: Option<String>) -> Self {
        Self {
            program,
            staged: Mutex::new(HashMap::new()),
        }
    }

    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }

    /// Start playing a cue without waiting for it to finish
    pub fn play(&self, cue: Cue) -> Result<(), SoundError> {
        let program = self.program.as_deref().ok_or(SoundError::NoPlayer)?;

        let mut staged = self.staged.lock().unwrap_or_else(|e| e.into_inner());
        if !staged.contains_key(&cue) {
            let path = stage(cue)?;
            staged.insert(cue, path);
        }
        let path = &staged[&cue];

        let mut child = Command::new(program)
            .arg(path.as_os_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SoundError::Spawn {
                player: program.to_string(),
                source,
            })?;

        // Reap the child off the caller's thread
        std::thread::spawn(move || {
            let _ = child.wait();
        });

        tracing::debug!(cue = cue.as_str(), player = program, "cue started");
        Ok(())
    }
}

/// Write a cue to a temporary .wav file that lives as long as the player
fn stage(cue: Cue) -> Result<TempPath, SoundError> {
    let wrap = |source: std::io::Error| SoundError::Stage {
        cue: cue.as_str(),
        source,
    };

    let mut file = tempfile::Builder::new()
        .prefix(&format!("focusplay-{}-", cue.as_str()))
        .suffix(".wav")
        .tempfile()
        .map_err(wrap)?;
    file.write_all(cue.bytes()).map_err(wrap)?;
    file.flush().map_err(wrap)?;

    Ok(file.into_temp_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cues_are_wav() {
        for cue in [Cue::Begin, Cue::End] {
            let bytes = cue.bytes();
            assert_eq!(&bytes[0..4], b"RIFF");
            assert_eq!(&bytes[8..12], b"WAVE");
        }
    }

    #[test]
    fn test_no_player() {
        let player = Player::with_program(None);
        assert!(matches!(player.play(Cue::Begin), Err(SoundError::NoPlayer)));
    }

    #[test]
    fn test_missing_player_binary() {
        let player = Player::with_program(Some("focusplay-no-such-player".to_string()));
        let err = player.play(Cue::End).unwrap_err();
        assert!(matches!(err, SoundError::Spawn { .. }));
        assert!(err.to_string().contains("focusplay-no-such-player"));
    }

    #[test]
    fn test_stage_writes_cue() {
        let path = stage(Cue::Begin).unwrap();
        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, Cue::Begin.bytes());
        assert!(path.to_string_lossy().ends_with(".wav"));
    }
}
