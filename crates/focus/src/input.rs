//! Line commands accepted by `focus run` on stdin

use crate::engine::Command;
use crate::settings::SettingsCommand;

/// Help shown for unknown input
pub const HELP: &str = "\
  f, focus          toggle focus mode
  g, game, rest     toggle rest mode
  sound on|off      turn break cues on or off
  time <MINUTES>    set the total focus time
  s, status         show the current status
  q, quit           stop and exit";

/// Parse one line of input. Returns `None` for blank or unknown lines.
pub fn parse_line(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let head = words.next()?.to_lowercase();
    let rest: Vec<&str> = words.collect();

    match (head.as_str(), rest.as_slice()) {
        ("f" | "focus", []) => Some(Command::ToggleFocus),
        ("g" | "game" | "rest", []) => Some(Command::ToggleRest),
        ("s" | "status", []) => Some(Command::ShowStatus),
        ("q" | "quit" | "exit", []) => Some(Command::Shutdown),
        ("sound", [value]) => parse_switch(value).map(|on| Command::Settings(SettingsCommand::Sound(on))),
        ("time", [value]) => Some(Command::Settings(SettingsCommand::FocusTime(value.to_string()))),
        _ => None,
    }
}

/// Parse `on`/`off` style switches
pub fn parse_switch(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
