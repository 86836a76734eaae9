//! Platform notice backends
//!
//! Every backend except `Echo` is an external program. `Backend::command`
//! builds the invocation and `Backend::send` runs it to completion, so
//! callers on an event loop should send from a worker thread.

use anyhow::{bail, Context, Result};
use std::process::Command;

use crate::{command_exists, DEFAULT_TITLE};

/// How hard a notice asks for attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Urgency {
    #[default]
    Normal,
    /// Break prompts. Shown through do-not-disturb where the platform allows it.
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Normal => "normal",
            Urgency::Critical => "critical",
        }
    }
}

/// A transient notice
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Notification {
    pub message: String,
    pub urgency: Urgency,
    /// Seconds on screen; the platform decides when unset
    pub timeout: Option<u32>,
}

impl Notification {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout = Some(seconds);
        self
    }
}

/// Where notices go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// macOS terminal-notifier
    TerminalNotifier,
    /// macOS osascript
    Osascript,
    /// Linux notify-send
    NotifySend,
    /// KDE kdialog
    Kdialog,
    /// Windows toast from inside WSL
    Wsl,
    /// A line on stdout
    Echo,
}

impl Backend {
    /// Pick the first backend whose program is installed
    pub fn detect() -> Self {
        if cfg!(target_os = "linux") && std::env::var_os("WSL_DISTRO_NAME").is_some() {
            return Self::Wsl;
        }

        let candidates: &[Backend] = if cfg!(target_os = "macos") {
            &[Self::TerminalNotifier, Self::Osascript]
        } else if cfg!(target_os = "linux") {
            &[Self::NotifySend, Self::Kdialog]
        } else {
            &[]
        };

        candidates
            .iter()
            .copied()
            .find(|b| command_exists(b.program()))
            .unwrap_or(Self::Echo)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Wsl => "wsl",
            other => other.program(),
        }
    }

    /// Executable behind the backend
    fn program(&self) -> &'static str {
        match self {
            Self::TerminalNotifier => "terminal-notifier",
            Self::Osascript => "osascript",
            Self::NotifySend => "notify-send",
            Self::Kdialog => "kdialog",
            Self::Wsl => "powershell.exe",
            Self::Echo => "echo",
        }
    }

    /// Show a notice and wait for the backend program to exit
    pub fn send(&self, notification: &Notification) -> Result<()> {
        tracing::debug!(
            backend = self.name(),
            urgency = notification.urgency.as_str(),
            message = %notification.message,
            "sending notice"
        );

        let Some(mut cmd) = self.command(notification) else {
            println!("{}", echo_line(notification));
            return Ok(());
        };

        let status = cmd
            .status()
            .with_context(|| format!("Failed to run {}", self.program()))?;
        if !status.success() {
            bail!("{} exited with {}", self.program(), status);
        }
        Ok(())
    }

    /// The process that displays `notification`, or `None` for echo
    fn command(&self, notification: &Notification) -> Option<Command> {
        let message = notification.message.as_str();
        let critical = notification.urgency == Urgency::Critical;
        let mut cmd = Command::new(self.program());

        match self {
            Self::TerminalNotifier => {
                cmd.args(["-title", DEFAULT_TITLE, "-message", message, "-group", "focusplay"]);
                if critical {
                    cmd.arg("-ignoreDnD");
                }
            }
            Self::Osascript => {
                let script = format!(
                    "display notification {} with title {}",
                    applescript_string(message),
                    applescript_string(DEFAULT_TITLE)
                );
                cmd.args(["-e", &script]);
            }
            Self::NotifySend => {
                cmd.args(["--app-name", "focusplay", "--urgency", notification.urgency.as_str()]);
                if let Some(secs) = notification.timeout {
                    cmd.arg(format!("--expire-time={}", u64::from(secs) * 1000));
                }
                cmd.args([DEFAULT_TITLE, message]);
            }
            Self::Kdialog => {
                let secs = notification.timeout.unwrap_or(5);
                cmd.args(["--title", DEFAULT_TITLE, "--passivepopup", message])
                    .arg(secs.to_string());
            }
            Self::Wsl => {
                cmd.args(["-NoProfile", "-Command", &toast_script(message)]);
            }
            Self::Echo => return None,
        }

        Some(cmd)
    }
}

/// Quote text as an AppleScript string literal
fn applescript_string(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// PowerShell that raises a generic toast with the app title and `message`
fn toast_script(message: &str) -> String {
    let xml = format!(
        "<toast><visual><binding template=\"ToastGeneric\"><text>{}</text><text>{}</text></binding></visual></toast>",
        xml_text(DEFAULT_TITLE),
        xml_text(message)
    );
    // Single-quoted PowerShell strings only need '' for '
    let xml = xml.replace('\'', "''");

    [
        "$null = [Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime]",
        "$null = [Windows.Data.Xml.Dom.XmlDocument, Windows.Data.Xml.Dom.XmlDocument, ContentType = WindowsRuntime]",
        "$doc = New-Object Windows.Data.Xml.Dom.XmlDocument",
        &format!("$doc.LoadXml('{}')", xml),
        &format!(
            "[Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier('{}').Show([Windows.UI.Notifications.ToastNotification]::new($doc))",
            DEFAULT_TITLE
        ),
    ]
    .join("; ")
}

fn xml_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// What the echo backend prints
fn echo_line(notification: &Notification) -> String {
    let marker = match notification.urgency {
        Urgency::Critical => "!",
        Urgency::Normal => "",
    };
    match notification.timeout {
        Some(secs) => format!("[{}]{} {} ({}s)", DEFAULT_TITLE, marker, notification.message, secs),
        None => format!("[{}]{} {}", DEFAULT_TITLE, marker, notification.message),
    }
}
