//! The surface the timer talks to: notices, the status bar and audio cues
//!
//! `DesktopHost` drives the real desktop; `RecordingHost` keeps every call
//! in memory so the engine can be exercised without side effects.

use std::collections::HashSet;
use std::io::{IsTerminal, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use focusplay_notify::{Backend, Cue, Notification, Player, SoundError, Urgency};

/// Facilities the engine needs from its host.
///
/// Every method must return promptly: they are called from the engine
/// loop, and a slow call delays every timer behind it.
pub trait Host: Send {
    /// Show a transient notice, optionally for a fixed duration
    fn notice(&self, message: &str, duration: Option<Duration>, urgency: Urgency);

    /// Replace the status bar text
    fn status(&self, text: &str);

    /// Start playing a cue; does not wait for it to finish
    fn play(&self, cue: Cue) -> Result<(), SoundError>;
}

/// Delivers one notice, possibly slowly
pub trait Notifier: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn send(&self, notification: &Notification) -> anyhow::Result<()>;
}

impl Notifier for Backend {
    fn name(&self) -> &'static str {
        Backend::name(self)
    }

    fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        Backend::send(self, notification)
    }
}

/// Desktop notices, a status line on stderr and cues through the system player
pub struct DesktopHost {
    notifier: Arc<dyn Notifier>,
    /// Notices print to the terminal we draw the status line on
    inline: bool,
    player: Player,
    tty: bool,
    last_status: Mutex<String>,
}

impl DesktopHost {
    pub fn detect() -> Self {
        let backend = Backend::detect();
        let player = Player::detect();
        tracing::info!(
            backend = backend.name(),
            player = player.program().unwrap_or("none"),
            "desktop host ready"
        );
        Self::new(backend, player)
    }

    pub fn new(backend: Backend, player: Player) -> Self {
        let mut host = Self::with_notifier(Arc::new(backend), player);
        host.inline = backend == Backend::Echo;
        host
    }

    /// Route notices through any `Notifier`. Each one is sent from its own
    /// thread.
    pub fn with_notifier(notifier: Arc<dyn Notifier>, player: Player) -> Self {
        Self {
            notifier,
            inline: false,
            player,
            tty: std::io::stderr().is_terminal(),
            last_status: Mutex::new(String::new()),
        }
    }

    pub fn notifier_name(&self) -> &'static str {
        self.notifier.name()
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Send a notice and wait for the backend to finish with it
    pub fn notice_now(&self, message: &str, duration: Option<Duration>) -> anyhow::Result<()> {
        self.notifier.send(&notification(message, duration, Urgency::Normal))
    }
}

fn notification(message: &str, duration: Option<Duration>, urgency: Urgency) -> Notification {
    let notification = Notification::new(message).with_urgency(urgency);
    match duration {
        Some(d) => notification.with_timeout(d.as_secs().clamp(1, u32::MAX as u64) as u32),
        None => notification,
    }
}

impl Host for DesktopHost {
    fn notice(&self, message: &str, duration: Option<Duration>, urgency: Urgency) {
        let notification = notification(message, duration, urgency);

        if self.inline {
            if self.tty {
                // Keep the echoed notice off the status line
                eprint!("\r\x1b[2K");
            }
            if let Err(e) = self.notifier.send(&notification) {
                tracing::warn!(backend = self.notifier.name(), "notice failed: {:#}", e);
            }
            return;
        }

        // Notifier programs may block until the popup closes
        let notifier = Arc::clone(&self.notifier);
        let spawned = std::thread::Builder::new()
            .name("notice".to_string())
            .spawn(move || {
                if let Err(e) = notifier.send(&notification) {
                    tracing::warn!(backend = notifier.name(), "notice failed: {:#}", e);
                }
            });
        if let Err(e) = spawned {
            tracing::warn!("could not start notice thread: {}", e);
        }
    }

    fn status(&self, text: &str) {
        let mut last = self.last_status.lock().unwrap_or_else(|e| e.into_inner());
        let mut stderr = std::io::stderr().lock();

        if self.tty {
            let _ = write!(stderr, "\r\x1b[2K{}", text);
            let _ = stderr.flush();
        } else if *last != text {
            let _ = writeln!(stderr, "{}", text);
        }

        last.clear();
        last.push_str(text);
    }

    fn play(&self, cue: Cue) -> Result<(), SoundError> {
        self.player.play(cue)
    }
}

/// One call made on a `RecordingHost`
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Notice {
        message: String,
        duration: Option<Duration>,
        urgency: Urgency,
    },
    Status(String),
    Play(Cue),
}

/// In-memory host. Clones share the same call log.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    calls: Arc<Mutex<Vec<HostCall>>>,
    failing: Arc<Mutex<HashSet<Cue>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later attempt to play `cue` fail
    pub fn fail_cue(&self, cue: Cue) {
        self.failing.lock().unwrap_or_else(|e| e.into_inner()).insert(cue);
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HostCall::Notice { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Notices sent with `Urgency::Critical`
    pub fn alerts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HostCall::Notice {
                    message,
                    urgency: Urgency::Critical,
                    ..
                } => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Cues that were attempted, including failed ones
    pub fn plays(&self) -> Vec<Cue> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HostCall::Play(cue) => Some(cue),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<String> {
        self.calls().into_iter().rev().find_map(|c| match c {
            HostCall::Status(text) => Some(text),
            _ => None,
        })
    }

    fn push(&self, call: HostCall) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }
}

impl Host for RecordingHost {
    fn notice(&self, message: &str, duration: Option<Duration>, urgency: Urgency) {
        self.push(HostCall::Notice {
            message: message.to_string(),
            duration,
            urgency,
        });
    }

    fn status(&self, text: &str) {
        self.push(HostCall::Status(text.to_string()));
    }

    fn play(&self, cue: Cue) -> Result<(), SoundError> {
        self.push(HostCall::Play(cue));
        if self.failing.lock().unwrap_or_else(|e| e.into_inner()).contains(&cue) {
            return Err(SoundError::NoPlayer);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::mpsc;

    /// Takes `delay` to deliver each notice, like a popup that waits to close
    struct SlowNotifier {
        delay: Duration,
        delivered: Mutex<mpsc::Sender<String>>,
    }

    impl Notifier for SlowNotifier {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn send(&self, notification: &Notification) -> anyhow::Result<()> {
            std::thread::sleep(self.delay);
            let _ = self
                .delivered
                .lock()
                .unwrap()
                .send(notification.message.clone());
            Ok(())
        }
    }

    #[test]
    fn test_recording_host_shares_log_across_clones() {
        let host = RecordingHost::new();
        let clone = host.clone();

        clone.notice("开始专注", None, Urgency::Normal);
        clone.status("本次专注：0.0分钟");
        clone.play(Cue::Begin).unwrap();

        assert_eq!(host.notices(), vec!["开始专注".to_string()]);
        assert_eq!(host.last_status().as_deref(), Some("本次专注：0.0分钟"));
        assert_eq!(host.plays(), vec![Cue::Begin]);
    }

    #[test]
    fn test_recording_host_injected_failure() {
        let host = RecordingHost::new();
        host.fail_cue(Cue::End);
        assert!(host.play(Cue::Begin).is_ok());
        assert!(host.play(Cue::End).is_err());
        assert_eq!(host.plays(), vec![Cue::Begin, Cue::End]);
    }

    #[test]
    fn test_desktop_host_without_player() {
        let host = DesktopHost::new(Backend::Echo, Player::with_program(None));
        assert!(matches!(host.play(Cue::Begin), Err(SoundError::NoPlayer)));
        host.status("总专注：0.0分钟");
        host.notice("hello", Some(Duration::from_secs(10)), Urgency::Critical);
    }

    #[tokio::test]
    async fn test_slow_notifier_does_not_stall_the_runtime() {
        let (tx, rx) = mpsc::channel();
        let notifier = SlowNotifier {
            delay: Duration::from_secs(2),
            delivered: Mutex::new(tx),
        };
        let host = DesktopHost::with_notifier(Arc::new(notifier), Player::with_program(None));
        assert_eq!(host.notifier_name(), "slow");

        let ticks = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&ticks);
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(50));
            loop {
                interval.tick().await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let started = std::time::Instant::now();
        host.notice("休息一下", Some(Duration::from_secs(10)), Urgency::Critical);
        assert!(started.elapsed() < Duration::from_millis(500));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(ticks.load(Ordering::SeqCst) >= 5);
        ticker.abort();

        let delivered = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(delivered, "休息一下");
    }

    #[test]
    fn test_notification_timeout_from_duration() {
        let n = notification("继续专注", None, Urgency::Normal);
        assert_eq!(n.timeout, None);

        let n = notification("休息一下", Some(Duration::from_millis(200)), Urgency::Critical);
        assert_eq!(n.timeout, Some(1));
        assert_eq!(n.urgency, Urgency::Critical);
    }
}
