//! The timer engine
//!
//! One `Engine` owns the session, the store, the host and every timer
//! handle. User triggers arrive as [`Command`]s; timers are small tokio
//! tasks that sleep and then post an [`Event`] back to the engine. All
//! state changes happen inside the engine loop, one message at a time.
//!
//! Each focus start bumps an epoch. Timers carry the epoch that scheduled
//! them, so a timer that wakes after its focus session ended is dropped
//! even if its abort raced with the wakeup.

use anyhow::Result;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use focusplay_core::format;
use focusplay_notify::{Cue, Urgency};

use crate::host::Host;
use crate::session::{Session, SessionRecord, Stint};
use crate::settings::SettingsCommand;
use crate::status::status_text;
use crate::store::FocusStore;
use crate::timing::Timing;

/// External triggers: icon clicks, palette commands, settings edits
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start focus mode, or stop it if it is running
    ToggleFocus,
    /// Start rest mode, or stop it if it is running
    ToggleRest,
    /// A settings panel change
    Settings(SettingsCommand),
    /// Show the current status as a notice
    ShowStatus,
    /// Stop the active mode, cancel every timer and leave the loop
    Shutdown,
}

/// Timer wakeups posted back to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Tick,
    ReminderDue { epoch: u64 },
    ShortBreakOver { epoch: u64 },
    CycleDue { epoch: u64 },
    LongBreakOver { epoch: u64 },
}

/// Why a focus stint began
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartReason {
    User,
    /// Automatic restart after a long break
    Resume,
}

/// Why a focus stint ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    User,
    LongBreak,
    Shutdown,
}

enum Step {
    Command(Option<Command>),
    Event(Event),
}

pub struct Engine<H: Host> {
    session: Session,
    store: FocusStore,
    host: H,
    timing: Timing,
    rng: StdRng,
    epoch: u64,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    ticker: Option<JoinHandle<()>>,
    /// Pending reminder, or the short break in progress
    reminder: Option<JoinHandle<()>>,
    cycle: Option<JoinHandle<()>>,
    long_break: Option<JoinHandle<()>>,
}

impl<H: Host> Engine<H> {
    /// Load settings from the store and build an idle engine.
    ///
    /// Flags left set by a previous process are cleared and saved. Timing
    /// that fails `Timing::validate` is refused.
    pub fn new(host: H, store: FocusStore, timing: Timing) -> Result<Self> {
        timing.validate()?;
        let settings = store.load_settings()?;
        let stale = settings.is_running || settings.is_gaming;
        let session = Session::new(settings);

        if stale {
            tracing::warn!("clearing session flags left by a previous run");
            store.save_settings(session.settings())?;
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Self {
            session,
            store,
            host,
            timing,
            rng: StdRng::from_entropy(),
            epoch: 0,
            events_tx,
            events_rx,
            ticker: None,
            reminder: None,
            cycle: None,
            long_break: None,
        })
    }

    /// Use a fixed seed for reminder delays
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Run until `Command::Shutdown` or until every command sender is gone.
    /// Returns the final settings.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Result<crate::Settings> {
        tracing::info!(focus_time = self.session.settings().focus_time, "engine started");
        self.render_status();

        loop {
            let step = tokio::select! {
                cmd = commands.recv() => Step::Command(cmd),
                Some(event) = self.events_rx.recv() => Step::Event(event),
            };

            match step {
                Step::Command(None) | Step::Command(Some(Command::Shutdown)) => break,
                Step::Command(Some(cmd)) => self.handle(cmd)?,
                Step::Event(event) => self.on_event(event)?,
            }
        }

        self.shutdown()?;
        Ok(self.session.settings().clone())
    }

    /// Handle one external trigger
    pub fn handle(&mut self, command: Command) -> Result<()> {
        tracing::debug!(?command, "command");
        match command {
            Command::ToggleFocus => {
                if self.session.is_focusing() {
                    self.stop_focus(StopReason::User)
                } else {
                    self.start_focus(StartReason::User)
                }
            }
            Command::ToggleRest => {
                if self.session.is_resting() {
                    self.stop_rest(StopReason::User)
                } else {
                    self.start_rest()
                }
            }
            Command::Settings(change) => {
                if self.session.apply(&change) {
                    tracing::info!(?change, "settings changed");
                    self.store.save_settings(self.session.settings())?;
                    self.render_status();
                }
                Ok(())
            }
            Command::ShowStatus => {
                let text = status_text(&self.session, Instant::now());
                self.tell(&text);
                self.host.status(&text);
                Ok(())
            }
            Command::Shutdown => self.shutdown(),
        }
    }

    /// Stop the active mode, cancel every timer and persist
    pub fn shutdown(&mut self) -> Result<()> {
        if self.session.is_focusing() {
            self.stop_focus(StopReason::Shutdown)?;
        } else if self.session.is_resting() {
            self.stop_rest(StopReason::Shutdown)?;
        }

        for handle in [
            self.ticker.take(),
            self.reminder.take(),
            self.cycle.take(),
            self.long_break.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }

        self.store.save_settings(self.session.settings())?;
        tracing::info!(focus_time = self.session.settings().focus_time, "engine stopped");
        Ok(())
    }

    fn on_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Tick => {
                self.render_status();
                Ok(())
            }
            Event::ReminderDue { epoch } if self.is_current(epoch) => self.begin_short_break(),
            Event::ShortBreakOver { epoch } if self.is_current(epoch) => self.end_short_break(),
            Event::CycleDue { epoch } if self.is_current(epoch) => self.begin_long_break(),
            Event::LongBreakOver { epoch } => self.end_long_break(epoch),
            stale => {
                tracing::debug!(?stale, current = self.epoch, "dropping stale timer event");
                Ok(())
            }
        }
    }

    /// True if a focus-scoped timer from `epoch` still applies
    fn is_current(&self, epoch: u64) -> bool {
        epoch == self.epoch && self.session.is_focusing()
    }

    fn start_focus(&mut self, reason: StartReason) -> Result<()> {
        if let Err(rejected) = self.session.start_focus(Instant::now()) {
            tracing::warn!("focus start refused: {}", rejected);
            self.tell(&rejected.to_string());
            return Ok(());
        }

        cancel(&mut self.long_break);
        self.epoch += 1;
        self.store.save_settings(self.session.settings())?;

        self.start_ticker();
        self.schedule_reminder();
        let epoch = self.epoch;
        self.cycle = Some(self.after(self.timing.cycle(), Event::CycleDue { epoch }));

        tracing::info!(epoch, ?reason, "focus started");
        if reason == StartReason::User {
            self.tell("开始专注");
        }
        self.render_status();
        Ok(())
    }

    fn stop_focus(&mut self, reason: StopReason) -> Result<()> {
        let Some(stint) = self.session.stop_focus(Instant::now()) else {
            return Ok(());
        };

        cancel(&mut self.reminder);
        cancel(&mut self.cycle);
        cancel(&mut self.ticker);
        self.store.save_settings(self.session.settings())?;
        self.log_stint(&stint, reason == StopReason::LongBreak);

        tracing::info!(minutes = stint.minutes, ?reason, "focus stopped");
        if reason == StopReason::User {
            self.tell(&format!(
                "专注结束，本次专注 {} 分钟",
                format::minutes(stint.minutes)
            ));
        }
        self.render_status();
        Ok(())
    }

    fn start_rest(&mut self) -> Result<()> {
        if let Err(rejected) = self.session.start_rest(Instant::now()) {
            tracing::warn!("rest start refused: {}", rejected);
            self.tell(&rejected.to_string());
            return Ok(());
        }

        cancel(&mut self.long_break);
        self.store.save_settings(self.session.settings())?;
        self.start_ticker();

        tracing::info!("rest started");
        self.tell("开始休息");
        self.render_status();
        Ok(())
    }

    fn stop_rest(&mut self, reason: StopReason) -> Result<()> {
        let Some(stint) = self.session.stop_rest(Instant::now()) else {
            return Ok(());
        };

        cancel(&mut self.ticker);
        self.store.save_settings(self.session.settings())?;
        self.log_stint(&stint, false);

        tracing::info!(minutes = stint.minutes, ?reason, "rest stopped");
        if reason == StopReason::User {
            self.tell(&format!(
                "休息结束，扣除 {} 分钟",
                format::minutes(stint.minutes)
            ));
        }
        self.render_status();
        Ok(())
    }

    fn schedule_reminder(&mut self) {
        let delay = self.timing.reminder_delay(&mut self.rng);
        let epoch = self.epoch;
        tracing::debug!(delay_secs = delay.as_secs_f64(), epoch, "next short break scheduled");
        self.reminder = Some(self.after(delay, Event::ReminderDue { epoch }));
    }

    fn begin_short_break(&mut self) -> Result<()> {
        tracing::info!("short break");
        self.play_cue(Cue::Begin);

        let pause = self.timing.short_break();
        self.host.notice(
            &format!("休息一下，{} 秒后继续", pause.as_secs()),
            Some(pause),
            Urgency::Critical,
        );

        let epoch = self.epoch;
        self.reminder = Some(self.after(pause, Event::ShortBreakOver { epoch }));
        Ok(())
    }

    fn end_short_break(&mut self) -> Result<()> {
        self.play_cue(Cue::End);
        self.tell("继续专注");
        self.schedule_reminder();
        Ok(())
    }

    fn begin_long_break(&mut self) -> Result<()> {
        self.cycle = None;
        self.stop_focus(StopReason::LongBreak)?;

        let pause = self.timing.long_break();
        tracing::info!(minutes = pause.as_secs() / 60, "long break");
        self.host.notice(
            &format!(
                "已连续专注 {} 分钟，休息 {} 分钟吧",
                self.timing.cycle_minutes, self.timing.long_break_minutes
            ),
            None,
            Urgency::Critical,
        );

        let epoch = self.epoch;
        self.long_break = Some(self.after(pause, Event::LongBreakOver { epoch }));
        Ok(())
    }

    fn end_long_break(&mut self, epoch: u64) -> Result<()> {
        self.long_break = None;
        if epoch != self.epoch || self.session.is_focusing() || self.session.is_resting() {
            tracing::debug!(epoch, "long break resume skipped");
            return Ok(());
        }

        self.tell("休息结束，继续专注");
        self.start_focus(StartReason::Resume)
    }

    /// Play a cue if sound is on. Failures are logged and shown, never fatal.
    fn play_cue(&self, cue: Cue) {
        if !self.session.sound_enabled() {
            return;
        }
        if let Err(e) = self.host.play(cue) {
            tracing::warn!(cue = cue.as_str(), "cue failed: {}", e);
            self.tell(&format!("提示音播放失败：{}", e));
        }
    }

    fn start_ticker(&mut self) {
        cancel(&mut self.ticker);
        let tx = self.events_tx.clone();
        let period = self.timing.status_tick();
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if tx.send(Event::Tick).is_err() {
                    break;
                }
            }
        }));
    }

    /// Post `event` back to the engine after `delay`
    fn after(&self, delay: Duration, event: Event) -> JoinHandle<()> {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        })
    }

    /// Ordinary notice with the platform's display time
    fn tell(&self, message: &str) {
        self.host.notice(message, None, Urgency::Normal);
    }

    fn render_status(&self) {
        self.host.status(&status_text(&self.session, Instant::now()));
    }

    fn log_stint(&self, stint: &Stint, long_break: bool) {
        let record = SessionRecord::from_stint(stint, Utc::now(), long_break);
        if let Err(e) = self.store.record_session(&record) {
            tracing::warn!(kind = stint.kind.as_str(), "failed to log session: {:#}", e);
        }
    }
}

fn cancel(handle: &mut Option<JoinHandle<()>>) {
    if let Some(handle) = handle.take() {
        handle.abort();
    }
}
