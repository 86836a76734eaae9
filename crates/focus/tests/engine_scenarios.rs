//! End-to-end timer scenarios on a paused tokio clock

use std::time::Duration;

use focus::{Command, Engine, FocusStore, HostCall, RecordingHost, Settings, SettingsCommand, Timing};
use focusplay_notify::{Cue, Urgency};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

struct Harness {
    host: RecordingHost,
    store: FocusStore,
    tx: mpsc::Sender<Command>,
    task: JoinHandle<anyhow::Result<Settings>>,
    _dir: TempDir,
}

impl Harness {
    fn start(timing: Timing, initial: Settings) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = FocusStore::new(dir.path()).unwrap();
        store.save_settings(&initial).unwrap();

        let host = RecordingHost::new();
        let engine = Engine::new(host.clone(), store.clone(), timing)
            .unwrap()
            .with_seed(11);

        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(engine.run(rx));

        Self {
            host,
            store,
            tx,
            task,
            _dir: dir,
        }
    }

    async fn send(&self, command: Command) {
        self.tx.send(command).await.unwrap();
        // Let the engine pick the command up before the clock moves
        tokio::task::yield_now().await;
    }

    fn saved(&self) -> Settings {
        self.store.load_settings().unwrap()
    }

    async fn finish(self) -> Settings {
        self.tx.send(Command::Shutdown).await.unwrap();
        self.task.await.unwrap().unwrap()
    }
}

fn fixed_reminder(secs: f64) -> Timing {
    Timing {
        reminder_min_secs: secs,
        reminder_max_secs: secs,
        ..Default::default()
    }
}

fn mins(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

#[tokio::test(start_paused = true)]
async fn short_break_fires_then_reschedules() {
    let h = Harness::start(fixed_reminder(240.0), Settings::default());
    h.send(Command::ToggleFocus).await;

    sleep(Duration::from_secs(239)).await;
    assert!(h.host.plays().is_empty());

    sleep(Duration::from_secs(2)).await;
    assert_eq!(h.host.plays(), vec![Cue::Begin]);
    assert!(h.host.calls().contains(&HostCall::Notice {
        message: "休息一下，10 秒后继续".to_string(),
        duration: Some(Duration::from_secs(10)),
        urgency: Urgency::Critical,
    }));
    assert!(!h.host.notices().contains(&"继续专注".to_string()));

    sleep(Duration::from_secs(10)).await;
    assert_eq!(h.host.plays(), vec![Cue::Begin, Cue::End]);
    assert_eq!(h.host.notices().last().map(String::as_str), Some("继续专注"));

    // Next reminder is 240s after the break ended
    sleep(Duration::from_secs(240)).await;
    assert_eq!(h.host.plays(), vec![Cue::Begin, Cue::End, Cue::Begin]);

    let settings = h.finish().await;
    assert!((settings.focus_time - 491.0 / 60.0).abs() < 1e-6);
    assert!(!settings.is_running);
}

#[tokio::test(start_paused = true)]
async fn random_reminders_stay_in_range() {
    let h = Harness::start(Timing::default(), Settings::default());
    h.send(Command::ToggleFocus).await;

    sleep(Duration::from_secs(179)).await;
    assert!(h.host.plays().is_empty());

    sleep(Duration::from_secs(300 - 179)).await;
    assert_eq!(h.host.plays().first(), Some(&Cue::Begin));
    assert!(h.host.plays().len() <= 2);

    h.finish().await;
}

#[tokio::test(start_paused = true)]
async fn long_break_after_ninety_minutes() {
    let h = Harness::start(Timing::default(), Settings::default());
    h.send(Command::ToggleFocus).await;

    sleep(mins(90) + Duration::from_secs(1)).await;

    let saved = h.saved();
    assert!(!saved.is_running);
    assert!((saved.focus_time - 90.0).abs() < 1e-6);
    assert!(h
        .host
        .notices()
        .contains(&"已连续专注 90 分钟，休息 20 分钟吧".to_string()));
    assert_eq!(h.host.last_status().as_deref(), Some("总专注：90.0分钟"));

    // No short breaks while the long break runs
    let plays = h.host.plays().len();
    sleep(mins(19)).await;
    assert_eq!(h.host.plays().len(), plays);
    assert!(!h.saved().is_running);

    sleep(mins(1)).await;
    assert!(h.saved().is_running);
    let notices = h.host.notices();
    assert!(notices.contains(&"休息结束，继续专注".to_string()));
    assert_eq!(notices.iter().filter(|n| *n == "开始专注").count(), 1);
    assert_eq!(h.host.last_status().as_deref(), Some("本次专注：0.0分钟"));

    // The restarted session counts from zero
    sleep(mins(3)).await;
    let settings = h.finish().await;
    assert!((settings.focus_time - 93.0).abs() < 0.05);
}

#[tokio::test(start_paused = true)]
async fn manual_rest_during_long_break_cancels_resume() {
    let timing = Timing {
        cycle_minutes: 30,
        long_break_minutes: 10,
        ..Default::default()
    };
    let h = Harness::start(timing, Settings::default());
    h.send(Command::ToggleFocus).await;

    sleep(mins(32)).await;
    h.send(Command::ToggleRest).await;
    assert!(h.saved().is_gaming);

    sleep(mins(15)).await;
    let saved = h.saved();
    assert!(saved.is_gaming);
    assert!(!saved.is_running);

    h.send(Command::ToggleRest).await;
    let settings = h.finish().await;
    assert!((settings.focus_time - 15.0).abs() < 1e-6);
}

#[tokio::test(start_paused = true)]
async fn conflicting_starts_change_nothing() {
    let h = Harness::start(fixed_reminder(240.0), Settings::default());

    h.send(Command::ToggleRest).await;
    let before = h.saved();
    h.send(Command::ToggleFocus).await;
    assert_eq!(h.saved(), before);
    assert_eq!(
        h.host.notices().last().map(String::as_str),
        Some("正在休息中，请先结束休息再开始专注")
    );

    sleep(mins(6)).await;
    assert!(h.host.plays().is_empty());
    h.send(Command::ToggleRest).await;

    h.send(Command::ToggleFocus).await;
    let before = h.saved();
    h.send(Command::ToggleRest).await;
    assert_eq!(h.saved(), before);
    assert_eq!(
        h.host.notices().last().map(String::as_str),
        Some("正在专注中，请先结束专注再开始休息")
    );

    h.finish().await;
}

#[tokio::test(start_paused = true)]
async fn rest_deducts_and_may_go_negative() {
    let h = Harness::start(
        fixed_reminder(240.0),
        Settings {
            focus_time: 5.0,
            ..Default::default()
        },
    );

    h.send(Command::ToggleRest).await;
    sleep(Duration::from_secs(90)).await;
    assert_eq!(h.host.last_status().as_deref(), Some("休息时间：1.5分钟"));

    sleep(Duration::from_secs(8 * 60 - 90)).await;
    h.send(Command::ToggleRest).await;

    let saved = h.saved();
    assert!(!saved.is_gaming);
    assert!((saved.focus_time + 3.0).abs() < 1e-6);
    assert_eq!(h.host.last_status().as_deref(), Some("总专注：-3.0分钟"));

    h.finish().await;
}

#[tokio::test(start_paused = true)]
async fn stopping_mid_break_cancels_the_rest_of_it() {
    let h = Harness::start(fixed_reminder(240.0), Settings::default());
    h.send(Command::ToggleFocus).await;

    sleep(Duration::from_secs(245)).await;
    h.send(Command::ToggleFocus).await;
    assert!(!h.saved().is_running);

    sleep(mins(10)).await;
    assert_eq!(h.host.plays(), vec![Cue::Begin]);
    assert!(!h.host.notices().contains(&"继续专注".to_string()));

    h.finish().await;
}

#[tokio::test(start_paused = true)]
async fn failing_cues_do_not_abort_the_break() {
    let h = Harness::start(fixed_reminder(60.0), Settings::default());
    h.host.fail_cue(Cue::Begin);
    h.host.fail_cue(Cue::End);
    h.send(Command::ToggleFocus).await;

    sleep(Duration::from_secs(71)).await;

    let notices = h.host.notices();
    let failures = notices
        .iter()
        .filter(|n| n.starts_with("提示音播放失败"))
        .count();
    assert_eq!(failures, 2);
    assert!(notices.contains(&"休息一下，10 秒后继续".to_string()));
    assert_eq!(notices.last().map(String::as_str), Some("继续专注"));

    // and the loop keeps going
    sleep(Duration::from_secs(60)).await;
    assert_eq!(h.host.plays().len(), 3);

    h.finish().await;
}

#[tokio::test(start_paused = true)]
async fn sound_off_mutes_cues_but_keeps_breaks() {
    let h = Harness::start(fixed_reminder(60.0), Settings::default());
    h.send(Command::Settings(SettingsCommand::Sound(false))).await;
    assert!(!h.saved().sound_enabled);

    h.send(Command::ToggleFocus).await;
    sleep(Duration::from_secs(71)).await;

    assert!(h.host.plays().is_empty());
    assert_eq!(h.host.notices().last().map(String::as_str), Some("继续专注"));

    h.finish().await;
}

#[tokio::test(start_paused = true)]
async fn focus_time_field_input() {
    let h = Harness::start(fixed_reminder(240.0), Settings::default());

    h.send(Command::Settings(SettingsCommand::FocusTime("abc".into()))).await;
    assert_eq!(h.saved().focus_time, 0.0);

    h.send(Command::Settings(SettingsCommand::FocusTime("12.5".into()))).await;
    assert_eq!(h.saved().focus_time, 12.5);
    assert_eq!(h.host.last_status().as_deref(), Some("总专注：12.5分钟"));

    h.finish().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_while_resting_settles_time() {
    let h = Harness::start(
        fixed_reminder(240.0),
        Settings {
            focus_time: 30.0,
            ..Default::default()
        },
    );
    h.send(Command::ToggleRest).await;
    sleep(mins(10)).await;

    let settings = h.finish().await;
    assert!(!settings.is_gaming);
    assert!((settings.focus_time - 20.0).abs() < 1e-6);
}

#[tokio::test(start_paused = true)]
async fn closing_the_command_channel_shuts_down() {
    let dir = tempfile::tempdir().unwrap();
    let store = FocusStore::new(dir.path()).unwrap();
    let engine = Engine::new(RecordingHost::new(), store.clone(), Timing::default()).unwrap();

    let (tx, rx) = mpsc::channel(8);
    let task = tokio::spawn(engine.run(rx));
    tx.send(Command::ToggleFocus).await.unwrap();
    tokio::task::yield_now().await;
    sleep(mins(2)).await;
    drop(tx);

    let settings = task.await.unwrap().unwrap();
    assert!(!settings.is_running);
    assert!((settings.focus_time - 2.0).abs() < 1e-6);
    assert_eq!(store.load_settings().unwrap(), settings);
}
