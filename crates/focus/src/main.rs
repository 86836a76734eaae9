//! focus - Focus timer with forced breaks and a rest mode
//!
//! "Focus earns credit. Rest spends it."
//!
//! Usage:
//!   focus run                       Interactive timer with a live status line
//!   focus status                    Show the total focus time
//!   focus config show               Show the settings
//!   focus config sound on|off       Turn break cues on or off
//!   focus config focus-time MINS    Override the total focus time
//!   focus stats [DAYS]              Show focus and rest statistics
//!   focus check                     Send a test notice and play the cues

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use focusplay_core::{format, Paths};
use focusplay_notify::Cue;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use focus::input::{self, parse_line, parse_switch};
use focus::status::status_text;
use focus::{
    Command, DesktopHost, Engine, FocusStats, FocusStore, Host, Session, SettingsCommand, Timing,
};

/// Focus - timer with forced breaks and a rest mode
#[derive(Parser)]
#[command(name = "focus")]
#[command(about = "Focus timer with forced short breaks, a 90-minute long-break cycle and a rest mode")]
#[command(version)]
#[command(after_help = r#"WHEN TO USE:
    Keep `focus run` open in a terminal while you work. Toggle focus mode
    when you sit down, toggle rest mode when you play. Rest time is
    deducted from your total focus time.

BREAKS:
    short    10 seconds, every 3-5 minutes of focus
    long     20 minutes, after 90 minutes of continuous focus

EXAMPLES:
    focus run                       # Start the interactive timer
    focus config sound off          # Silence the break cues
    focus config focus-time 120     # Set the total to 120 minutes
    focus stats 30                  # Show 30-day statistics

CONFIGURATION:
    Break timing can be tuned in <config dir>/focusplay/timing.json.
    Set RUST_LOG=focus=debug to see scheduler decisions.
"#)]
struct Cli {
    /// Override the data directory
    #[arg(long, global = true, env = "FOCUS_DATA_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive timer
    #[command(alias = "r")]
    Run {
        /// Fixed seed for reminder delays
        #[arg(long, hide = true)]
        seed: Option<u64>,
    },

    /// Show the total focus time
    #[command(alias = "st")]
    Status,

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Show focus and rest statistics
    Stats {
        /// Number of days to show (default: 7)
        #[arg(default_value = "7")]
        days: u32,
    },

    /// Send a test notice and play both cues
    Check,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current settings
    Show,

    /// Turn break cues on or off
    Sound {
        /// on or off
        value: String,
    },

    /// Override the total focus time in minutes (non-numeric input is ignored)
    FocusTime {
        /// Minutes
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
}

// ANSI color codes
const GREEN: &str = "\x1b[0;32m";
const CYAN: &str = "\x1b[0;36m";
const MAGENTA: &str = "\x1b[0;35m";
const BOLD: &str = "\x1b[1m";
const NC: &str = "\x1b[0m";

fn use_colors() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stdout())
}

fn color(code: &str, text: &str) -> String {
    if use_colors() {
        format!("{}{}{}", code, text, NC)
    } else {
        text.to_string()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = match &cli.data_dir {
        Some(dir) => Paths::rooted(dir),
        None => Paths::new(),
    };
    let store = FocusStore::new(&paths.state("focus"))?;

    match cli.command {
        Some(Commands::Run { seed }) => cmd_run(&paths, store, seed),
        Some(Commands::Status) | None => cmd_status(&store),
        Some(Commands::Config { action }) => cmd_config(&store, action.unwrap_or(ConfigAction::Show)),
        Some(Commands::Stats { days }) => cmd_stats(&store, days),
        Some(Commands::Check) => cmd_check(),
    }
}

/// Run the interactive timer until quit, EOF or Ctrl-C
fn cmd_run(paths: &Paths, store: FocusStore, seed: Option<u64>) -> Result<()> {
    let timing = Timing::load(&paths.config_file("timing.json"))?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = rt.block_on(run_interactive(store, timing, seed));

    // The stdin reader may still be parked in a blocking read
    rt.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn run_interactive(store: FocusStore, timing: Timing, seed: Option<u64>) -> Result<()> {
    let mut engine = Engine::new(DesktopHost::detect(), store, timing.clone())?;
    if let Some(seed) = seed {
        engine = engine.with_seed(seed);
    }

    println!("{}", color(&format!("{}{}", BOLD, MAGENTA), "FOCUS"));
    println!();
    println!(
        "  {}  every {} - {}, {} each",
        color(CYAN, "Short breaks:"),
        format::duration(timing.reminder_min_secs),
        format::duration(timing.reminder_max_secs),
        format::duration(timing.short_break_secs as f64)
    );
    println!(
        "  {}   after {} minutes, {} minutes long",
        color(CYAN, "Long break:"),
        timing.cycle_minutes,
        timing.long_break_minutes
    );
    println!();
    println!("{}", input::HELP);
    println!();

    let (tx, rx) = mpsc::channel(16);

    let stdin_tx = tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_line(&line) {
                        Some(command) => {
                            if stdin_tx.send(command).await.is_err() {
                                break;
                            }
                        }
                        None => eprintln!("\nUnknown command: {}\n{}", line.trim(), input::HELP),
                    }
                }
                Ok(None) => {
                    let _ = stdin_tx.send(Command::Shutdown).await;
                    break;
                }
                Err(e) => {
                    tracing::warn!("stdin closed: {}", e);
                    let _ = stdin_tx.send(Command::Shutdown).await;
                    break;
                }
            }
        }
    });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(Command::Shutdown).await;
        }
    });

    let settings = engine.run(rx).await?;

    eprintln!();
    println!(
        "{} Total focus time: {} minutes",
        color(GREEN, "[ok]"),
        format::minutes(settings.focus_time)
    );
    Ok(())
}

/// Show the total focus time
fn cmd_status(store: &FocusStore) -> Result<()> {
    let settings = store.load_settings()?;
    let active = if settings.is_running {
        Some("focus")
    } else if settings.is_gaming {
        Some("rest")
    } else {
        None
    };

    let session = Session::new(settings);
    println!("{}", status_text(&session, tokio::time::Instant::now()));

    if let Some(mode) = active {
        println!();
        println!("{} {} mode is active in a running timer", color(CYAN, "[info]"), mode);
    }

    Ok(())
}

/// Show or change settings
fn cmd_config(store: &FocusStore, action: ConfigAction) -> Result<()> {
    let mut settings = store.load_settings()?;

    let change = match action {
        ConfigAction::Show => None,
        ConfigAction::Sound { value } => match parse_switch(&value) {
            Some(on) => Some(SettingsCommand::Sound(on)),
            None => bail!("Expected 'on' or 'off', got '{}'", value),
        },
        ConfigAction::FocusTime { value } => Some(SettingsCommand::FocusTime(value)),
    };

    if let Some(change) = change {
        if settings.apply(&change) {
            store.save_settings(&settings)?;
            println!("{} Settings saved", color(GREEN, "[ok]"));
            println!();
        }
    }

    println!("  {}       {}", color(CYAN, "Sound:"), if settings.sound_enabled { "on" } else { "off" });
    println!(
        "  {}  {} minutes",
        color(CYAN, "Focus time:"),
        format::minutes(settings.focus_time)
    );
    println!("  {}        {}", color(CYAN, "File:"), store.settings_path().display());

    Ok(())
}

/// Show focus statistics
fn cmd_stats(store: &FocusStore, days: u32) -> Result<()> {
    let records = store.get_sessions_for_days(days)?;
    let stats = FocusStats::from_records(&records);
    let settings = store.load_settings()?;

    println!("{}Focus Statistics (Last {} days){}", BOLD, days, NC);
    println!();
    println!(
        "  {}   {}",
        color(CYAN, "Focus Sessions:"),
        stats.focus_sessions
    );
    println!(
        "  {}       {}",
        color(CYAN, "Focus Time:"),
        format::hours_minutes(stats.focus_minutes)
    );
    println!(
        "  {}        {}",
        color(CYAN, "Rest Time:"),
        format::hours_minutes(stats.rest_minutes)
    );
    println!(
        "  {}      {}",
        color(CYAN, "Long Breaks:"),
        stats.long_breaks
    );
    println!(
        "  {}       {}",
        color(CYAN, "Net Credit:"),
        format::hours_minutes(stats.net_minutes())
    );

    if stats.focus_sessions > 0 {
        println!();
        println!(
            "  {}  {} minutes",
            color(CYAN, "Average Session:"),
            format::minutes(stats.average_focus())
        );
    }

    println!();
    println!(
        "  {} {}",
        color(CYAN, "All-time total:"),
        format::hours_minutes(settings.focus_time)
    );

    Ok(())
}

/// Send a test notice and play both cues
fn cmd_check() -> Result<()> {
    let host = DesktopHost::detect();

    println!("Testing notices and cues");
    println!("  Backend: {}", host.notifier_name());
    println!("  Player:  {}", host.player().program().unwrap_or("none"));
    println!();

    match host.notice_now("If you see this, notices are working!", Some(Duration::from_secs(5))) {
        Ok(()) => println!("{} notice sent", color(GREEN, "[ok]")),
        Err(e) => println!("{} notice: {:#}", color(CYAN, "[warn]"), e),
    }

    for cue in [Cue::Begin, Cue::End] {
        match host.play(cue) {
            Ok(()) => println!("{} {} cue started", color(GREEN, "[ok]"), cue.as_str()),
            Err(e) => println!("{} {} cue: {}", color(CYAN, "[warn]"), cue.as_str(), e),
        }
        std::thread::sleep(Duration::from_millis(800));
    }

    Ok(())
}
