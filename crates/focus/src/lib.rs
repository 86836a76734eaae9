//! focus - Focus timer with forced breaks and a rest mode
//!
//! "Focus earns credit. Rest spends it."
//!
//! Focus mode tracks elapsed focus time and:
//! - Interrupts with a 10 second short break every 3-5 minutes
//! - Forces a 20 minute long break after 90 minutes of continuous focus
//! - Credits elapsed minutes to the total focus time on stop
//!
//! Rest (game) mode is mutually exclusive with focus mode and deducts its
//! elapsed minutes from the total.
//!
//! Commands:
//! - run: Interactive timer with a live status line
//! - status: Show the total focus time
//! - config: Sound toggle and focus-time override
//! - stats [DAYS]: Focus and rest statistics

pub mod engine;
pub mod host;
pub mod input;
pub mod session;
pub mod settings;
pub mod stats;
pub mod status;
pub mod store;
pub mod timing;

pub use engine::{Command, Engine};
pub use host::{DesktopHost, Host, HostCall, Notifier, RecordingHost};
pub use session::{Mode, Session, SessionKind, SessionRecord, StartRejected};
pub use settings::{Settings, SettingsCommand};
pub use stats::FocusStats;
pub use store::FocusStore;
pub use timing::Timing;
