//! Status bar text

use focusplay_core::format;
use tokio::time::Instant;

use crate::session::{Mode, Session};

/// Render the status bar for the current mode
pub fn status_text(session: &Session, now: Instant) -> String {
    let elapsed = session.elapsed_minutes(now).unwrap_or(0.0);
    match session.mode() {
        Mode::Focusing { .. } => format!("本次专注：{}分钟", format::minutes(elapsed)),
        Mode::Resting { .. } => format!("休息时间：{}分钟", format::minutes(elapsed)),
        Mode::Idle => format!("总专注：{}分钟", format::minutes(session.settings().focus_time)),
    }
}
