//! Focus statistics calculation
//!
//! Aggregates session log records into totals for the `stats` command.

use crate::session::{SessionKind, SessionRecord};

/// Aggregated focus statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FocusStats {
    /// Number of focus stints
    pub focus_sessions: u32,
    /// Number of rest stints
    pub rest_sessions: u32,
    /// Total focus minutes
    pub focus_minutes: f64,
    /// Total rest minutes
    pub rest_minutes: f64,
    /// Focus stints ended by the long-break cycle
    pub long_breaks: u32,
}

impl FocusStats {
    pub fn from_records(records: &[SessionRecord]) -> Self {
        records.iter().fold(Self::default(), |mut stats, record| {
            match record.kind {
                SessionKind::Focus => {
                    stats.focus_sessions += 1;
                    stats.focus_minutes += record.minutes;
                    if record.long_break {
                        stats.long_breaks += 1;
                    }
                }
                SessionKind::Rest => {
                    stats.rest_sessions += 1;
                    stats.rest_minutes += record.minutes;
                }
            }
            stats
        })
    }

    /// Focus credit earned over the period (focus minus rest)
    pub fn net_minutes(&self) -> f64 {
        self.focus_minutes - self.rest_minutes
    }

    /// Average focus stint in minutes
    pub fn average_focus(&self) -> f64 {
        if self.focus_sessions == 0 {
            0.0
        } else {
            self.focus_minutes / self.focus_sessions as f64
        }
    }
}
