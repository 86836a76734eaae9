//! Human readable time formatting

/// Format minutes with one decimal place, e.g. `12.5`
pub fn minutes(mins: f64) -> String {
    format!("{:.1}", mins)
}

/// Format a minute count as `Xh Ym` (or `Ym` under an hour)
///
/// Negative totals keep their sign; rest can outweigh focus.
pub fn hours_minutes(mins: f64) -> String {
    let sign = if mins < 0.0 { "-" } else { "" };
    let total = mins.abs().round() as u64;
    let (h, m) = (total / 60, total % 60);
    if h > 0 {
        format!("{}{}h {}m", sign, h, m)
    } else {
        format!("{}{}m", sign, m)
    }
}

/// Format a duration in seconds, e.g. `42s`, `3m 5s`
pub fn duration(secs: f64) -> String {
    let secs = secs.max(0.0).round() as u64;
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes() {
        assert_eq!(minutes(0.0), "0.0");
        assert_eq!(minutes(12.46), "12.5");
        assert_eq!(minutes(-3.04), "-3.0");
    }

    #[test]
    fn test_hours_minutes() {
        assert_eq!(hours_minutes(45.0), "45m");
        assert_eq!(hours_minutes(135.0), "2h 15m");
        assert_eq!(hours_minutes(-30.0), "-30m");
    }

    #[test]
    fn test_duration() {
        assert_eq!(duration(42.0), "42s");
        assert_eq!(duration(185.0), "3m 5s");
        assert_eq!(duration(5400.0), "1h 30m");
    }
}
