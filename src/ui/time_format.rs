/// `MM:SS`, or `H:MM:SS` from an hour up
pub fn format_clock(seconds: f64) -> String {
    let total_secs = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Share of `duration` elapsed at `current`, as a percentage in `0..=100`
pub fn progress_percent(current: f64, duration: f64) -> f64 {
    if !duration.is_finite() || duration <= 0.0 || !current.is_finite() {
        return 0.0;
    }
    (current / duration * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(9.99), "00:09");
        assert_eq!(format_clock(125.0), "02:05");
        assert_eq!(format_clock(180.0), "03:00");
        assert_eq!(format_clock(3725.0), "1:02:05");
    }

    #[test]
    fn test_format_clock_bad_input() {
        assert_eq!(format_clock(-3.0), "00:00");
        assert_eq!(format_clock(f64::NAN), "00:00");
        assert_eq!(format_clock(f64::INFINITY), "00:00");
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0.0, 180.0), 0.0);
        assert_eq!(progress_percent(90.0, 180.0), 50.0);
        assert_eq!(progress_percent(180.0, 180.0), 100.0);
        assert_eq!(progress_percent(200.0, 180.0), 100.0);
        assert_eq!(progress_percent(-1.0, 180.0), 0.0);
    }

    #[test]
    fn test_progress_percent_without_duration() {
        assert_eq!(progress_percent(10.0, 0.0), 0.0);
        assert_eq!(progress_percent(10.0, f64::NAN), 0.0);
        assert_eq!(progress_percent(f64::NAN, 10.0), 0.0);
    }
}
