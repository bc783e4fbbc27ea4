use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Display language for relative timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeLocale {
    #[default]
    Hebrew,
    English,
}

impl FromStr for TimeLocale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "he" | "hebrew" => Ok(TimeLocale::Hebrew),
            "en" | "english" => Ok(TimeLocale::English),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

impl fmt::Display for TimeLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeLocale::Hebrew => write!(f, "he"),
            TimeLocale::English => write!(f, "en"),
        }
    }
}

/// Formats `instant` relative to `now`: under a minute is "now", then
/// minutes, hours and days up to a week, then a short `dd/MM/yy` date.
pub fn format_relative_time(instant: DateTime<Utc>, now: DateTime<Utc>, locale: TimeLocale) -> String {
    let elapsed = now.signed_duration_since(instant);
    let minutes = elapsed.num_minutes();

    if minutes < 1 {
        return match locale {
            TimeLocale::Hebrew => "עכשיו".to_string(),
            TimeLocale::English => "now".to_string(),
        };
    }

    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    match locale {
        TimeLocale::Hebrew if minutes < 60 => format!("לפני {} דקות", minutes),
        TimeLocale::Hebrew if hours < 24 => format!("לפני {} שעות", hours),
        TimeLocale::Hebrew if days < 7 => format!("לפני {} ימים", days),
        TimeLocale::English if minutes < 60 => plural(minutes, "minute"),
        TimeLocale::English if hours < 24 => plural(hours, "hour"),
        TimeLocale::English if days < 7 => plural(days, "day"),
        _ => instant.format("%d/%m/%y").to_string(),
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}
