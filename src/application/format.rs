//! Formatting helpers for durations and platform timestamps

use chrono::{DateTime, Utc};
use std::fmt;

/// `1h 2m 3s`; hours and minutes are omitted while zero
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 || hours > 0 {
        parts.push(format!("{}m", minutes));
    }
    parts.push(format!("{}s", secs));
    parts.join(" ")
}

/// Display styles for `<t:UNIX:STYLE>` markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampStyle {
    ShortTime,
    LongTime,
    ShortDate,
    LongDate,
    ShortDateTime,
    LongDateTime,
    #[default]
    Relative,
}

impl TimestampStyle {
    pub fn code(&self) -> char {
        match self {
            TimestampStyle::ShortTime => 't',
            TimestampStyle::LongTime => 'T',
            TimestampStyle::ShortDate => 'd',
            TimestampStyle::LongDate => 'D',
            TimestampStyle::ShortDateTime => 'f',
            TimestampStyle::LongDateTime => 'F',
            TimestampStyle::Relative => 'R',
        }
    }
}

impl fmt::Display for TimestampStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Values above 10^12 are taken as milliseconds, anything else as seconds
pub fn discord_timestamp(unix: i64, style: TimestampStyle) -> String {
    let seconds = if unix > 1_000_000_000_000 { unix / 1000 } else { unix };
    format!("<t:{}:{}>", seconds, style)
}

pub fn discord_timestamp_at(time: DateTime<Utc>, style: TimestampStyle) -> String {
    discord_timestamp(time.timestamp(), style)
}
