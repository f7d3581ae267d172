use anyhow::{Context, Result};
use std::time::Duration as StdDuration;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub fn parse_rfc3339(raw: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339).context("invalid RFC 3339 timestamp")
}

pub fn format_rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_default()
}

/// Chart axis label, HH:MM:SS.
pub fn clock_label(ts: OffsetDateTime) -> String {
    let format = time::macros::format_description!("[hour]:[minute]:[second]");
    ts.format(&format).unwrap_or_default()
}

/// Session duration as MM:SS, or HH:MM:SS once it passes an hour.
pub fn format_session_duration(elapsed: StdDuration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
