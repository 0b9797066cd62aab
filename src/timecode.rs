//! SubRip time codes (`HH:MM:SS,mmm`).

use crate::error::{Result, VidsubError};

/// Format seconds as an SRT time code.
///
/// Negative and NaN inputs clamp to zero. Milliseconds are rounded to the
/// nearest value. Hours are padded to two digits and simply grow wider past 99.
pub fn format_srt_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let total_milliseconds = (seconds * 1000.0).round() as u64;
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Parse an SRT time code back into seconds.
pub fn parse_srt_time(value: &str) -> Result<f64> {
    let invalid = || VidsubError::Subtitle(format!("Invalid time code: '{}'", value));

    let (clock, millis) = value.trim().split_once(',').ok_or_else(invalid)?;
    let mut parts = clock.split(':');
    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };

    let hours: u64 = h.parse().map_err(|_| invalid())?;
    let minutes: u64 = m.parse().map_err(|_| invalid())?;
    let secs: u64 = s.parse().map_err(|_| invalid())?;
    let millis: u64 = millis.parse().map_err(|_| invalid())?;
    if minutes >= 60 || secs >= 60 || millis >= 1000 {
        return Err(invalid());
    }

    let total = hours * 3_600_000 + minutes * 60_000 + secs * 1_000 + millis;
    Ok(total as f64 / 1000.0)
}
