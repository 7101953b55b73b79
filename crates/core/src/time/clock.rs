use anyhow::Context;
use chrono::{DateTime, FixedOffset, Utc};

/// Offset used for the "Updated: HH:MM" label. Falls back to the host's local offset.
pub fn display_offset(offset_minutes: Option<i32>) -> anyhow::Result<FixedOffset> {
    match offset_minutes {
        Some(minutes) => FixedOffset::east_opt(minutes * 60)
            .with_context(|| format!("invalid display UTC offset: {minutes} minutes")),
        None => Ok(*chrono::Local::now().offset()),
    }
}

pub fn format_updated_at(ts: DateTime<Utc>, offset: FixedOffset) -> String {
    ts.with_timezone(&offset).format("%H:%M").to_string()
}
