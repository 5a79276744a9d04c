//! Timestamp utilities

use chrono::{DateTime, Local, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Output file name stamped with local time, e.g. `mashup_20240131_154502.mp3`
pub fn stamped_output_name(prefix: &str, at: DateTime<Local>) -> String {
    format!("{}_{}.mp3", prefix, at.format("%Y%m%d_%H%M%S"))
}
