use chrono::{DateTime, Local, Utc};
use std::time::Duration;

const UNITS: [(&str, u64); 4] = [
    ("TB", 1 << 40),
    ("GB", 1 << 30),
    ("MB", 1 << 20),
    ("KB", 1 << 10),
];

pub fn format_bytes(bytes: u64) -> String {
    for (suffix, scale) in UNITS {
        if bytes >= scale {
            return format!("{:.2} {}", bytes as f64 / scale as f64, suffix);
        }
    }
    format!("{} B", bytes)
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else if secs > 0 {
        format!("{}s", seconds)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    let local: DateTime<Local> = DateTime::from(*dt);
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Parses sizes such as `512`, `100MB` or `1.5 GB` into bytes (binary units).
pub fn parse_size(s: &str) -> Result<u64, String> {
    let upper = s.trim().to_uppercase();

    let (number, scale) = UNITS
        .iter()
        .find_map(|(suffix, scale)| upper.strip_suffix(suffix).map(|n| (n, *scale)))
        .or_else(|| upper.strip_suffix('B').map(|n| (n, 1)))
        .unwrap_or((upper.as_str(), 1));

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("Invalid size value: {}", s))?;

    if value < 0.0 {
        return Err(format!("Size cannot be negative: {}", s));
    }

    Ok((value * scale as f64) as u64)
}
