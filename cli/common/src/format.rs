//! Formatting utilities for CLI summaries.

use std::time::Duration;

const BYTE_UNITS: [&str; 5] = ["bytes", "KB", "MB", "GB", "TB"];

/// Format bytes as a human-readable string (binary units).
///
/// # Examples
///
/// ```
/// use pq_cli_common::format_bytes;
///
/// assert_eq!(format_bytes(500), "500 bytes");
/// assert_eq!(format_bytes(1536), "1.50 KB");
/// assert_eq!(format_bytes(1_073_741_824), "1.00 GB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} bytes", bytes)
    } else {
        format!("{:.2} {}", value, BYTE_UNITS[unit])
    }
}

/// Format a count with thousands separators.
///
/// # Examples
///
/// ```
/// use pq_cli_common::format_number;
///
/// assert_eq!(format_number(10_000), "10,000");
/// assert_eq!(format_number(999), "999");
/// ```
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;

    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - head) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a duration as seconds with millisecond precision, or minutes
/// and seconds past one minute.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.3}s", secs)
    } else {
        let whole = duration.as_secs();
        format!("{}m {:02}s", whole / 60, whole % 60)
    }
}

/// Format a per-second rate, e.g. `"12,500/s"`.
pub fn format_rate(count: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs <= 0.0 {
        return "-".to_string();
    }
    format!("{}/s", format_number((count as f64 / secs).round() as u64))
}
