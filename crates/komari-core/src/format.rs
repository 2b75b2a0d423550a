//! Human-readable byte, rate and duration formatting helpers.

const BYTE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Format bytes with 1024-based units, rounding up to at most two decimals
/// (e.g. "512 B", "1.5 KB", "3.01 GB").
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).ceil() / 100.0;
    let text = format!("{rounded:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text} {}", BYTE_UNITS[unit])
}

/// Format a bytes-per-second rate, e.g. "1.5 KB/s".
pub fn format_rate(bytes_per_sec: u64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec))
}

/// Format a percentage with one decimal, e.g. "42.5%".
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// Format seconds into a compact duration: "12d", "3d4h", "5h12m", "7m3s", "42s".
///
/// `shortened` drops the second component ("3d", "5h", "7m").
pub fn format_uptime(seconds: u64, shortened: bool) -> String {
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days >= 10 || (days > 0 && shortened) {
        format!("{days}d")
    } else if days > 0 {
        format!("{days}d{}h", hours % 24)
    } else if hours > 0 && shortened {
        format!("{hours}h")
    } else if hours > 0 {
        format!("{hours}h{}m", minutes % 60)
    } else if minutes > 0 && shortened {
        format!("{minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m{}s", seconds % 60)
    } else {
        format!("{seconds}s")
    }
}
