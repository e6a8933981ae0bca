use chrono::DateTime;

/// Format seconds as `M:SS`, or `H:MM:SS` from one hour up
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Compact view count: `950`, `1.2K`, `3.4M`, `1.1B`
pub fn format_view_count(views: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_000_000_000, "B"), (1_000_000, "M"), (1_000, "K")];

    for (scale, suffix) in UNITS {
        if views >= scale {
            let scaled = views as f64 / scale as f64;
            let text = format!("{:.1}", scaled);
            let text = text.strip_suffix(".0").unwrap_or(&text);
            return format!("{}{}", text, suffix);
        }
    }

    views.to_string()
}

/// Calendar date of an epoch-seconds publication time
pub fn format_published(published: i64) -> Option<String> {
    DateTime::from_timestamp(published, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}
