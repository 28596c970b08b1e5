use rand::Rng;
use std::time::Duration;

/// Picks a random duration between `min_secs` and `max_secs`
pub fn jitter(min_secs: f64, max_secs: f64) -> Duration {
    let (lo, hi) = if min_secs <= max_secs {
        (min_secs, max_secs)
    } else {
        (max_secs, min_secs)
    };
    let secs = if hi > lo {
        rand::rng().random_range(lo..=hi)
    } else {
        lo
    };
    Duration::from_secs_f64(secs.max(0.0))
}

/// Sleeps for a random, human-looking interval
pub async fn human_pause(min_secs: f64, max_secs: f64) {
    tokio::time::sleep(jitter(min_secs, max_secs)).await;
}

/// Convert a string to a sanitized filename
pub fn sanitize_filename(url: &str) -> String {
    // Remove protocol and replace invalid filename characters
    let mut name = url.replace("http://", "").replace("https://", "");
    name = name.replace(['/', ':', '?', '&', '=', '#', '%', '\\', ' '], "_");

    // Limit filename length on a char boundary
    name.chars().take(100).collect()
}
