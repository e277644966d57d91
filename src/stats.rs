//! Speed and accuracy math shared by the engine and the results screen.

use chrono::Duration;

/// Characters per "word" in the standard WPM approximation
pub const CHARS_PER_WORD: f64 = 5.0;

/// Words per minute for `total_chars` typed over `elapsed`.
///
/// Returns 0 when no time has passed (or the clock went backwards).
pub fn wpm(total_chars: u64, elapsed: Duration) -> u32 {
    let elapsed_ms = elapsed.num_milliseconds();
    if elapsed_ms <= 0 {
        return 0;
    }
    let elapsed_minutes = elapsed_ms as f64 / 60_000.0;
    ((total_chars as f64 / CHARS_PER_WORD) / elapsed_minutes).round() as u32
}

/// Fractional WPM, used for chart coordinates where rounding would flatten the line
pub fn wpm_f64(total_chars: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    (total_chars as f64 / CHARS_PER_WORD) / (elapsed_secs / 60.0)
}

/// Accuracy percentage in `0..=100`. No characters typed counts as perfect.
pub fn accuracy(total_chars: u64, total_mistakes: u64) -> u32 {
    if total_chars == 0 {
        return 100;
    }
    let correct = total_chars.saturating_sub(total_mistakes) as f64;
    let pct = ((correct / total_chars as f64) * 100.0).round();
    pct.clamp(0.0, 100.0) as u32
}

/// Time between two instants in fractional seconds
pub fn secs_between(from: chrono::DateTime<chrono::Utc>, to: chrono::DateTime<chrono::Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}
