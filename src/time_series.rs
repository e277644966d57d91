use crate::session::SentenceRecord;
use crate::stats::wpm_f64;

/// One point on the results chart: seconds since the first keystroke and the
/// running WPM at that moment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub t: f64,
    pub wpm: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.t, p.wpm)
    }
}

/// Running WPM after each completed sentence
pub fn running_wpm(log: &[SentenceRecord]) -> Vec<TimeSeriesPoint> {
    log.iter()
        .scan(0u64, |chars, record| {
            *chars += record.chars;
            Some(TimeSeriesPoint::new(
                record.elapsed_secs,
                wpm_f64(*chars, record.elapsed_secs),
            ))
        })
        .collect()
}

/// WPM of each sentence on its own, measured from the previous completion.
/// The first sentence is measured from the first keystroke.
pub fn per_sentence_wpm(log: &[SentenceRecord]) -> Vec<f64> {
    let mut previous = 0.0;
    log.iter()
        .map(|record| {
            let wpm = wpm_f64(record.chars, record.elapsed_secs - previous);
            previous = record.elapsed_secs;
            wpm
        })
        .collect()
}

/// Population standard deviation of per-sentence WPM; lower is steadier.
/// `None` with fewer than two sentences.
pub fn consistency(log: &[SentenceRecord]) -> Option<f64> {
    let speeds = per_sentence_wpm(log);
    if speeds.len() < 2 {
        return None;
    }
    let n = speeds.len() as f64;
    let mean = speeds.iter().sum::<f64>() / n;
    let variance = speeds.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt())
}
