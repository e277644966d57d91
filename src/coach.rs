//! Picks the next drill bank from how the last session went.

use clap::ValueEnum;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::curriculum::DrillCategory;
use crate::session::SentenceRecord;
use crate::stats::accuracy;
use crate::time_series::per_sentence_wpm;

/// Only the tail of the log is judged
pub const RECENT_SENTENCES: usize = 10;
const ACCURACY_FLOOR: u32 = 95;
/// More shaky sentences than this sends the typist back to basics
const SHAKY_LIMIT: usize = 3;
/// More sentences than this with a missed shifted or symbol key triggers that drill
const KEY_MISS_LIMIT: usize = 2;
const FAST_WPM: f64 = 40.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub category: DrillCategory,
    pub advice: String,
}

impl Recommendation {
    fn new(category: DrillCategory, advice: impl Into<String>) -> Self {
        Self {
            category,
            advice: advice.into(),
        }
    }
}

/// Recommend the next drill bank for a finished session.
///
/// Checks run in order and the first hit wins: low accuracy, missed
/// uppercase letters, missed symbols, high speed. With nothing to flag the
/// bank is picked at random to keep practice varied.
pub fn recommend<R: Rng + ?Sized>(log: &[SentenceRecord], rng: &mut R) -> Recommendation {
    if log.is_empty() {
        return Recommendation::new(
            DrillCategory::BasicKo,
            "Start with the basics, one step at a time.",
        );
    }

    let skip = log.len().saturating_sub(RECENT_SENTENCES);
    let recent = &log[skip..];

    let shaky = recent
        .iter()
        .filter(|r| accuracy(r.chars, r.mistakes) < ACCURACY_FLOOR)
        .count();
    if shaky > SHAKY_LIMIT {
        return Recommendation::new(
            DrillCategory::BasicKo,
            "Accuracy is a little unsteady. Slow down and rebuild the fundamentals.",
        );
    }

    let missed_any = |pred: fn(char) -> bool| {
        recent
            .iter()
            .filter(|r| r.missed.chars().any(pred))
            .count()
    };
    if missed_any(char::is_uppercase) > KEY_MISS_LIMIT {
        return Recommendation::new(
            DrillCategory::ShiftMix,
            "Shifted letters keep slipping. Time for some focused Shift practice.",
        );
    }
    if missed_any(is_symbol) > KEY_MISS_LIMIT {
        return Recommendation::new(
            DrillCategory::SymbolCode,
            "Symbols still feel unfamiliar. Code snippets will help them stick.",
        );
    }

    let speeds = per_sentence_wpm(log);
    let recent_speeds = &speeds[skip..];
    let avg_wpm = recent_speeds.iter().sum::<f64>() / recent_speeds.len() as f64;
    if avg_wpm > FAST_WPM {
        return Recommendation::new(
            DrillCategory::LongSentence,
            format!("Averaging {avg_wpm:.1} WPM. Build stamina with long sentences."),
        );
    }

    let category = DrillCategory::value_variants()
        .choose(rng)
        .copied()
        .unwrap_or(DrillCategory::BasicKo);
    Recommendation::new(category, "Keep the feel with a varied mix of sentences.")
}

fn is_symbol(c: char) -> bool {
    !c.is_alphanumeric() && c != ' '
}
