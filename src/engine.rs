use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::curriculum::{Curriculum, CurriculumEntry};
use crate::error::SessionError;
use crate::session::{
    SentenceRecord, SessionEvent, SessionListener, SessionPhase, SessionReport, SessionStats,
};
use crate::stats::{self, secs_between};
use crate::typing_policy::{incorrect_positions, PositionStatuses};

/// Drives one practice session through a curriculum.
///
/// The engine owns no timers and performs no I/O. Callers feed it the full
/// contents of the input buffer on every edit plus a separate notification
/// for each backspace, and poll [`compute_wpm`](Self::compute_wpm) /
/// [`compute_accuracy`](Self::compute_accuracy) for live display.
pub struct SessionEngine<C: Clock = SystemClock> {
    curriculum: Curriculum,
    current_index: usize,
    phase: SessionPhase,
    stats: SessionStats,
    // positions seen incorrect at least once in the current sentence
    sentence_mistakes: HashSet<usize>,
    sentence_log: Vec<SentenceRecord>,
    finished_at: Option<DateTime<Utc>>,
    report: Option<SessionReport>,
    clock: C,
    listeners: Vec<Box<dyn SessionListener>>,
}

impl SessionEngine<SystemClock> {
    pub fn new(curriculum: Curriculum) -> Self {
        Self::with_clock(curriculum, SystemClock)
    }
}

impl<C: Clock> SessionEngine<C> {
    pub fn with_clock(curriculum: Curriculum, clock: C) -> Self {
        Self {
            curriculum,
            current_index: 0,
            phase: SessionPhase::Idle,
            stats: SessionStats::default(),
            sentence_mistakes: HashSet::new(),
            sentence_log: Vec::new(),
            finished_at: None,
            report: None,
            clock,
            listeners: Vec::new(),
        }
    }

    pub fn add_listener<L: SessionListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener));
    }

    /// Begin (or restart) a session from the first entry.
    ///
    /// On error nothing is reset.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.curriculum.is_empty() {
            return Err(SessionError::EmptyCurriculum);
        }

        self.current_index = 0;
        self.stats = SessionStats::default();
        self.sentence_log.clear();
        self.finished_at = None;
        self.report = None;
        self.phase = SessionPhase::Playing;

        info!(sentences = self.curriculum.len(), "session started");
        self.load_sentence();
        Ok(())
    }

    /// Compare the whole input buffer against the current sentence.
    ///
    /// Returns the per-position statuses of the sentence that was current
    /// when the call began, even if this input completed it. Outside of a
    /// running session this is a no-op returning an empty sequence.
    pub fn on_input<'a>(&'a mut self, raw: &'a str) -> PositionStatuses<'a> {
        if !self.is_playing() {
            return PositionStatuses::empty();
        }

        let idx = self.current_index;
        let now = self.clock.now();
        if self.stats.start_time.is_none() {
            debug!("timer started");
            self.stats.start_time = Some(now);
        }

        let Some(entry) = self.curriculum.get(idx) else {
            return PositionStatuses::empty();
        };
        self.sentence_mistakes
            .extend(incorrect_positions(entry.text(), raw));

        if entry.text() == raw {
            self.complete_sentence(now);
        }

        match self.curriculum.get(idx) {
            Some(entry) => PositionStatuses::new(entry.text(), raw),
            None => PositionStatuses::empty(),
        }
    }

    pub fn on_backspace(&mut self) {
        if !self.is_playing() {
            return;
        }

        self.stats.total_backspaces += 1;
        self.stats.sentence_backspaces += 1;
        self.emit(SessionEvent::BackspacePressed {
            total_backspaces: self.stats.total_backspaces,
        });
    }

    /// Words per minute so far. Frozen at the finish time once the session ends.
    pub fn compute_wpm(&self) -> u32 {
        match self.elapsed() {
            Some(elapsed) => stats::wpm(self.stats.total_chars, elapsed),
            None => 0,
        }
    }

    pub fn compute_accuracy(&self) -> u32 {
        stats::accuracy(self.stats.total_chars, self.stats.total_mistakes)
    }

    /// Time since the first keystroke, or `None` before it
    pub fn elapsed(&self) -> Option<Duration> {
        let start = self.stats.start_time?;
        let end = self.finished_at.unwrap_or_else(|| self.clock.now());
        Some(end - start)
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == SessionPhase::Playing
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Sentence being typed, `None` unless playing
    pub fn current_entry(&self) -> Option<&CurriculumEntry> {
        if self.is_playing() {
            self.curriculum.get(self.current_index)
        } else {
            None
        }
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.clone()
    }

    pub fn sentence_log(&self) -> &[SentenceRecord] {
        &self.sentence_log
    }

    /// Final report, available once the session has finished
    pub fn report(&self) -> Option<&SessionReport> {
        self.report.as_ref()
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    fn load_sentence(&mut self) {
        self.sentence_mistakes.clear();
        self.stats.sentence_backspaces = 0;

        let Some(entry) = self.curriculum.get(self.current_index) else {
            return;
        };
        debug!(index = self.current_index, level = entry.level(), "sentence loaded");
        let event = SessionEvent::SentenceLoaded {
            index: self.current_index,
            level: entry.level(),
            text: entry.text().to_string(),
            guide: entry.guide().map(str::to_string),
        };
        self.emit(event);
    }

    fn complete_sentence(&mut self, now: DateTime<Utc>) {
        let idx = self.current_index;
        let Some(entry) = self.curriculum.get(idx) else {
            return;
        };
        let chars = entry.char_len() as u64;
        let level = entry.level();
        let mistakes = self.sentence_mistakes.len() as u64;
        let missed: String = entry
            .text()
            .chars()
            .enumerate()
            .filter(|(i, _)| self.sentence_mistakes.contains(i))
            .map(|(_, c)| c)
            .collect();

        self.stats.total_chars += chars;
        self.stats.total_mistakes += mistakes;
        self.sentence_log.push(SentenceRecord {
            index: idx,
            level,
            chars,
            mistakes,
            missed,
            backspaces: self.stats.sentence_backspaces,
            elapsed_secs: self
                .stats
                .start_time
                .map_or(0.0, |start| secs_between(start, now)),
        });
        self.current_index += 1;

        debug!(index = idx, mistakes, "sentence completed");
        self.emit(SessionEvent::SentenceCompleted {
            index: idx,
            stats: self.stats.clone(),
        });

        if self.current_index == self.curriculum.len() {
            self.finish(now);
        } else {
            self.load_sentence();
        }
    }

    fn finish(&mut self, now: DateTime<Utc>) {
        self.phase = SessionPhase::Finished;
        self.finished_at = Some(now);

        let report = SessionReport {
            wpm: self.compute_wpm(),
            accuracy: self.compute_accuracy(),
            total_backspaces: self.stats.total_backspaces,
            total_chars: self.stats.total_chars,
            total_mistakes: self.stats.total_mistakes,
            elapsed_secs: self.elapsed().map_or(0.0, |d| d.num_milliseconds() as f64 / 1000.0),
        };
        info!(
            wpm = report.wpm,
            accuracy = report.accuracy,
            backspaces = report.total_backspaces,
            "session finished"
        );
        self.report = Some(report.clone());
        self.emit(SessionEvent::SessionFinished(report));
    }

    fn emit(&mut self, event: SessionEvent) {
        for listener in &mut self.listeners {
            listener.on_event(&event);
        }
    }
}

impl<C: Clock + fmt::Debug> fmt::Debug for SessionEngine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEngine")
            .field("current_index", &self.current_index)
            .field("phase", &self.phase)
            .field("stats", &self.stats)
            .field("clock", &self.clock)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::typing_policy::CharStatus;
    use assert_matches::assert_matches;
    use std::sync::mpsc::{self, Receiver};

    fn curriculum(texts: &[&str]) -> Curriculum {
        texts
            .iter()
            .map(|t| CurriculumEntry::new(1, *t).unwrap())
            .collect()
    }

    fn engine_with_events(
        texts: &[&str],
    ) -> (SessionEngine<ManualClock>, ManualClock, Receiver<SessionEvent>) {
        let clock = ManualClock::default();
        let mut engine = SessionEngine::with_clock(curriculum(texts), clock.clone());
        let (tx, rx) = mpsc::channel();
        engine.add_listener(tx);
        (engine, clock, rx)
    }

    fn statuses(engine: &mut SessionEngine<ManualClock>, raw: &str) -> Vec<CharStatus> {
        engine.on_input(raw).map(|p| p.status).collect()
    }

    #[test]
    fn test_new_engine_is_idle() {
        let engine = SessionEngine::new(curriculum(&["hi"]));

        assert_eq!(engine.phase(), SessionPhase::Idle);
        assert!(!engine.is_playing());
        assert_eq!(engine.current_index(), 0);
        assert!(engine.current_entry().is_none());
        assert_eq!(engine.compute_wpm(), 0);
        assert_eq!(engine.compute_accuracy(), 100);
    }

    #[test]
    fn test_start_emits_first_sentence() {
        let (mut engine, _clock, rx) = engine_with_events(&["hi", "yo"]);

        engine.start().unwrap();

        assert!(engine.is_playing());
        assert_eq!(engine.current_entry().unwrap().text(), "hi");
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::SentenceLoaded {
                index: 0,
                level: 1,
                text: "hi".to_string(),
                guide: None,
            }
        );
    }

    #[test]
    fn test_start_empty_curriculum_fails() {
        let mut engine = SessionEngine::new(Curriculum::default());

        assert_matches!(engine.start(), Err(SessionError::EmptyCurriculum));
        assert_eq!(engine.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_input_before_start_is_ignored() {
        let (mut engine, _clock, rx) = engine_with_events(&["hi"]);

        assert_eq!(engine.on_input("hi").count(), 0);
        engine.on_backspace();

        assert_eq!(engine.stats(), SessionStats::default());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_first_input_sets_start_time_once() {
        let (mut engine, clock, _rx) = engine_with_events(&["hello"]);
        engine.start().unwrap();

        engine.on_input("h");
        let first = engine.stats().start_time;
        clock.advance(Duration::seconds(3));
        engine.on_input("he");

        assert!(first.is_some());
        assert_eq!(engine.stats().start_time, first);
    }

    #[test]
    fn test_hi_scenario() {
        let (mut engine, _clock, rx) = engine_with_events(&["hi"]);
        engine.start().unwrap();
        let _ = rx.try_recv();

        assert_eq!(
            statuses(&mut engine, "h"),
            vec![CharStatus::Correct, CharStatus::Cursor]
        );
        assert_eq!(
            statuses(&mut engine, "hi"),
            vec![CharStatus::Correct, CharStatus::Correct]
        );

        assert_eq!(engine.stats().total_chars, 2);
        assert_eq!(engine.phase(), SessionPhase::Finished);
        assert_matches!(rx.try_recv(), Ok(SessionEvent::SentenceCompleted { index: 0, .. }));
        assert_matches!(
            rx.try_recv(),
            Ok(SessionEvent::SessionFinished(SessionReport { accuracy: 100, .. }))
        );
    }

    #[test]
    fn test_high_water_mark_mistakes() {
        let (mut engine, _clock, _rx) = engine_with_events(&["ab"]);
        engine.start().unwrap();

        assert_eq!(
            statuses(&mut engine, "x"),
            vec![CharStatus::Incorrect, CharStatus::Cursor]
        );
        engine.on_input("ab");

        let stats = engine.stats();
        assert_eq!(stats.total_mistakes, 1);
        assert_eq!(stats.total_chars, 2);
        assert_eq!(engine.compute_accuracy(), 50);
    }

    #[test]
    fn test_same_position_counts_once() {
        let (mut engine, _clock, _rx) = engine_with_events(&["abc", "de"]);
        engine.start().unwrap();

        engine.on_input("x");
        engine.on_input("");
        engine.on_input("y");
        engine.on_input("az");
        engine.on_input("abc");

        assert_eq!(engine.stats().total_mistakes, 2);
        // next sentence starts with a clean slate
        engine.on_input("de");
        assert_eq!(engine.stats().total_mistakes, 2);
    }

    #[test]
    fn test_sentence_log_keeps_missed_chars_in_order() {
        let (mut engine, _clock, _rx) = engine_with_events(&["Ab;c", "de"]);
        engine.start().unwrap();

        engine.on_input("Ab:");
        engine.on_input("x");
        engine.on_input("Ab;c");
        engine.on_input("de");

        let log = engine.sentence_log();
        assert_eq!(log[0].missed, "A;");
        assert_eq!(log[0].mistakes, 2);
        assert_eq!(log[1].missed, "");
    }

    #[test]
    fn test_exact_match_advances_by_one() {
        let (mut engine, _clock, rx) = engine_with_events(&["one", "two"]);
        engine.start().unwrap();
        let _ = rx.try_recv();

        engine.on_input("one");

        assert_eq!(engine.current_index(), 1);
        assert_eq!(engine.stats().total_chars, 3);
        assert!(engine.is_playing());
        assert_matches!(rx.try_recv(), Ok(SessionEvent::SentenceCompleted { index: 0, .. }));
        assert_matches!(
            rx.try_recv(),
            Ok(SessionEvent::SentenceLoaded { index: 1, ref text, .. }) if text == "two"
        );
    }

    #[test]
    fn test_prefix_never_advances() {
        let (mut engine, _clock, _rx) = engine_with_events(&["hello"]);
        engine.start().unwrap();

        for raw in ["h", "he", "hel", "hell", "hell", "hello!"] {
            engine.on_input(raw);
        }

        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.stats().total_chars, 0);
    }

    #[test]
    fn test_finished_engine_ignores_input() {
        let (mut engine, _clock, _rx) = engine_with_events(&["a"]);
        engine.start().unwrap();
        engine.on_input("a");
        let before = engine.stats();

        assert_eq!(engine.on_input("a").count(), 0);
        engine.on_backspace();

        assert!(!engine.is_playing());
        assert_eq!(engine.stats(), before);
        assert_eq!(engine.current_index(), 1);
    }

    #[test]
    fn test_backspace_counts() {
        let (mut engine, _clock, rx) = engine_with_events(&["abc", "d"]);
        engine.start().unwrap();
        let _ = rx.try_recv();

        engine.on_input("x");
        engine.on_backspace();
        engine.on_backspace();

        assert_eq!(engine.stats().total_backspaces, 2);
        assert_eq!(engine.stats().sentence_backspaces, 2);
        assert_eq!(engine.stats().total_chars, 0);
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::BackspacePressed {
                total_backspaces: 1
            }
        );

        engine.on_input("abc");
        assert_eq!(engine.stats().sentence_backspaces, 0);
        assert_eq!(engine.stats().total_backspaces, 2);
        assert_eq!(engine.sentence_log()[0].backspaces, 2);
    }

    #[test]
    fn test_wpm_with_manual_clock() {
        let (mut engine, clock, _rx) = engine_with_events(&["aaaaa", "bbbbb"]);
        engine.start().unwrap();

        engine.on_input("a");
        clock.advance(Duration::seconds(30));
        engine.on_input("aaaaa");

        // 5 chars = 1 word in half a minute
        assert_eq!(engine.compute_wpm(), 2);
        clock.advance(Duration::seconds(30));
        assert_eq!(engine.compute_wpm(), 1);
    }

    #[test]
    fn test_wpm_zero_before_time_passes() {
        let (mut engine, _clock, _rx) = engine_with_events(&["ab", "c"]);
        engine.start().unwrap();
        engine.on_input("ab");

        assert_eq!(engine.stats().total_chars, 2);
        assert_eq!(engine.compute_wpm(), 0);
    }

    #[test]
    fn test_wpm_frozen_after_finish() {
        let (mut engine, clock, _rx) = engine_with_events(&["aaaaa"]);
        engine.start().unwrap();

        engine.on_input("a");
        clock.advance(Duration::seconds(60));
        engine.on_input("aaaaa");
        clock.advance(Duration::minutes(10));

        assert_eq!(engine.compute_wpm(), 1);
        assert_eq!(engine.report().unwrap().wpm, 1);
        assert_eq!(engine.report().unwrap().elapsed_secs, 60.0);
    }

    #[test]
    fn test_sentence_log_records_elapsed() {
        let (mut engine, clock, _rx) = engine_with_events(&["a", "b"]);
        engine.start().unwrap();

        engine.on_input("x");
        clock.advance(Duration::seconds(2));
        engine.on_input("a");
        clock.advance(Duration::seconds(3));
        engine.on_input("b");

        let log = engine.sentence_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].elapsed_secs, 2.0);
        assert_eq!(log[0].mistakes, 1);
        assert_eq!(log[1].elapsed_secs, 5.0);
        assert_eq!(log[1].mistakes, 0);
    }

    #[test]
    fn test_restart_resets_everything() {
        let (mut engine, _clock, _rx) = engine_with_events(&["a", "b"]);
        engine.start().unwrap();
        engine.on_input("x");
        engine.on_backspace();
        engine.on_input("a");

        engine.start().unwrap();

        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.stats(), SessionStats::default());
        assert!(engine.sentence_log().is_empty());
        engine.on_input("a");
        assert_eq!(engine.stats().total_mistakes, 0);
    }

    #[test]
    fn test_start_after_finish_plays_again() {
        let (mut engine, _clock, _rx) = engine_with_events(&["a"]);
        engine.start().unwrap();
        engine.on_input("a");
        assert_eq!(engine.phase(), SessionPhase::Finished);

        engine.start().unwrap();

        assert!(engine.is_playing());
        assert!(engine.report().is_none());
    }

    #[test]
    fn test_statuses_for_completed_sentence() {
        let (mut engine, _clock, _rx) = engine_with_events(&["ab", "cd"]);
        engine.start().unwrap();

        let chars: String = engine.on_input("ab").map(|p| p.char).collect();

        assert_eq!(chars, "ab");
        assert_eq!(engine.current_entry().unwrap().text(), "cd");
    }

    #[test]
    fn test_accuracy_bounded_under_noise() {
        let (mut engine, _clock, _rx) = engine_with_events(&["abcd", "ef"]);
        engine.start().unwrap();

        for raw in ["zzzz", "zzzzzzzz", "a", "abzz", "abcd", "xx", "ef"] {
            engine.on_input(raw);
            let accuracy = engine.compute_accuracy();
            assert!(accuracy <= 100);
        }
        let stats = engine.stats();
        assert!(stats.total_mistakes <= stats.total_chars);
        assert_eq!(engine.compute_accuracy(), 0);
    }

    #[test]
    fn test_closure_listener_sees_guide() {
        let entry = CurriculumEntry::new(2, "hi").unwrap().with_guide("smile");
        let mut engine = SessionEngine::new(Curriculum::new(vec![entry]));
        let (tx, rx) = mpsc::channel();
        engine.add_listener(move |event: &SessionEvent| {
            if let SessionEvent::SentenceLoaded { guide, .. } = event {
                let _ = tx.send(guide.clone());
            }
        });

        engine.start().unwrap();

        assert_eq!(rx.try_recv().unwrap(), Some("smile".to_string()));
    }
}
