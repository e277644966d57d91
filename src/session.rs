use std::sync::mpsc::Sender;

use chrono::{DateTime, Utc};
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Playing,
    Finished,
}

/// Counters accumulated over one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub total_chars: u64,
    pub total_mistakes: u64,
    pub total_backspaces: u64,
    /// Backspaces in the sentence currently on screen
    pub sentence_backspaces: u64,
    /// Set by the first keystroke of the session
    pub start_time: Option<DateTime<Utc>>,
}

/// One completed sentence
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceRecord {
    pub index: usize,
    pub level: u32,
    pub chars: u64,
    pub mistakes: u64,
    /// Target characters at the mistaken positions, in sentence order
    pub missed: String,
    pub backspaces: u64,
    /// Seconds from the session's first keystroke until this sentence matched
    pub elapsed_secs: f64,
}

/// Final numbers for a finished session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub wpm: u32,
    pub accuracy: u32,
    pub total_backspaces: u64,
    pub total_chars: u64,
    pub total_mistakes: u64,
    pub elapsed_secs: f64,
}

/// Notifications emitted by the engine. Each carries owned data.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SentenceLoaded {
        index: usize,
        level: u32,
        text: String,
        guide: Option<String>,
    },
    SentenceCompleted {
        index: usize,
        stats: SessionStats,
    },
    BackspacePressed {
        total_backspaces: u64,
    },
    SessionFinished(SessionReport),
}

/// Receiver of engine notifications
pub trait SessionListener: Send {
    fn on_event(&mut self, event: &SessionEvent);
}

impl SessionListener for Sender<SessionEvent> {
    fn on_event(&mut self, event: &SessionEvent) {
        // a dropped receiver just means nobody is rendering anymore
        let _ = self.send(event.clone());
    }
}

impl<F> SessionListener for F
where
    F: FnMut(&SessionEvent) + Send,
{
    fn on_event(&mut self, event: &SessionEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_stats_default_is_zeroed() {
        let stats = SessionStats::default();
        assert_eq!(stats.total_chars, 0);
        assert_eq!(stats.total_mistakes, 0);
        assert_eq!(stats.total_backspaces, 0);
        assert_eq!(stats.sentence_backspaces, 0);
        assert!(stats.start_time.is_none());
    }

    #[test]
    fn test_sender_listener_forwards_events() {
        let (mut tx, rx) = mpsc::channel();
        tx.on_event(&SessionEvent::BackspacePressed {
            total_backspaces: 3,
        });

        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::BackspacePressed {
                total_backspaces: 3
            }
        );
    }

    #[test]
    fn test_sender_listener_ignores_dropped_receiver() {
        let (mut tx, rx) = mpsc::channel::<SessionEvent>();
        drop(rx);
        tx.on_event(&SessionEvent::BackspacePressed {
            total_backspaces: 1,
        });
    }

    #[test]
    fn test_closure_listener() {
        let mut seen = 0;
        {
            let mut listener = |_: &SessionEvent| seen += 1;
            listener.on_event(&SessionEvent::BackspacePressed {
                total_backspaces: 1,
            });
        }
        assert_eq!(seen, 1);
    }
}
