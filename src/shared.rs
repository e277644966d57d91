use std::sync::Arc;

use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::engine::SessionEngine;
use crate::error::SessionError;
use crate::session::{SessionPhase, SessionStats};
use crate::typing_policy::PositionStatus;

/// Point-in-time view of an engine, taken under its lock
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    pub phase: SessionPhase,
    pub current_index: usize,
    pub stats: SessionStats,
    pub wpm: u32,
    pub accuracy: u32,
}

/// Engine handle for hosts that touch the session from more than one thread.
///
/// Every mutation goes through the same lock, so input events, backspaces and
/// restarts are applied one at a time; stat polling reads a snapshot taken
/// under that lock as well.
pub struct SharedEngine<C: Clock = SystemClock> {
    inner: Arc<Mutex<SessionEngine<C>>>,
}

impl<C: Clock> Clone for SharedEngine<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Clock> SharedEngine<C> {
    pub fn new(engine: SessionEngine<C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn start(&self) -> Result<(), SessionError> {
        self.inner.lock().start()
    }

    /// Statuses are collected because they borrow the engine
    pub fn on_input(&self, raw: &str) -> Vec<PositionStatus> {
        self.inner.lock().on_input(raw).collect()
    }

    pub fn on_backspace(&self) {
        self.inner.lock().on_backspace();
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let engine = self.inner.lock();
        EngineSnapshot {
            phase: engine.phase(),
            current_index: engine.current_index(),
            stats: engine.stats(),
            wpm: engine.compute_wpm(),
            accuracy: engine.compute_accuracy(),
        }
    }

    /// Run `f` with exclusive access to the engine
    pub fn with<R>(&self, f: impl FnOnce(&mut SessionEngine<C>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
