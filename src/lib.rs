// Library surface for the terminal binary, headless tests and other front ends.
// The engine and everything it depends on stay free of terminal types.
pub mod app_dirs;
pub mod clock;
pub mod coach;
pub mod config;
pub mod curriculum;
pub mod engine;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod shared;
pub mod stats;
pub mod time_series;
pub mod typing_policy;

pub use curriculum::{Curriculum, CurriculumEntry, DrillCategory};
pub use engine::SessionEngine;
pub use error::{CurriculumError, SessionError};
pub use session::{SessionEvent, SessionListener, SessionPhase, SessionReport, SessionStats};
pub use typing_policy::{CharStatus, PositionStatus};
