//! Lesson state machine.
//!
//! A [`Lesson`] is an ordered list of steps. The [`LessonEngine`] walks it,
//! dispatching each step's [`ValidationDescriptor`] to the pattern, level or
//! indicator validators and advancing only when validation passes.

pub mod engine;
pub mod progress;
pub mod step;

pub use engine::{LessonEngine, LessonState, StepOutcome};
pub use progress::{
    progress_key, FileStore, LessonListener, LessonProgress, MemoryStore, ProgressStore, StoreListener,
};
pub use step::{Lesson, LessonStep, StepKind, ValidationDescriptor};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LessonError {
    #[error("Failed to parse lesson JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read lesson file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Duplicate step id '{0}'")]
    DuplicateStep(String),

    #[error("Unknown step id '{0}'")]
    UnknownStep(String),

    #[error("Progress belongs to lesson '{found}', expected '{expected}'")]
    LessonMismatch { expected: String, found: String },

    #[error("Step index {index} out of range for {len} steps")]
    StepIndex { index: usize, len: usize },
}
