//! Candle tutor: lesson state machine and chart interaction bus.
//!
//! Indicators, validators and data sources live in the `tutor-*` crates;
//! this crate ties them into guided lessons.

pub mod events;
pub mod lesson;

pub use events::{InteractionBus, InteractionEvent, InteractionKind, InteractionState};
pub use lesson::{
    Lesson, LessonEngine, LessonError, LessonListener, LessonProgress, LessonStep, StepOutcome,
    ValidationDescriptor,
};
