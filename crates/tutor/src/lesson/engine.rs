//! Lesson engine: step navigation, validation dispatch and completion.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tutor_config::Config;
use tutor_core::{Candle, IndicatorKind, IndicatorSeries, SignalType};
use tutor_indicators::{Indicator, Macd, MacdConfig, Rsi, RsiConfig};
use tutor_ta::{validate_pattern, LevelValidator, PatternContext, PatternKind, Trend, ValidationResult};

use super::progress::{LessonListener, LessonProgress};
use super::step::{Lesson, LessonStep, ValidationDescriptor};
use super::LessonError;
use crate::events::{Interaction, InteractionEvent};

/// Mutable lesson state. Only the engine writes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonState {
    pub current_step_index: usize,
    pub completed_steps: HashSet<String>,
    /// Latest data recorded per action id.
    pub user_actions: HashMap<String, serde_json::Value>,
    /// Latest validation result per step id.
    pub validation_results: HashMap<String, ValidationResult>,
    /// Candle indices currently selected on the chart.
    pub selected_candles: BTreeSet<usize>,
}

/// Result of [`LessonEngine::complete_step`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The step passed and the lesson moved to `next_index`.
    Advanced { next_index: usize },
    /// The step passed and every step of the lesson is now complete.
    LessonComplete,
    /// The step passed but was not the active step, or is the last step
    /// while earlier ones are still open. The current step is unchanged.
    Completed,
    /// Validation failed; nothing moved.
    Blocked(ValidationResult),
    UnknownStep,
}

pub struct LessonEngine {
    lesson: Lesson,
    candles: Vec<Candle>,
    rsi: RsiConfig,
    macd: MacdConfig,
    level_validator: LevelValidator,
    state: LessonState,
    listener: Option<Box<dyn LessonListener>>,
}

impl fmt::Debug for LessonEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LessonEngine")
            .field("lesson", &self.lesson.id)
            .field("candles", &self.candles.len())
            .field("state", &self.state)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl LessonEngine {
    pub fn new(lesson: Lesson, candles: Vec<Candle>, config: &Config) -> Self {
        log::info!(
            "Starting lesson '{}' with {} steps over {} candles",
            lesson.id,
            lesson.steps.len(),
            candles.len()
        );
        Self {
            lesson,
            candles,
            rsi: config.indicators.rsi.clone(),
            macd: config.indicators.macd.clone(),
            level_validator: config.validation.level.clone(),
            state: LessonState::default(),
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: Box<dyn LessonListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn set_listener(&mut self, listener: Box<dyn LessonListener>) {
        self.listener = Some(listener);
    }

    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn state(&self) -> &LessonState {
        &self.state
    }

    /// Replace the chart data. Candle selections refer to the old data and are dropped.
    pub fn set_candles(&mut self, candles: Vec<Candle>) {
        self.candles = candles;
        self.state.selected_candles.clear();
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn current_step(&self) -> Option<&LessonStep> {
        self.lesson.steps.get(self.state.current_step_index)
    }

    pub fn is_step_complete(&self, step_id: &str) -> bool {
        self.state.completed_steps.contains(step_id)
    }

    /// Fraction of steps completed. An empty lesson counts as done.
    pub fn progress(&self) -> f64 {
        let total = self.lesson.steps.len();
        if total == 0 {
            return 1.0;
        }
        self.state.completed_steps.len() as f64 / total as f64
    }

    pub fn can_go_next(&self) -> bool {
        self.state.current_step_index + 1 < self.lesson.steps.len()
    }

    pub fn can_go_prev(&self) -> bool {
        self.state.current_step_index > 0
    }

    /// Move forward for review. Does not complete anything.
    pub fn next_step(&mut self) -> bool {
        if !self.can_go_next() {
            return false;
        }
        self.state.current_step_index += 1;
        true
    }

    pub fn prev_step(&mut self) -> bool {
        if !self.can_go_prev() {
            return false;
        }
        self.state.current_step_index -= 1;
        true
    }

    pub fn is_complete(&self) -> bool {
        self.lesson
            .steps
            .iter()
            .all(|step| self.state.completed_steps.contains(&step.id))
    }

    // ========================================================================
    // User input
    // ========================================================================

    /// Store data for an action id. Never changes the current step.
    pub fn record_action(&mut self, action_id: &str, data: serde_json::Value) {
        self.state.user_actions.insert(action_id.to_string(), data);
    }

    /// Record a chart interaction under its kind name.
    ///
    /// Candle clicks also update the candle selection used by pattern steps.
    pub fn record_interaction(&mut self, event: &InteractionEvent) {
        if let Interaction::CandleClick { index, selected, .. } = event.payload {
            if selected {
                self.state.selected_candles.insert(index);
            } else {
                self.state.selected_candles.remove(&index);
            }
        }
        let data = serde_json::to_value(event).unwrap_or_default();
        self.record_action(event.kind().name(), data);
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Run a step's validator against the current data.
    pub fn validate_step(&self, step: &LessonStep) -> ValidationResult {
        match &step.validation {
            None => ValidationResult::pass(1.0, "No validation required"),
            Some(ValidationDescriptor::Pattern { pattern_id, trend }) => {
                self.validate_pattern_step(pattern_id, *trend)
            }
            Some(ValidationDescriptor::Level { level_price }) => match level_price {
                Some(price) => self.level_validator.validate(*price, &self.candles),
                None => ValidationResult::fail(0.0, "No level price selected"),
            },
            Some(ValidationDescriptor::Signal {
                indicator,
                signal_type,
            }) => self.validate_signal_step(*indicator, *signal_type),
        }
    }

    fn validate_pattern_step(&self, pattern_id: &str, trend: Option<Trend>) -> ValidationResult {
        let Ok(kind) = pattern_id.parse::<PatternKind>() else {
            return ValidationResult::fail(0.0, format!("Pattern '{pattern_id}' not found"));
        };
        if self.candles.is_empty() {
            return ValidationResult::no_data();
        }

        // Window ends at the highest selected candle, or at the tail
        let end = self
            .state
            .selected_candles
            .last()
            .map_or(self.candles.len() - 1, |&i| i.min(self.candles.len() - 1));

        validate_pattern(kind, &self.candles[..=end], &PatternContext { trend })
    }

    fn validate_signal_step(&self, indicator: Option<IndicatorKind>, signal_type: Option<SignalType>) -> ValidationResult {
        let kinds = match indicator {
            Some(kind) => vec![kind],
            None => vec![IndicatorKind::Rsi, IndicatorKind::Macd],
        };
        let label = indicator.map_or("RSI or MACD", |k| k.label());

        let series: Vec<IndicatorSeries> = kinds
            .into_iter()
            .map(|kind| self.compute(kind))
            .filter(|s| !s.is_empty())
            .collect();
        if series.is_empty() {
            return ValidationResult::fail(0.0, format!("Not enough history to compute {label}"));
        }

        let wanted = |t: SignalType| match signal_type {
            Some(expected) => t == expected,
            None => t != SignalType::Neutral,
        };
        let best = series
            .iter()
            .flat_map(|s| s.signals.iter())
            .filter(|s| wanted(s.signal_type))
            .map(|s| s.strength)
            .fold(None, |best: Option<f64>, x| Some(best.map_or(x, |b| b.max(x))));

        let what = match signal_type {
            Some(SignalType::Buy) => "buy",
            Some(SignalType::Sell) => "sell",
            Some(SignalType::Neutral) => "neutral",
            None => "trading",
        };
        match best {
            Some(strength) => ValidationResult::pass(strength, format!("{label} {what} signal found")),
            None => ValidationResult::fail(0.0, format!("No {what} signal on {label}")),
        }
    }

    fn compute(&self, kind: IndicatorKind) -> IndicatorSeries {
        match kind {
            IndicatorKind::Rsi => Rsi::new(self.rsi.clone()).calculate(&self.candles),
            IndicatorKind::Macd => Macd::new(self.macd.clone()).calculate(&self.candles),
        }
    }

    // ========================================================================
    // Completion
    // ========================================================================

    /// Validate a step and, only if it passes, mark it complete.
    ///
    /// The current step index moves forward by one when the completed step is
    /// the active one. It never moves backward.
    pub fn complete_step(&mut self, step_id: &str) -> StepOutcome {
        let Some(position) = self.lesson.step_position(step_id) else {
            log::warn!("Lesson '{}' has no step '{}'", self.lesson.id, step_id);
            return StepOutcome::UnknownStep;
        };

        let result = self.validate_step(&self.lesson.steps[position]);
        self.state
            .validation_results
            .insert(step_id.to_string(), result.clone());

        if !result.valid {
            log::debug!("Step '{}' blocked: {}", step_id, result.message);
            return StepOutcome::Blocked(result);
        }

        self.state.completed_steps.insert(step_id.to_string());

        // Only the active step moves the lesson, and only one step forward
        let was_current = position == self.state.current_step_index;
        if was_current && position + 1 < self.lesson.steps.len() {
            self.state.current_step_index = position + 1;
        }
        let finished = self.is_complete();

        let progress = self.snapshot();
        if let Some(listener) = self.listener.as_mut() {
            listener.on_step_complete(step_id, &progress);
            if finished {
                listener.on_lesson_complete(&progress);
            }
        }

        if finished {
            log::info!("Lesson '{}' complete", self.lesson.id);
            StepOutcome::LessonComplete
        } else if was_current && self.state.current_step_index > position {
            StepOutcome::Advanced {
                next_index: self.state.current_step_index,
            }
        } else {
            StepOutcome::Completed
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn snapshot(&self) -> LessonProgress {
        LessonProgress {
            lesson_id: self.lesson.id.clone(),
            current_step_index: self.state.current_step_index,
            completed_steps: self
                .lesson
                .steps
                .iter()
                .filter(|s| self.state.completed_steps.contains(&s.id))
                .map(|s| s.id.clone())
                .collect(),
        }
    }

    /// Resume from saved progress. State is untouched on error.
    pub fn restore(&mut self, progress: &LessonProgress) -> Result<(), LessonError> {
        if progress.lesson_id != self.lesson.id {
            return Err(LessonError::LessonMismatch {
                expected: self.lesson.id.clone(),
                found: progress.lesson_id.clone(),
            });
        }

        let len = self.lesson.steps.len();
        if progress.current_step_index >= len.max(1) {
            return Err(LessonError::StepIndex {
                index: progress.current_step_index,
                len,
            });
        }
        if let Some(unknown) = progress
            .completed_steps
            .iter()
            .find(|id| self.lesson.step_position(id).is_none())
        {
            return Err(LessonError::UnknownStep(unknown.clone()));
        }

        self.state.current_step_index = progress.current_step_index;
        self.state.completed_steps = progress.completed_steps.iter().cloned().collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::lesson::progress::{MemoryStore, StoreListener};
    use crate::lesson::step::StepKind;

    fn c(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::ohlc(0, open, high, low, close)
    }

    /// Falling market with a hammer at index 2 and a plain candle at the tail.
    fn hammer_candles() -> Vec<Candle> {
        vec![
            c(12.0, 12.1, 11.4, 11.5),
            c(11.5, 11.6, 10.0, 10.2),
            c(10.0, 10.11, 7.0, 10.1),
            c(10.1, 10.6, 10.0, 10.5),
        ]
    }

    fn hammer_lesson() -> Lesson {
        Lesson::new(
            "hammer-101",
            "Hammers",
            vec![
                LessonStep::text("intro", "A hammer rejects lower prices."),
                LessonStep::validated(
                    "find-hammer",
                    "Click the hammer.",
                    ValidationDescriptor::Pattern {
                        pattern_id: "hammer".to_string(),
                        trend: Some(Trend::Down),
                    },
                ),
                LessonStep::validated(
                    "support",
                    "Its low area is support.",
                    ValidationDescriptor::Level {
                        level_price: Some(10.0),
                    },
                ),
            ],
        )
    }

    fn engine() -> LessonEngine {
        LessonEngine::new(hammer_lesson(), hammer_candles(), &Config::default())
    }

    fn click(index: usize, selected: bool) -> InteractionEvent {
        InteractionEvent {
            payload: Interaction::CandleClick {
                candle: hammer_candles()[index],
                index,
                selected,
            },
            timestamp: 0,
        }
    }

    fn falling_closes() -> Vec<Candle> {
        let mut closes: Vec<f64> = (0..20).map(|i| 100.0 + if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        closes.extend((1..=20).map(|i| 100.0 - i as f64 * 1.5));
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle::ohlc(i as i64 * 60_000, close, close + 0.5, close - 0.5, close))
            .collect()
    }

    #[derive(Default)]
    struct Recorder {
        events: Rc<RefCell<Vec<String>>>,
    }

    impl LessonListener for Recorder {
        fn on_step_complete(&mut self, step_id: &str, _progress: &LessonProgress) {
            self.events.borrow_mut().push(format!("step:{step_id}"));
        }

        fn on_lesson_complete(&mut self, progress: &LessonProgress) {
            self.events.borrow_mut().push(format!("done:{}", progress.lesson_id));
        }
    }

    #[test]
    fn test_failed_step_blocks_then_advances() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut engine = engine().with_listener(Box::new(Recorder {
            events: events.clone(),
        }));

        assert_eq!(engine.complete_step("intro"), StepOutcome::Advanced { next_index: 1 });

        // Tail candle is not a hammer
        let outcome = engine.complete_step("find-hammer");
        assert!(matches!(outcome, StepOutcome::Blocked(ref r) if !r.valid));
        assert_eq!(engine.state().current_step_index, 1);
        assert_eq!(engine.state().completed_steps.len(), 1);
        assert!(!engine.is_step_complete("find-hammer"));
        assert!(!engine.state().validation_results["find-hammer"].valid);

        engine.record_interaction(&click(2, true));
        assert_eq!(engine.complete_step("find-hammer"), StepOutcome::Advanced { next_index: 2 });
        assert_eq!(engine.state().current_step_index, 2);
        assert!(engine.state().validation_results["find-hammer"].valid);

        assert_eq!(engine.complete_step("support"), StepOutcome::LessonComplete);
        assert_eq!(engine.state().current_step_index, 2);
        assert!(engine.is_complete());
        assert_eq!(engine.progress(), 1.0);

        assert_eq!(
            *events.borrow(),
            vec!["step:intro", "step:find-hammer", "step:support", "done:hammer-101"]
        );
    }

    #[test]
    fn test_deselect_falls_back_to_tail() {
        let mut engine = engine();
        engine.record_interaction(&click(2, true));
        engine.record_interaction(&click(2, false));

        assert!(engine.state().selected_candles.is_empty());
        assert!(!engine.validate_step(&engine.lesson().steps[1]).valid);
        assert_eq!(engine.state().user_actions["candle-click"]["selected"], false);
    }

    #[test]
    fn test_wrong_trend_fails() {
        let mut engine = engine();
        engine.record_interaction(&click(2, true));
        let step = LessonStep::validated(
            "x",
            "",
            ValidationDescriptor::Pattern {
                pattern_id: "hammer".to_string(),
                trend: Some(Trend::Up),
            },
        );
        let result = engine.validate_step(&step);
        assert!(!result.valid);
        assert!(result.strength > 0.0);
    }

    #[test]
    fn test_unknown_pattern_is_not_found() {
        let step = LessonStep::validated(
            "x",
            "",
            ValidationDescriptor::Pattern {
                pattern_id: "cup-and-handle".to_string(),
                trend: None,
            },
        );
        let result = engine().validate_step(&step);
        assert!(!result.valid);
        assert!(result.message.contains("not found"));
    }

    #[test]
    fn test_level_step() {
        let engine = engine();
        let result = engine.validate_step(&engine.lesson().steps[2]);
        assert!(result.valid);
        assert_eq!(result.touches, Some(2));

        let missing = LessonStep::validated("x", "", ValidationDescriptor::Level { level_price: None });
        assert!(!engine.validate_step(&missing).valid);
    }

    #[test]
    fn test_signal_step() {
        let lesson = Lesson::new("rsi", "RSI", vec![]);
        let engine = LessonEngine::new(lesson, falling_closes(), &Config::default());
        let signal = |signal_type| {
            LessonStep::validated(
                "x",
                "",
                ValidationDescriptor::Signal {
                    indicator: Some(IndicatorKind::Rsi),
                    signal_type,
                },
            )
        };

        let buy = engine.validate_step(&signal(Some(SignalType::Buy)));
        assert!(buy.valid);
        assert!(buy.strength > 0.0);
        assert!(!engine.validate_step(&signal(Some(SignalType::Sell))).valid);
        assert!(engine.validate_step(&signal(None)).valid);
    }

    #[test]
    fn test_signal_step_needs_history() {
        let lesson = Lesson::new("rsi", "RSI", vec![]);
        let engine = LessonEngine::new(lesson, hammer_candles(), &Config::default());
        let step = LessonStep::validated(
            "x",
            "",
            ValidationDescriptor::Signal {
                indicator: None,
                signal_type: Some(SignalType::Buy),
            },
        );

        let result = engine.validate_step(&step);
        assert!(!result.valid);
        assert!(result.message.contains("Not enough history"));
    }

    #[test]
    fn test_record_action_never_transitions() {
        let mut engine = engine();
        engine.record_action("quiz-answer", serde_json::json!({ "choice": 2 }));

        assert_eq!(engine.state().current_step_index, 0);
        assert!(engine.state().completed_steps.is_empty());
        assert_eq!(engine.state().user_actions["quiz-answer"]["choice"], 2);
    }

    #[test]
    fn test_navigation_clamps() {
        let mut engine = engine();
        assert!(!engine.can_go_prev());
        assert!(!engine.prev_step());
        assert!(engine.next_step());
        assert!(engine.next_step());
        assert!(!engine.next_step());
        assert_eq!(engine.state().current_step_index, 2);
        assert_eq!(engine.current_step().map(|s| s.id.as_str()), Some("support"));
        assert!(engine.state().completed_steps.is_empty());
    }

    fn text_lesson() -> LessonEngine {
        let steps = ["a", "b", "c", "d"]
            .iter()
            .map(|id| LessonStep::text(*id, ""))
            .collect();
        LessonEngine::new(Lesson::new("text", "Text", steps), vec![], &Config::default())
    }

    #[test]
    fn test_out_of_order_completion_never_moves_index() {
        let mut engine = text_lesson();

        assert_eq!(engine.complete_step("c"), StepOutcome::Completed);
        assert_eq!(engine.state().current_step_index, 0);
        assert!(engine.is_step_complete("c"));

        assert_eq!(engine.complete_step("a"), StepOutcome::Advanced { next_index: 1 });
        assert_eq!(engine.state().current_step_index, 1);

        // Reviewing an earlier step keeps the index where it is
        assert!(engine.next_step());
        assert!(engine.next_step());
        assert_eq!(engine.complete_step("a"), StepOutcome::Completed);
        assert_eq!(engine.state().current_step_index, 3);
    }

    #[test]
    fn test_last_step_alone_does_not_finish_lesson() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut engine = text_lesson().with_listener(Box::new(Recorder {
            events: events.clone(),
        }));

        assert_eq!(engine.complete_step("d"), StepOutcome::Completed);
        assert!(!engine.is_complete());
        assert_eq!(engine.progress(), 0.25);
        assert_eq!(*events.borrow(), vec!["step:d"]);

        assert_eq!(engine.complete_step("a"), StepOutcome::Advanced { next_index: 1 });
        assert_eq!(engine.complete_step("b"), StepOutcome::Advanced { next_index: 2 });
        assert_eq!(engine.complete_step("c"), StepOutcome::LessonComplete);
        assert!(engine.is_complete());
        assert_eq!(engine.state().current_step_index, 3);
        assert_eq!(events.borrow().last().map(String::as_str), Some("done:text"));
        assert_eq!(events.borrow().iter().filter(|e| e.starts_with("done:")).count(), 1);
    }

    #[test]
    fn test_unknown_step() {
        let mut engine = engine();
        assert_eq!(engine.complete_step("missing"), StepOutcome::UnknownStep);
        assert!(engine.state().validation_results.is_empty());
    }

    #[test]
    fn test_empty_lesson() {
        let engine = LessonEngine::new(Lesson::new("empty", "Empty", vec![]), vec![], &Config::default());
        assert_eq!(engine.progress(), 1.0);
        assert!(engine.is_complete());
        assert!(engine.current_step().is_none());
        assert!(!engine.can_go_next());
    }

    #[test]
    fn test_set_candles_clears_selection() {
        let mut engine = engine();
        engine.record_interaction(&click(2, true));
        engine.set_candles(hammer_candles());
        assert!(engine.state().selected_candles.is_empty());
    }

    #[test]
    fn test_progress_persists_and_restores() {
        let store = MemoryStore::new();
        let listener = StoreListener::new(store.clone(), Some("u1"), "hammer-101");
        let mut engine = engine().with_listener(Box::new(listener));
        engine.complete_step("intro");

        let saved = StoreListener::new(store, Some("u1"), "hammer-101")
            .load()
            .unwrap()
            .unwrap();
        assert_eq!(saved.current_step_index, 1);
        assert_eq!(saved.completed_steps, vec!["intro".to_string()]);

        let mut resumed = LessonEngine::new(hammer_lesson(), hammer_candles(), &Config::default());
        resumed.restore(&saved).unwrap();
        assert_eq!(resumed.current_step().map(|s| s.kind), Some(StepKind::Validation));
        assert!(resumed.is_step_complete("intro"));
        assert_eq!(resumed.snapshot(), saved);
    }

    #[test]
    fn test_restore_rejects_foreign_progress() {
        let mut engine = engine();
        let foreign = LessonProgress {
            lesson_id: "other".to_string(),
            ..Default::default()
        };
        assert!(matches!(engine.restore(&foreign), Err(LessonError::LessonMismatch { .. })));

        let out_of_range = LessonProgress {
            lesson_id: "hammer-101".to_string(),
            current_step_index: 3,
            completed_steps: vec![],
        };
        assert!(matches!(engine.restore(&out_of_range), Err(LessonError::StepIndex { index: 3, len: 3 })));

        let unknown = LessonProgress {
            lesson_id: "hammer-101".to_string(),
            current_step_index: 0,
            completed_steps: vec!["ghost".to_string()],
        };
        assert!(matches!(engine.restore(&unknown), Err(LessonError::UnknownStep(_))));
        assert_eq!(engine.state(), &LessonState::default());
    }
}
