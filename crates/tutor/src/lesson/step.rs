//! Lesson definitions as supplied by the content source.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tutor_core::{Candle, IndicatorKind, SignalType};
use tutor_ta::Trend;

use super::LessonError;

/// Presentation kind of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    #[default]
    Text,
    Interactive,
    Validation,
    Quiz,
}

/// What a step checks before the lesson may advance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ValidationDescriptor {
    /// A candlestick pattern must be present at the selected candle.
    Pattern {
        #[serde(rename = "patternId")]
        pattern_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trend: Option<Trend>,
    },
    /// A level must be touched often enough.
    Level {
        #[serde(rename = "levelPrice", default, skip_serializing_if = "Option::is_none")]
        level_price: Option<f64>,
    },
    /// An indicator must raise a signal. Either indicator counts when unset.
    Signal {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        indicator: Option<IndicatorKind>,
        #[serde(rename = "signalType", default, skip_serializing_if = "Option::is_none")]
        signal_type: Option<SignalType>,
    },
}

/// One step of a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonStep {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: StepKind,
    #[serde(default)]
    pub content: String,
    /// Action id the chart layer should ask for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_action: Option<String>,
    /// Chart element to highlight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationDescriptor>,
}

impl LessonStep {
    /// A text step without validation.
    pub fn text(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: StepKind::Text,
            content: content.into(),
            require_action: None,
            highlight: None,
            validation: None,
        }
    }

    /// A validation step.
    pub fn validated(id: impl Into<String>, content: impl Into<String>, validation: ValidationDescriptor) -> Self {
        Self {
            kind: StepKind::Validation,
            validation: Some(validation),
            ..Self::text(id, content)
        }
    }
}

/// An ordered list of steps, optionally with its own candles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<LessonStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candles: Option<Vec<Candle>>,
}

impl Lesson {
    pub fn new(id: impl Into<String>, title: impl Into<String>, steps: Vec<LessonStep>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            steps,
            candles: None,
        }
    }

    /// Parse and check a lesson definition.
    pub fn from_json(json: &str) -> Result<Self, LessonError> {
        let lesson: Lesson = serde_json::from_str(json)?;
        lesson.check()?;
        Ok(lesson)
    }

    /// Load a lesson definition from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LessonError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Step ids must be unique since completion is tracked by id.
    pub fn check(&self) -> Result<(), LessonError> {
        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.id.as_str()) {
                return Err(LessonError::DuplicateStep(step.id.clone()));
            }
        }
        Ok(())
    }

    pub fn step_position(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }

    pub fn step(&self, step_id: &str) -> Option<&LessonStep> {
        self.steps.iter().find(|s| s.id == step_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LESSON: &str = r#"{
        "id": "reversals-1",
        "title": "Reversal candles",
        "steps": [
            { "id": "intro", "type": "text", "content": "Candles tell a story." },
            {
                "id": "find-hammer",
                "type": "interactive",
                "content": "Click the hammer.",
                "requireAction": "candle-click",
                "validation": { "type": "pattern", "patternId": "hammer", "trend": "down" }
            },
            {
                "id": "level",
                "type": "validation",
                "content": "Mark support.",
                "validation": { "type": "level", "levelPrice": 1.085 }
            },
            {
                "id": "rsi",
                "type": "quiz",
                "content": "Spot the RSI buy.",
                "validation": { "type": "signal", "indicator": "rsi", "signalType": "buy" }
            }
        ]
    }"#;

    #[test]
    fn test_parse_lesson() {
        let lesson = Lesson::from_json(LESSON).unwrap();

        assert_eq!(lesson.steps.len(), 4);
        assert_eq!(lesson.description, "");
        assert!(lesson.candles.is_none());
        assert_eq!(lesson.steps[1].require_action.as_deref(), Some("candle-click"));
        assert_eq!(
            lesson.steps[1].validation,
            Some(ValidationDescriptor::Pattern {
                pattern_id: "hammer".to_string(),
                trend: Some(Trend::Down),
            })
        );
        assert_eq!(
            lesson.steps[2].validation,
            Some(ValidationDescriptor::Level {
                level_price: Some(1.085)
            })
        );
        assert_eq!(
            lesson.steps[3].validation,
            Some(ValidationDescriptor::Signal {
                indicator: Some(IndicatorKind::Rsi),
                signal_type: Some(SignalType::Buy),
            })
        );
        assert_eq!(lesson.step_position("level"), Some(2));
    }

    #[test]
    fn test_level_without_price_parses() {
        let step: LessonStep = serde_json::from_str(
            r#"{ "id": "x", "type": "validation", "validation": { "type": "level" } }"#,
        )
        .unwrap();
        assert_eq!(step.validation, Some(ValidationDescriptor::Level { level_price: None }));
    }

    #[test]
    fn test_duplicate_step_ids_rejected() {
        let json = r#"{ "id": "l", "title": "t", "steps": [ { "id": "a" }, { "id": "a" } ] }"#;
        assert!(matches!(Lesson::from_json(json), Err(LessonError::DuplicateStep(id)) if id == "a"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(Lesson::from_json("{"), Err(LessonError::Parse(_))));
    }
}
