//! Uniform result shape shared by every validator.

use serde::{Deserialize, Serialize};

/// Outcome of a pattern or level validation.
///
/// A failed validation is a normal result, never an error: `valid` is false
/// and `message` explains why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Confidence in `[0, 1]`.
    pub strength: f64,
    /// Number of level touches, for level validations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub touches: Option<usize>,
    pub message: String,
}

impl ValidationResult {
    pub fn pass(strength: f64, message: impl Into<String>) -> Self {
        Self {
            valid: true,
            strength,
            touches: None,
            message: message.into(),
        }
    }

    pub fn fail(strength: f64, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            strength,
            touches: None,
            message: message.into(),
        }
    }

    /// Failed validation because there was nothing to look at.
    pub fn no_data() -> Self {
        Self::fail(0.0, "No data to validate")
    }

    pub fn with_touches(mut self, touches: usize) -> Self {
        self.touches = Some(touches);
        self
    }
}
