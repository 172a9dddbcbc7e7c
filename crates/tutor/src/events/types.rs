//! Interaction event and state definitions.
//!
//! This module defines the read models shared with the chart layer:
//! - [`InteractionKind`] - Event kinds listeners subscribe to
//! - [`Interaction`] - Kind-specific event payloads
//! - [`InteractionEvent`] - A timestamped interaction
//! - [`InteractionState`] - Current selection, drawn levels and hover

use serde::{Deserialize, Serialize};
use tutor_core::{Candle, Signal};
use tutor_ta::Level;

/// Kinds of user gesture the bus dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionKind {
    CandleClick,
    LevelClick,
    SignalClick,
    PatternSelect,
    LevelDraw,
}

impl InteractionKind {
    /// Stable name, also used as the lesson action id for the gesture.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            InteractionKind::CandleClick => "candle-click",
            InteractionKind::LevelClick => "level-click",
            InteractionKind::SignalClick => "signal-click",
            InteractionKind::PatternSelect => "pattern-select",
            InteractionKind::LevelDraw => "level-draw",
        }
    }
}

/// Payload of an interaction.
///
/// `selected` reports the selection state after the toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Interaction {
    CandleClick {
        candle: Candle,
        index: usize,
        selected: bool,
    },
    LevelClick {
        level: Level,
        selected: bool,
    },
    SignalClick {
        signal: Signal,
        index: usize,
        selected: bool,
    },
    PatternSelect {
        pattern_id: String,
        selected: bool,
    },
    LevelDraw {
        level: Level,
    },
}

impl Interaction {
    #[must_use]
    pub fn kind(&self) -> InteractionKind {
        match self {
            Interaction::CandleClick { .. } => InteractionKind::CandleClick,
            Interaction::LevelClick { .. } => InteractionKind::LevelClick,
            Interaction::SignalClick { .. } => InteractionKind::SignalClick,
            Interaction::PatternSelect { .. } => InteractionKind::PatternSelect,
            Interaction::LevelDraw { .. } => InteractionKind::LevelDraw,
        }
    }
}

/// A timestamped interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    #[serde(flatten)]
    pub payload: Interaction,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl InteractionEvent {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn now(payload: Interaction) -> Self {
        Self {
            payload,
            timestamp: now_ms(),
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> InteractionKind {
        self.payload.kind()
    }
}

/// Chart element under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoverTarget {
    Candle,
    Level,
    Signal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoveredElement {
    pub target: HoverTarget,
    pub index: usize,
}

/// Selection state maintained by the bus.
///
/// Selections keep click order. Levels are identified by price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionState {
    pub selected_candles: Vec<usize>,
    pub selected_levels: Vec<Level>,
    pub selected_signals: Vec<usize>,
    pub selected_patterns: Vec<String>,
    pub drawn_levels: Vec<Level>,
    pub hovered: Option<HoveredElement>,
}

impl InteractionState {
    #[must_use]
    pub fn is_candle_selected(&self, index: usize) -> bool {
        self.selected_candles.contains(&index)
    }

    #[must_use]
    pub fn is_level_selected(&self, price: f64) -> bool {
        self.selected_levels.iter().any(|l| l.price == price)
    }
}

pub(crate) fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
