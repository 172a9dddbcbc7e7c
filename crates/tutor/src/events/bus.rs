//! Interaction bus for dispatching user gestures.
//!
//! The [`InteractionBus`] owns the [`InteractionState`], applies each gesture
//! to it and then notifies the listeners subscribed to that kind of event.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use tutor_core::{Candle, Signal};
use tutor_ta::{Level, LevelType};

use super::types::{HoveredElement, Interaction, InteractionEvent, InteractionKind, InteractionState};

/// Handle returned by [`InteractionBus::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Box<dyn FnMut(&InteractionEvent)>;

/// Undrained events kept by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 1024;

/// Synchronous publish/subscribe bus for chart interactions.
///
/// Every gesture mutates the state and runs the matching listeners before
/// the call returns. Emitted events are also kept in a FIFO history so a
/// caller without listeners can process them afterwards. The history holds at
/// most `history_limit` events; older ones are dropped, so callers relying on
/// it should drain it regularly. A limit of 0 keeps no history.
///
/// # Usage Pattern
///
/// ```ignore
/// let mut bus = InteractionBus::new();
///
/// let id = bus.on(InteractionKind::CandleClick, |event| {
///     log::info!("clicked at {}", event.timestamp);
/// });
///
/// bus.handle_candle_click(&candles[3], 3);
///
/// // Feed the recorded gestures to the lesson engine
/// for event in bus.drain_events() {
///     engine.record_interaction(&event);
/// }
///
/// bus.off(InteractionKind::CandleClick, id);
/// ```
pub struct InteractionBus {
    state: InteractionState,
    listeners: HashMap<InteractionKind, Vec<(ListenerId, Callback)>>,
    next_id: u64,
    /// Emitted events not yet drained, oldest first.
    history: VecDeque<InteractionEvent>,
    /// Oldest events are dropped beyond this many.
    history_limit: usize,
}

impl Default for InteractionBus {
    fn default() -> Self {
        Self {
            state: InteractionState::default(),
            listeners: HashMap::new(),
            next_id: 0,
            history: VecDeque::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl fmt::Debug for InteractionBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionBus")
            .field("state", &self.state)
            .field("listeners", &self.listeners.values().map(Vec::len).sum::<usize>())
            .field("history", &self.history.len())
            .field("history_limit", &self.history_limit)
            .finish()
    }
}

impl InteractionBus {
    /// Create a new empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bus keeping at most `limit` undrained events.
    #[must_use]
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            history_limit: limit,
            ..Self::default()
        }
    }

    /// Subscribe to one kind of event.
    pub fn on<F>(&mut self, kind: InteractionKind, callback: F) -> ListenerId
    where
        F: FnMut(&InteractionEvent) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.entry(kind).or_default().push((id, Box::new(callback)));
        id
    }

    /// Unsubscribe a listener. Returns false if it was not registered for `kind`.
    pub fn off(&mut self, kind: InteractionKind, id: ListenerId) -> bool {
        let Some(callbacks) = self.listeners.get_mut(&kind) else {
            return false;
        };
        let before = callbacks.len();
        callbacks.retain(|(listener, _)| *listener != id);
        callbacks.len() < before
    }

    fn emit(&mut self, payload: Interaction) {
        let event = InteractionEvent::now(payload);
        if let Some(callbacks) = self.listeners.get_mut(&event.kind()) {
            for (_, callback) in callbacks.iter_mut() {
                callback(&event);
            }
        }
        self.history.push_back(event);
        while self.history.len() > self.history_limit {
            self.history.pop_front();
        }
    }

    /// Toggle a candle's selection. Returns the new selection state.
    pub fn handle_candle_click(&mut self, candle: &Candle, index: usize) -> bool {
        let selected = toggle(&mut self.state.selected_candles, |i| *i == index, index);
        self.emit(Interaction::CandleClick {
            candle: *candle,
            index,
            selected,
        });
        selected
    }

    /// Toggle a level's selection, matching on price.
    pub fn handle_level_click(&mut self, level: &Level) -> bool {
        let price = level.price;
        let selected = toggle(&mut self.state.selected_levels, |l| l.price == price, level.clone());
        self.emit(Interaction::LevelClick {
            level: level.clone(),
            selected,
        });
        selected
    }

    /// Toggle a signal's selection by its index.
    pub fn handle_signal_click(&mut self, signal: &Signal, index: usize) -> bool {
        let selected = toggle(&mut self.state.selected_signals, |i| *i == index, index);
        self.emit(Interaction::SignalClick {
            signal: *signal,
            index,
            selected,
        });
        selected
    }

    /// Toggle a pattern choice.
    pub fn select_pattern(&mut self, pattern_id: &str) -> bool {
        let selected = toggle(
            &mut self.state.selected_patterns,
            |p| p == pattern_id,
            pattern_id.to_string(),
        );
        self.emit(Interaction::PatternSelect {
            pattern_id: pattern_id.to_string(),
            selected,
        });
        selected
    }

    /// Add a hand-drawn level. It is not validated here.
    pub fn draw_level(&mut self, price: f64, level_type: LevelType) -> Level {
        let level = Level::drawn(price, level_type);
        self.state.drawn_levels.push(level.clone());
        self.emit(Interaction::LevelDraw { level: level.clone() });
        level
    }

    /// Clear candle, level, signal and pattern selections. Drawn levels stay.
    pub fn clear_selection(&mut self) {
        self.state.selected_candles.clear();
        self.state.selected_levels.clear();
        self.state.selected_signals.clear();
        self.state.selected_patterns.clear();
    }

    pub fn set_hovered(&mut self, element: Option<HoveredElement>) {
        self.state.hovered = element;
    }

    #[must_use]
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Drain all recorded events in emission order.
    pub fn drain_events(&mut self) -> impl Iterator<Item = InteractionEvent> + '_ {
        self.history.drain(..)
    }

    /// Take all recorded events, leaving the history empty.
    #[must_use]
    pub fn take_events(&mut self) -> Vec<InteractionEvent> {
        std::mem::take(&mut self.history).into_iter().collect()
    }

    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.history.is_empty()
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.history.len()
    }

    /// Peek at the oldest recorded event without removing it.
    #[must_use]
    pub fn peek_event(&self) -> Option<&InteractionEvent> {
        self.history.front()
    }

    #[must_use]
    pub fn listener_count(&self, kind: InteractionKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }
}

/// Remove the first item matching `is_match`, or push `item`. Returns true when added.
fn toggle<T>(items: &mut Vec<T>, is_match: impl Fn(&T) -> bool, item: T) -> bool {
    match items.iter().position(is_match) {
        Some(pos) => {
            items.remove(pos);
            false
        }
        None => {
            items.push(item);
            true
        }
    }
}
