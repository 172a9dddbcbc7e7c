//! User interaction events.
//!
//! This module provides:
//! - [`InteractionBus`] - Toggle-state owner and synchronous dispatcher
//! - Event and state types shared with the chart layer

pub mod bus;
pub mod types;

pub use bus::{InteractionBus, ListenerId, DEFAULT_HISTORY_LIMIT};
pub use types::{
    HoverTarget, HoveredElement, Interaction, InteractionEvent, InteractionKind, InteractionState,
};
