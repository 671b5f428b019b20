//! Transition state machine shared by every window kind
//!
//! The table is the single source of truth for which events are legal in which
//! state. Events without an edge are dropped by the caller, never queued.
//!
//! ```text
//!            Open                 Close
//!   Closed ─────────► Opening    Opened ─────────► Closing
//!                     │  │  ▲                      │  │
//!       Finish/Timeout│  │  └──────── Cancel ──────┘  │Finish/Timeout
//!                     ▼  └──► Closed (Cancel)         ▼
//!                   Opened                          Closed
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ShellError;
use crate::scheduler::TimerId;

/// Transition state of a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionState {
    #[default]
    Closed,
    Opening,
    Opened,
    Closing,
}

/// Events fed into the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionEvent {
    Open,
    Close,
    /// The visual layer reported the effect as completed
    Finish,
    /// The fallback timer fired before Finish arrived
    Timeout,
    /// Reverse an in-flight transition
    Cancel,
}

impl TransitionState {
    /// Destination for `event`, or `None` when the table has no edge
    pub fn next(self, event: TransitionEvent) -> Option<TransitionState> {
        use TransitionEvent::*;
        use TransitionState::*;

        match (self, event) {
            (Closed, Open) => Some(Opening),
            (Opened, Close) => Some(Closing),
            (Opening, Finish) | (Opening, Timeout) => Some(Opened),
            (Opening, Cancel) => Some(Closed),
            (Closing, Finish) | (Closing, Timeout) => Some(Closed),
            (Closing, Cancel) => Some(Opened),
            _ => None,
        }
    }

    /// Opening or Closing
    pub fn is_transitioning(self) -> bool {
        matches!(self, TransitionState::Opening | TransitionState::Closing)
    }

    /// Opened or Opening
    pub fn is_active(self) -> bool {
        matches!(self, TransitionState::Opened | TransitionState::Opening)
    }
}

/// Visual effect hint attached to a transition
///
/// The engine never inspects the effect; it is handed to the visual layer and
/// exposed for observers. `Invoked`/`Invoking` mark a card exchange between two
/// top-level windows instead of independent enlarge/reduce effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionEffect {
    Enlarge,
    Reduce,
    ZoomIn,
    ZoomOut,
    SlideLeft,
    SlideRight,
    SlideUp,
    SlideDown,
    FadeIn,
    FadeOut,
    Invoked,
    Invoking,
    Immediate,
}

/// Fallback timing derived from observed effect durations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionTiming {
    pub open_timeout: Duration,
    pub close_timeout: Duration,
}

impl Default for TransitionTiming {
    fn default() -> Self {
        Self {
            open_timeout: Duration::from_millis(390),
            close_timeout: Duration::from_millis(300),
        }
    }
}

/// Per-window engine state
///
/// `generation` is bumped on every state change so a fallback timer armed for an
/// earlier transition can be recognised as stale when it fires.
#[derive(Debug, Default)]
pub struct TransitionEngine {
    state: TransitionState,
    generation: u64,
    timer: Option<TimerId>,
    effect: Option<TransitionEffect>,
}

impl TransitionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Effect of the transition currently in flight (or last requested)
    pub fn effect(&self) -> Option<TransitionEffect> {
        self.effect
    }

    pub fn set_effect(&mut self, effect: Option<TransitionEffect>) {
        self.effect = effect;
    }

    /// Apply `event`, returning the previous state on success
    ///
    /// The armed fallback timer (if any) is handed back through `take_timer`; the
    /// caller owns the scheduler and cancels it.
    pub fn apply(&mut self, event: TransitionEvent) -> Result<TransitionState, ShellError> {
        let previous = self.state;
        let next = previous.next(event).ok_or(ShellError::InvalidTransition {
            state: previous,
            event,
        })?;
        self.state = next;
        self.generation += 1;
        Ok(previous)
    }

    /// Remember the fallback timer armed for the current transitional state
    pub fn arm(&mut self, timer: TimerId) {
        self.timer = Some(timer);
    }

    pub fn take_timer(&mut self) -> Option<TimerId> {
        self.timer.take()
    }
}
