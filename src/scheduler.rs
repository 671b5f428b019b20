//! Deadline scheduler driving every fallback timer
//!
//! All waits in the core (transition fallbacks, readiness probes) are scheduled
//! continuations keyed by window id. The clock is virtual: the host advances it,
//! either from a real clock (the binary maps it to `tokio::time`) or step by step
//! in tests. Nothing here ever blocks.

use log::trace;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::window::WindowId;

/// Handle of a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Fallback for a missing transition-completed signal
    TransitionFallback { window: WindowId, generation: u64 },
    /// Fallback for a missing paint-completed signal
    Readiness { window: WindowId },
    /// Attention overlays open once their content loaded; this forces it
    AttentionLoad { window: WindowId },
}

impl TimerKind {
    pub fn window(&self) -> WindowId {
        match *self {
            TimerKind::TransitionFallback { window, .. }
            | TimerKind::Readiness { window }
            | TimerKind::AttentionLoad { window } => window,
        }
    }
}

/// Ordered queue of pending timers plus the virtual clock
#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_seq: u64,
    queue: BTreeMap<(Duration, u64), (TimerId, TimerKind)>,
    index: HashMap<TimerId, (Duration, u64)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Arm a timer firing `delay` from now
    pub fn schedule(&mut self, delay: Duration, kind: TimerKind) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = TimerId(seq);
        let deadline = self.now + delay;

        self.queue.insert((deadline, seq), (id, kind));
        self.index.insert(id, (deadline, seq));
        trace!("armed timer {:?} ({:?}) for {:?}", id, kind, deadline);
        id
    }

    /// Cancel one timer. Returns false if it already fired or never existed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.index.remove(&id) {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    /// Cancel every timer belonging to `window`
    pub fn cancel_window(&mut self, window: WindowId) -> usize {
        self.cancel_where(|kind| kind.window() == window)
    }

    /// Cancel every timer whose kind matches `predicate`
    pub fn cancel_where<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&TimerKind) -> bool,
    {
        let doomed: Vec<TimerId> = self
            .queue
            .values()
            .filter(|(_, kind)| predicate(kind))
            .map(|(id, _)| *id)
            .collect();

        for id in &doomed {
            self.cancel(*id);
        }
        doomed.len()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to it
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerId, TimerKind)> {
        let key = *self.queue.keys().next()?;
        if key.0 > until {
            return None;
        }

        let (id, kind) = self.queue.remove(&key)?;
        self.index.remove(&id);
        if key.0 > self.now {
            self.now = key.0;
        }
        Some((id, kind))
    }

    /// Move the clock forward without firing anything (never backwards)
    pub fn set_now(&mut self, now: Duration) {
        if now > self.now {
            self.now = now;
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.index.contains_key(&id)
    }
}
