//! Displayed-window coordinator
//!
//! Owns the answer to "which top-level window is authoritative right now" and
//! serializes exchanges between the outgoing and incoming window. The coordinator
//! only keeps state and takes decisions; the shell applies the transitions it
//! asks for. At most one exchange is in flight; later requests wait in a queue.
//!
//! An exchange goes through two phases:
//!
//! 1. `AwaitingReadiness`: the incoming window is opening and the coordinator
//!    waits for it to paint (or for the readiness timeout).
//! 2. `Transitioning`: the outgoing window was asked to close; the exchange
//!    settles once neither side is opening or closing anymore.

use log::debug;
use std::collections::VecDeque;
use std::time::Duration;

use crate::scheduler::TimerId;
use crate::window::WindowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangePhase {
    AwaitingReadiness,
    Transitioning,
}

/// One in-flight switch of the displayed window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exchange {
    pub incoming: WindowId,
    pub outgoing: Option<WindowId>,
    pub phase: ExchangePhase,
    pub readiness_timer: Option<TimerId>,
    pub started_at: Duration,
}

/// What to do with a display request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Start an exchange right away
    Start,
    /// An exchange is in flight; the target waits in the queue
    Queued,
    /// Already displayed, in flight with nothing queued, or queued last
    Ignore,
}

#[derive(Debug, Default)]
pub struct DisplayCoordinator {
    home: Option<WindowId>,
    displayed: Option<WindowId>,
    /// Last displayed window announced to observers
    announced: Option<WindowId>,
    exchange: Option<Exchange>,
    queue: VecDeque<WindowId>,
}

impl DisplayCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn home(&self) -> Option<WindowId> {
        self.home
    }

    pub fn set_home(&mut self, home: Option<WindowId>) {
        self.home = home;
    }

    /// The authoritative top-level window
    pub fn displayed(&self) -> Option<WindowId> {
        self.displayed
    }

    pub fn exchange(&self) -> Option<&Exchange> {
        self.exchange.as_ref()
    }

    pub fn in_flight(&self) -> bool {
        self.exchange.is_some()
    }

    /// Incoming window of the in-flight exchange
    pub fn incoming(&self) -> Option<WindowId> {
        self.exchange.map(|e| e.incoming)
    }

    pub fn is_outgoing(&self, id: WindowId) -> bool {
        self.exchange.map_or(false, |e| e.outgoing == Some(id))
    }

    pub fn awaiting_readiness_of(&self, id: WindowId) -> bool {
        self.exchange.map_or(false, |e| {
            e.incoming == id && e.phase == ExchangePhase::AwaitingReadiness
        })
    }

    pub fn queued(&self) -> impl Iterator<Item = &WindowId> {
        self.queue.iter()
    }

    /// Decide what to do with a request to display `target`
    pub fn request(&mut self, target: WindowId) -> Decision {
        if let Some(exchange) = self.exchange {
            // The newest request wins, so the in-flight target only counts as
            // a duplicate while nothing is waiting behind it
            let duplicate = match self.queue.back() {
                Some(&last) => last == target,
                None => exchange.incoming == target,
            };
            if duplicate {
                return Decision::Ignore;
            }
            debug!("display: queueing {} behind {}", target, exchange.incoming);
            self.queue.push_back(target);
            return Decision::Queued;
        }

        if self.displayed == Some(target) {
            return Decision::Ignore;
        }
        Decision::Start
    }

    pub fn begin(&mut self, incoming: WindowId, outgoing: Option<WindowId>, now: Duration) {
        debug!("display: exchange {:?} -> {} started", outgoing, incoming);
        self.exchange = Some(Exchange {
            incoming,
            outgoing,
            phase: ExchangePhase::AwaitingReadiness,
            readiness_timer: None,
            started_at: now,
        });
    }

    pub fn set_readiness_timer(&mut self, timer: TimerId) {
        if let Some(exchange) = self.exchange.as_mut() {
            exchange.readiness_timer = Some(timer);
        }
    }

    /// The incoming window is ready: it becomes the displayed window and the
    /// outgoing side may start closing
    ///
    /// Returns the exchange as it was when readiness was reached, with its timer
    /// handed back to the caller for cancellation.
    pub fn mark_ready(&mut self) -> Option<Exchange> {
        let exchange = self.exchange.as_mut()?;
        if exchange.phase != ExchangePhase::AwaitingReadiness {
            return None;
        }

        let snapshot = *exchange;
        exchange.phase = ExchangePhase::Transitioning;
        exchange.readiness_timer = None;
        self.displayed = Some(exchange.incoming);
        Some(snapshot)
    }

    /// Both sides finished. Returns `(displayed, previously announced)` when the
    /// displayed window changed since the last announcement and `announce` is set.
    ///
    /// A window that will not stay displayed (killed mid-exchange) is settled
    /// with `announce == false` and never becomes the announced window.
    pub fn settle(&mut self, announce: bool) -> Option<(WindowId, Option<WindowId>)> {
        let exchange = self.exchange.take()?;
        debug!("display: exchange to {} settled", exchange.incoming);

        let displayed = self.displayed?;
        if !announce || self.announced == Some(displayed) {
            return None;
        }
        let previous = self.announced.replace(displayed);
        Some((displayed, previous))
    }

    /// Forget a displayed window that is no longer active
    pub fn clear_displayed(&mut self) {
        self.displayed = None;
    }

    /// Drop the in-flight exchange without changing the displayed window
    pub fn abort(&mut self) -> Option<Exchange> {
        let exchange = self.exchange.take()?;
        debug!("display: exchange to {} aborted", exchange.incoming);
        Some(exchange)
    }

    pub fn pop_queued(&mut self) -> Option<WindowId> {
        self.queue.pop_front()
    }

    /// Withdraw every queued request for `id`; returns whether any was queued
    pub fn dequeue(&mut self, id: WindowId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|&queued| queued != id);
        before != self.queue.len()
    }

    /// A window is gone: it can no longer be queued or displayed
    pub fn forget(&mut self, id: WindowId) {
        self.dequeue(id);
        if self.home == Some(id) {
            self.home = None;
        }
    }
}
