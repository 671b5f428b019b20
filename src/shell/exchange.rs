//! Displayed-window exchanges and inbound open/close routing

use log::{debug, info, warn};

use super::Shell;
use crate::display::{Decision, ExchangePhase};
use crate::error::{ShellError, ShellResult};
use crate::notify::Notification;
use crate::scheduler::TimerKind;
use crate::window::{
    KillReason, ReadinessPolicy, Routing, TransitionEffect, TransitionEvent, TransitionState,
    WindowId, WindowKind,
};

impl Shell {
    // === Inbound requests ===

    /// Open a window with `hint` (or its default effect)
    ///
    /// Apps and home are exchanged against the displayed window. Their hint is
    /// used when the exchange starts right away; a request queued behind an
    /// exchange in flight opens with the default exchange effect.
    pub fn request_open(
        &mut self,
        id: WindowId,
        hint: Option<TransitionEffect>,
    ) -> ShellResult<()> {
        if !self.check_id(id)? {
            return Ok(());
        }
        let Some(window) = self.windows.get(&id) else {
            return Ok(());
        };
        if window.is_killed() {
            warn!("window {} is being killed, not opening it", id);
            return Ok(());
        }

        match window.policy().routing {
            Routing::Coordinator => self.set_displayed_with(id, hint),
            Routing::Direct => match window.state() {
                TransitionState::Closed => {
                    self.apply_event(id, TransitionEvent::Open, hint);
                }
                TransitionState::Closing => {
                    self.apply_event(id, TransitionEvent::Cancel, None);
                }
                state => debug!("window {} already {:?}", id, state),
            },
        }
        Ok(())
    }

    /// Close a window. A displayed app hands over to its fallback; home is
    /// never closed by request.
    pub fn request_close(
        &mut self,
        id: WindowId,
        hint: Option<TransitionEffect>,
    ) -> ShellResult<()> {
        if !self.check_id(id)? {
            return Ok(());
        }
        let Some(window) = self.windows.get(&id) else {
            return Ok(());
        };
        let kind = window.kind();
        let state = window.state();

        match window.policy().routing {
            Routing::Coordinator if kind == WindowKind::Home => {
                debug!("ignoring close request for home {}", id);
            }
            Routing::Coordinator => {
                if self.display.dequeue(id) {
                    debug!("withdrew queued display of {}", id);
                }
                let shown =
                    self.display.displayed() == Some(id) || self.display.incoming() == Some(id);
                if shown {
                    match self.fallback_for(id, KillReason::Requested) {
                        Some(fallback) => self.set_displayed(fallback),
                        None => warn!("nothing to show instead of {}, keeping it", id),
                    }
                } else if state == TransitionState::Opened {
                    self.apply_event(id, TransitionEvent::Close, hint);
                }
            }
            Routing::Direct => {
                self.apply_event(id, TransitionEvent::Close, hint);
            }
        }
        Ok(())
    }

    /// Reverse the transition in flight on an inline window
    pub fn request_cancel(&mut self, id: WindowId) -> ShellResult<()> {
        if !self.check_id(id)? {
            return Ok(());
        }
        let inline = self.windows.get(&id).map_or(false, |w| w.kind().is_inline());
        if !inline {
            warn!("cancel is only available for activities and popups, not {}", id);
            return Ok(());
        }
        self.apply_event(id, TransitionEvent::Cancel, None);
        Ok(())
    }

    /// Dismiss attention windows and show home
    pub fn request_home(&mut self) {
        let mut attention: Vec<WindowId> = self
            .windows
            .values()
            .filter(|w| w.kind() == WindowKind::Attention && w.is_active())
            .map(|w| w.id())
            .collect();
        attention.sort();

        for id in attention {
            let event = match self.windows.get(&id).map(|w| w.state()) {
                Some(TransitionState::Opening) => TransitionEvent::Cancel,
                _ => TransitionEvent::Close,
            };
            self.apply_event(id, event, None);
        }

        if let Some(home) = self.display.home() {
            info!("🏠 going home");
            self.set_displayed(home);
        }
    }

    /// Exchange the displayed window for `id`, an app or home
    pub fn display(&mut self, id: WindowId) -> ShellResult<()> {
        if !self.check_id(id)? {
            return Ok(());
        }
        if !self.windows.get(&id).map_or(false, |w| w.kind().is_displayable()) {
            return Err(ShellError::NotDisplayable(id));
        }
        self.set_displayed(id);
        Ok(())
    }

    /// Edge swipe back: the previous window of the same group, else the newest
    /// window of the group below
    pub fn go_previous(&mut self) -> Option<WindowId> {
        let current = self.display.incoming().or(self.display.displayed())?;
        if Some(current) == self.display.home() {
            return None;
        }

        let target = self
            .windows
            .get(&current)
            .and_then(|w| w.links().previous)
            .filter(|&previous| self.is_alive(previous))
            .or_else(|| {
                self.stack
                    .below(self.group_root(current))
                    .map(|below| self.group_leaf(below))
            })?;

        self.set_displayed(target);
        Some(target)
    }

    /// Edge swipe forward: the next window of the same group, else the root of
    /// the group above
    pub fn go_next(&mut self) -> Option<WindowId> {
        let current = self.display.incoming().or(self.display.displayed())?;
        if Some(current) == self.display.home() {
            return None;
        }

        let target = self
            .windows
            .get(&current)
            .and_then(|w| w.links().next)
            .filter(|&next| self.is_alive(next))
            .or_else(|| self.stack.above(self.group_root(current)))?;

        self.set_displayed(target);
        Some(target)
    }

    // === Groups ===

    /// First window of the same-origin chain `id` belongs to
    pub(crate) fn group_root(&self, id: WindowId) -> WindowId {
        let mut root = id;
        for _ in 0..self.windows.len() {
            match self.windows.get(&root).and_then(|w| w.links().previous) {
                Some(previous) => root = previous,
                None => break,
            }
        }
        root
    }

    /// Last window of the same-origin chain starting at `id`
    pub(crate) fn group_leaf(&self, id: WindowId) -> WindowId {
        let mut leaf = id;
        for _ in 0..self.windows.len() {
            match self
                .windows
                .get(&leaf)
                .and_then(|w| w.links().next)
                .filter(|&next| self.is_alive(next))
            {
                Some(next) => leaf = next,
                None => break,
            }
        }
        leaf
    }

    // === Exchange ===

    /// Make `target` the displayed window
    pub(crate) fn set_displayed(&mut self, target: WindowId) {
        self.set_displayed_with(target, None);
    }

    fn set_displayed_with(&mut self, target: WindowId, hint: Option<TransitionEffect>) {
        if !self.windows.get(&target).map_or(false, |w| w.kind().is_displayable()) {
            warn!("window {} cannot be displayed", target);
            return;
        }

        match self.display.request(target) {
            Decision::Start => self.start_exchange(target, hint),
            Decision::Queued => debug!("display of {} queued", target),
            Decision::Ignore => debug!("display of {} already requested", target),
        }
    }

    fn start_exchange(&mut self, target: WindowId, hint: Option<TransitionEffect>) {
        let Some(window) = self.windows.get(&target) else {
            return;
        };
        if window.is_killed() {
            debug!("not displaying killed window {}", target);
            return;
        }
        let kind = window.kind();
        let state = window.state();

        let outgoing = self
            .display
            .displayed()
            .filter(|&displayed| displayed != target && self.windows.contains_key(&displayed));
        let now = self.scheduler.now();
        self.display.begin(target, outgoing, now);
        info!("🔀 exchanging {:?} -> {}", outgoing, target);

        match state {
            TransitionState::Closed => {
                let hint =
                    hint.or_else(|| (kind == WindowKind::App).then_some(TransitionEffect::Invoked));
                self.apply_event(target, TransitionEvent::Open, hint);
            }
            TransitionState::Closing => {
                self.apply_event(target, TransitionEvent::Cancel, None);
            }
            TransitionState::Opening | TransitionState::Opened => {}
        }

        // Opening may have killed or already readied the target
        if !self.display.awaiting_readiness_of(target) {
            return;
        }
        if self.is_ready(target) {
            self.exchange_ready();
        } else {
            let timer = self.scheduler.schedule(
                self.config.readiness.next_paint_timeout(),
                TimerKind::Readiness { window: target },
            );
            self.display.set_readiness_timer(timer);
        }
    }

    fn is_ready(&self, id: WindowId) -> bool {
        let Some(window) = self.windows.get(&id) else {
            return false;
        };
        match window.policy().readiness {
            ReadinessPolicy::NextPaint => window.has_painted(),
            ReadinessPolicy::Immediate => true,
            ReadinessPolicy::AfterLoad => window.is_loaded(),
        }
    }

    /// The incoming window is ready: start closing the outgoing one
    pub(crate) fn exchange_ready(&mut self) {
        let Some(exchange) = self.display.mark_ready() else {
            return;
        };
        if let Some(timer) = exchange.readiness_timer {
            self.scheduler.cancel(timer);
        }

        let incoming_kind = self.windows.get(&exchange.incoming).map(|w| w.kind());
        if let Some(outgoing) = exchange.outgoing {
            match self.windows.get(&outgoing).map(|w| w.state()) {
                Some(TransitionState::Opened) => {
                    let hint = (incoming_kind == Some(WindowKind::App))
                        .then_some(TransitionEffect::Invoking);
                    self.apply_event(outgoing, TransitionEvent::Close, hint);
                }
                Some(TransitionState::Opening) => {
                    self.apply_event(outgoing, TransitionEvent::Cancel, None);
                }
                _ => {}
            }
        }

        self.check_exchange();
    }

    pub(crate) fn abort_exchange(&mut self) {
        if let Some(exchange) = self.display.abort() {
            if let Some(timer) = exchange.readiness_timer {
                self.scheduler.cancel(timer);
            }
        }
    }

    /// Settle, abort or fall back depending on where both sides are
    pub(crate) fn check_exchange(&mut self) {
        let Some(exchange) = self.display.exchange().copied() else {
            return;
        };

        let incoming_state = self.windows.get(&exchange.incoming).map(|w| w.state());
        if matches!(incoming_state, None | Some(TransitionState::Closed)) {
            match exchange.phase {
                ExchangePhase::AwaitingReadiness => {
                    warn!(
                        "{} went away before it was ready, keeping {:?}",
                        exchange.incoming, exchange.outgoing
                    );
                    self.abort_exchange();
                    self.drain_display_queue();
                }
                ExchangePhase::Transitioning => {
                    warn!("{} went away mid-exchange, falling back to home", exchange.incoming);
                    self.abort_exchange();
                    match self.display.home().filter(|&home| self.is_alive(home)) {
                        Some(home) => self.set_displayed(home),
                        None => self.drain_display_queue(),
                    }
                }
            }
            self.ensure_displayed_alive();
            return;
        }

        if exchange.phase != ExchangePhase::Transitioning {
            return;
        }
        let incoming_busy = incoming_state.map_or(false, |s| s.is_transitioning());
        let outgoing_busy = exchange
            .outgoing
            .and_then(|id| self.windows.get(&id))
            .map_or(false, |w| w.state().is_transitioning());
        if incoming_busy || outgoing_busy {
            return;
        }

        let announce = self.is_alive(exchange.incoming);
        if let Some((displayed, previous)) = self.display.settle(announce) {
            info!("🖥️  displayed window is now {}", displayed);
            self.publish(Notification::DisplayedChanged {
                displayed,
                previous,
            });
        }
        self.refresh_orientation();
        self.drain_display_queue();
        self.ensure_displayed_alive();
    }

    fn drain_display_queue(&mut self) {
        while !self.display.in_flight() {
            let Some(next) = self.display.pop_queued() else {
                break;
            };
            if self.is_alive(next) {
                self.set_displayed(next);
            }
        }
    }

    /// Show home when the displayed window died outside of any exchange
    pub(crate) fn ensure_displayed_alive(&mut self) {
        if self.display.in_flight() {
            return;
        }
        let healthy = self
            .display
            .displayed()
            .and_then(|id| self.windows.get(&id))
            .map_or(false, |w| !w.is_killed() && w.is_active());
        if healthy {
            return;
        }

        if let Some(home) = self.display.home().filter(|&home| self.is_alive(home)) {
            debug!("displayed window is gone, showing home");
            if self.display.displayed() == Some(home) {
                self.display.clear_displayed();
            }
            self.set_displayed(home);
        }
    }
}
