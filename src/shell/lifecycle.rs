//! Transition application, kill and destruction

use log::{debug, error, info, warn};

use super::Shell;
use crate::error::{ShellError, ShellResult};
use crate::notify::{Notification, WindowRef};
use crate::scheduler::TimerKind;
use crate::window::{
    KillReason, TransitionEffect, TransitionEvent, TransitionState, VisibilityState, WindowId,
    WindowKind,
};

impl Shell {
    /// Feed `event` into the engine of `id` and run the entry actions of the new
    /// state. Returns false when the event had no edge and was dropped.
    pub(crate) fn apply_event(
        &mut self,
        id: WindowId,
        event: TransitionEvent,
        hint: Option<TransitionEffect>,
    ) -> bool {
        let Some(window) = self.windows.get_mut(&id) else {
            warn!("dropping {:?} for destroyed window {}", event, id);
            return false;
        };

        let previous = match window.engine_mut().apply(event) {
            Ok(previous) => previous,
            Err(err) => {
                debug!("window {}: {}", id, err);
                return false;
            }
        };
        if let Some(timer) = window.engine_mut().take_timer() {
            self.scheduler.cancel(timer);
        }

        let state = window.state();
        debug!("window {} {:?} --{:?}--> {:?}", id, previous, event, state);

        match state {
            TransitionState::Opening => self.enter_opening(id, hint),
            TransitionState::Opened => self.enter_opened(id, previous),
            TransitionState::Closing => self.enter_closing(id, hint),
            TransitionState::Closed => self.enter_closed(id, previous),
        }
        true
    }

    fn enter_opening(&mut self, id: WindowId, hint: Option<TransitionEffect>) {
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        let kind = window.kind();
        let effect = hint.unwrap_or(window.policy().open_effect);
        window.engine_mut().set_effect(Some(effect));

        let visibility = if kind != WindowKind::Attention && self.layout.overlay_dominates() {
            VisibilityState::ScreenshotPlaceholder
        } else {
            VisibilityState::Foreground
        };
        self.set_visibility(id, visibility);
        self.refresh_bounds(id);

        match kind {
            WindowKind::App => {
                let root = self.group_root(id);
                let change = self.stack.on_opening(root);
                self.publish_stack(change);
            }
            WindowKind::Home => {
                let change = self.stack.on_home();
                self.publish_stack(change);
            }
            _ => {}
        }

        if let Some(opening) = self.window_ref(id) {
            self.publish(Notification::WindowWillOpen {
                window: opening,
                effect,
            });
        }

        if effect == TransitionEffect::Immediate {
            self.apply_event(id, TransitionEvent::Finish, None);
        } else {
            self.arm_fallback(id, self.timing.open_timeout);
        }
    }

    fn enter_opened(&mut self, id: WindowId, previous: TransitionState) {
        if let Some(window) = self.windows.get_mut(&id) {
            window.focus();
        }

        if previous == TransitionState::Opening {
            if let Some(opened) = self.window_ref(id) {
                info!("✅ window {} opened", id);
                self.publish(Notification::WindowOpened { window: opened });
            }
        }

        if self.windows.get(&id).map(|w| w.kind()) == Some(WindowKind::Attention) {
            self.attention_shown(id);
        }

        self.refresh_orientation();
        self.check_exchange();
    }

    fn enter_closing(&mut self, id: WindowId, hint: Option<TransitionEffect>) {
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        let kind = window.kind();
        let effect = hint.unwrap_or(window.policy().close_effect);
        window.engine_mut().set_effect(Some(effect));
        window.blur();

        if let Some(closing) = self.window_ref(id) {
            self.publish(Notification::WindowWillClose {
                window: closing,
                effect,
            });
        }

        if kind == WindowKind::Attention {
            self.attention_hidden(id);
        }

        if effect == TransitionEffect::Immediate {
            self.apply_event(id, TransitionEvent::Finish, None);
        } else {
            self.arm_fallback(id, self.timing.close_timeout);
        }
    }

    fn enter_closed(&mut self, id: WindowId, previous: TransitionState) {
        self.set_visibility(id, VisibilityState::Background);

        if previous == TransitionState::Closing {
            if let Some(closed) = self.window_ref(id) {
                self.publish(Notification::WindowClosed { window: closed });
            }
        }
        if previous == TransitionState::Opening
            && self.windows.get(&id).map(|w| w.kind()) == Some(WindowKind::Attention)
        {
            self.attention_hidden(id);
        }

        self.refresh_orientation();
        if self.windows.get(&id).map_or(false, |w| w.is_killed()) {
            self.try_destroy(id);
        }
        self.check_exchange();
    }

    fn arm_fallback(&mut self, id: WindowId, delay: std::time::Duration) {
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        // A nested event may already have moved the window on
        if !window.state().is_transitioning() {
            return;
        }

        let generation = window.engine().generation();
        let timer = self.scheduler.schedule(
            delay,
            TimerKind::TransitionFallback {
                window: id,
                generation,
            },
        );
        window.engine_mut().arm(timer);
    }

    // === Kill ===

    /// Kill a window and everything depending on it
    pub fn request_kill(&mut self, id: WindowId) -> ShellResult<()> {
        if !self.check_id(id)? {
            return Ok(());
        }
        self.kill(id, KillReason::Requested)
    }

    pub(crate) fn kill(&mut self, id: WindowId, reason: KillReason) -> ShellResult<()> {
        if self.display.home() == Some(id) {
            return self.respawn_home(id, reason);
        }
        self.kill_window(id, reason);
        Ok(())
    }

    /// Idempotent: a window is only ever killed once
    pub(crate) fn kill_window(&mut self, id: WindowId, reason: KillReason) {
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        if !window.mark_killed(reason) {
            debug!("window {} already killed", id);
            return;
        }
        info!("🗑️  killing {:?} window {} ({:?})", window.kind(), id, reason);
        let dependents = window.links().dependents();

        for dependent in dependents {
            self.kill_window(dependent, KillReason::Cascade);
        }

        let Some(window) = self.windows.get(&id) else {
            return;
        };
        match window.state() {
            TransitionState::Opening => {
                self.apply_event(id, TransitionEvent::Cancel, None);
            }
            TransitionState::Closing => {
                self.apply_event(id, TransitionEvent::Finish, None);
            }
            TransitionState::Opened => {
                if self.display.is_outgoing(id) {
                    // closes as part of the exchange
                } else if self.display.awaiting_readiness_of(id) {
                    self.abort_exchange();
                    self.apply_event(id, TransitionEvent::Close, None);
                } else if self.display.displayed() == Some(id) || self.display.incoming() == Some(id)
                {
                    let fallback = self.fallback_for(id, reason);
                    match fallback {
                        Some(fallback) => self.set_displayed(fallback),
                        None => {
                            self.apply_event(id, TransitionEvent::Close, None);
                        }
                    }
                } else {
                    self.apply_event(id, TransitionEvent::Close, None);
                }
            }
            TransitionState::Closed => {}
        }

        self.try_destroy(id);
    }

    /// Window to display instead of `id` when it goes away
    pub(crate) fn fallback_for(&self, id: WindowId, reason: KillReason) -> Option<WindowId> {
        let previous = self.windows.get(&id).and_then(|w| w.links().previous);
        let home = self.display.home().filter(|&home| home != id && self.is_alive(home));

        match (reason, previous) {
            (KillReason::FatalError, _) => home,
            (_, Some(previous)) if self.is_alive(previous) => Some(previous),
            _ => home,
        }
    }

    /// Destroy `id` if it is killed, closed and has no live dependents
    pub(crate) fn try_destroy(&mut self, id: WindowId) {
        let Some(window) = self.windows.get(&id) else {
            return;
        };
        if !window.is_killed() || window.state() != TransitionState::Closed {
            return;
        }
        if window
            .links()
            .dependents()
            .iter()
            .any(|dependent| self.windows.contains_key(dependent))
        {
            debug!("window {} waits for its dependents", id);
            return;
        }

        let Some(window) = self.windows.remove(&id) else {
            return;
        };
        self.scheduler.cancel_window(id);

        let links = *window.links();
        let reason = window.kill_reason().unwrap_or(KillReason::Requested);
        let kind = window.kind();
        let terminated = WindowRef::of(&window);
        // Releases the surface
        drop(window);

        let mut parents = Vec::new();
        if let Some((_, parent)) = links.opener() {
            parents.push(parent);
        }
        for other in links.dependents().into_iter().chain(parents.iter().copied()) {
            if let Some(other) = self.windows.get_mut(&other) {
                other.links.unlink(id);
            }
        }

        let change = self.stack.remove(id);
        self.publish_stack(change);
        self.display.forget(id);

        info!("☠️  window {} terminated", id);
        self.publish(Notification::WindowTerminated {
            window: terminated,
            reason,
        });

        if kind == WindowKind::Activity && reason == KillReason::ClosedByContent {
            if let Some(caller) = links.caller {
                self.reclaim_focus(caller, id);
            }
        }

        for parent in parents {
            self.try_destroy(parent);
        }

        self.refresh_orientation();
        self.check_exchange();
        self.ensure_displayed_alive();
    }

    // === Home ===

    /// Replace the home window: the new one exists before the old one goes
    fn respawn_home(&mut self, old: WindowId, reason: KillReason) -> ShellResult<()> {
        if self.home_unrecoverable {
            return Err(ShellError::HomeUnrecoverable(self.home_crashes));
        }

        if reason == KillReason::FatalError {
            self.home_crashes += 1;
            if self.home_crashes > self.config.home.max_consecutive_crashes {
                error!("🚨 home crashed {} times in a row, giving up", self.home_crashes);
                self.home_unrecoverable = true;
                self.display.set_home(None);
                self.kill_window(old, reason);
                self.publish(Notification::HomeUnrecoverable {
                    crashes: self.home_crashes,
                });
                return Err(ShellError::HomeUnrecoverable(self.home_crashes));
            }
        }

        let displayed =
            self.display.displayed() == Some(old) || self.display.incoming() == Some(old);
        let home = self.create_home()?;
        info!("🏠 respawning home: {} replaces {}", home, old);

        self.kill_window(old, reason);
        if displayed {
            self.set_displayed(home);
        }
        Ok(())
    }
}
