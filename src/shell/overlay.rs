//! Attention windows, lockscreen, visibility, layout and orientation

use log::{debug, info};

use super::Shell;
use crate::error::ShellResult;
use crate::notify::Notification;
use crate::scheduler::TimerKind;
use crate::surface::Bounds;
use crate::window::{
    Orientation, TransitionEvent, TransitionState, VisibilityState, WindowId, WindowKind,
};

impl Shell {
    // === Visibility ===

    /// Apply `visibility` to `id` and to its active inline dependents
    pub(crate) fn set_visibility(&mut self, id: WindowId, visibility: VisibilityState) {
        let screenshot_size = self.layout.screenshot_size();
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        let changed = window.set_visibility(visibility, screenshot_size);
        let inline = [window.links().callee, window.links().front];

        if changed {
            if let Some(window) = self.window_ref(id) {
                self.publish(Notification::VisibilityChanged { window, visibility });
            }
        }

        for child in inline.into_iter().flatten() {
            let active = self
                .windows
                .get(&child)
                .map_or(false, |w| w.kind().is_inline() && w.is_active());
            if active {
                self.set_visibility(child, visibility);
            }
        }
    }

    /// Force the visibility of a window from the host (e.g. the task switcher)
    pub fn set_visible(
        &mut self,
        id: WindowId,
        foreground: bool,
        placeholder_if_hidden: bool,
    ) -> ShellResult<()> {
        if !self.check_id(id)? {
            return Ok(());
        }
        let visibility = match (foreground, placeholder_if_hidden) {
            (true, _) => VisibilityState::Foreground,
            (false, true) => VisibilityState::ScreenshotPlaceholder,
            (false, false) => VisibilityState::Background,
        };
        self.set_visibility(id, visibility);
        Ok(())
    }

    /// Windows the user is looking at when nothing covers them
    fn covered_windows(&self) -> Vec<WindowId> {
        let mut covered: Vec<WindowId> = self
            .windows
            .values()
            .filter(|w| w.kind().is_displayable() && w.is_active())
            .map(|w| w.id())
            .collect();
        covered.sort();
        covered
    }

    fn restore_covered(&mut self) {
        let visibility = if self.layout.overlay_dominates() {
            VisibilityState::ScreenshotPlaceholder
        } else {
            VisibilityState::Foreground
        };
        for id in self.covered_windows() {
            self.set_visibility(id, visibility);
        }
    }

    // === Overlays ===

    pub(crate) fn attention_shown(&mut self, id: WindowId) {
        if !self.layout.attention_visible {
            info!("🔔 attention window {} covers the screen", id);
            self.layout.attention_visible = true;
        }
        self.restore_covered();
        self.resize_active();
    }

    pub(crate) fn attention_hidden(&mut self, id: WindowId) {
        let others = self
            .windows
            .values()
            .any(|w| w.id() != id && w.kind() == WindowKind::Attention && w.is_active());
        if others || !self.layout.attention_visible {
            return;
        }

        debug!("last attention window {} is going away", id);
        self.layout.attention_visible = false;
        self.restore_covered();
        self.resize_active();
    }

    /// Content of an attention window finished loading before its deadline
    pub(crate) fn attention_loaded(&mut self, id: WindowId) {
        let pending = self.scheduler.cancel_where(|kind| {
            matches!(kind, TimerKind::AttentionLoad { window } if *window == id)
        });
        if pending > 0 {
            self.open_attention(id);
        }
    }

    pub(crate) fn open_attention(&mut self, id: WindowId) {
        let waiting = self
            .windows
            .get(&id)
            .map_or(false, |w| !w.is_killed() && w.state() == TransitionState::Closed);
        if waiting {
            self.apply_event(id, TransitionEvent::Open, None);
        }
    }

    /// Show or hide the lockscreen
    pub fn set_locked(&mut self, locked: bool) {
        if self.layout.locked == locked {
            return;
        }
        info!("🔒 lockscreen {}", if locked { "on" } else { "off" });
        self.layout.locked = locked;
        self.restore_covered();
    }

    /// An activity closed itself: hand focus back to its caller
    pub(crate) fn reclaim_focus(&mut self, caller: WindowId, from: WindowId) {
        let Some(window) = self.windows.get_mut(&caller) else {
            return;
        };
        if window.is_killed() {
            return;
        }
        window.focus();
        let active = window.is_active();
        if active && !self.layout.overlay_dominates() {
            self.set_visibility(caller, VisibilityState::Foreground);
        }

        if let Some(window) = self.window_ref(caller) {
            debug!("window {} reclaims focus from {}", caller, from);
            self.publish(Notification::WindowFocusReclaimed { window, from });
        }
        self.refresh_orientation();
    }

    // === Layout ===

    /// Recompute the bounds of `id` from the current layout
    pub(crate) fn refresh_bounds(&mut self, id: WindowId) {
        let Some(window) = self.windows.get(&id) else {
            return;
        };
        let bounds = self.layout.bounds_for(window.is_fullscreen());
        self.apply_window_bounds(id, bounds);
    }

    fn apply_window_bounds(&mut self, id: WindowId, bounds: Bounds) {
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        if window.apply_bounds(bounds) {
            if let Some(window) = self.window_ref(id) {
                self.publish(Notification::WindowResized { window, bounds });
            }
        }
    }

    fn resize_active(&mut self) {
        let mut active: Vec<WindowId> = self
            .windows
            .values()
            .filter(|w| w.is_active())
            .map(|w| w.id())
            .collect();
        active.sort();
        for id in active {
            self.refresh_bounds(id);
        }
    }

    /// Resize an active window, optionally overriding the layout-derived size
    pub fn resize(
        &mut self,
        id: WindowId,
        width: Option<u32>,
        height: Option<u32>,
    ) -> ShellResult<()> {
        if !self.check_id(id)? {
            return Ok(());
        }
        let Some(window) = self.windows.get(&id) else {
            return Ok(());
        };
        if !window.is_active() {
            debug!("not resizing inactive window {}", id);
            return Ok(());
        }

        let computed = self.layout.bounds_for(window.is_fullscreen());
        let bounds = Bounds::new(
            width.unwrap_or(computed.width),
            height.unwrap_or(computed.height),
        );
        self.apply_window_bounds(id, bounds);
        Ok(())
    }

    pub fn set_keyboard_height(&mut self, height: u32) {
        if self.layout.keyboard_height == height {
            return;
        }
        debug!("keyboard height {} -> {}", self.layout.keyboard_height, height);
        self.layout.keyboard_height = height;
        self.resize_active();
    }

    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        if (self.layout.screen_width, self.layout.screen_height) == (width, height) {
            return;
        }
        info!("📐 screen is now {}x{}", width, height);
        self.layout.screen_width = width;
        self.layout.screen_height = height;
        self.resize_active();
    }

    // === Orientation ===

    /// Ask for an orientation on behalf of `id` (`None` releases the request)
    pub fn request_orientation(
        &mut self,
        id: WindowId,
        orientation: Option<Orientation>,
    ) -> ShellResult<()> {
        if !self.check_id(id)? {
            return Ok(());
        }
        if let Some(window) = self.windows.get_mut(&id) {
            window.request_orientation(orientation);
        }
        self.refresh_orientation();
        Ok(())
    }

    /// Orientation of `id`: its own, else the nearest opener's, else the default
    pub fn effective_orientation(&self, id: WindowId) -> Orientation {
        let mut current = Some(id);
        for _ in 0..=self.windows.len() {
            let Some(window) = current.and_then(|id| self.windows.get(&id)) else {
                break;
            };
            if let Some(orientation) = window.own_orientation() {
                return orientation;
            }
            current = window.links().opener().map(|(_, parent)| parent);
        }
        Orientation::default()
    }

    /// Follow the deepest active inline dependent of the displayed window
    pub(crate) fn refresh_orientation(&mut self) {
        let Some(mut target) = self.display.incoming().or(self.display.displayed()) else {
            return;
        };
        for _ in 0..self.windows.len() {
            let deeper = self.windows.get(&target).and_then(|w| {
                [w.links().callee, w.links().front]
                    .into_iter()
                    .flatten()
                    .find(|child| self.windows.get(child).map_or(false, |c| c.is_active()))
            });
            match deeper {
                Some(child) => target = child,
                None => break,
            }
        }

        let orientation = self.effective_orientation(target);
        if orientation != self.orientation {
            info!("🔄 orientation {:?} -> {:?} for {}", self.orientation, orientation, target);
            self.orientation = orientation;
            self.publish(Notification::OrientationChanged { orientation });
        }
    }
}
