//! The shell: single owner of every window and of the ordering state
//!
//! Windows never hold references to each other; every operation that spans
//! more than one window (exchanges, cascades, hierarchy bookkeeping) is a method
//! on `Shell`. The shell is single-threaded and event driven: inbound requests
//! and external signals are plain method calls, and every wait is a timer in the
//! [`Scheduler`] that fires when the host advances the clock.
//!
//! The implementation is split by concern:
//! - `lifecycle`: transition application, kill and destruction
//! - `exchange`: displayed-window exchanges and inbound open/close routing
//! - `children`: launches and dependent windows
//! - `overlay`: attention windows, lockscreen, visibility, layout and orientation

mod children;
mod exchange;
mod lifecycle;
mod overlay;

#[cfg(test)]
mod tests;

use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use crate::config::ShellConfig;
use crate::display::DisplayCoordinator;
use crate::error::{ShellError, ShellResult};
use crate::layout::LayoutState;
use crate::notify::{Envelope, Notification, NotificationBus, WindowRef};
use crate::scheduler::{Scheduler, TimerKind};
use crate::stack::{StackManager, StackSnapshot};
use crate::surface::{Container, SurfaceEvent, SurfaceFactory};
use crate::telemetry::{LoadTime, LoadTimeTracker};
use crate::window::{
    KillReason, LaunchConfig, ManifestRef, Orientation, TransitionEvent, TransitionTiming, Window,
    WindowId, WindowKind,
};

pub use children::LaunchOptions;

pub struct Shell {
    config: ShellConfig,
    timing: TransitionTiming,

    /// Window tracking by ID
    windows: HashMap<WindowId, Window>,
    next_id: u64,

    scheduler: Scheduler,
    stack: StackManager,
    display: DisplayCoordinator,
    layout: LayoutState,
    orientation: Orientation,

    bus: NotificationBus,
    load_times: Rc<RefCell<LoadTimeTracker>>,
    surfaces: Box<dyn SurfaceFactory>,

    /// Fatal errors on home since its last successful load
    home_crashes: u32,
    home_unrecoverable: bool,
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("windows", &self.windows.len())
            .field("now", &self.scheduler.now())
            .field("stack", &self.stack)
            .field("display", &self.display)
            .finish()
    }
}

impl Shell {
    /// Create the shell and start showing a fresh home window
    pub fn new(config: ShellConfig, surfaces: Box<dyn SurfaceFactory>) -> ShellResult<Self> {
        let load_times = Rc::new(RefCell::new(LoadTimeTracker::new()));
        let mut bus = NotificationBus::new(config.general.notification_history);
        let tracker = Rc::clone(&load_times);
        bus.subscribe(move |envelope| tracker.borrow_mut().observe(envelope));

        let mut shell = Self {
            timing: config.transition.timing(),
            layout: LayoutState::from_config(&config.layout),
            config,
            windows: HashMap::new(),
            next_id: 1,
            scheduler: Scheduler::new(),
            stack: StackManager::new(),
            display: DisplayCoordinator::new(),
            orientation: Orientation::default(),
            bus,
            load_times,
            surfaces,
            home_crashes: 0,
            home_unrecoverable: false,
        };

        let home = shell.create_home()?;
        info!("🏠 shell started, home is {}", home);
        shell.set_displayed(home);
        Ok(shell)
    }

    // === Accessors ===

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id)
    }

    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.windows.values()
    }

    /// Window ids in creation order
    pub fn window_ids(&self) -> Vec<WindowId> {
        let mut ids: Vec<WindowId> = self.windows.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn home(&self) -> Option<WindowId> {
        self.display.home()
    }

    pub fn displayed(&self) -> Option<WindowId> {
        self.display.displayed()
    }

    pub fn is_exchanging(&self) -> bool {
        self.display.in_flight()
    }

    pub fn stack(&self) -> StackSnapshot {
        self.stack.snapshot()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn layout(&self) -> &LayoutState {
        &self.layout
    }

    pub fn load_time(&self, id: WindowId) -> Option<LoadTime> {
        self.load_times.borrow().get(id)
    }

    /// Home kept crashing and was not respawned
    pub fn is_home_unrecoverable(&self) -> bool {
        self.home_unrecoverable
    }

    /// Earliest pending timer deadline
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    // === Notifications ===

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&Envelope) + 'static,
    {
        self.bus.subscribe(listener);
    }

    pub fn history(&self) -> impl Iterator<Item = &Envelope> {
        self.bus.history()
    }

    pub fn drain_notifications(&mut self) -> Vec<Envelope> {
        self.bus.drain()
    }

    pub(crate) fn publish(&mut self, notification: Notification) {
        let now = self.scheduler.now();
        self.bus.publish(now, notification);
    }

    pub(crate) fn publish_stack(&mut self, change: Option<StackSnapshot>) {
        if let Some(stack) = change {
            self.publish(Notification::StackChanged { stack });
        }
    }

    pub(crate) fn window_ref(&self, id: WindowId) -> Option<WindowRef> {
        self.windows.get(&id).map(WindowRef::of)
    }

    // === Window table ===

    /// Resolve an id for an inbound request
    ///
    /// `Ok(false)`: the window existed but is destroyed; the request is a no-op.
    pub(crate) fn check_id(&self, id: WindowId) -> ShellResult<bool> {
        if self.windows.contains_key(&id) {
            Ok(true)
        } else if id.0 > 0 && id.0 < self.next_id {
            warn!("window {} is already destroyed, ignoring request", id);
            Ok(false)
        } else {
            Err(ShellError::UnknownWindow(id))
        }
    }

    /// Exists and was not killed
    pub(crate) fn is_alive(&self, id: WindowId) -> bool {
        self.windows.get(&id).map_or(false, |w| !w.is_killed())
    }

    pub(crate) fn create_window(
        &mut self,
        kind: WindowKind,
        config: LaunchConfig,
        container: Container,
        parent: Option<WindowId>,
    ) -> WindowId {
        let id = WindowId(self.next_id);
        self.next_id += 1;

        let mut surface = self.surfaces.create(id, &config, container);
        surface.load(&config.url);
        let window = Window::new(id, kind, config, container, surface, self.scheduler.now());
        info!("🪟 created {:?} window {} for {}", kind, id, window.config().url);

        let created = WindowRef::of(&window);
        self.windows.insert(id, window);
        self.publish(Notification::WindowCreated {
            window: created,
            parent,
        });
        id
    }

    pub(crate) fn create_home(&mut self) -> ShellResult<WindowId> {
        let mut config = LaunchConfig::new(&self.config.home.url)?;
        if let Some(manifest_url) = &self.config.home.manifest_url {
            config = config.with_manifest(ManifestRef::new(manifest_url, "Home"));
        }

        let id = self.create_window(WindowKind::Home, config, Container::TopLevel, None);
        self.display.set_home(Some(id));
        Ok(id)
    }

    // === External signals ===

    /// The visual layer finished the effect running on `id`
    pub fn transition_completed(&mut self, id: WindowId) -> ShellResult<()> {
        if !self.check_id(id)? {
            return Ok(());
        }
        self.apply_event(id, TransitionEvent::Finish, None);
        Ok(())
    }

    /// The surface of `id` painted a frame
    pub fn paint_completed(&mut self, id: WindowId) -> ShellResult<()> {
        if !self.check_id(id)? {
            return Ok(());
        }
        if let Some(window) = self.windows.get_mut(&id) {
            window.record_paint();
        }
        if self.display.awaiting_readiness_of(id) {
            debug!("window {} painted, exchange may proceed", id);
            self.exchange_ready();
        }
        Ok(())
    }

    /// Feed an event reported by the rendering surface of `id`
    pub fn surface_event(&mut self, id: WindowId, event: SurfaceEvent) -> ShellResult<()> {
        if !self.check_id(id)? {
            return Ok(());
        }

        match event {
            SurfaceEvent::LoadStart => {
                if let Some(window) = self.windows.get_mut(&id) {
                    window.set_loaded(false);
                }
            }
            SurfaceEvent::LoadEnd => self.content_loaded(id),
            SurfaceEvent::LocationChanged(url) => {
                if let Some(window) = self.windows.get_mut(&id) {
                    window.set_location(&url);
                }
            }
            SurfaceEvent::FatalError(reason) => {
                let failure = ShellError::SurfaceFatalError { id, reason };
                error!("💥 {}", failure);
                return self.kill(id, KillReason::FatalError);
            }
            SurfaceEvent::ClosedByContent => {
                debug!("window {} closed by its content", id);
                return self.kill(id, KillReason::ClosedByContent);
            }
            SurfaceEvent::VisibilityChanged(visible) => {
                debug!("surface of {} reports visible={}", id, visible);
            }
            SurfaceEvent::Resized(bounds) => {
                debug!("surface of {} reports {}x{}", id, bounds.width, bounds.height);
            }
        }
        Ok(())
    }

    fn content_loaded(&mut self, id: WindowId) {
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        window.set_loaded(true);
        let kind = window.kind();

        if kind == WindowKind::Home && self.display.home() == Some(id) {
            self.home_crashes = 0;
        }
        if let Some(loaded) = self.window_ref(id) {
            self.publish(Notification::WindowLoaded { window: loaded });
        }
        if kind == WindowKind::Attention {
            self.attention_loaded(id);
        }
    }

    // === Clock ===

    /// Advance the virtual clock, firing every timer that comes due
    pub fn advance(&mut self, delta: Duration) {
        let target = self.scheduler.now() + delta;
        self.advance_to(target);
    }

    pub fn advance_to(&mut self, target: Duration) {
        while let Some((_, kind)) = self.scheduler.pop_due(target) {
            self.fire(kind);
        }
        self.scheduler.set_now(target);
    }

    fn fire(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::TransitionFallback { window, generation } => {
                let current = self.windows.get(&window).map(|w| w.engine().generation());
                if current != Some(generation) {
                    debug!("dropping stale transition timer of {}", window);
                    return;
                }
                debug!("transition of {} timed out, settling", window);
                self.apply_event(window, TransitionEvent::Timeout, None);
            }
            TimerKind::Readiness { window } => {
                if self.display.awaiting_readiness_of(window) {
                    warn!("window {} did not paint in time, exchanging anyway", window);
                    self.exchange_ready();
                }
            }
            TimerKind::AttentionLoad { window } => {
                warn!("attention window {} did not load in time, opening anyway", window);
                self.open_attention(window);
            }
        }
    }

    // === Navigation passthroughs ===

    pub fn reload(&mut self, id: WindowId) -> ShellResult<()> {
        if self.check_id(id)? {
            if let Some(window) = self.windows.get_mut(&id) {
                window.reload();
            }
        }
        Ok(())
    }

    pub fn go_back(&mut self, id: WindowId) -> ShellResult<()> {
        if self.check_id(id)? {
            if let Some(window) = self.windows.get_mut(&id) {
                window.go_back();
            }
        }
        Ok(())
    }

    pub fn go_forward(&mut self, id: WindowId) -> ShellResult<()> {
        if self.check_id(id)? {
            if let Some(window) = self.windows.get_mut(&id) {
                window.go_forward();
            }
        }
        Ok(())
    }

    pub fn can_go_back(&self, id: WindowId) -> ShellResult<bool> {
        self.check_id(id)?;
        Ok(self.windows.get(&id).map_or(false, |w| w.can_go_back()))
    }

    pub fn can_go_forward(&self, id: WindowId) -> ShellResult<bool> {
        self.check_id(id)?;
        Ok(self.windows.get(&id).map_or(false, |w| w.can_go_forward()))
    }

    /// Fresh screenshot of a window, scaled to the configured maximum
    pub fn screenshot(&mut self, id: WindowId) -> ShellResult<Option<Vec<u8>>> {
        if !self.check_id(id)? {
            return Ok(None);
        }
        let (max_width, max_height) = self.layout.screenshot_size();
        Ok(self
            .windows
            .get_mut(&id)
            .and_then(|w| w.screenshot(max_width, max_height)))
    }
}
