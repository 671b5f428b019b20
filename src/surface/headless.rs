//! In-memory rendering surface
//!
//! Records every call instead of rendering. The factory keeps a probe per created
//! surface so the host (or a test) can look at what the core did to it after the
//! surface itself has been handed to its window.

use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{Bounds, Container, RenderingSurface, SurfaceFactory};
use crate::window::{LaunchConfig, WindowId};

#[derive(Debug, Default)]
struct HeadlessState {
    history: Vec<String>,
    position: usize,
    visible: bool,
    focused: bool,
    bounds: Option<Bounds>,
    container: Option<Container>,
    reloads: u32,
    screenshots: u32,
    released: bool,
}

/// Surface that only remembers what was asked of it
#[derive(Debug)]
pub struct HeadlessSurface {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessSurface {
    pub fn new(container: Container) -> (Self, SurfaceProbe) {
        let state = Rc::new(RefCell::new(HeadlessState {
            container: Some(container),
            ..HeadlessState::default()
        }));
        let probe = SurfaceProbe {
            state: Rc::clone(&state),
        };
        (Self { state }, probe)
    }
}

impl RenderingSurface for HeadlessSurface {
    fn load(&mut self, url: &str) {
        let mut state = self.state.borrow_mut();
        let keep = state.position + 1;
        state.history.truncate(keep);
        state.history.push(url.to_string());
        state.position = state.history.len() - 1;
    }

    fn reload(&mut self) {
        self.state.borrow_mut().reloads += 1;
    }

    fn navigate_back(&mut self) {
        let mut state = self.state.borrow_mut();
        state.position = state.position.saturating_sub(1);
    }

    fn navigate_forward(&mut self) {
        let mut state = self.state.borrow_mut();
        if state.position + 1 < state.history.len() {
            state.position += 1;
        }
    }

    fn can_navigate_back(&self) -> bool {
        self.state.borrow().position > 0
    }

    fn can_navigate_forward(&self) -> bool {
        let state = self.state.borrow();
        state.position + 1 < state.history.len()
    }

    fn request_screenshot(&mut self, max_width: u32, max_height: u32) -> Option<Vec<u8>> {
        let mut state = self.state.borrow_mut();
        state.screenshots += 1;
        let bounds = state.bounds.unwrap_or(Bounds::new(max_width, max_height));
        let width = bounds.width.min(max_width);
        let height = bounds.height.min(max_height);
        Some(format!("screenshot:{}x{}", width, height).into_bytes())
    }

    fn set_visible(&mut self, visible: bool) {
        trace!("headless surface visible={}", visible);
        self.state.borrow_mut().visible = visible;
    }

    fn focus(&mut self) {
        self.state.borrow_mut().focused = true;
    }

    fn blur(&mut self) {
        self.state.borrow_mut().focused = false;
    }

    fn set_bounds(&mut self, bounds: Bounds) {
        self.state.borrow_mut().bounds = Some(bounds);
    }
}

impl Drop for HeadlessSurface {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.released = true;
        state.visible = false;
        state.focused = false;
    }
}

/// Read-only view on a headless surface
#[derive(Debug, Clone)]
pub struct SurfaceProbe {
    state: Rc<RefCell<HeadlessState>>,
}

impl SurfaceProbe {
    pub fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    pub fn is_focused(&self) -> bool {
        self.state.borrow().focused
    }

    /// True once the owning window dropped the surface
    pub fn is_released(&self) -> bool {
        self.state.borrow().released
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.state.borrow().bounds
    }

    pub fn container(&self) -> Option<Container> {
        self.state.borrow().container
    }

    pub fn current_url(&self) -> Option<String> {
        let state = self.state.borrow();
        state.history.get(state.position).cloned()
    }

    pub fn reloads(&self) -> u32 {
        self.state.borrow().reloads
    }

    pub fn screenshots(&self) -> u32 {
        self.state.borrow().screenshots
    }
}

/// Factory producing headless surfaces and keeping a probe for each
#[derive(Debug, Default, Clone)]
pub struct HeadlessSurfaceFactory {
    probes: Rc<RefCell<HashMap<WindowId, SurfaceProbe>>>,
}

impl HeadlessSurfaceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe of the surface created for `id`
    pub fn probe(&self, id: WindowId) -> Option<SurfaceProbe> {
        self.probes.borrow().get(&id).cloned()
    }

    pub fn created(&self) -> usize {
        self.probes.borrow().len()
    }
}

impl SurfaceFactory for HeadlessSurfaceFactory {
    fn create(
        &mut self,
        id: WindowId,
        _config: &LaunchConfig,
        container: Container,
    ) -> Box<dyn RenderingSurface> {
        let (surface, probe) = HeadlessSurface::new(container);
        self.probes.borrow_mut().insert(id, probe);
        Box::new(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_navigation() {
        let (mut surface, probe) = HeadlessSurface::new(Container::TopLevel);
        assert_eq!(probe.current_url(), None);
        surface.load("app://a/index.html");
        assert!(!surface.can_navigate_back());

        surface.load("app://a/second.html");
        surface.load("app://a/third.html");
        assert!(surface.can_navigate_back());
        assert!(!surface.can_navigate_forward());

        surface.navigate_back();
        assert_eq!(probe.current_url().as_deref(), Some("app://a/second.html"));
        assert!(surface.can_navigate_forward());

        // Loading from the middle drops the forward history
        surface.load("app://a/other.html");
        assert!(!surface.can_navigate_forward());
        assert_eq!(probe.current_url().as_deref(), Some("app://a/other.html"));
    }

    #[test]
    fn test_drop_marks_released() {
        let (surface, probe) = HeadlessSurface::new(Container::TopLevel);
        assert!(!probe.is_released());
        drop(surface);
        assert!(probe.is_released());
    }

    #[test]
    fn test_screenshot_fits_bounds() {
        let (mut surface, probe) = HeadlessSurface::new(Container::TopLevel);
        surface.set_bounds(Bounds::new(320, 460));
        let shot = surface.request_screenshot(160, 240).unwrap();
        assert_eq!(shot, b"screenshot:160x240".to_vec());
        assert_eq!(probe.screenshots(), 1);
    }
}
