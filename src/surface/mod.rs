//! Rendering surface capability consumed by the core
//!
//! A surface is the embedded content renderer a window wraps. The core never
//! renders anything itself; it only drives surfaces through this trait and reacts
//! to the events they report. Each window owns exactly one surface for its whole
//! life and drops it on destruction.

pub mod headless;

use serde::{Deserialize, Serialize};

use crate::window::{LaunchConfig, WindowId};

pub use headless::{HeadlessSurface, HeadlessSurfaceFactory, SurfaceProbe};

/// Pixel bounds of a surface inside its container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Where a surface is attached in the host view tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Container {
    /// The shared top-level windows container
    TopLevel,
    /// Inside the surface container of another window
    Inline { parent: WindowId },
}

/// Events reported by a rendering surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    LoadStart,
    LoadEnd,
    LocationChanged(String),
    /// The renderer crashed or cannot continue
    FatalError(String),
    /// Content asked to close its own window (`window.close()`)
    ClosedByContent,
    VisibilityChanged(bool),
    Resized(Bounds),
}

/// Operations the core performs on a rendering surface
#[cfg_attr(test, mockall::automock)]
pub trait RenderingSurface {
    /// Navigate to `url`; the shell loads the launch url right after creation
    fn load(&mut self, url: &str);
    fn reload(&mut self);
    fn navigate_back(&mut self);
    fn navigate_forward(&mut self);
    fn can_navigate_back(&self) -> bool;
    fn can_navigate_forward(&self) -> bool;

    /// Capture the current content, scaled to fit the given size
    fn request_screenshot(&mut self, max_width: u32, max_height: u32) -> Option<Vec<u8>>;

    fn set_visible(&mut self, visible: bool);
    fn focus(&mut self);
    fn blur(&mut self);

    /// Apply new bounds computed from the host layout
    fn set_bounds(&mut self, bounds: Bounds);
}

/// Creates the surface for a newly constructed window
///
/// Surfaces start out blank; the shell loads the launch url into them.
pub trait SurfaceFactory {
    fn create(
        &mut self,
        id: WindowId,
        config: &LaunchConfig,
        container: Container,
    ) -> Box<dyn RenderingSurface>;
}
