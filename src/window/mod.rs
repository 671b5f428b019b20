//! Window model
//!
//! A window wraps exactly one rendering surface and carries its transition engine,
//! its hierarchy links and the little bit of per-window bookkeeping the shell needs
//! (kill flag, readiness flags, placeholder screenshot). Everything that involves
//! more than one window lives on the [`Shell`](crate::shell::Shell); this module
//! only knows about itself.

pub mod hierarchy;
pub mod transition;


use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ShellResult;
use crate::surface::{Bounds, Container, RenderingSurface};

pub use hierarchy::{ChildRequest, Origin, WindowFeatures, WindowLinks};
pub use transition::{
    TransitionEffect, TransitionEngine, TransitionEvent, TransitionState, TransitionTiming,
};

/// Process-unique window identity, monotonically increasing
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Window kind classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    App,
    Home,
    Activity,
    Popup,
    Attention,
}

/// When a window counts as ready to be shown in place of another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessPolicy {
    /// One paint after becoming visible
    NextPaint,
    /// Ready as soon as asked
    Immediate,
    /// Content finished loading
    AfterLoad,
}

/// Who applies open/close requests for a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// Exchanged against the displayed window by the coordinator
    Coordinator,
    /// Transition applied on the window itself
    Direct,
}

/// Where a kind's surface is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    TopLevel,
    Inline,
}

/// Static per-kind behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindPolicy {
    pub open_effect: TransitionEffect,
    pub close_effect: TransitionEffect,
    pub readiness: ReadinessPolicy,
    pub placement: Placement,
    pub routing: Routing,
}

impl WindowKind {
    pub fn policy(self) -> KindPolicy {
        use TransitionEffect::*;

        match self {
            WindowKind::App => KindPolicy {
                open_effect: Enlarge,
                close_effect: Reduce,
                readiness: ReadinessPolicy::NextPaint,
                placement: Placement::TopLevel,
                routing: Routing::Coordinator,
            },
            WindowKind::Home => KindPolicy {
                open_effect: ZoomOut,
                close_effect: ZoomIn,
                readiness: ReadinessPolicy::NextPaint,
                placement: Placement::TopLevel,
                routing: Routing::Coordinator,
            },
            WindowKind::Activity => KindPolicy {
                open_effect: FadeIn,
                close_effect: FadeOut,
                readiness: ReadinessPolicy::Immediate,
                placement: Placement::Inline,
                routing: Routing::Direct,
            },
            WindowKind::Popup => KindPolicy {
                open_effect: SlideLeft,
                close_effect: SlideRight,
                readiness: ReadinessPolicy::Immediate,
                placement: Placement::Inline,
                routing: Routing::Direct,
            },
            WindowKind::Attention => KindPolicy {
                open_effect: SlideDown,
                close_effect: SlideUp,
                readiness: ReadinessPolicy::AfterLoad,
                placement: Placement::TopLevel,
                routing: Routing::Direct,
            },
        }
    }

    /// App or Home: the kinds that can be the displayed window
    pub fn is_displayable(self) -> bool {
        matches!(self, WindowKind::App | WindowKind::Home)
    }

    pub fn is_inline(self) -> bool {
        self.policy().placement == Placement::Inline
    }
}

/// Screen orientation, as declared by a manifest or requested by content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    Portrait,
    #[default]
    PortraitPrimary,
    PortraitSecondary,
    Landscape,
    LandscapePrimary,
    LandscapeSecondary,
}

impl std::str::FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "portrait" => Ok(Orientation::Portrait),
            "portrait-primary" => Ok(Orientation::PortraitPrimary),
            "portrait-secondary" => Ok(Orientation::PortraitSecondary),
            "landscape" => Ok(Orientation::Landscape),
            "landscape-primary" => Ok(Orientation::LandscapePrimary),
            "landscape-secondary" => Ok(Orientation::LandscapeSecondary),
            other => Err(format!("unknown orientation: {}", other)),
        }
    }
}

/// Visible state of a window's surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisibilityState {
    Foreground,
    Background,
    /// Hidden, with a screenshot of the last content shown in its place
    ScreenshotPlaceholder,
}

/// Reference to an already-parsed app manifest
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManifestRef {
    pub manifest_url: String,
    pub name: String,
    #[serde(default)]
    pub orientation: Option<Orientation>,
    #[serde(default)]
    pub fullscreen: bool,
}

impl ManifestRef {
    pub fn new(manifest_url: &str, name: &str) -> Self {
        Self {
            manifest_url: manifest_url.to_string(),
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }
}

/// Immutable launch configuration of a window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    pub url: String,
    pub origin: Origin,
    pub manifest: Option<ManifestRef>,
    pub stay_background: bool,
    pub fullscreen: bool,
}

impl LaunchConfig {
    pub fn new(url: &str) -> ShellResult<Self> {
        Ok(Self {
            url: url.to_string(),
            origin: Origin::parse(url)?,
            manifest: None,
            stay_background: false,
            fullscreen: false,
        })
    }

    pub fn with_manifest(mut self, manifest: ManifestRef) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn stay_background(mut self, stay_background: bool) -> Self {
        self.stay_background = stay_background;
        self
    }

    pub fn fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    /// Fullscreen either requested at launch or declared by the manifest
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen || self.manifest.as_ref().map_or(false, |m| m.fullscreen)
    }
}

/// Why a window is being killed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KillReason {
    Requested,
    FatalError,
    /// Content closed its own window
    ClosedByContent,
    /// Killed because the window it depends on was killed
    Cascade,
}

/// One on-screen surface and its lifecycle state
pub struct Window {
    id: WindowId,
    kind: WindowKind,
    config: LaunchConfig,
    container: Container,
    engine: TransitionEngine,
    surface: Box<dyn RenderingSurface>,
    pub(crate) links: WindowLinks,

    visibility: VisibilityState,
    bounds: Option<Bounds>,
    screenshot: Option<Vec<u8>>,
    location: String,
    requested_orientation: Option<Orientation>,

    killed: Option<KillReason>,
    loaded: bool,
    painted_since_visible: bool,
    created_at: Duration,
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("url", &self.config.url)
            .field("state", &self.engine.state())
            .field("visibility", &self.visibility)
            .field("links", &self.links)
            .field("killed", &self.killed)
            .finish()
    }
}

impl Window {
    pub fn new(
        id: WindowId,
        kind: WindowKind,
        config: LaunchConfig,
        container: Container,
        surface: Box<dyn RenderingSurface>,
        created_at: Duration,
    ) -> Self {
        let location = config.url.clone();
        Self {
            id,
            kind,
            config,
            container,
            engine: TransitionEngine::new(),
            surface,
            links: WindowLinks::default(),
            visibility: VisibilityState::Background,
            bounds: None,
            screenshot: None,
            location,
            requested_orientation: None,
            killed: None,
            loaded: false,
            painted_since_visible: false,
            created_at,
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    pub fn policy(&self) -> KindPolicy {
        self.kind.policy()
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    pub fn origin(&self) -> &Origin {
        &self.config.origin
    }

    pub fn container(&self) -> Container {
        self.container
    }

    pub fn links(&self) -> &WindowLinks {
        &self.links
    }

    pub fn state(&self) -> TransitionState {
        self.engine.state()
    }

    pub fn is_active(&self) -> bool {
        self.engine.is_active()
    }

    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    pub(crate) fn engine_mut(&mut self) -> &mut TransitionEngine {
        &mut self.engine
    }

    pub fn visibility(&self) -> VisibilityState {
        self.visibility
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Screenshot captured when the window was last hidden behind a placeholder
    pub fn placeholder(&self) -> Option<&[u8]> {
        self.screenshot.as_deref()
    }

    /// Location last reported by the surface
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn created_at(&self) -> Duration {
        self.created_at
    }

    pub fn is_killed(&self) -> bool {
        self.killed.is_some()
    }

    pub fn kill_reason(&self) -> Option<KillReason> {
        self.killed
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn has_painted(&self) -> bool {
        self.painted_since_visible
    }

    /// Orientation this window asks for by itself, without looking at its parents
    pub fn own_orientation(&self) -> Option<Orientation> {
        self.config
            .manifest
            .as_ref()
            .and_then(|m| m.orientation)
            .or(self.requested_orientation)
    }

    pub fn is_fullscreen(&self) -> bool {
        self.config.is_fullscreen()
    }

    // === Bookkeeping ===

    /// Flag the window as killed. Returns false if it already was.
    pub(crate) fn mark_killed(&mut self, reason: KillReason) -> bool {
        if self.killed.is_some() {
            return false;
        }
        self.killed = Some(reason);
        true
    }

    pub(crate) fn record_paint(&mut self) {
        self.painted_since_visible = true;
    }

    pub(crate) fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    pub(crate) fn set_location(&mut self, url: &str) {
        self.location = url.to_string();
    }

    pub(crate) fn request_orientation(&mut self, orientation: Option<Orientation>) {
        self.requested_orientation = orientation;
    }

    // === Surface passthroughs ===

    /// Apply a visibility state to the surface
    ///
    /// Returns false when the window already was in that state. Becoming visible
    /// resets the paint flag so readiness waits for a fresh frame.
    pub(crate) fn set_visibility(
        &mut self,
        visibility: VisibilityState,
        screenshot_size: (u32, u32),
    ) -> bool {
        if self.visibility == visibility {
            return false;
        }

        match visibility {
            VisibilityState::Foreground => {
                self.screenshot = None;
                self.painted_since_visible = false;
                self.surface.set_visible(true);
            }
            VisibilityState::ScreenshotPlaceholder => {
                let (max_width, max_height) = screenshot_size;
                self.screenshot = self.surface.request_screenshot(max_width, max_height);
                self.surface.set_visible(false);
            }
            VisibilityState::Background => {
                self.screenshot = None;
                self.surface.set_visible(false);
            }
        }

        debug!("window {} visibility {:?} -> {:?}", self.id, self.visibility, visibility);
        self.visibility = visibility;
        true
    }

    pub(crate) fn focus(&mut self) {
        self.surface.focus();
    }

    pub(crate) fn blur(&mut self) {
        self.surface.blur();
    }

    /// Push new bounds to the surface. Returns false if unchanged.
    pub(crate) fn apply_bounds(&mut self, bounds: Bounds) -> bool {
        if self.bounds == Some(bounds) {
            return false;
        }
        self.bounds = Some(bounds);
        self.surface.set_bounds(bounds);
        true
    }

    pub(crate) fn reload(&mut self) {
        self.loaded = false;
        self.surface.reload();
    }

    pub(crate) fn go_back(&mut self) {
        self.surface.navigate_back();
    }

    pub(crate) fn go_forward(&mut self) {
        self.surface.navigate_forward();
    }

    pub fn can_go_back(&self) -> bool {
        self.surface.can_navigate_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.surface.can_navigate_forward()
    }

    pub(crate) fn screenshot(&mut self, max_width: u32, max_height: u32) -> Option<Vec<u8>> {
        self.surface.request_screenshot(max_width, max_height)
    }
}
