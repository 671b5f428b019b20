//! Error taxonomy for the window lifecycle core
//!
//! Domain failures are typed so callers can react to them (a rejected child spawn
//! is not the same thing as a dead home surface). The binary and configuration
//! loading keep using `anyhow` at the edges.

use thiserror::Error;

use crate::window::transition::{TransitionEvent, TransitionState};
use crate::window::WindowId;

/// Which parent/child relationship a hierarchy error concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// previous/next: same-origin child app windows
    Chain,
    /// rear/front: popup windows
    Popup,
    /// caller/callee: activity windows
    Activity,
    /// owner/attention: attention overlays
    Attention,
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Relation::Chain => "next",
            Relation::Popup => "front",
            Relation::Activity => "callee",
            Relation::Attention => "attention",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    /// A second child was requested while one already exists in that relationship
    #[error("window {parent} already has a {relation} window ({existing})")]
    HierarchyConflict {
        parent: WindowId,
        existing: WindowId,
        relation: Relation,
    },

    /// The event has no edge from the current state
    #[error("no {event:?} edge from {state:?}")]
    InvalidTransition {
        state: TransitionState,
        event: TransitionEvent,
    },

    /// The rendering surface of a window reported a fatal failure
    #[error("surface of window {id} failed: {reason}")]
    SurfaceFatalError { id: WindowId, reason: String },

    /// The id was never issued by this shell
    #[error("window {0} is not known")]
    UnknownWindow(WindowId),

    /// The window cannot become the displayed window (not an app or home)
    #[error("window {0} cannot be displayed")]
    NotDisplayable(WindowId),

    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Home kept crashing; the host has to take over
    #[error("home surface crashed {0} times in a row")]
    HomeUnrecoverable(u32),
}

pub type ShellResult<T> = std::result::Result<T, ShellError>;
