//! # Strata window lifecycle library
//!
//! The window core of a mobile UI shell: every window (apps, home, activities,
//! popups, attention overlays) goes through one transition state machine, and a
//! single coordinator decides which top-level window is displayed.
//!
//! ## Architecture
//!
//! Strata is built on a modular architecture:
//! - `window`: Window model, transition engine and parent/child links
//! - `stack`: Ordered app stack with a current-position pointer
//! - `display`: Displayed-window exchanges between outgoing and incoming windows
//! - `shell`: Single owner of every window; inbound requests and external signals
//! - `scheduler`: Virtual clock and fallback timers
//! - `surface`: Rendering surface capability plus an in-memory implementation
//! - `notify`: Notification bus; `telemetry` observes it for load times
//! - `config`: Configuration parsing and management
//! - `console`: Line protocol used by the `strata` binary
//!
//! ## Usage
//!
//! ```rust,no_run
//! use strata::{LaunchOptions, Shell, ShellConfig};
//! use strata::surface::HeadlessSurfaceFactory;
//! use std::time::Duration;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut shell = Shell::new(ShellConfig::default(), Box::new(HeadlessSurfaceFactory::new()))?;
//!     shell.advance(Duration::from_secs(2));
//!
//!     let app = shell.launch("app://clock.localhost/index.html", None, LaunchOptions::default())?;
//!     shell.paint_completed(app)?;
//!     shell.advance(Duration::from_millis(500));
//!     assert_eq!(shell.displayed(), Some(app));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod console;
pub mod display;
pub mod error;
pub mod layout;
pub mod notify;
pub mod scheduler;
pub mod shell;
pub mod stack;
pub mod surface;
pub mod telemetry;
pub mod window;

// Re-export main types for easy access
pub use config::ShellConfig;
pub use error::{ShellError, ShellResult};
pub use notify::{Envelope, Notification};
pub use shell::{LaunchOptions, Shell};
pub use window::{Window, WindowId, WindowKind};

/// Version information for Strata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
