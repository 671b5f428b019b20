//! Load-time telemetry
//!
//! `LoadTimeTracker` is a plain notification observer: it watches will-open,
//! opened and loaded notifications and records how long each window took to get
//! there. It has no hooks into the lifecycle code itself.

use log::info;
use std::collections::HashMap;
use std::time::Duration;

use crate::notify::{Envelope, Notification};
use crate::window::WindowId;

/// Timings of one window, relative to its first will-open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadTime {
    pub requested_at: Duration,
    pub opened_after: Option<Duration>,
    pub loaded_after: Option<Duration>,
}

#[derive(Debug, Default)]
pub struct LoadTimeTracker {
    windows: HashMap<WindowId, LoadTime>,
}

impl LoadTimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, envelope: &Envelope) {
        match &envelope.notification {
            Notification::WindowWillOpen { window, .. } => {
                self.windows.entry(window.id).or_insert(LoadTime {
                    requested_at: envelope.at,
                    ..LoadTime::default()
                });
            }
            Notification::WindowOpened { window } => {
                if let Some(entry) = self.windows.get_mut(&window.id) {
                    if entry.opened_after.is_none() {
                        entry.opened_after = Some(envelope.at.saturating_sub(entry.requested_at));
                    }
                }
            }
            Notification::WindowLoaded { window } => {
                if let Some(entry) = self.windows.get_mut(&window.id) {
                    if entry.loaded_after.is_none() {
                        let elapsed = envelope.at.saturating_sub(entry.requested_at);
                        entry.loaded_after = Some(elapsed);
                        info!("⏱️  {:?} window {} loaded in {:?}", window.kind, window.id, elapsed);
                    }
                }
            }
            Notification::WindowTerminated { window, .. } => {
                self.windows.remove(&window.id);
            }
            _ => {}
        }
    }

    pub fn get(&self, id: WindowId) -> Option<LoadTime> {
        self.windows.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
