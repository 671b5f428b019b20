//! Lifecycle notifications and the bus delivering them
//!
//! Every notification is wrapped in an [`Envelope`] stamped with the scheduler
//! time. Subscribers are called synchronously, in subscription order, and the bus
//! keeps a bounded history for hosts that poll instead of subscribing.

use log::trace;
use serde::{Serialize, Serializer};
use std::collections::VecDeque;
use std::time::Duration;

use crate::stack::StackSnapshot;
use crate::surface::Bounds;
use crate::window::{
    KillReason, Orientation, TransitionEffect, VisibilityState, Window, WindowId, WindowKind,
};

/// Identity payload shared by every per-window notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowRef {
    pub id: WindowId,
    pub kind: WindowKind,
    pub origin: String,
}

impl WindowRef {
    pub fn of(window: &Window) -> Self {
        Self {
            id: window.id(),
            kind: window.kind(),
            origin: window.origin().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Notification {
    WindowCreated {
        window: WindowRef,
        parent: Option<WindowId>,
    },
    WindowWillOpen {
        window: WindowRef,
        effect: TransitionEffect,
    },
    WindowOpened {
        window: WindowRef,
    },
    WindowWillClose {
        window: WindowRef,
        effect: TransitionEffect,
    },
    WindowClosed {
        window: WindowRef,
    },
    WindowTerminated {
        window: WindowRef,
        reason: KillReason,
    },
    WindowResized {
        window: WindowRef,
        bounds: Bounds,
    },
    WindowLoaded {
        window: WindowRef,
    },
    VisibilityChanged {
        window: WindowRef,
        visibility: VisibilityState,
    },
    WindowFocusReclaimed {
        window: WindowRef,
        from: WindowId,
    },
    StackChanged {
        stack: StackSnapshot,
    },
    DisplayedChanged {
        displayed: WindowId,
        previous: Option<WindowId>,
    },
    OrientationChanged {
        orientation: Orientation,
    },
    HomeUnrecoverable {
        crashes: u32,
    },
}

impl Notification {
    /// Window the notification is about, if any
    pub fn window_id(&self) -> Option<WindowId> {
        match self {
            Notification::WindowCreated { window, .. }
            | Notification::WindowWillOpen { window, .. }
            | Notification::WindowOpened { window }
            | Notification::WindowWillClose { window, .. }
            | Notification::WindowClosed { window }
            | Notification::WindowTerminated { window, .. }
            | Notification::WindowResized { window, .. }
            | Notification::WindowLoaded { window }
            | Notification::VisibilityChanged { window, .. }
            | Notification::WindowFocusReclaimed { window, .. } => Some(window.id),
            Notification::DisplayedChanged { displayed, .. } => Some(*displayed),
            Notification::StackChanged { .. }
            | Notification::OrientationChanged { .. }
            | Notification::HomeUnrecoverable { .. } => None,
        }
    }

    /// Kebab-case event name
    pub fn name(&self) -> &'static str {
        match self {
            Notification::WindowCreated { .. } => "window-created",
            Notification::WindowWillOpen { .. } => "window-will-open",
            Notification::WindowOpened { .. } => "window-opened",
            Notification::WindowWillClose { .. } => "window-will-close",
            Notification::WindowClosed { .. } => "window-closed",
            Notification::WindowTerminated { .. } => "window-terminated",
            Notification::WindowResized { .. } => "window-resized",
            Notification::WindowLoaded { .. } => "window-loaded",
            Notification::VisibilityChanged { .. } => "visibility-changed",
            Notification::WindowFocusReclaimed { .. } => "window-focus-reclaimed",
            Notification::StackChanged { .. } => "stack-changed",
            Notification::DisplayedChanged { .. } => "displayed-changed",
            Notification::OrientationChanged { .. } => "orientation-changed",
            Notification::HomeUnrecoverable { .. } => "home-unrecoverable",
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.window_id() {
            Some(id) => write!(f, "{} {}", self.name(), id),
            None => f.write_str(self.name()),
        }
    }
}

fn serialize_millis<S: Serializer>(at: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(at.as_millis() as u64)
}

/// A notification stamped with the scheduler time it was published at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    #[serde(rename = "at_ms", serialize_with = "serialize_millis")]
    pub at: Duration,
    #[serde(flatten)]
    pub notification: Notification,
}

type Listener = Box<dyn FnMut(&Envelope)>;

/// Synchronous fan-out of notifications
pub struct NotificationBus {
    listeners: Vec<Listener>,
    history: VecDeque<Envelope>,
    capacity: usize,
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("listeners", &self.listeners.len())
            .field("history", &self.history.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            listeners: Vec::new(),
            history: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    /// Add a listener called for every published notification
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&Envelope) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn publish(&mut self, at: Duration, notification: Notification) {
        trace!("notify {}", notification);
        let envelope = Envelope { at, notification };

        for listener in &mut self.listeners {
            listener(&envelope);
        }

        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(envelope);
    }

    /// Most recent notifications, oldest first
    pub fn history(&self) -> impl Iterator<Item = &Envelope> {
        self.history.iter()
    }

    /// Take the history, leaving it empty
    pub fn drain(&mut self) -> Vec<Envelope> {
        self.history.drain(..).collect()
    }
}
