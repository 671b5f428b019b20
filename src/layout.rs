//! Host layout metrics and overlay state
//!
//! Window bounds are derived from the screen size minus the chrome that is
//! currently on screen (status bar, software home button, keyboard).

use crate::config::LayoutConfig;
use crate::surface::Bounds;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutState {
    pub screen_width: u32,
    pub screen_height: u32,
    pub status_bar_height: u32,
    pub software_buttons_height: u32,
    pub keyboard_height: u32,

    /// An attention window covers the displayed window
    pub attention_visible: bool,
    /// The lockscreen covers everything
    pub locked: bool,

    pub screenshot_max_width: u32,
    pub screenshot_max_height: u32,
}

impl LayoutState {
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            screen_width: config.screen_width,
            screen_height: config.screen_height,
            status_bar_height: config.status_bar_height,
            software_buttons_height: config.software_buttons_height,
            keyboard_height: 0,
            attention_visible: false,
            locked: false,
            screenshot_max_width: config.screenshot_max_width,
            screenshot_max_height: config.screenshot_max_height,
        }
    }

    /// Bounds available to a window
    ///
    /// Fullscreen windows also cover the status bar, unless an attention window
    /// is showing (its status bar must stay visible).
    pub fn bounds_for(&self, fullscreen: bool) -> Bounds {
        let mut chrome = self.software_buttons_height.saturating_add(self.keyboard_height);
        if !fullscreen || self.attention_visible {
            chrome = chrome.saturating_add(self.status_bar_height);
        }
        Bounds::new(self.screen_width, self.screen_height.saturating_sub(chrome))
    }

    /// Something covers the displayed window
    pub fn overlay_dominates(&self) -> bool {
        self.attention_visible || self.locked
    }

    pub fn screenshot_size(&self) -> (u32, u32) {
        (self.screenshot_max_width, self.screenshot_max_height)
    }
}

impl Default for LayoutState {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}
