//! Configuration management for Strata
//!
//! This module handles loading, parsing, and validating configuration
//! from TOML files: transition timing, readiness fallbacks, host layout
//! metrics and the home surface.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::window::TransitionTiming;

/// Main configuration struct containing all shell settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ShellConfig {
    /// Transition effect timing
    #[serde(default)]
    pub transition: TransitionConfig,

    /// Readiness probe fallbacks
    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Host layout metrics
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Home surface
    #[serde(default)]
    pub home: HomeConfig,

    /// General shell settings
    #[serde(default)]
    pub general: GeneralConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransitionConfig {
    /// Duration of the visual open/close effects (milliseconds)
    pub effect_duration_ms: u64,

    /// Open fallback = effect duration × this factor
    pub open_timeout_factor: f64,

    /// Close fallback = effect duration × this factor
    pub close_timeout_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReadinessConfig {
    /// How long an exchange waits for the incoming window to paint (milliseconds)
    pub next_paint_timeout_ms: u64,

    /// How long an attention window waits for its content before opening anyway
    pub attention_load_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    pub status_bar_height: u32,
    pub software_buttons_height: u32,

    /// Upper bound of placeholder screenshots
    pub screenshot_max_width: u32,
    pub screenshot_max_height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HomeConfig {
    /// Content URL of the home surface
    pub url: String,

    /// Manifest of the home app
    pub manifest_url: Option<String>,

    /// Fatal errors in a row (without a successful load) before giving up
    pub max_consecutive_crashes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable debug mode
    pub debug: bool,

    /// Number of notifications kept in the bus history
    pub notification_history: usize,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            effect_duration_ms: 300,
            open_timeout_factor: 1.3,
            close_timeout_factor: 1.0,
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            next_paint_timeout_ms: 1000,
            attention_load_timeout_ms: 1000,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            screen_width: 320,
            screen_height: 480,
            status_bar_height: 20,
            software_buttons_height: 0,
            screenshot_max_width: 160,
            screenshot_max_height: 240,
        }
    }
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            url: "app://home.localhost/index.html".to_string(),
            manifest_url: Some("app://home.localhost/manifest.webapp".to_string()),
            max_consecutive_crashes: 3,
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            debug: false,
            notification_history: 256,
        }
    }
}

impl TransitionConfig {
    /// Fallback timers derived from the effect duration
    pub fn timing(&self) -> TransitionTiming {
        let effect = self.effect_duration_ms as f64;
        TransitionTiming {
            open_timeout: Duration::from_millis((effect * self.open_timeout_factor).round() as u64),
            close_timeout: Duration::from_millis(
                (effect * self.close_timeout_factor).round() as u64,
            ),
        }
    }
}

impl ReadinessConfig {
    pub fn next_paint_timeout(&self) -> Duration {
        Duration::from_millis(self.next_paint_timeout_ms)
    }

    pub fn attention_load_timeout(&self) -> Duration {
        Duration::from_millis(self.attention_load_timeout_ms)
    }
}

impl ShellConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Expand ~ to home directory
        let expanded_path = if path.to_string_lossy().starts_with('~') {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            Path::new(&home).join(path.strip_prefix("~").unwrap_or(path))
        } else {
            path.to_path_buf()
        };

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: ShellConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.transition.effect_duration_ms == 0 || self.transition.effect_duration_ms > 10_000 {
            anyhow::bail!("Invalid effect_duration_ms: must be between 1 and 10000");
        }

        // Fallbacks must never fire before the effect could have finished
        if !(1.0..=5.0).contains(&self.transition.open_timeout_factor) {
            anyhow::bail!("Invalid open_timeout_factor: must be between 1.0 and 5.0");
        }
        if !(1.0..=5.0).contains(&self.transition.close_timeout_factor) {
            anyhow::bail!("Invalid close_timeout_factor: must be between 1.0 and 5.0");
        }

        if self.readiness.next_paint_timeout_ms == 0 {
            anyhow::bail!("Invalid next_paint_timeout_ms: must be greater than 0");
        }
        if self.readiness.attention_load_timeout_ms == 0 {
            anyhow::bail!("Invalid attention_load_timeout_ms: must be greater than 0");
        }

        let layout = &self.layout;
        if layout.screen_width == 0 || layout.screen_height == 0 {
            anyhow::bail!("Invalid screen size: width and height must be greater than 0");
        }
        if layout.status_bar_height + layout.software_buttons_height >= layout.screen_height {
            anyhow::bail!("Invalid layout: status bar and software buttons exceed screen height");
        }
        if layout.screenshot_max_width == 0 || layout.screenshot_max_height == 0 {
            anyhow::bail!("Invalid screenshot size: must be greater than 0");
        }

        url::Url::parse(&self.home.url)
            .with_context(|| format!("Invalid home url: {}", self.home.url))?;
        if self.home.max_consecutive_crashes == 0 {
            anyhow::bail!("Invalid max_consecutive_crashes: must be at least 1");
        }

        if self.general.notification_history == 0 {
            anyhow::bail!("Invalid notification_history: must be greater than 0");
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }

    /// Merge a partial configuration into this one
    /// Non-default sections from the partial config will override this config
    pub fn merge_partial(mut self, partial: ShellConfig) -> Self {
        let default_config = ShellConfig::default();

        if partial.transition != default_config.transition {
            self.transition = partial.transition;
        }
        if partial.readiness != default_config.readiness {
            self.readiness = partial.readiness;
        }
        if partial.layout != default_config.layout {
            self.layout = partial.layout;
        }
        if partial.home != default_config.home {
            self.home = partial.home;
        }
        if partial.general != default_config.general {
            self.general = partial.general;
        }

        self
    }
}
