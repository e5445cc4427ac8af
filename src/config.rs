// SPDX-License-Identifier: GPL-3.0-only
//! User configuration
//!
//! Read from `$XDG_CONFIG_HOME/display-mode-switcher/config.toml`. Every key is
//! optional; a missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::connector::DEFAULT_DRM_PATH;
use crate::dispatcher::DEFAULT_MUTATOR;
use crate::error::{AppError, Result};
use crate::notifier::DEFAULT_EVENT_PATH;

pub const CONFIG_DIR: &str = "display-mode-switcher";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Connector hierarchy to probe
    pub drm_path: PathBuf,
    /// File whose settled changes trigger a probe
    pub event_path: PathBuf,
    /// Command line of the mutator; the mode is appended as last argument
    pub mutator: String,
    /// Height used for the menu metrics instead of the internal panel's
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_height: Option<i64>,
    /// Notify the user when a probe finds no external display
    pub notify_disconnected: bool,
    /// Also probe on udev DRM hotplug events
    pub udev_hotplug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            drm_path: PathBuf::from(DEFAULT_DRM_PATH),
            event_path: PathBuf::from(DEFAULT_EVENT_PATH),
            mutator: DEFAULT_MUTATOR.to_string(),
            display_height: None,
            notify_disconnected: true,
            udev_hotplug: false,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load `path`, or defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load the given file or the default one, falling back to defaults on error
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => {
                warn!("Could not find config directory, using defaults");
                return Self::default();
            }
        };

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("Errors loading config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    fn parse(contents: &str) -> std::result::Result<Self, String> {
        let config: Config = toml::from_str(contents).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.mutator.trim().is_empty() {
            return Err("mutator must not be empty".to_string());
        }
        if let Some(height) = self.display_height {
            if height <= 0 {
                return Err(format!("display_height must be positive, got {}", height));
            }
        }
        Ok(())
    }
}
