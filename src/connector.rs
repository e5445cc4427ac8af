// SPDX-License-Identifier: GPL-3.0-only
//! Connector state probing
//!
//! Reads the DRM connector hierarchy (normally `/sys/class/drm`). Each entry is
//! a directory (sysfs symlinks to one) named `cardN-<connector>` holding a
//! `status` file with `connected`, `disconnected` or `unknown`.
//!
//! The `cardN-` prefix is stripped before classifying, so `card0-DP-1` counts
//! as DisplayPort while `card0-eDP-1` stays internal. Matching on the raw
//! entry name would never see a DP connector on real sysfs.

use std::fs;
use std::path::PathBuf;

use crate::error::{AppError, Result};

pub const DEFAULT_DRM_PATH: &str = "/sys/class/drm";

/// Fallback height for the scale calculator when no internal panel is found
pub const DEFAULT_DISPLAY_HEIGHT: i64 = 1080;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorKind {
    Hdmi,
    DisplayPort,
    Other,
}

impl ConnectorKind {
    /// Classify a connector name (without the `cardN-` prefix)
    pub fn from_name(name: &str) -> Self {
        if name.contains("HDMI") {
            ConnectorKind::Hdmi
        } else if name.starts_with("DP") {
            ConnectorKind::DisplayPort
        } else {
            ConnectorKind::Other
        }
    }
}

/// State of one external connector at probe time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorStatus {
    pub name: String,
    pub kind: ConnectorKind,
    pub connected: bool,
}

/// Strip the `cardN-` prefix sysfs puts in front of connector names
///
/// `card0-DP-1` becomes `DP-1`, `card1-eDP-1` becomes `eDP-1`; names without
/// the prefix are returned unchanged.
pub fn connector_name(entry_name: &str) -> &str {
    if let Some(rest) = entry_name.strip_prefix("card") {
        if let Some((index, connector)) = rest.split_once('-') {
            if !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()) {
                return connector;
            }
        }
    }
    entry_name
}

/// Only the exact (trimmed) word `connected` counts
fn is_connected_status(raw: &str) -> bool {
    raw.trim() == "connected"
}

fn is_internal_panel(name: &str) -> bool {
    name.starts_with("eDP") || name.starts_with("LVDS") || name.starts_with("DSI")
}

/// Reads connector states from a DRM-style directory hierarchy
#[derive(Debug, Clone)]
pub struct ConnectorProber {
    root: PathBuf,
}

impl Default for ConnectorProber {
    fn default() -> Self {
        Self::new(DEFAULT_DRM_PATH)
    }
}

impl ConnectorProber {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Is any HDMI or DisplayPort connector connected?
    ///
    /// Never fails: an unreadable hierarchy is logged and reported as
    /// "not connected".
    pub fn probe(&self) -> bool {
        match self.scan() {
            Ok(connectors) => connectors.iter().any(|c| c.connected),
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    /// List the HDMI and DisplayPort connectors with their state
    ///
    /// Entries that are not directories, have other names, or lack a
    /// `status` file are skipped.
    pub fn scan(&self) -> Result<Vec<ConnectorStatus>> {
        let entries = fs::read_dir(&self.root).map_err(|source| AppError::Enumeration {
            path: self.root.clone(),
            source,
        })?;

        let mut connectors = Vec::new();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry in {}: {}", self.root.display(), e);
                    continue;
                }
            };

            let entry_name = entry.file_name().to_string_lossy().into_owned();
            let name = connector_name(&entry_name);
            let kind = ConnectorKind::from_name(name);
            if kind == ConnectorKind::Other {
                continue;
            }

            // sysfs entries are symlinks, follow them
            let is_dir = fs::metadata(entry.path()).map(|m| m.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }

            let status_path = entry.path().join("status");
            if !status_path.exists() {
                info!("Status file not found: {}", status_path.display());
                continue;
            }

            let raw = match fs::read(&status_path) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Failed to read {}: {}", status_path.display(), e);
                    continue;
                }
            };
            let status = String::from_utf8_lossy(&raw);
            let connected = is_connected_status(&status);

            debug!(connector = %name, status = %status.trim(), "Probed connector");

            connectors.push(ConnectorStatus {
                name: name.to_string(),
                kind,
                connected,
            });
        }

        connectors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(connectors)
    }

    /// Preferred mode height of the connected internal panel, if any
    ///
    /// Reads the first `WxH` line of the connector's `modes` file.
    pub fn internal_panel_height(&self) -> Option<i64> {
        let entries = fs::read_dir(&self.root).ok()?;

        for entry in entries.flatten() {
            let entry_name = entry.file_name().to_string_lossy().into_owned();
            if !is_internal_panel(connector_name(&entry_name)) {
                continue;
            }

            let connected = fs::read_to_string(entry.path().join("status"))
                .map(|s| is_connected_status(&s))
                .unwrap_or(false);
            if !connected {
                continue;
            }

            let Ok(modes) = fs::read_to_string(entry.path().join("modes")) else {
                continue;
            };
            if let Some(height) = modes.lines().next().and_then(parse_mode_height) {
                debug!("Internal panel {} height: {}", entry_name, height);
                return Some(height);
            }
        }

        None
    }
}

/// Height from a DRM mode line such as `1920x1200` or `1920x1080i`
fn parse_mode_height(line: &str) -> Option<i64> {
    let (_, height) = line.trim().split_once('x')?;
    let digits: String = height.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
