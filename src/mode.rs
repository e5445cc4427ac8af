// SPDX-License-Identifier: GPL-3.0-only
//! Display composition modes offered in a session

use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// How the external display is composed with the internal one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Internal,
    External,
    Join,
    Mirror,
}

impl Mode {
    /// Fixed order used by the hotkey cycle and for button layout
    pub const CYCLE: [Mode; 4] = [Mode::Internal, Mode::External, Mode::Join, Mode::Mirror];

    /// Mode at `index` in the cycle, wrapping around
    pub fn from_cycle_index(index: usize) -> Mode {
        Self::CYCLE[index % Self::CYCLE.len()]
    }

    /// Position of this mode in the cycle
    #[cfg(test)]
    pub fn cycle_index(self) -> usize {
        match self {
            Mode::Internal => 0,
            Mode::External => 1,
            Mode::Join => 2,
            Mode::Mirror => 3,
        }
    }

    /// The single argument passed to the mutator
    pub fn as_arg(self) -> &'static str {
        match self {
            Mode::Internal => "internal",
            Mode::External => "external",
            Mode::Join => "join",
            Mode::Mirror => "mirror",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Internal => "Internal only",
            Mode::External => "External only",
            Mode::Join => "Extended",
            Mode::Mirror => "Mirror",
        }
    }

    pub fn icon_name(self) -> &'static str {
        match self {
            Mode::Internal => "video-single-display-symbolic",
            Mode::External => "computer-symbolic",
            Mode::Join => "video-joined-displays-symbolic",
            Mode::Mirror => "view-mirror-symbolic",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

impl FromStr for Mode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "internal" => Ok(Mode::Internal),
            "external" => Ok(Mode::External),
            "join" | "extended" => Ok(Mode::Join),
            "mirror" => Ok(Mode::Mirror),
            other => Err(AppError::InvalidMode(other.to_string())),
        }
    }
}
