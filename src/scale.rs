// SPDX-License-Identifier: GPL-3.0-only
//! Session UI metrics proportional to the display height
//!
//! Heights are clamped to the range between two reference layouts and the
//! metrics are interpolated linearly between them.

use std::fmt;

/// Metrics for the smallest supported display (864x486)
const REF_LOW: ScaleMetrics = ScaleMetrics {
    margin_top: 50,
    icon_size: 25,
    font_size: 15,
};
const REF_LOW_HEIGHT: i64 = 486;

/// Metrics for the largest reference display (1920x1200)
const REF_HIGH: ScaleMetrics = ScaleMetrics {
    margin_top: 150,
    icon_size: 55,
    font_size: 30,
};
const REF_HIGH_HEIGHT: i64 = 1200;

/// Pixel metrics for the session UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleMetrics {
    pub margin_top: u32,
    pub icon_size: u32,
    pub font_size: u32,
}

impl fmt::Display for ScaleMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "margin-top: {}px; icon-size: {}px; font-size: {}px",
            self.margin_top, self.icon_size, self.font_size
        )
    }
}

/// Compute the session UI metrics for a display of the given height
///
/// # Example
///
/// ```no_run
/// let metrics = scale(843);
/// assert_eq!(metrics.margin_top, 100);
/// ```
pub fn scale(height: i64) -> ScaleMetrics {
    let clamped = height.clamp(REF_LOW_HEIGHT, REF_HIGH_HEIGHT);
    let t = (clamped - REF_LOW_HEIGHT) as f64 / (REF_HIGH_HEIGHT - REF_LOW_HEIGHT) as f64;

    ScaleMetrics {
        margin_top: lerp(REF_LOW.margin_top, REF_HIGH.margin_top, t),
        icon_size: lerp(REF_LOW.icon_size, REF_HIGH.icon_size, t),
        font_size: lerp(REF_LOW.font_size, REF_HIGH.font_size, t),
    }
}

/// Interpolate and round to the nearest pixel, halves going up
fn lerp(low: u32, high: u32, t: f64) -> u32 {
    let value = low as f64 + (high as f64 - low as f64) * t;
    (value + 0.5).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_reference() {
        assert_eq!(
            scale(486),
            ScaleMetrics {
                margin_top: 50,
                icon_size: 25,
                font_size: 15
            }
        );
    }

    #[test]
    fn test_high_reference() {
        assert_eq!(
            scale(1200),
            ScaleMetrics {
                margin_top: 150,
                icon_size: 55,
                font_size: 30
            }
        );
    }

    #[test]
    fn test_clamping() {
        assert_eq!(scale(3000), scale(1200));
        assert_eq!(scale(100), scale(486));
        assert_eq!(scale(-5), scale(486));
    }

    #[test]
    fn test_midpoint_rounds_half_up() {
        // t = 0.5 exactly, font size lands on 22.5
        let metrics = scale(843);
        assert_eq!(metrics.margin_top, 100);
        assert_eq!(metrics.icon_size, 40);
        assert_eq!(metrics.font_size, 23);
    }

    #[test]
    fn test_common_height() {
        // t = 594 / 714
        let metrics = scale(1080);
        assert_eq!(metrics.margin_top, 133);
        assert_eq!(metrics.icon_size, 50);
        assert_eq!(metrics.font_size, 27);
    }

    #[test]
    fn test_display_format() {
        assert_eq!(
            scale(486).to_string(),
            "margin-top: 50px; icon-size: 25px; font-size: 15px"
        );
    }
}
