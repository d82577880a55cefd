//! Capture resolutions offered for the camera feed.

use crate::error::{Result, VuloopError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Frame size requested from the video source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_supported(&self) -> bool {
        SUPPORTED_RESOLUTIONS.contains(self)
    }
}

/// Resolutions the capture device is opened with, smallest first
pub const SUPPORTED_RESOLUTIONS: [Resolution; 3] = [
    Resolution::new(640, 480),
    Resolution::new(1280, 720),
    Resolution::new(1920, 1080),
];

impl Default for Resolution {
    fn default() -> Self {
        SUPPORTED_RESOLUTIONS[0]
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = VuloopError;

    fn from_str(s: &str) -> Result<Self> {
        let (width, height) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| VuloopError::InvalidResolution(s.to_string()))?;

        let width: u32 = width
            .trim()
            .parse()
            .map_err(|_| VuloopError::InvalidResolution(s.to_string()))?;
        let height: u32 = height
            .trim()
            .parse()
            .map_err(|_| VuloopError::InvalidResolution(s.to_string()))?;

        if width == 0 || height == 0 {
            return Err(VuloopError::InvalidResolution(s.to_string()));
        }

        Ok(Self::new(width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let res: Resolution = "1280x720".parse().unwrap();
        assert_eq!(res, Resolution::new(1280, 720));
        assert_eq!(res.to_string(), "1280x720");

        let res: Resolution = " 1920X1080 ".parse().unwrap();
        assert_eq!(res, Resolution::new(1920, 1080));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "1280", "x720", "1280x", "0x720", "axb", "1280x-1"] {
            let result = input.parse::<Resolution>();
            assert!(
                matches!(result, Err(VuloopError::InvalidResolution(_))),
                "accepted {:?}",
                input
            );
        }
    }

    #[test]
    fn test_supported_set() {
        assert_eq!(Resolution::default(), Resolution::new(640, 480));
        assert!(Resolution::new(1280, 720).is_supported());
        assert!(!Resolution::new(800, 600).is_supported());
    }
}
