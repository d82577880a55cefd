#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod backend;
pub mod cpal_backend;
#[cfg(test)]
pub mod fake;
pub mod level;
pub mod loopback;
pub mod queue;

/// Capture and playback sample rate
pub const SAMPLE_RATE: u32 = 44_100;

/// Mono in, mono out
pub const CHANNELS: u16 = 1;

/// Hardware block size requested from the driver, in samples
pub const BLOCK_SAMPLES: usize = 4096;

/// Signed 16-bit little-endian
pub const BYTES_PER_SAMPLE: usize = 2;

/// Which side of the loopback a device serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceRole {
    Input,
    Output,
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceRole::Input => write!(f, "input"),
            DeviceRole::Output => write!(f, "output"),
        }
    }
}

/// Audio device info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDevice {
    pub name: String,
    pub role: DeviceRole,
    pub is_default: bool,
    pub sample_rate: u32,
    pub channels: u16,
}

/// What a role should be bound to when (re)configuring the loopback
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeviceSelection {
    /// The host's default device for the role
    #[default]
    Default,
    /// A device matched by name
    Named(String),
    /// No stream for this role
    Disabled,
}

impl DeviceSelection {
    pub fn name(&self) -> Option<&str> {
        match self {
            DeviceSelection::Named(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, DeviceSelection::Disabled)
    }
}

impl From<Option<String>> for DeviceSelection {
    fn from(name: Option<String>) -> Self {
        match name {
            Some(name) => DeviceSelection::Named(name),
            None => DeviceSelection::Default,
        }
    }
}

impl fmt::Display for DeviceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSelection::Default => write!(f, "default"),
            DeviceSelection::Named(name) => write!(f, "{}", name),
            DeviceSelection::Disabled => write!(f, "disabled"),
        }
    }
}

/// Stream parameters bound at open time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub block_samples: usize,
}

impl StreamSpec {
    /// Size of one block as transferred to the device
    pub fn block_bytes(&self) -> usize {
        self.block_samples * self.channels as usize * BYTES_PER_SAMPLE
    }

    /// Nominal time between driver callbacks
    pub fn block_duration_ms(&self) -> u64 {
        (self.block_samples as u64 * 1000) / self.sample_rate as u64
    }
}

impl Default for StreamSpec {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
            block_samples: BLOCK_SAMPLES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stream_spec() {
        let spec = StreamSpec::default();
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.block_bytes(), 8192);
        assert_eq!(spec.block_duration_ms(), 92);
    }

    #[test]
    fn test_selection_from_option() {
        assert_eq!(DeviceSelection::from(None), DeviceSelection::Default);
        assert_eq!(
            DeviceSelection::from(Some("MicA".to_string())),
            DeviceSelection::Named("MicA".to_string())
        );
        assert_eq!(DeviceSelection::Named("MicA".into()).name(), Some("MicA"));
        assert!(DeviceSelection::Disabled.is_disabled());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(DeviceRole::Input.to_string(), "input");
        assert_eq!(DeviceRole::Output.to_string(), "output");
    }
}
