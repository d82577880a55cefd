use crate::audio::loopback::DEFAULT_QUEUE_BLOCKS;
use crate::error::{Result, VuloopError};
use serde::{Deserialize, Serialize};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VuloopConfig {
    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub meter: MeterConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VuloopConfig {
    /// Reject values the loopback cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.audio.queue_blocks == 0 {
            return Err(VuloopError::InvalidConfig(
                "audio.queue_blocks must be at least 1".to_string(),
            ));
        }
        if self.meter.refresh_ms == 0 {
            return Err(VuloopError::InvalidConfig(
                "meter.refresh_ms must be at least 1".to_string(),
            ));
        }
        if self.meter.width < 10 {
            return Err(VuloopError::InvalidConfig(
                "meter.width must be at least 10".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Capture device name (None = default)
    pub input_device: Option<String>,
    /// Playback device name (None = default)
    pub output_device: Option<String>,
    /// Route captured audio to the output device
    #[serde(default = "default_true")]
    pub playback: bool,
    /// Playback queue depth in blocks
    #[serde(default = "default_queue_blocks")]
    pub queue_blocks: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            input_device: None,
            output_device: None,
            playback: true,
            queue_blocks: DEFAULT_QUEUE_BLOCKS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterConfig {
    /// Redraw interval (ms)
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
    /// Bar width in characters
    #[serde(default = "default_width")]
    pub width: usize,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            refresh_ms: 50,
            width: 40,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_queue_blocks() -> usize {
    DEFAULT_QUEUE_BLOCKS
}

fn default_refresh_ms() -> u64 {
    50
}

fn default_width() -> usize {
    40
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creates() {
        let config = VuloopConfig::default();
        assert!(config.audio.playback);
        assert_eq!(config.audio.queue_blocks, 4);
        assert_eq!(config.meter.refresh_ms, 50);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_audio_config_defaults() {
        let audio = AudioConfig::default();
        assert!(audio.input_device.is_none());
        assert!(audio.output_device.is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: VuloopConfig = toml::from_str(
            r#"
            [audio]
            input_device = "USB Mic"
            "#,
        )
        .unwrap();
        assert_eq!(config.audio.input_device.as_deref(), Some("USB Mic"));
        assert!(config.audio.playback);
        assert_eq!(config.audio.queue_blocks, 4);
        assert_eq!(config.meter.width, 40);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = VuloopConfig::default();
        config.audio.queue_blocks = 0;
        assert!(matches!(config.validate(), Err(VuloopError::InvalidConfig(_))));

        let mut config = VuloopConfig::default();
        config.meter.refresh_ms = 0;
        assert!(matches!(config.validate(), Err(VuloopError::InvalidConfig(_))));

        let mut config = VuloopConfig::default();
        config.meter.width = 3;
        assert!(matches!(config.validate(), Err(VuloopError::InvalidConfig(_))));
    }
}
