use crate::audio::DeviceRole;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VuloopError {
    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Audio device not found: {0}")]
    AudioDeviceNotFound(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("Cannot open {role} device '{device}': {reason}")]
    DeviceOpen {
        role: DeviceRole,
        device: String,
        reason: String,
    },

    #[error("Loopback not configured")]
    NotConfigured,

    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VuloopError>;
