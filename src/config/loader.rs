use crate::config::settings::VuloopConfig;
use crate::error::{Result, VuloopError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get XDG-compliant config directory
pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", "vuloop")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| VuloopError::Config("Could not determine config directory".to_string()))
}

/// Get config file path
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from the default path, creating it if missing
pub fn load_config() -> Result<VuloopConfig> {
    let path = config_path()?;

    if !path.exists() {
        let config = VuloopConfig::default();
        save_config_to(&config, &path)?;
        return Ok(config);
    }

    read_config(&path)
}

/// Load config from an explicit path, which must exist
pub fn load_config_from(path: &Path) -> Result<VuloopConfig> {
    if !path.exists() {
        return Err(VuloopError::ConfigNotFound(path.to_path_buf()));
    }
    read_config(path)
}

fn read_config(path: &Path) -> Result<VuloopConfig> {
    let content = fs::read_to_string(path)?;
    let config: VuloopConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

pub fn save_config_to(config: &VuloopConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

/// Apply VULOOP_* environment overrides
pub fn apply_env(config: &mut VuloopConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

fn apply_overrides<F>(config: &mut VuloopConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(device) = lookup("VULOOP_INPUT_DEVICE") {
        config.audio.input_device = Some(device);
    }
    if let Some(device) = lookup("VULOOP_OUTPUT_DEVICE") {
        config.audio.output_device = Some(device);
    }
    if let Some(level) = lookup("VULOOP_LOG_LEVEL") {
        config.logging.level = level;
    }
}

/// Load config (explicit path or default) with environment overrides
pub fn load_config_with_env(path: Option<&Path>) -> Result<VuloopConfig> {
    let mut config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    apply_env(&mut config);
    Ok(config)
}

/// Like `load_config_with_env`, but never writes a default file to disk.
///
/// A missing file yields the defaults.
pub fn peek_config(path: Option<&Path>) -> Result<VuloopConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config_path()?,
    };

    let mut config = if path.exists() {
        read_config(&path)?
    } else {
        VuloopConfig::default()
    };
    apply_env(&mut config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_serializes() {
        let config = VuloopConfig::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[audio]"));
        assert!(toml.contains("[meter]"));
        assert!(toml.contains("[logging]"));
    }

    #[test]
    fn test_config_roundtrip_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = VuloopConfig::default();
        config.audio.input_device = Some("MicA".to_string());
        config.audio.playback = false;
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.audio.input_device.as_deref(), Some("MicA"));
        assert!(!loaded.audio.playback);
    }

    #[test]
    fn test_missing_explicit_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            load_config_from(&path),
            Err(VuloopError::ConfigNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[audio]\nqueue_blocks = 0\n").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(VuloopError::InvalidConfig(_))
        ));

        fs::write(&path, "[audio\n").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(VuloopError::TomlParse(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("VULOOP_INPUT_DEVICE", "MicC"),
            ("VULOOP_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = VuloopConfig::default();
        config.audio.output_device = Some("SpeakerB".to_string());
        apply_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.audio.input_device.as_deref(), Some("MicC"));
        assert_eq!(config.audio.output_device.as_deref(), Some("SpeakerB"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_peek_config_does_not_create_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = peek_config(Some(&path)).unwrap();
        assert_eq!(config.meter.width, VuloopConfig::default().meter.width);
        assert!(!path.exists());

        fs::write(&path, "[meter]\nwidth = 64\n").unwrap();
        let config = peek_config(Some(&path)).unwrap();
        assert_eq!(config.meter.width, 64);
    }

    #[test]
    fn test_config_paths_are_valid() {
        let _ = config_dir();
        let _ = config_path();
    }
}
