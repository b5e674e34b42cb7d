//! TOML-based configuration persistence for the virtual piano.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\VirtualPiano\config.toml`
//! - Linux:    `~/.config/virtual-piano/config.toml`
//! - macOS:    `~/Library/Application Support/VirtualPiano/config.toml`
//!
//! # What is TOML? (for beginners)
//!
//! TOML (Tom's Obvious Minimal Language) is a configuration file format designed
//! to be easy to read and write.  Example:
//!
//! ```toml
//! [audio]
//! sounds_dir = "sounds"
//! black_volume = 0.6
//!
//! [timing]
//! press_revert_ms = 150
//! ```
//!
//! # Serde default values
//!
//! Every field is annotated with `#[serde(default = "some_fn")]`, and every
//! section with `#[serde(default)]`, so an empty file, a missing section, or a
//! config written by an older version all load cleanly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::dispatch_key::KeyVolumes;
use crate::application::session::SessionTiming;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value parsed but is out of range.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Where samples live and how loud each key category plays.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioConfig {
    #[serde(default = "default_sounds_dir")]
    pub sounds_dir: PathBuf,
    /// File extension of the samples, without the dot.
    #[serde(default = "default_sample_extension")]
    pub sample_extension: String,
    #[serde(default = "default_white_volume")]
    pub white_volume: f32,
    #[serde(default = "default_black_volume")]
    pub black_volume: f32,
}

/// Visual and playback timing, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimingConfig {
    #[serde(default = "default_press_revert_ms")]
    pub press_revert_ms: u64,
    #[serde(default = "default_blink_interval_ms")]
    pub blink_interval_ms: u64,
    #[serde(default = "default_playback_grace_ms")]
    pub playback_grace_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Directory `:save` writes `recording.json` into.
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_sounds_dir() -> PathBuf {
    PathBuf::from("sounds")
}
fn default_sample_extension() -> String {
    "wav".to_string()
}
fn default_white_volume() -> f32 {
    1.0
}
fn default_black_volume() -> f32 {
    0.6
}
fn default_press_revert_ms() -> u64 {
    150
}
fn default_blink_interval_ms() -> u64 {
    500
}
fn default_playback_grace_ms() -> u64 {
    100
}
fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sounds_dir: default_sounds_dir(),
            sample_extension: default_sample_extension(),
            white_volume: default_white_volume(),
            black_volume: default_black_volume(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            press_revert_ms: default_press_revert_ms(),
            blink_interval_ms: default_blink_interval_ms(),
            playback_grace_ms: default_playback_grace_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            export_dir: default_export_dir(),
        }
    }
}

// ── Conversions into application types ────────────────────────────────────────

impl AudioConfig {
    pub fn volumes(&self) -> KeyVolumes {
        KeyVolumes {
            white: self.white_volume,
            black: self.black_volume,
        }
    }
}

impl TimingConfig {
    pub fn session_timing(&self) -> SessionTiming {
        SessionTiming {
            press_revert: Duration::from_millis(self.press_revert_ms),
            blink_interval: Duration::from_millis(self.blink_interval_ms),
            playback_grace: Duration::from_millis(self.playback_grace_ms),
        }
    }
}

impl AppConfig {
    /// Checks values that parse but make no sense.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, volume) in [
            ("audio.white_volume", self.audio.white_volume),
            ("audio.black_volume", self.audio.black_volume),
        ] {
            if !(0.0..=1.0).contains(&volume) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{volume} is outside 0.0..=1.0"),
                });
            }
        }
        if self.timing.blink_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "timing.blink_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.audio.sample_extension.is_empty() {
            return Err(ConfigError::Invalid {
                field: "audio.sample_extension",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform config file, returning
/// `AppConfig::default()` if the file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed, and
/// [`ConfigError::Invalid`] for out-of-range values.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning defaults if the file is absent.
///
/// # Errors
///
/// Same as [`load_config`].
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let cfg = match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str::<AppConfig>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Persists `config` to the platform config file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_file_path()?)
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Same as [`save_config`].
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("VirtualPiano"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("virtual-piano"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("VirtualPiano")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};
    use uuid::Uuid;

    fn temp_config_path() -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("piano_cfg_{}", Uuid::new_v4()));
        let path = dir.join("nested").join("config.toml");
        (dir, path)
    }

    // ── AppConfig defaults ────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_matches_documented_values() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.general.log_level, "info");
        assert_eq!(cfg.audio.sounds_dir, PathBuf::from("sounds"));
        assert_eq!(cfg.audio.sample_extension, "wav");
        assert_eq!(cfg.timing.press_revert_ms, 150);
        assert_eq!(cfg.timing.blink_interval_ms, 500);
        assert_eq!(cfg.timing.playback_grace_ms, 100);
        assert_eq!(cfg.storage.export_dir, PathBuf::from("."));
    }

    #[test]
    fn test_default_conversions_match_application_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.audio.volumes(), KeyVolumes::default());
        assert_eq!(cfg.timing.session_timing(), SessionTiming::default());
    }

    // ── TOML parsing ──────────────────────────────────────────────────────────

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_deserialize_partial_section_overrides_defaults() {
        // Arrange
        let toml_str = r#"
[audio]
black_volume = 0.4

[timing]
playback_grace_ms = 250
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.audio.black_volume, 0.4);
        assert_eq!(cfg.timing.playback_grace_ms, 250);
        // Unspecified fields keep their defaults
        assert_eq!(cfg.audio.white_volume, 1.0);
        assert_eq!(cfg.timing.press_revert_ms, 150);
    }

    #[test]
    fn test_app_config_serializes_and_deserializes_round_trip() {
        let mut cfg = AppConfig::default();
        cfg.audio.sounds_dir = PathBuf::from("/opt/piano/samples");
        cfg.general.log_level = "debug".to_string();

        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: AppConfig = toml::from_str(&toml_str).expect("deserialize");

        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_deserialize_invalid_toml_returns_parse_error() {
        let result: Result<AppConfig, toml::de::Error> = toml::from_str("[[[ not valid toml");
        assert!(result.is_err());
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn test_validate_rejects_volume_above_one() {
        let mut cfg = AppConfig::default();
        cfg.audio.black_volume = 1.2;

        let err = cfg.validate().unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Invalid { field: "audio.black_volume", .. }
        ));
    }

    #[test]
    fn test_validate_rejects_zero_blink_interval() {
        let mut cfg = AppConfig::default();
        assert_ok!(cfg.validate());

        cfg.timing.blink_interval_ms = 0;
        assert_err!(cfg.validate());
    }

    // ── load / save against a temp directory ──────────────────────────────────

    #[test]
    fn test_load_config_from_absent_file_returns_default() {
        let (_, path) = temp_config_path();
        let cfg = assert_ok!(load_config_from(&path));
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_save_and_load_config_round_trip_via_temp_dir() {
        // Arrange
        let (dir, path) = temp_config_path();
        let mut cfg = AppConfig::default();
        cfg.storage.export_dir = PathBuf::from("takes");
        cfg.timing.press_revert_ms = 90;

        // Act
        save_config_to(&cfg, &path).expect("save");
        let loaded = load_config_from(&path).expect("load");

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_from_malformed_file_returns_parse_error() {
        let (dir, path) = temp_config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[audio\nsounds_dir = ").unwrap();

        let result = load_config_from(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    // ── config_dir path formation ─────────────────────────────────────────────

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(
                path.ends_with("config.toml"),
                "config file must be named config.toml, got {path:?}"
            );
        }
        // NoPlatformConfigDir (e.g. in a stripped CI env) is also acceptable.
    }
}
