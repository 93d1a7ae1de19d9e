//! Configuration management for Palmdeck
//!
//! Provides persistent settings storage with schema versioning and migrations.
//! Configuration is stored in `~/.palmdeck/config.json`; every section falls
//! back to its defaults when missing, so a partial file is always valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::{KeyChord, KeyChordError, PresentationCommand};

/// Current config schema version
const CURRENT_VERSION: u32 = 1;

/// Errors raised while loading or saving configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to create config directory: {0}")]
    CreateDir(#[source] std::io::Error),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown config version: {0}")]
    UnknownVersion(u32),

    #[error("Invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },

    #[error("Invalid key binding for {command}: {source}")]
    Binding {
        command: &'static str,
        #[source]
        source: KeyChordError,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema version for migrations
    pub version: u32,
    /// Gesture classification thresholds
    pub classifier: ClassifierConfig,
    /// Arming window and cooldown settings
    pub trigger: TriggerConfig,
    /// Key chord sent for each presentation command
    pub bindings: KeyBindings,
    /// General application settings
    pub general: GeneralConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            classifier: ClassifierConfig::default(),
            trigger: TriggerConfig::default(),
            bindings: KeyBindings::default(),
            general: GeneralConfig::default(),
        }
    }
}

impl Config {
    /// Reject values that would break classification or gating
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.classifier.validate()?;
        self.trigger.validate()?;
        self.bindings.validate()
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.into(),
    }
}

fn check_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{} must be a finite value >= 0", value)))
    }
}

fn check_positive_secs(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{} must be a finite number of seconds > 0", value)))
    }
}

/// Gesture classifier thresholds (normalised image units)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// How far above its joint a fingertip must be to count as extended
    pub extension_margin: f32,
    /// Minimum extended fingers (thumb excluded) for an open palm
    pub open_palm_min_fingers: u8,
    /// Horizontal centroid shift that reads as a swipe
    pub swipe_min_dx: f32,
    /// Vertical centroid shift tolerated during a swipe
    pub swipe_max_dy: f32,
    /// Vertical centroid shift that reads as pointing down
    pub point_down_min_dy: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            extension_margin: 0.02,
            open_palm_min_fingers: 4,
            swipe_min_dx: 0.05,
            swipe_max_dy: 0.03,
            point_down_min_dy: 0.05,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=4).contains(&self.open_palm_min_fingers) {
            return Err(invalid(
                "classifier.open_palm_min_fingers",
                format!("{} is outside 1..=4", self.open_palm_min_fingers),
            ));
        }
        check_non_negative("classifier.extension_margin", self.extension_margin)?;
        check_non_negative("classifier.swipe_min_dx", self.swipe_min_dx)?;
        check_non_negative("classifier.swipe_max_dy", self.swipe_max_dy)?;
        check_non_negative("classifier.point_down_min_dy", self.point_down_min_dy)
    }
}

/// Trigger gate timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Seconds a finger lift keeps the gesture window open
    pub window_secs: f64,
    /// Minimum seconds between two fired commands
    pub cooldown_secs: f64,
    /// Confidence a gesture must exceed to fire
    pub fire_threshold: f32,
    /// Close the window as soon as one command fires
    pub consume_on_fire: bool,
    /// Number of recent classifications searched for a closed hand
    pub history_capacity: usize,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            window_secs: 3.0,
            cooldown_secs: 1.0,
            fire_threshold: 0.7,
            consume_on_fire: false,
            history_capacity: 5,
        }
    }
}

impl TriggerConfig {
    pub fn window(&self) -> Duration {
        secs_to_duration(self.window_secs)
    }

    pub fn cooldown(&self) -> Duration {
        secs_to_duration(self.cooldown_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive_secs("trigger.window_secs", self.window_secs)?;
        check_positive_secs("trigger.cooldown_secs", self.cooldown_secs)?;
        if !(0.0..=1.0).contains(&self.fire_threshold) {
            return Err(invalid(
                "trigger.fire_threshold",
                format!("{} is outside 0..=1", self.fire_threshold),
            ));
        }
        if self.history_capacity == 0 {
            return Err(invalid("trigger.history_capacity", "must be at least 1"));
        }
        Ok(())
    }
}

/// Negative and NaN clamp to zero, oversized values saturate
fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}

/// Key chords per presentation command, in `KeyChord::parse` syntax
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub play_pause: String,
    pub stop: String,
    pub next: String,
    pub previous: String,
    pub zoom_in: String,
    pub toggle_pointer: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            play_pause: "space".to_string(),
            stop: "f".to_string(),
            next: "right".to_string(),
            previous: "left".to_string(),
            zoom_in: "ctrl+plus".to_string(),
            toggle_pointer: "escape".to_string(),
        }
    }
}

impl KeyBindings {
    /// Raw binding string for a command
    pub fn raw(&self, command: PresentationCommand) -> &str {
        match command {
            PresentationCommand::PlayPause => &self.play_pause,
            PresentationCommand::Stop => &self.stop,
            PresentationCommand::Next => &self.next,
            PresentationCommand::Previous => &self.previous,
            PresentationCommand::ZoomIn => &self.zoom_in,
            PresentationCommand::TogglePointer => &self.toggle_pointer,
        }
    }

    /// Parse the binding for a command
    pub fn chord(&self, command: PresentationCommand) -> Result<KeyChord, ConfigError> {
        KeyChord::parse(self.raw(command)).map_err(|source| ConfigError::Binding {
            command: command.as_str(),
            source,
        })
    }

    /// Parse every binding, failing on the first invalid one
    pub fn validate(&self) -> Result<(), ConfigError> {
        for command in PresentationCommand::ALL {
            self.chord(command)?;
        }
        Ok(())
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Also write logs to `~/.palmdeck/logs/palmdeck.log`
    pub log_to_file: bool,
    /// Print the statistics summary when the stream ends
    pub print_summary: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_to_file: false,
            print_summary: true,
        }
    }
}

/// Get the path to the config file (~/.palmdeck/config.json)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.json")
}

/// Get the path to the config directory (~/.palmdeck)
pub fn get_config_dir() -> PathBuf {
    home_dir_or_fallback().join(".palmdeck")
}

/// Get the home directory, falling back to /tmp if unavailable
fn home_dir_or_fallback() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        tracing::error!("Could not determine home directory, using /tmp");
        PathBuf::from("/tmp")
    })
}

/// Load configuration from a specific file
///
/// A missing file yields the defaults. Older schema versions are migrated
/// and written back. Out-of-range values are rejected.
pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::info!("Config file {} not found, using defaults", path.display());
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config: Config = serde_json::from_str(&contents)?;
    let original_version = config.version;
    let migrated = migrate_config(config)?;
    migrated.validate()?;

    if migrated.version != original_version {
        save_to_path(&migrated, path)?;
    }

    Ok(migrated)
}

/// Save configuration to a specific file, creating parent directories
pub fn save_to_path(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir).map_err(ConfigError::CreateDir)?;
        }
    }

    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Config saved to {}", path.display());
    Ok(())
}

/// Migrate configuration from older schema versions
fn migrate_config(mut config: Config) -> Result<Config, ConfigError> {
    let original_version = config.version;

    while config.version < CURRENT_VERSION {
        config = apply_migration(config)?;
    }

    if config.version > CURRENT_VERSION {
        return Err(ConfigError::UnknownVersion(config.version));
    }

    if config.version != original_version {
        tracing::info!(
            "Migrated config from version {} to {}",
            original_version,
            config.version
        );
    }

    Ok(config)
}

/// Apply a single migration step
fn apply_migration(config: Config) -> Result<Config, ConfigError> {
    match config.version {
        // Version 0 -> 1: unversioned files written before the schema field existed
        0 => {
            let mut migrated = config;
            migrated.version = 1;
            Ok(migrated)
        }
        v => Err(ConfigError::UnknownVersion(v)),
    }
}
