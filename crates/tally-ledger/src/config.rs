//! # Ledger Configuration
//!
//! Settings for the database location, the ledger policies that are still
//! open product decisions, and the reporting window.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_DB_PATH=/srv/tally/tally.db                                  │
//! │     TALLY_ALLOW_SETTLED_EDITS=false                                    │
//! │     TALLY_PARTIAL_REVERSAL=restore_adjustment                          │
//! │     TALLY_WINDOW_DAYS=31                                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tally/tally.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.tally.ledger/tally.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # tally.toml
//! [database]
//! path = "/srv/tally/tally.db"
//! max_connections = 5
//! min_connections = 1
//!
//! [ledger]
//! allow_settled_edits = true
//! partial_reversal = "keep_adjustment"   # keep_adjustment | restore_adjustment
//!
//! [reporting]
//! window_days = 62
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use tally_core::{PartialReversalPolicy, DEFAULT_WINDOW_DAYS};
use tally_db::DbConfig;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No config path available on this platform")]
    NoConfigPath,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "tally", "ledger")
        .map(|dirs| dirs.data_dir().join("tally.db"))
        .unwrap_or_else(|| PathBuf::from("./tally.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }
}

// =============================================================================
// Ledger Settings
// =============================================================================

/// Policies for the two ledger behaviors that still await product sign-off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Whether a settled entry may be edited. When allowed, each such edit is
    /// logged as a warning.
    #[serde(default = "default_true")]
    pub allow_settled_edits: bool,

    /// What reverting a partial-payment carve-out does to the adjustment left
    /// on the original entry.
    #[serde(default)]
    pub partial_reversal: PartialReversalPolicy,
}

fn default_true() -> bool {
    true
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            allow_settled_edits: true,
            partial_reversal: PartialReversalPolicy::default(),
        }
    }
}

// =============================================================================
// Reporting Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingSettings {
    /// Length of the default reporting window, ending now.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

fn default_window_days() -> u32 {
    DEFAULT_WINDOW_DAYS
}

impl Default for ReportingSettings {
    fn default() -> Self {
        ReportingSettings {
            window_days: default_window_days(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub ledger: LedgerSettings,

    #[serde(default)]
    pub reporting: ReportingSettings,
}

impl LedgerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (tally.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading ledger config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load ledger config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoConfigPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Ledger config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }

        if self.reporting.window_days == 0 {
            return Err(ConfigError::Invalid(
                "reporting.window_days must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `TALLY_*` overrides read through `lookup`. Unparseable values
    /// are logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("TALLY_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(value) = lookup("TALLY_ALLOW_SETTLED_EDITS") {
            match parse_bool(&value) {
                Some(allow) => self.ledger.allow_settled_edits = allow,
                None => warn!(value = %value, "Unknown TALLY_ALLOW_SETTLED_EDITS value"),
            }
        }

        if let Some(value) = lookup("TALLY_PARTIAL_REVERSAL") {
            match value.parse() {
                Ok(policy) => {
                    debug!(?policy, "Overriding partial reversal policy from environment");
                    self.ledger.partial_reversal = policy;
                }
                Err(e) => warn!(error = %e, "Ignoring TALLY_PARTIAL_REVERSAL"),
            }
        }

        if let Some(value) = lookup("TALLY_WINDOW_DAYS") {
            match value.parse::<u32>() {
                Ok(days) => self.reporting.window_days = days,
                Err(_) => warn!(value = %value, "Unknown TALLY_WINDOW_DAYS value"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "ledger")
            .map(|dirs| dirs.config_dir().join("tally.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Database pool settings derived from `[database]`.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
    }

    pub fn partial_reversal(&self) -> PartialReversalPolicy {
        self.ledger.partial_reversal
    }

    pub fn allow_settled_edits(&self) -> bool {
        self.ledger.allow_settled_edits
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert!(config.allow_settled_edits());
        assert_eq!(config.partial_reversal(), PartialReversalPolicy::KeepAdjustment);
        assert_eq!(config.reporting.window_days, DEFAULT_WINDOW_DAYS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: LedgerConfig = toml::from_str(
            r#"
            [ledger]
            partial_reversal = "restore_adjustment"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.partial_reversal(),
            PartialReversalPolicy::RestoreAdjustment
        );
        assert!(config.allow_settled_edits());
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TALLY_DB_PATH", "/tmp/t.db"),
            ("TALLY_ALLOW_SETTLED_EDITS", "false"),
            ("TALLY_PARTIAL_REVERSAL", "restore"),
            ("TALLY_WINDOW_DAYS", "31"),
        ]);

        let mut config = LedgerConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/tmp/t.db"));
        assert!(!config.allow_settled_edits());
        assert_eq!(
            config.partial_reversal(),
            PartialReversalPolicy::RestoreAdjustment
        );
        assert_eq!(config.reporting.window_days, 31);
    }

    #[test]
    fn test_bad_overrides_are_ignored() {
        let mut config = LedgerConfig::default();
        config.apply_overrides(|key| match key {
            "TALLY_ALLOW_SETTLED_EDITS" => Some("maybe".to_string()),
            "TALLY_PARTIAL_REVERSAL" => Some("forgive".to_string()),
            "TALLY_WINDOW_DAYS" => Some("-3".to_string()),
            _ => None,
        });

        assert!(config.allow_settled_edits());
        assert_eq!(config.partial_reversal(), PartialReversalPolicy::KeepAdjustment);
        assert_eq!(config.reporting.window_days, DEFAULT_WINDOW_DAYS);
    }

    #[test]
    fn test_config_validation() {
        let mut config = LedgerConfig::default();

        config.reporting.window_days = 0;
        assert!(config.validate().is_err());

        config.reporting.window_days = 30;
        config.database.min_connections = 10;
        assert!(config.validate().is_err());

        config.database.min_connections = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_serialization() {
        let config = LedgerConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[ledger]"));
        assert!(toml_str.contains("partial_reversal = \"keep_adjustment\""));
    }
}
