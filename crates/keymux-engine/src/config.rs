//! Engine configuration
//!
//! Stored as pretty-printed JSON. A missing file is created with defaults on
//! first load.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use keymux_boot_protocol::BOOT_REPORT_SIZE;
use keymux_errors::{KeyMuxError, Result, ValidationError};

/// Current configuration schema.
pub const CONFIG_SCHEMA_VERSION: &str = "keymux.config/1";

const SCHEMA_PREFIX: &str = "keymux.config/";

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMuxConfig {
    /// Configuration schema version
    pub schema_version: String,
    /// Enumeration monitor settings
    #[serde(default)]
    pub enumeration: EnumerationConfig,
    /// Per-device reader settings
    #[serde(default)]
    pub listener: ListenerConfig,
}

/// What a monitoring pass does when the platform device list call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnumerationFailurePolicy {
    /// Diff against an empty snapshot: no devices observed, so every
    /// connected keyboard is disconnected. Monitoring carries on.
    #[default]
    TreatAsEmpty,
    /// Leave the registry untouched and retry on the next interval.
    SkipPass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumerationConfig {
    /// Period between enumeration passes in milliseconds
    pub interval_ms: u64,
    pub on_failure: EnumerationFailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Read timeout of each reader; bounds how long a reader takes to notice
    /// that listening stopped
    pub poll_interval_ms: u32,
    /// Bytes reserved for one input report
    pub report_buffer_size: usize,
}

impl Default for KeyMuxConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION.to_string(),
            enumeration: EnumerationConfig::default(),
            listener: ListenerConfig::default(),
        }
    }
}

impl Default for EnumerationConfig {
    fn default() -> Self {
        Self {
            interval_ms: EnumerationConfig::DEFAULT_INTERVAL_MS,
            on_failure: EnumerationFailurePolicy::default(),
        }
    }
}

impl EnumerationConfig {
    pub const DEFAULT_INTERVAL_MS: u64 = 3000;
    pub const MIN_INTERVAL_MS: u64 = 50;
    pub const MAX_INTERVAL_MS: u64 = 600_000;

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: ListenerConfig::DEFAULT_POLL_INTERVAL_MS,
            report_buffer_size: keymux_hid::DEFAULT_REPORT_BUFFER_SIZE,
        }
    }
}

impl ListenerConfig {
    pub const DEFAULT_POLL_INTERVAL_MS: u32 = 10;
    pub const MAX_POLL_INTERVAL_MS: u32 = 1000;

    /// Poll interval as the signed timeout HID reads take.
    pub fn read_timeout_ms(&self) -> i32 {
        i32::try_from(self.poll_interval_ms).unwrap_or(i32::MAX)
    }
}

impl KeyMuxConfig {
    /// Load configuration from the default location.
    ///
    /// # Errors
    ///
    /// See [`load_from_path`](Self::load_from_path).
    pub async fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path).await
    }

    /// Load configuration from `path`, writing defaults if it does not exist.
    ///
    /// Older schema versions are migrated in memory; the result is validated.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, unparsable JSON, unknown schema versions and
    /// out-of-range values.
    pub async fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !tokio::fs::try_exists(path).await.map_err(KeyMuxError::Io)? {
            info!(path = %path.display(), "Config file not found, creating default");
            let config = Self::default();
            config.save_to_path(path).await?;
            return Ok(config);
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(KeyMuxError::Io)?;

        let mut config: KeyMuxConfig = serde_json::from_str(&content).map_err(|e| {
            KeyMuxError::config(format!("failed to parse {}: {e}", path.display()))
        })?;

        if config.migrate()? {
            info!(path = %path.display(), "Migrated config to {CONFIG_SCHEMA_VERSION}");
        }
        config.validate()?;

        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Save configuration to the default location.
    ///
    /// # Errors
    ///
    /// See [`save_to_path`](Self::save_to_path).
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path()?;
        self.save_to_path(&config_path).await
    }

    /// Save configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Fails when the directory or file cannot be written.
    pub async fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(KeyMuxError::Io)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| KeyMuxError::config(format!("failed to serialize config: {e}")))?;

        tokio::fs::write(path, content)
            .await
            .map_err(KeyMuxError::Io)?;

        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// `$HOME/.config/keymux/config.json`, or `%LOCALAPPDATA%\keymux\config.json`
    /// on Windows.
    ///
    /// # Errors
    ///
    /// Fails when the base directory variable is not set.
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(windows) {
            std::env::var("LOCALAPPDATA")
                .map(PathBuf::from)
                .map_err(|e| KeyMuxError::config(format!("LOCALAPPDATA: {e}")))?
        } else {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .map_err(|e| KeyMuxError::config(format!("HOME: {e}")))?
        };

        Ok(config_dir.join("keymux").join("config.json"))
    }

    /// Check schema version and value ranges.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.schema_version.starts_with(SCHEMA_PREFIX) {
            return Err(ValidationError::invalid_format(
                "schema_version",
                format!("{:?} does not start with {SCHEMA_PREFIX:?}", self.schema_version),
            )
            .into());
        }

        let interval = self.enumeration.interval_ms;
        if !(EnumerationConfig::MIN_INTERVAL_MS..=EnumerationConfig::MAX_INTERVAL_MS)
            .contains(&interval)
        {
            return Err(ValidationError::out_of_range(
                "enumeration.interval_ms",
                interval,
                EnumerationConfig::MIN_INTERVAL_MS,
                EnumerationConfig::MAX_INTERVAL_MS,
            )
            .into());
        }

        let poll = self.listener.poll_interval_ms;
        if !(1..=ListenerConfig::MAX_POLL_INTERVAL_MS).contains(&poll) {
            return Err(ValidationError::out_of_range(
                "listener.poll_interval_ms",
                poll,
                1,
                ListenerConfig::MAX_POLL_INTERVAL_MS,
            )
            .into());
        }

        if self.listener.report_buffer_size < BOOT_REPORT_SIZE {
            return Err(ValidationError::out_of_range(
                "listener.report_buffer_size",
                self.listener.report_buffer_size,
                BOOT_REPORT_SIZE,
                usize::MAX,
            )
            .into());
        }

        Ok(())
    }

    /// Bring an older schema up to date. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Fails for schema versions this build does not know.
    pub fn migrate(&mut self) -> Result<bool> {
        if self.schema_version == CONFIG_SCHEMA_VERSION {
            return Ok(false);
        }

        match self.schema_version.as_str() {
            // v0 had no failure policy; serde defaults already filled it in.
            "keymux.config/0" => {
                self.schema_version = CONFIG_SCHEMA_VERSION.to_string();
                Ok(true)
            }
            other => Err(KeyMuxError::config(format!(
                "unsupported config schema version: {other}"
            ))),
        }
    }

    /// Override the enumeration interval.
    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.enumeration.interval_ms = interval_ms;
        self
    }
}
