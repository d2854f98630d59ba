//! Process configuration, built once at startup and passed down explicitly.
//!
//! # Responsibility
//! - Describe database, logging and media settings in one value object.
//! - Load it from JSON, falling back to defaults for omitted fields.
//!
//! # Invariants
//! - No core component reads environment variables or global state for
//!   configuration; callers inject the parts they need.
//! - A config that passed `validate()` yields usable media limits and signing.

use crate::logging::default_log_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// 50 MiB, the largest accepted upload.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
/// Signed media URLs stay valid for 30 minutes.
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 30 * 60;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// SQLite file; `None` keeps the store in memory.
    pub db_path: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    /// Directory used by the filesystem object store.
    pub root_dir: PathBuf,
    /// Prefix of signed media URLs.
    pub public_base_url: String,
    /// HMAC key for signed URLs.
    pub signing_secret: String,
    pub max_upload_bytes: usize,
    pub signed_url_ttl_secs: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root_dir: std::env::temp_dir().join("capsule-media"),
            public_base_url: "http://localhost:8080/media".to_string(),
            signing_secret: String::new(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.media.validate()
    }
}

impl MediaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("media.max_upload_bytes must be > 0"));
        }
        if self.signed_url_ttl_secs == 0 {
            return Err(ConfigError::Invalid("media.signed_url_ttl_secs must be > 0"));
        }
        if self.signing_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("media.signing_secret must not be empty"));
        }
        if self.public_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("media.public_base_url must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_SIGNED_URL_TTL_SECS};

    #[test]
    fn omitted_fields_fall_back_to_defaults() {
        let config =
            CoreConfig::from_json_str(r#"{"media":{"signing_secret":"s3cret"}}"#).unwrap();
        assert_eq!(config.db_path, None);
        assert_eq!(config.media.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.media.signed_url_ttl_secs, DEFAULT_SIGNED_URL_TTL_SECS);
        assert!(!config.logging.level.is_empty());
    }

    #[test]
    fn missing_secret_is_rejected() {
        let err = CoreConfig::from_json_str("{}").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("signing_secret")));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = CoreConfig::from_json_str(r#"{"dbPath":"x"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capsule.json");
        std::fs::write(
            &path,
            r#"{"db_path":"/tmp/c.db","media":{"signing_secret":"k","signed_url_ttl_secs":60}}"#,
        )
        .unwrap();
        let config = CoreConfig::load(&path).unwrap();
        assert_eq!(config.media.signed_url_ttl_secs, 60);
        assert_eq!(
            config.db_path.as_deref(),
            Some(std::path::Path::new("/tmp/c.db"))
        );
    }
}
