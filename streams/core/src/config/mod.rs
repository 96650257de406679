//! TOML Configuration File Support
//!
//! Connection settings for the pod REST client, loaded from a TOML file at
//! `~/.config/pod-streams/streams.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [pod]
//! url = "https://acme.pod.example.com"
//! session_token = "..."
//! key_manager_token = "..."
//! timeout_ms = 30000
//!
//! [listing]
//! page_size = 100
//! include_inactive = false
//! ```
//!
//! # Environment Variables
//!
//! - `STREAMS_POD_URL`
//! - `STREAMS_SESSION_TOKEN`
//! - `STREAMS_KEY_MANAGER_TOKEN`
//! - `STREAMS_TIMEOUT_MS`
//! - `STREAMS_PAGE_SIZE`

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default pod base URL
pub const DEFAULT_POD_URL: &str = "https://localhost:8443";

/// Default number of streams requested per listing page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Pod section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PodToml {
    /// Pod base URL
    pub url: Option<String>,

    /// Session token sent with every request
    pub session_token: Option<String>,

    /// Key manager token sent with every request
    pub key_manager_token: Option<String>,

    /// Per-request timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

/// Listing section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingToml {
    /// Streams requested per page
    pub page_size: Option<usize>,

    /// Whether operator listings include inactive streams
    pub include_inactive: Option<bool>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamsToml {
    /// Pod configuration section
    pub pod: PodToml,

    /// Listing configuration section
    pub listing: ListingToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved pod connection settings
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone)]
pub struct PodConfig {
    /// Pod base URL
    pub pod_url: String,

    /// Session token
    pub session_token: Option<String>,

    /// Key manager token
    pub key_manager_token: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,

    /// Streams requested per listing page
    pub page_size: usize,

    /// Whether operator listings include inactive streams
    pub include_inactive: bool,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl std::fmt::Debug for PodConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PodConfig")
            .field("pod_url", &self.pod_url)
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .field(
                "key_manager_token",
                &self.key_manager_token.as_ref().map(|_| "***"),
            )
            .field("timeout", &self.timeout)
            .field("page_size", &self.page_size)
            .field("include_inactive", &self.include_inactive)
            .field("config_file_path", &self.config_file_path)
            .field("source", &self.source)
            .finish()
    }
}

impl Default for PodConfig {
    fn default() -> Self {
        Self {
            pod_url: DEFAULT_POD_URL.to_string(),
            session_token: None,
            key_manager_token: None,
            timeout: DEFAULT_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
            include_inactive: false,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl PodConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration pointing at a pod URL
    #[must_use]
    pub fn for_pod(pod_url: impl Into<String>) -> Self {
        Self {
            pod_url: pod_url.into(),
            ..Self::default()
        }
    }

    /// Set the session token
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Set the listing page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check the configuration for values the connection cannot work with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for an empty pod URL or a zero
    /// page size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pod_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "pod URL must not be empty".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "page size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/pod-streams/streams.toml` or
/// `~/.config/pod-streams/streams.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("pod-streams").join("streams.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<PodConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<PodConfig, ConfigError> {
    let mut config = load_file_config(path)?;

    // Environment overrides file values
    apply_env_config(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Load defaults and file values, without environment overrides
fn load_file_config(path: Option<PathBuf>) -> Result<PodConfig, ConfigError> {
    let mut config = PodConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: StreamsToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut PodConfig, toml: &StreamsToml) {
    if let Some(ref url) = toml.pod.url {
        config.pod_url.clone_from(url);
    }
    if toml.pod.session_token.is_some() {
        config.session_token.clone_from(&toml.pod.session_token);
    }
    if toml.pod.key_manager_token.is_some() {
        config
            .key_manager_token
            .clone_from(&toml.pod.key_manager_token);
    }
    if let Some(timeout) = toml.pod.timeout_ms {
        config.timeout = Duration::from_millis(timeout);
    }

    if let Some(page_size) = toml.listing.page_size {
        config.page_size = page_size;
    }
    if let Some(include) = toml.listing.include_inactive {
        config.include_inactive = include;
    }
}

/// Apply environment variable overrides to the config
///
/// `lookup` resolves a variable name to its value.
fn apply_env_config(config: &mut PodConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("STREAMS_POD_URL") {
        config.pod_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(token) = lookup("STREAMS_SESSION_TOKEN") {
        config.session_token = Some(token);
        config.source = ConfigSource::Env;
    }
    if let Some(token) = lookup("STREAMS_KEY_MANAGER_TOKEN") {
        config.key_manager_token = Some(token);
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = lookup("STREAMS_TIMEOUT_MS") {
        if let Ok(ms) = timeout.parse::<u64>() {
            config.timeout = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        } else {
            tracing::warn!(value = %timeout, "Ignoring unparseable STREAMS_TIMEOUT_MS");
        }
    }
    if let Some(page_size) = lookup("STREAMS_PAGE_SIZE") {
        if let Ok(n) = page_size.parse::<usize>() {
            config.page_size = n;
            config.source = ConfigSource::Env;
        } else {
            tracing::warn!(value = %page_size, "Ignoring unparseable STREAMS_PAGE_SIZE");
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Pod URL override
    pub pod_url: Option<String>,

    /// Session token override
    pub session_token: Option<String>,

    /// Timeout override (milliseconds)
    pub timeout_ms: Option<u64>,

    /// Page size override
    pub page_size: Option<usize>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set pod URL override
    #[must_use]
    pub fn with_pod_url(mut self, url: String) -> Self {
        self.pod_url = Some(url);
        self
    }

    /// Set session token override
    #[must_use]
    pub fn with_session_token(mut self, token: String) -> Self {
        self.session_token = Some(token);
        self
    }

    /// Set timeout override
    #[must_use]
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    /// Set page size override
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut PodConfig) {
        if self.pod_url.is_some()
            || self.session_token.is_some()
            || self.timeout_ms.is_some()
            || self.page_size.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.pod_url {
            config.pod_url.clone_from(url);
        }

        if self.session_token.is_some() {
            config.session_token.clone_from(&self.session_token);
        }

        if let Some(timeout) = self.timeout_ms {
            config.timeout = Duration::from_millis(timeout);
        }

        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
