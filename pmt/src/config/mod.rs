//! Configuration system for the `pmt` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/pmt/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::api::client::DEFAULT_API_URL;
use crate::net::NetConfig;
use crate::session::{SessionError, default_session_path};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// The backend URL is not a valid absolute URL.
    #[error("invalid API URL {url:?}: {source}")]
    InvalidUrl {
        /// URL as configured.
        url: String,
        /// Parse failure.
        source: url::ParseError,
    },
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    api: ApiFileConfig,
    session: SessionFileConfig,
    ui: UiFileConfig,
}

/// `[api]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ApiFileConfig {
    url: Option<String>,
    request_timeout_secs: Option<u64>,
    channel_capacity: Option<usize>,
}

/// `[session]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    file: Option<PathBuf>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
    date_format: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- API --
    /// Backend base URL.
    pub api_url: String,
    /// Per-request timeout; `None` keeps the transport default.
    pub request_timeout: Option<Duration>,
    /// Channel capacity for command/event mpsc channels.
    pub channel_capacity: usize,

    // -- Session --
    /// Persistent session file; `None` means the platform default.
    pub session_file: Option<PathBuf>,

    // -- UI --
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,
    /// Date display format string (chrono).
    pub date_format: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: None,
            channel_capacity: 256,
            session_file: None,
            poll_timeout: Duration::from_millis(50),
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// Otherwise the default path (`~/.config/pmt/config.toml`) is tried and
    /// silently ignored if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Priority: CLI > file > default. Kept apart from `load()` so tests
    /// need no CLI parsing.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            api_url: cli
                .api_url
                .clone()
                .or_else(|| file.api.url.clone())
                .unwrap_or(defaults.api_url),
            request_timeout: file
                .api
                .request_timeout_secs
                .map(Duration::from_secs)
                .or(defaults.request_timeout),
            channel_capacity: file
                .api
                .channel_capacity
                .unwrap_or(defaults.channel_capacity),
            session_file: cli
                .session_file
                .clone()
                .or_else(|| file.session.file.clone()),
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
            date_format: file
                .ui
                .date_format
                .clone()
                .unwrap_or(defaults.date_format),
        }
    }

    /// Build the [`NetConfig`] for the network coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if `api_url` does not parse.
    pub fn to_net_config(&self) -> Result<NetConfig, ConfigError> {
        let api_url = Url::parse(&self.api_url).map_err(|source| ConfigError::InvalidUrl {
            url: self.api_url.clone(),
            source,
        })?;
        Ok(NetConfig {
            api_url,
            request_timeout: self.request_timeout,
            channel_capacity: self.channel_capacity,
        })
    }

    /// Path of the persistent session file.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoDataDir`] if no file is configured and the
    /// platform data directory is unknown.
    pub fn session_path(&self) -> Result<PathBuf, SessionError> {
        self.session_file
            .clone()
            .map_or_else(default_session_path, Ok)
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Terminal kanban client for the PMT project manager")]
pub struct CliArgs {
    /// Base URL of the PMT backend.
    #[arg(long, env = "PMT_API_URL")]
    pub api_url: Option<String>,

    /// Path to config file (default: `~/.config/pmt/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Session file (default: `<data_dir>/pmt/session.json`).
    #[arg(long)]
    pub session_file: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "PMT_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/pmt.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("pmt").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.channel_capacity, 256);
        assert_eq!(config.session_file, None);
        assert_eq!(config.poll_timeout, Duration::from_millis(50));
        assert_eq!(config.date_format, "%Y-%m-%d");
    }

    #[test]
    fn toml_parsing_full() {
        let toml_str = r#"
[api]
url = "http://pmt.example.com:9000"
request_timeout_secs = 15
channel_capacity = 64

[session]
file = "/var/lib/pmt/session.json"

[ui]
poll_timeout_ms = 100
date_format = "%d/%m/%Y"
"#;
        let file: ConfigFile = toml::from_str(toml_str).unwrap();
        let config = ClientConfig::resolve(&CliArgs::default(), &file);

        assert_eq!(config.api_url, "http://pmt.example.com:9000");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.channel_capacity, 64);
        assert_eq!(
            config.session_file.as_deref(),
            Some(std::path::Path::new("/var/lib/pmt/session.json"))
        );
        assert_eq!(config.poll_timeout, Duration::from_millis(100));
        assert_eq!(config.date_format, "%d/%m/%Y");
    }

    #[test]
    fn toml_parsing_partial() {
        let file: ConfigFile = toml::from_str("[ui]\npoll_timeout_ms = 20\n").unwrap();
        let config = ClientConfig::resolve(&CliArgs::default(), &file);

        assert_eq!(config.poll_timeout, Duration::from_millis(20));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.channel_capacity, 256);
    }

    #[test]
    fn cli_overrides_file() {
        let toml_str = r#"
[api]
url = "http://file:8080"

[session]
file = "/from/file.json"
"#;
        let file: ConfigFile = toml::from_str(toml_str).unwrap();
        let cli = CliArgs {
            api_url: Some("http://cli:8080".to_string()),
            session_file: None,
            ..Default::default()
        };
        let config = ClientConfig::resolve(&cli, &file);

        assert_eq!(config.api_url, "http://cli:8080");
        assert_eq!(
            config.session_file.as_deref(),
            Some(std::path::Path::new("/from/file.json"))
        );
    }

    #[test]
    fn wrong_value_type_is_a_parse_error() {
        assert!(toml::from_str::<ConfigFile>("[api]\nurl = 3\n").is_err());
        assert!(toml::from_str::<ConfigFile>("").is_ok());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        assert!(load_config_file(None).is_ok());
    }

    #[test]
    fn explicit_missing_config_file_returns_error() {
        let result = load_config_file(Some(std::path::Path::new("/nonexistent/config.toml")));
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn to_net_config_parses_the_url() {
        let config = ClientConfig {
            api_url: "http://localhost:9999".to_string(),
            request_timeout: Some(Duration::from_secs(3)),
            ..Default::default()
        };
        let net = config.to_net_config().unwrap();
        assert_eq!(net.api_url.as_str(), "http://localhost:9999/");
        assert_eq!(net.request_timeout, Some(Duration::from_secs(3)));
        assert_eq!(net.channel_capacity, 256);
    }

    #[test]
    fn to_net_config_rejects_a_relative_url() {
        let config = ClientConfig {
            api_url: "localhost".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.to_net_config(),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn configured_session_file_wins() {
        let config = ClientConfig {
            session_file: Some(PathBuf::from("/tmp/s.json")),
            ..Default::default()
        };
        assert_eq!(config.session_path().unwrap(), PathBuf::from("/tmp/s.json"));
    }
}
