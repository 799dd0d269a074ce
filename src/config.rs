use crate::board::Screen;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use time::UtcOffset;
use time::macros::format_description;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const CONFIG_PATH_ENV: &str = "CHARGE_BOARD_CONFIG";
pub const SOURCE_URL_ENV: &str = "CHARGE_BOARD_SOURCE_URL";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_FIXTURE_DIR: &str = "data";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_ROTATION_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_CLOCK_TICK_SECS: u64 = 1;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub source: Option<SourceSection>,
    #[serde(default)]
    pub timing: Option<TimingSection>,
    #[serde(default)]
    pub server: Option<ServerSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceSection {
    /// Absolute http(s) URL or root-relative fixture path
    pub url: Option<String>,
    /// Directory root-relative paths resolve against (default: data)
    pub fixture_dir: Option<PathBuf>,
    /// Upper bound on a single retrieval (default: 10)
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimingSection {
    pub refresh_interval_secs: Option<u64>,
    pub rotation_interval_secs: Option<u64>,
    pub clock_tick_secs: Option<u64>,
    pub initial_screen: Option<Screen>,
    /// Fixed board offset such as "+01:00"; detected from the host if unset
    pub utc_offset: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub refresh_interval: Duration,
    pub rotation_interval: Duration,
    pub clock_tick: Duration,
    pub fetch_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config path from `CHARGE_BOARD_CONFIG`, or the default.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load from `config_path()`.
pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(config_path())
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        let timing = self.timing();
        for (name, value) in [
            ("refresh_interval_secs", timing.refresh_interval),
            ("rotation_interval_secs", timing.rotation_interval),
            ("clock_tick_secs", timing.clock_tick),
            ("timeout_secs", timing.fetch_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
            }
        }
        self.utc_offset()?;
        Ok(())
    }

    /// Source setting from the environment override, then the file. Blank
    /// values count as unset.
    pub fn source_url(&self) -> Option<String> {
        self.source_url_with_override(std::env::var(SOURCE_URL_ENV).ok().as_deref())
    }

    pub fn source_url_with_override(&self, env_value: Option<&str>) -> Option<String> {
        let from_env = env_value.map(str::trim).filter(|value| !value.is_empty());
        let from_file = self
            .source
            .as_ref()
            .and_then(|s| s.url.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty());
        from_env.or(from_file).map(str::to_string)
    }

    pub fn fixture_dir(&self) -> &Path {
        self.source
            .as_ref()
            .and_then(|s| s.fixture_dir.as_deref())
            .unwrap_or(Path::new(DEFAULT_FIXTURE_DIR))
    }

    pub fn timing(&self) -> Timing {
        let timing = self.timing.as_ref();
        let secs = |value: Option<u64>, default: u64| Duration::from_secs(value.unwrap_or(default));
        Timing {
            refresh_interval: secs(
                timing.and_then(|t| t.refresh_interval_secs),
                DEFAULT_REFRESH_INTERVAL_SECS,
            ),
            rotation_interval: secs(
                timing.and_then(|t| t.rotation_interval_secs),
                DEFAULT_ROTATION_INTERVAL_SECS,
            ),
            clock_tick: secs(
                timing.and_then(|t| t.clock_tick_secs),
                DEFAULT_CLOCK_TICK_SECS,
            ),
            fetch_timeout: secs(
                self.source.as_ref().and_then(|s| s.timeout_secs),
                DEFAULT_FETCH_TIMEOUT_SECS,
            ),
        }
    }

    pub fn initial_screen(&self) -> Screen {
        self.timing
            .as_ref()
            .and_then(|t| t.initial_screen)
            .unwrap_or_default()
    }

    /// Configured board offset, `None` when it should be detected.
    pub fn utc_offset(&self) -> Result<Option<UtcOffset>, ConfigError> {
        let Some(raw) = self.timing.as_ref().and_then(|t| t.utc_offset.as_deref()) else {
            return Ok(None);
        };
        let format = format_description!("[offset_hour sign:mandatory]:[offset_minute]");
        UtcOffset::parse(raw.trim(), format)
            .map(Some)
            .map_err(|err| ConfigError::Invalid(format!("utc_offset {raw:?}: {err}")))
    }

    pub fn logging_level(&self) -> &str {
        &self.logging.level
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }
}
