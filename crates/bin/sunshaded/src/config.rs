//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `sunshade.toml` in the working directory, or the file named by
//! `SUNSHADE_CONFIG`. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use sunshade_app::coordinator::{DEFAULT_SEASON_ENTITY, DEFAULT_SUN_ENTITY, EnvironmentSources};
use sunshade_domain::config::{CoverConfig, GlobalConfig};
use sunshade_domain::error::ValidationError;
use sunshade_domain::id::InstallationId;
use sunshade_domain::runtime::EntryData;
use sunshade_domain::state::StateSnapshot;

const DEFAULT_CONFIG_PATH: &str = "sunshade.toml";
const DEFAULT_INSTALLATION_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Tick loop settings.
    pub scheduler: SchedulerConfig,
    /// Host entities shared by every cover.
    pub sources: SourcesConfig,
    /// Identity of this installation.
    pub installation: InstallationConfig,
    /// Installation-wide controller settings.
    pub global: GlobalConfig,
    /// Managed covers.
    pub covers: Vec<CoverSection>,
    /// Virtual host settings.
    #[serde(rename = "virtual")]
    pub virtual_host: VirtualConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between two ticks.
    pub interval_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub sun_entity: String,
    pub season_entity: String,
}

/// Persisted automation flags are keyed by this id, so it must stay stable
/// across restarts.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct InstallationConfig {
    pub id: String,
}

/// One `[[covers]]` table. Unset fields take the controller defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CoverSection {
    pub cover_id: String,
    pub temp_sensor: String,
    pub window_azimuth: Option<f64>,
    pub fov_half: Option<f64>,
    pub default_day: Option<u8>,
    pub min_day: Option<u8>,
    pub max_day: Option<u8>,
    pub default_night: Option<u8>,
    pub t_min: Option<f64>,
    pub t_max: Option<f64>,
    pub min_delta_position: Option<u8>,
    pub min_delta_time_secs: Option<u32>,
    pub invert_position: bool,
    pub debug: bool,
}

/// Seed data for the virtual host.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VirtualConfig {
    /// Seed the demo entities, plus a demo cover when none is configured.
    pub demo: bool,
    /// Extra entity records, applied after the demo ones.
    pub states: Vec<SeedState>,
}

#[derive(Debug, Deserialize)]
pub struct SeedState {
    pub entity_id: String,
    #[serde(flatten)]
    pub snapshot: StateSnapshot,
}

impl Config {
    /// Load configuration from `sunshade.toml` (or `SUNSHADE_CONFIG`) if
    /// present, then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("SUNSHADE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SUNSHADE_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("SUNSHADE_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("SUNSHADE_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("SUNSHADE_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("SUNSHADE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.scheduler.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "scheduler interval must be non-zero".to_string(),
            ));
        }
        self.installation_id()?;
        self.entry_data()?;
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.interval_secs)
    }

    #[must_use]
    pub fn sources(&self) -> EnvironmentSources {
        EnvironmentSources {
            sun_entity: self.sources.sun_entity.clone(),
            season_entity: self.sources.season_entity.clone(),
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when the id is not a UUID.
    pub fn installation_id(&self) -> Result<InstallationId, ConfigError> {
        InstallationId::from_str(&self.installation.id).map_err(|err| {
            ConfigError::Validation(format!("installation id {:?}: {err}", self.installation.id))
        })
    }

    /// Validated global settings and cover configs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a cover or the global settings
    /// break an invariant, or two covers share an id.
    pub fn entry_data(&self) -> Result<EntryData, ConfigError> {
        let mut covers = self
            .covers
            .iter()
            .map(CoverSection::build)
            .collect::<Result<Vec<_>, _>>()?;
        if covers.is_empty() && self.virtual_host.demo {
            covers.push(demo_cover()?);
        }
        Ok(EntryData::new(self.global.clone(), covers)?)
    }

    /// Entity records the virtual host starts with.
    #[must_use]
    pub fn seed_states(&self) -> HashMap<String, StateSnapshot> {
        self.virtual_host
            .states
            .iter()
            .map(|seed| (seed.entity_id.clone(), seed.snapshot.clone()))
            .collect()
    }
}

impl CoverSection {
    fn build(&self) -> Result<CoverConfig, ValidationError> {
        let mut builder = CoverConfig::builder()
            .cover_id(self.cover_id.as_str())
            .temp_sensor(self.temp_sensor.as_str())
            .invert_position(self.invert_position)
            .debug(self.debug);
        if let Some(value) = self.window_azimuth {
            builder = builder.window_azimuth(value);
        }
        if let Some(value) = self.fov_half {
            builder = builder.fov_half(value);
        }
        if let Some(value) = self.default_day {
            builder = builder.default_day(value);
        }
        if let Some(value) = self.min_day {
            builder = builder.min_day(value);
        }
        if let Some(value) = self.max_day {
            builder = builder.max_day(value);
        }
        if let Some(value) = self.default_night {
            builder = builder.default_night(value);
        }
        if let Some(value) = self.t_min {
            builder = builder.t_min(value);
        }
        if let Some(value) = self.t_max {
            builder = builder.t_max(value);
        }
        if let Some(value) = self.min_delta_position {
            builder = builder.min_delta_position(value);
        }
        if let Some(value) = self.min_delta_time_secs {
            builder = builder.min_delta_time_secs(value);
        }
        builder.build()
    }
}

/// Matches the cover seeded by `VirtualHost::demo`.
fn demo_cover() -> Result<CoverConfig, ValidationError> {
    CoverConfig::builder()
        .cover_id("cover.living_room")
        .temp_sensor("sensor.living_room_temperature")
        .window_azimuth(180.0)
        .build()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:sunshade.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "sunshaded=info,sunshade=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            sun_entity: DEFAULT_SUN_ENTITY.to_string(),
            season_entity: DEFAULT_SEASON_ENTITY.to_string(),
        }
    }
}

impl Default for InstallationConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_INSTALLATION_ID.to_string(),
        }
    }
}

impl Default for VirtualConfig {
    fn default() -> Self {
        Self {
            demo: true,
            states: Vec::new(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// A controller setting breaks an invariant.
    #[error("invalid controller settings: {0}")]
    Invalid(#[from] ValidationError),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
