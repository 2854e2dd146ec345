//! # Configuration Management
//!
//! The board serves one platform at one location, so every installation
//! constant is compiled into [`Config::default`]. A `subway-config.toml` next to
//! the binary may override them; a missing or unreadable file is not an error.
//! A file named explicitly with `--config` goes through [`Config::from_path`]
//! instead, which refuses to fall back.
//!
//! API keys never live in the file. They come from the environment via
//! [`Secrets::from_env`], and the process refuses to start without them.

use crate::error::ConfigError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "subway-config.toml";

/// Environment variable carrying the transit feed API key
pub const TRANSIT_KEY_VAR: &str = "MTA_API_KEY";

/// Environment variable carrying the weather service API key
pub const WEATHER_KEY_VAR: &str = "OPENWEATHER_API_KEY";

/// Largest accepted grid side; far beyond any chained matrix panel
pub const MAX_DISPLAY_SIDE: u32 = 4096;

/// Application configuration
///
/// Every section and field falls back to its compiled-in default, so an
/// override file only needs the values it changes.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Real-time transit feed settings
    pub transit: TransitConfig,
    /// Weather service settings
    pub weather: WeatherConfig,
    /// LED matrix and render cadence
    pub display: DisplayConfig,
    /// Shared HTTP client settings
    pub http: HttpConfig,
}

/// Transit feed and monitored platform
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransitConfig {
    /// GTFS-realtime feed URL (e.g. the A/C/E feed)
    pub endpoint: String,
    /// Stop id of the platform shown on the board (e.g. "A42N")
    pub stop_id: String,
    /// Stop id of the opposite-direction platform at the same station
    pub opposite_stop_id: String,
    /// Seconds between feed polls
    pub refresh_secs: u64,
}

/// Weather service location and cadence
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Current-conditions endpoint
    pub endpoint: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Unit system requested from the service ("metric" gives °C)
    pub units: String,
    /// Seconds between weather polls
    pub refresh_secs: u64,
}

/// Matrix geometry and render loop timing
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub rows: u32,
    pub cols: u32,
    /// Seconds between repaints
    pub render_secs: u64,
    /// Seconds to wait before the first paint so the first fetches can land
    pub grace_secs: u64,
    /// Directory holding `a_train.png` and the condition icons
    pub asset_dir: PathBuf,
    /// IANA zone the countdowns are computed in
    pub time_zone: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TransitConfig {
    fn default() -> Self {
        TransitConfig {
            endpoint: "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-ace"
                .to_string(),
            stop_id: "A42N".to_string(),          // Hoyt-Schermerhorn, northbound
            opposite_stop_id: "A42S".to_string(), // Hoyt-Schermerhorn, southbound
            refresh_secs: 60,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        WeatherConfig {
            endpoint: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            latitude: 40.688986,
            longitude: -73.9861586,
            units: "metric".to_string(),
            refresh_secs: 300,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            rows: 32,
            cols: 64,
            render_secs: 30,
            grace_secs: 2,
            asset_dir: PathBuf::from("./img"),
            time_zone: "America/New_York".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig { timeout_secs: 20 }
    }
}

impl Config {
    /// Load configuration from subway-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from a file the operator named explicitly.
    ///
    /// Unlike [`Config::load_from_path`] there is no fallback: an unreadable or
    /// malformed file is a [`ConfigError::Invalid`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            ConfigError::Invalid(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = toml::from_str::<Config>(&contents)
            .map_err(|e| ConfigError::Invalid(format!("{}: {}", path.display(), e)))?;
        log::info!(
            "Loaded configuration for stop {} from {}",
            config.transit.stop_id,
            path.display()
        );
        Ok(config)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    log::info!(
                        "Loaded configuration for stop {} from {}",
                        config.transit.stop_id,
                        path.as_ref().display()
                    );
                    config
                }
                Err(e) => {
                    log::warn!("Invalid config file format: {}", e);
                    log::warn!("Using compiled-in configuration");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No config file found, using compiled-in configuration");
                Self::default()
            }
        }
    }

    /// Reject values that would stall a loop or produce an empty canvas.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cadences = [
            ("transit.refresh_secs", self.transit.refresh_secs),
            ("weather.refresh_secs", self.weather.refresh_secs),
            ("display.render_secs", self.display.render_secs),
        ];
        for (name, secs) in cadences {
            if secs == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be at least 1")));
            }
        }
        let sides = 1..=MAX_DISPLAY_SIDE;
        if !sides.contains(&self.display.rows) || !sides.contains(&self.display.cols) {
            return Err(ConfigError::Invalid(format!(
                "display must be between 1x1 and {MAX_DISPLAY_SIDE}x{MAX_DISPLAY_SIDE}, got {}x{}",
                self.display.cols, self.display.rows
            )));
        }
        self.time_zone()?;
        Ok(())
    }

    /// Parsed target time zone.
    pub fn time_zone(&self) -> Result<Tz, ConfigError> {
        self.display
            .time_zone
            .parse::<Tz>()
            .map_err(|_| ConfigError::Invalid(format!("unknown time zone {}", self.display.time_zone)))
    }

    pub fn transit_cadence(&self) -> Duration {
        Duration::from_secs(self.transit.refresh_secs)
    }

    pub fn weather_cadence(&self) -> Duration {
        Duration::from_secs(self.weather.refresh_secs)
    }

    pub fn render_cadence(&self) -> Duration {
        Duration::from_secs(self.display.render_secs)
    }

    pub fn render_grace(&self) -> Duration {
        Duration::from_secs(self.display.grace_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}

/// API keys for the two upstream services.
#[derive(Clone)]
pub struct Secrets {
    pub transit_api_key: String,
    pub weather_api_key: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("transit_api_key", &"<redacted>")
            .field("weather_api_key", &"<redacted>")
            .finish()
    }
}

impl Secrets {
    /// Read both keys from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read both keys through `lookup`; unset and empty values are both missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::MissingSecret(name))
        };
        Ok(Secrets {
            transit_api_key: require(TRANSIT_KEY_VAR)?,
            weather_api_key: require(WEATHER_KEY_VAR)?,
        })
    }
}
