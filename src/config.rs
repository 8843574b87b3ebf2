//! Configuration management for the `SunRide` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::SunRideError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `SunRide` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SunRideConfig {
    /// Weather endpoint configuration
    pub weather: WeatherConfig,
    /// Request batching configuration
    pub batch: BatchConfig,
    /// Forecast point generation defaults
    pub route: RouteConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// HTTP server configuration
    pub server: ServerConfig,
}

/// Weather endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the weather endpoint
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Per-attempt timeout in milliseconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_ms: u64,
    /// Retries after a timeout or network error
    #[serde(default = "default_weather_max_retries")]
    pub max_retries: u32,
    /// Delay between retries in milliseconds
    #[serde(default = "default_weather_retry_delay")]
    pub retry_delay_ms: u64,
    /// Random spread of the retry delay (0 disables jitter)
    #[serde(default)]
    pub retry_jitter: f64,
}

/// Request batching settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of concurrent requests per batch
    #[serde(default = "default_batch_size")]
    pub size: usize,
    /// Pause between batches in milliseconds
    #[serde(default = "default_batch_delay")]
    pub delay_ms: u64,
}

/// Forecast point generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Distance between forecast points in kilometers
    #[serde(default = "default_interval")]
    pub interval_km: f64,
    /// Assumed riding speed in km/h
    #[serde(default = "default_average_speed")]
    pub average_speed_kmh: f64,
    /// Upper bound of forecast points per route
    #[serde(default = "default_max_points")]
    pub max_points: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions
fn default_weather_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_weather_timeout() -> u64 {
    10_000
}

fn default_weather_max_retries() -> u32 {
    3
}

fn default_weather_retry_delay() -> u64 {
    1000
}

fn default_batch_size() -> usize {
    5
}

fn default_batch_delay() -> u64 {
    500
}

fn default_interval() -> f64 {
    5.0
}

fn default_average_speed() -> f64 {
    25.0
}

fn default_max_points() -> usize {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timeout_ms: default_weather_timeout(),
            max_retries: default_weather_max_retries(),
            retry_delay_ms: default_weather_retry_delay(),
            retry_jitter: 0.0,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: default_batch_size(),
            delay_ms: default_batch_delay(),
        }
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            interval_km: default_interval(),
            average_speed_kmh: default_average_speed(),
            max_points: default_max_points(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl SunRideConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. SUNRIDE__WEATHER__BASE_URL
        builder = builder.add_source(
            Environment::with_prefix("SUNRIDE")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: SunRideConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sunride").join("config.toml"))
    }

    /// Replace empty string settings with their defaults
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_ms == 0 || self.weather.timeout_ms > 300_000 {
            return Err(SunRideError::config(
                "Weather timeout must be between 1 ms and 300 seconds",
            )
            .into());
        }

        if self.weather.max_retries > 10 {
            return Err(SunRideError::config("Weather max retries cannot exceed 10").into());
        }

        if !(0.0..=1.0).contains(&self.weather.retry_jitter) {
            return Err(SunRideError::config("Retry jitter must be between 0 and 1").into());
        }

        if self.batch.size == 0 || self.batch.size > 50 {
            return Err(SunRideError::config("Batch size must be between 1 and 50").into());
        }

        if self.batch.delay_ms > 60_000 {
            return Err(SunRideError::config("Batch delay cannot exceed 60 seconds").into());
        }

        if self.route.interval_km.is_nan() || self.route.interval_km <= 0.0 {
            return Err(SunRideError::config("Forecast interval must be positive").into());
        }

        if self.route.average_speed_kmh.is_nan() || self.route.average_speed_kmh <= 0.0 {
            return Err(SunRideError::config("Average speed must be positive").into());
        }

        if self.route.max_points == 0 {
            return Err(SunRideError::config("Maximum forecast points must be at least 1").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SunRideError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SunRideError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.weather.base_url.starts_with("http://")
            && !self.weather.base_url.starts_with("https://")
        {
            return Err(SunRideError::config(
                "Weather base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }
}
