//! `SunRide` - Route weather planning for cyclists
//!
//! This library turns a GPX route into forecast points along the way and
//! fetches weather for each of them from an upstream weather endpoint, in
//! rate-friendly batches with per-point retries.

pub mod api;
pub mod config;
pub mod error;
pub mod forecast;
pub mod gpx;
pub mod logging;
pub mod models;
pub mod sampling;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::SunRideConfig;
pub use error::SunRideError;
pub use forecast::{RouteForecastService, RouteOptions};
pub use models::{ForecastPoint, PointOutcome, PointWeather, RouteForecast, WeatherData};
pub use weather::{ApiConfig, BatchPolicy, FetchError, WeatherClient, fetch_weather_for_points};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SunRideError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
