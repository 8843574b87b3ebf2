//! Data models for the SunRide application
//!
//! This module contains the core domain models organized by concern:
//! - Point: Forecast points along a route and coordinate checks
//! - Route: GPX track points and route summaries
//! - Weather: Weather payloads returned by the upstream provider
//! - Forecast: The assembled weather forecast for a whole route

pub mod forecast;
pub mod point;
pub mod route;
pub mod weather;

// Re-export all public types for convenient access
pub use forecast::{PointOutcome, PointWeather, RouteForecast};
pub use point::ForecastPoint;
pub use route::{ParsedRoute, RouteSummary, TrackPoint};
pub use weather::WeatherData;
