//! Forecast point model and coordinate validation

use serde::{Deserialize, Serialize};

/// A resampled location/time pair along a route at which weather is requested
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
    /// Expected arrival time at this point (unix seconds)
    pub timestamp: i64,
    /// Distance from the start of the route in kilometers
    pub distance: f64,
}

impl ForecastPoint {
    /// Create a new forecast point
    #[must_use]
    pub fn new(lat: f64, lon: f64, timestamp: i64, distance: f64) -> Self {
        Self {
            lat,
            lon,
            timestamp,
            distance,
        }
    }

    /// Whether this point may be sent to the weather provider
    #[must_use]
    pub fn is_valid(&self) -> bool {
        coordinate_problem(self.lat, self.lon).is_none()
    }

    /// Format point as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Describe what is wrong with a coordinate pair, if anything
pub(crate) fn coordinate_problem(lat: f64, lon: f64) -> Option<String> {
    if !lat.is_finite() || !lon.is_finite() {
        return Some(format!("coordinates must be finite numbers, got: {lat}, {lon}"));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Some(format!("latitude must be between -90 and 90, got: {lat}"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Some(format!("longitude must be between -180 and 180, got: {lon}"));
    }
    None
}
