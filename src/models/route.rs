//! Route models: parsed GPX tracks and their summaries

use chrono::{DateTime, Utc};
use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

/// A single recorded or planned point of a GPX track
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    /// Elevation in meters
    pub elevation: Option<f64>,
    pub time: Option<DateTime<Utc>>,
}

impl TrackPoint {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            elevation: None,
            time: None,
        }
    }

    /// Great-circle distance to another point in kilometers
    #[must_use]
    pub fn distance_km(&self, other: &TrackPoint) -> f64 {
        let from = HaversineLocation {
            latitude: self.lat,
            longitude: self.lon,
        };
        let to = HaversineLocation {
            latitude: other.lat,
            longitude: other.lon,
        };
        distance(from, to, Units::Kilometers)
    }
}

/// A route as read from a GPX document
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ParsedRoute {
    pub name: Option<String>,
    pub points: Vec<TrackPoint>,
}

impl ParsedRoute {
    /// Cumulative distance in kilometers at every track point, starting at 0
    #[must_use]
    pub fn cumulative_distances(&self) -> Vec<f64> {
        let mut total = 0.0;
        let mut cumulative = Vec::with_capacity(self.points.len());
        for (i, point) in self.points.iter().enumerate() {
            if i > 0 {
                total += self.points[i - 1].distance_km(point);
            }
            cumulative.push(total);
        }
        cumulative
    }

    /// Total route length in kilometers
    #[must_use]
    pub fn total_distance_km(&self) -> f64 {
        self.cumulative_distances().last().copied().unwrap_or(0.0)
    }
}

/// Headline numbers of an analysed route
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub name: Option<String>,
    pub total_distance_km: f64,
    pub track_points: usize,
    pub forecast_points: usize,
    pub start_time: DateTime<Utc>,
    pub estimated_finish: DateTime<Utc>,
}
