//! Per-point weather outcomes and the assembled route forecast

use serde::Serialize;

use super::{ForecastPoint, RouteSummary, WeatherData};
use crate::weather::FetchError;

/// What happened when weather was requested for one forecast point
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PointOutcome {
    Success { weather: WeatherData },
    Failed { error: FetchError },
}

impl PointOutcome {
    #[must_use]
    pub fn weather(&self) -> Option<&WeatherData> {
        match self {
            PointOutcome::Success { weather } => Some(weather),
            PointOutcome::Failed { .. } => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&FetchError> {
        match self {
            PointOutcome::Success { .. } => None,
            PointOutcome::Failed { error } => Some(error),
        }
    }

    #[must_use]
    pub fn into_weather(self) -> Option<WeatherData> {
        match self {
            PointOutcome::Success { weather } => Some(weather),
            PointOutcome::Failed { .. } => None,
        }
    }
}

impl From<Result<WeatherData, FetchError>> for PointOutcome {
    fn from(result: Result<WeatherData, FetchError>) -> Self {
        match result {
            Ok(weather) => PointOutcome::Success { weather },
            Err(error) => PointOutcome::Failed { error },
        }
    }
}

/// A forecast point together with its weather outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointWeather {
    pub point: ForecastPoint,
    pub outcome: PointOutcome,
}

/// Weather along a whole route, index-aligned with the generated forecast points
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteForecast {
    pub summary: RouteSummary,
    pub points: Vec<PointWeather>,
    pub weather_available: usize,
    pub weather_failed: usize,
}

impl RouteForecast {
    #[must_use]
    pub fn new(summary: RouteSummary, points: Vec<PointWeather>) -> Self {
        let weather_available = points
            .iter()
            .filter(|p| p.outcome.weather().is_some())
            .count();
        let weather_failed = points.len() - weather_available;
        Self {
            summary,
            points,
            weather_available,
            weather_failed,
        }
    }

    /// Every point failed, which usually means the upstream is down rather than a spot failure
    #[must_use]
    pub fn is_total_failure(&self) -> bool {
        !self.points.is_empty() && self.weather_available == 0
    }
}
