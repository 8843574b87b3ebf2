//! Weather data model as delivered by the upstream weather endpoint

use serde::{Deserialize, Serialize};

/// Weather conditions at a single forecast point
///
/// Field names follow the upstream JSON (`feelsLike`, `windSpeed`, ...). Only
/// `temperature` and `feelsLike` are mandatory; the remaining measurements are
/// optional but must be within their physical ranges when present.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    /// Temperature in Celsius
    pub temperature: f64,
    /// Apparent temperature in Celsius
    pub feels_like: f64,
    /// Relative humidity percentage (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    /// Atmospheric pressure in hPa (800-1200)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    /// Wind speed in m/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_direction: Option<f64>,
    /// Wind gust speed in m/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_gust: Option<f64>,
    /// Precipitation amount in mm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
    /// Precipitation probability percentage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation_probability: Option<f64>,
    /// Cloud cover percentage (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,
    /// Visibility in kilometers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
    /// Human-readable description of weather conditions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Weather condition icon ID from the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl WeatherData {
    /// Minimal payload with only the mandatory fields set
    #[must_use]
    pub fn new(temperature: f64, feels_like: f64) -> Self {
        Self {
            temperature,
            feels_like,
            humidity: None,
            pressure: None,
            wind_speed: None,
            wind_direction: None,
            wind_gust: None,
            precipitation: None,
            precipitation_probability: None,
            cloud_cover: None,
            uv_index: None,
            visibility: None,
            description: None,
            icon: None,
        }
    }

    /// Check every present measurement against its physical range
    pub fn check_ranges(&self) -> Result<(), String> {
        if !self.temperature.is_finite() || !self.feels_like.is_finite() {
            return Err("temperature and feelsLike must be finite numbers".to_string());
        }

        let bounded = [
            ("humidity", self.humidity, 0.0, 100.0),
            ("pressure", self.pressure, 800.0, 1200.0),
            ("windSpeed", self.wind_speed, 0.0, f64::MAX),
            ("windDirection", self.wind_direction, 0.0, 360.0),
            ("cloudCover", self.cloud_cover, 0.0, 100.0),
        ];

        for (field, value, min, max) in bounded {
            if let Some(value) = value {
                if !(min..=max).contains(&value) {
                    return Err(format!("{field} out of range: {value}"));
                }
            }
        }
        Ok(())
    }

    /// Sixteen-point compass name for a bearing in degrees
    #[must_use]
    pub fn wind_direction_to_cardinal(degrees: f64) -> &'static str {
        const POINTS: [&str; 16] = [
            "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
            "NW", "NNW",
        ];
        let sector = (degrees.rem_euclid(360.0) / 22.5).round() as usize % POINTS.len();
        POINTS[sector]
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C (feels {:.1}°C)", self.temperature, self.feels_like)
    }

    /// Format wind information, if the provider reported any
    #[must_use]
    pub fn format_wind(&self) -> Option<String> {
        let speed = self.wind_speed?;
        let direction = self
            .wind_direction
            .map_or("", Self::wind_direction_to_cardinal);
        Some(match self.wind_gust {
            Some(gust) => format!("{speed:.1} m/s {direction} (gusts {gust:.1} m/s)"),
            None => format!("{speed:.1} m/s {direction}"),
        })
    }
}
