//! Route Forecast Module
//!
//! Combines GPX parsing, forecast point generation and batched weather
//! retrieval into a single weather forecast for a whole route.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::Result;
use crate::config::{RouteConfig, SunRideConfig};
use crate::gpx::parse_gpx;
use crate::models::{ParsedRoute, RouteForecast, RouteSummary};
use crate::sampling::{SamplingOptions, generate_forecast_points};
use crate::weather::{ApiConfig, BatchPolicy, WeatherClient};

/// Per-request overrides of the configured route defaults
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    /// Departure time; defaults to now
    pub start_time: Option<DateTime<Utc>>,
    pub average_speed_kmh: Option<f64>,
    pub interval_km: Option<f64>,
}

/// Route forecast service
pub struct RouteForecastService {
    client: Arc<WeatherClient>,
    defaults: RouteConfig,
}

impl RouteForecastService {
    #[must_use]
    pub fn new(client: Arc<WeatherClient>, defaults: RouteConfig) -> Self {
        Self { client, defaults }
    }

    /// Build the service with an HTTP weather client from configuration
    pub fn from_config(config: &SunRideConfig) -> anyhow::Result<Self> {
        let client = WeatherClient::new(
            ApiConfig::from(&config.weather),
            BatchPolicy::from(&config.batch),
        )?;
        Ok(Self::new(Arc::new(client), config.route.clone()))
    }

    #[must_use]
    pub fn client(&self) -> &Arc<WeatherClient> {
        &self.client
    }

    /// Upper bound of forecast points accepted per request
    #[must_use]
    pub fn max_points(&self) -> usize {
        self.defaults.max_points
    }

    fn sampling_options(&self, options: &RouteOptions) -> SamplingOptions {
        let mut sampling =
            SamplingOptions::from_config(&self.defaults, options.start_time.unwrap_or_else(Utc::now));
        if let Some(speed) = options.average_speed_kmh {
            sampling.average_speed_kmh = speed;
        }
        if let Some(interval) = options.interval_km {
            sampling.interval_km = interval;
        }
        sampling
    }

    /// Generate the weather forecast for an uploaded GPX document
    #[instrument(skip(self, gpx), fields(bytes = gpx.len()))]
    pub async fn forecast_gpx(&self, gpx: &[u8], options: RouteOptions) -> Result<RouteForecast> {
        let route = parse_gpx(gpx)?;
        self.forecast_route(&route, options).await
    }

    /// Generate the weather forecast for a GPX file on disk
    pub async fn forecast_gpx_file(
        &self,
        path: &Path,
        options: RouteOptions,
    ) -> Result<RouteForecast> {
        let gpx = std::fs::read(path)?;
        self.forecast_gpx(&gpx, options).await
    }

    /// Generate the weather forecast for an already parsed route
    pub async fn forecast_route(
        &self,
        route: &ParsedRoute,
        options: RouteOptions,
    ) -> Result<RouteForecast> {
        let sampling = self.sampling_options(&options);
        let points = generate_forecast_points(route, &sampling)?;
        info!(
            "Requesting weather for {} forecast points along '{}'",
            points.len(),
            route.name.as_deref().unwrap_or("unnamed route")
        );

        let total_distance_km = points.last().map_or(0.0, |p| p.distance);
        let summary = RouteSummary {
            name: route.name.clone(),
            total_distance_km,
            track_points: route.points.len(),
            forecast_points: points.len(),
            start_time: sampling.start_time,
            estimated_finish: sampling.arrival_time(total_distance_km)?,
        };

        let outcomes = self.client.fetch_outcomes(&points).await;
        Ok(RouteForecast::new(summary, outcomes))
    }
}
