//! Batch Scheduler: fan out weather requests in fixed-size groups
//!
//! Points are split into consecutive batches. All requests of a batch run
//! concurrently and the whole batch settles before the scheduler pauses and
//! moves on, so at most `batch_size` requests are ever in flight.

use std::time::Duration;

use futures::future::join_all;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use super::client::{ApiConfig, WeatherClient};
use crate::config::BatchConfig;
use crate::models::{ForecastPoint, PointWeather, WeatherData};

/// Admission policy for the upstream weather endpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchPolicy {
    /// Requests issued together per batch
    pub batch_size: usize,
    /// Pause between two batches
    pub delay: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: 5,
            delay: Duration::from_millis(500),
        }
    }
}

impl From<&BatchConfig> for BatchPolicy {
    fn from(config: &BatchConfig) -> Self {
        Self {
            batch_size: config.size,
            delay: Duration::from_millis(config.delay_ms),
        }
    }
}

impl WeatherClient {
    /// Weather outcome for every point, in input order
    ///
    /// Never fails: each point's error is kept in its own slot.
    #[instrument(skip_all, fields(points = points.len()))]
    pub async fn fetch_outcomes(&self, points: &[ForecastPoint]) -> Vec<PointWeather> {
        if points.is_empty() {
            return Vec::new();
        }

        let batch_size = self.policy.batch_size.max(1);
        let batch_count = points.len().div_ceil(batch_size);
        let mut outcomes = Vec::with_capacity(points.len());

        for (batch_index, batch) in points.chunks(batch_size).enumerate() {
            if batch_index > 0 {
                debug!(
                    "Waiting {}ms before next batch",
                    self.policy.delay.as_millis()
                );
                sleep(self.policy.delay).await;
            }

            debug!(
                "Fetching batch {}/{} ({} points)",
                batch_index + 1,
                batch_count,
                batch.len()
            );

            // join_all yields in input order, whatever the completion order
            let settled = join_all(batch.iter().map(|point| async move {
                PointWeather {
                    point: *point,
                    outcome: self.fetch_point(point).await.into(),
                }
            }))
            .await;
            outcomes.extend(settled);
        }

        let available = outcomes
            .iter()
            .filter(|p| p.outcome.weather().is_some())
            .count();
        if available == 0 {
            warn!(
                "No weather available for any of {} points; upstream may be down",
                points.len()
            );
        } else {
            info!(
                "Fetched weather for {}/{} points in {} batches",
                available,
                points.len(),
                batch_count
            );
        }

        outcomes
    }

    /// Weather for every point in input order, `None` where it could not be fetched
    pub async fn fetch_weather_for_points(
        &self,
        points: &[ForecastPoint],
    ) -> Vec<Option<WeatherData>> {
        self.fetch_outcomes(points)
            .await
            .into_iter()
            .map(|p| p.outcome.into_weather())
            .collect()
    }
}

/// One-shot helper: fetch over HTTP with the default batch policy
pub async fn fetch_weather_for_points(
    points: &[ForecastPoint],
    config: ApiConfig,
) -> Vec<Option<WeatherData>> {
    match WeatherClient::new(config, BatchPolicy::default()) {
        Ok(client) => client.fetch_weather_for_points(points).await,
        Err(e) => {
            error!("Could not create weather client: {:#}", e);
            vec![None; points.len()]
        }
    }
}
