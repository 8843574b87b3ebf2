//! Weather endpoint client
//!
//! Fetches weather for single forecast points with a client-side timeout and
//! a bounded retry loop. Only timeouts and network failures are retried; any
//! answer from the server, good or bad, is final.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::RngExt;
use serde::Serialize;
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

use super::FetchError;
use super::batch::BatchPolicy;
use crate::config::WeatherConfig;
use crate::models::{ForecastPoint, WeatherData, point::coordinate_problem};

/// Connection settings for the weather endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Base URL; requests go to `{base_url}/weather`
    pub base_url: String,
    /// Retries after the first attempt for timeouts and network errors
    pub max_retries: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
    /// Client-side limit for one attempt, including reading the body
    pub timeout: Duration,
    /// Random spread applied to `retry_delay`, as a fraction in `[0, 1]`
    pub retry_jitter: f64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            timeout: Duration::from_millis(10_000),
            retry_jitter: 0.0,
        }
    }
}

impl From<&WeatherConfig> for ApiConfig {
    fn from(config: &WeatherConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            timeout: Duration::from_millis(config.timeout_ms),
            retry_jitter: config.retry_jitter,
        }
    }
}

/// JSON body sent to the weather endpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherRequest {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: i64,
}

impl From<&ForecastPoint> for WeatherRequest {
    fn from(point: &ForecastPoint) -> Self {
        Self {
            lat: point.lat,
            lon: point.lon,
            timestamp: point.timestamp,
        }
    }
}

/// Status and body of an answered request
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// The request never got an answer
#[derive(Error, Debug)]
#[error("{0}")]
pub struct TransportError(pub String);

/// One HTTP exchange with the weather endpoint
#[async_trait]
pub trait WeatherTransport: Send + Sync {
    async fn post_weather(
        &self,
        url: &str,
        request: &WeatherRequest,
    ) -> std::result::Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("SunRide/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WeatherTransport for HttpTransport {
    async fn post_weather(
        &self,
        url: &str,
        request: &WeatherRequest,
    ) -> std::result::Result<RawResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError(format!("request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(format!("failed to read response body: {e}")))?;

        Ok(RawResponse { status, body })
    }
}

/// Point Validator: reject points that must never reach the network
pub fn validate_point(point: &ForecastPoint) -> std::result::Result<(), FetchError> {
    match coordinate_problem(point.lat, point.lon) {
        Some(message) => Err(FetchError::Validation { message }),
        None => Ok(()),
    }
}

/// Parse and check a successful response body
pub fn parse_weather(body: &str) -> std::result::Result<WeatherData, FetchError> {
    let weather: WeatherData =
        serde_json::from_str(body).map_err(|e| FetchError::MalformedResponse {
            message: e.to_string(),
        })?;
    weather
        .check_ranges()
        .map_err(|message| FetchError::MalformedResponse { message })?;
    Ok(weather)
}

/// Weather client for the route weather endpoint
///
/// Cheap to share behind an `Arc`; holds no per-request state.
pub struct WeatherClient {
    transport: Arc<dyn WeatherTransport>,
    pub(super) config: ApiConfig,
    pub(super) policy: BatchPolicy,
}

impl WeatherClient {
    /// Create a client talking HTTP to `config.base_url`
    pub fn new(config: ApiConfig, policy: BatchPolicy) -> Result<Self> {
        let transport = HttpTransport::new()?;
        Ok(Self::with_transport(Arc::new(transport), config, policy))
    }

    /// Create a client on top of an existing transport
    #[must_use]
    pub fn with_transport(
        transport: Arc<dyn WeatherTransport>,
        config: ApiConfig,
        policy: BatchPolicy,
    ) -> Self {
        Self {
            transport,
            config,
            policy,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    #[must_use]
    pub fn policy(&self) -> &BatchPolicy {
        &self.policy
    }

    fn weather_url(&self) -> String {
        format!("{}/weather", self.config.base_url.trim_end_matches('/'))
    }

    /// Per-Point Fetcher: weather for one point, retrying transient failures
    #[instrument(skip(self, point), fields(lat = point.lat, lon = point.lon, timestamp = point.timestamp))]
    pub async fn fetch_point(
        &self,
        point: &ForecastPoint,
    ) -> std::result::Result<WeatherData, FetchError> {
        validate_point(point)?;

        let url = self.weather_url();
        let request = WeatherRequest::from(point);
        let max_attempts = self.config.max_retries + 1;
        let request_start = Instant::now();
        let mut attempt = 1;

        loop {
            debug!("Requesting weather (attempt {}/{})", attempt, max_attempts);

            match self.attempt(&url, &request, attempt).await {
                Ok(weather) => {
                    if attempt > 1 {
                        info!(
                            "Weather received in {:.3}s after {} retries",
                            request_start.elapsed().as_secs_f64(),
                            attempt - 1
                        );
                    }
                    return Ok(weather);
                }
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    let delay = self.retry_delay();
                    warn!(
                        "Attempt {} failed ({}), retrying in {:.1}s",
                        attempt,
                        error,
                        delay.as_secs_f64()
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    warn!("Weather fetch failed: {}", error);
                    return Err(error);
                }
            }
        }
    }

    async fn attempt(
        &self,
        url: &str,
        request: &WeatherRequest,
        attempt: u32,
    ) -> std::result::Result<WeatherData, FetchError> {
        let response = match timeout(self.config.timeout, self.transport.post_weather(url, request))
            .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(FetchError::Network {
                    attempts: attempt,
                    message: e.to_string(),
                });
            }
            Err(_) => {
                return Err(FetchError::Network {
                    attempts: attempt,
                    message: format!(
                        "request timed out after {}ms",
                        self.config.timeout.as_millis()
                    ),
                });
            }
        };

        if !(200..300).contains(&response.status) {
            return Err(FetchError::Api {
                status: response.status,
                body: response.body,
            });
        }

        parse_weather(&response.body)
    }

    fn retry_delay(&self) -> Duration {
        let jitter = if self.config.retry_jitter.is_finite() {
            self.config.retry_jitter.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if jitter == 0.0 {
            return self.config.retry_delay;
        }
        let factor: f64 = rand::rng().random_range((1.0 - jitter)..=(1.0 + jitter));
        self.config.retry_delay.mul_f64(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::testing::{ScriptedTransport, Step, point};

    fn client(transport: &Arc<ScriptedTransport>) -> WeatherClient {
        WeatherClient::with_transport(
            transport.clone(),
            ApiConfig::default(),
            BatchPolicy::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_point_is_rejected_without_request() {
        let transport = Arc::new(ScriptedTransport::default());
        let client = client(&transport);

        let result = client.fetch_point(&point(1000.0, 8.0, 1)).await;

        assert!(matches!(result, Err(FetchError::Validation { .. })));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_timeouts_then_succeed() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.script(1, vec![Step::Hang, Step::Hang, Step::ok(18.5)]);
        let client = client(&transport);

        let started = tokio::time::Instant::now();
        let weather = client.fetch_point(&point(46.0, 8.0, 1)).await.unwrap();

        assert_eq!(weather.temperature, 18.5);
        assert_eq!(transport.call_count(), 3);
        // two 10s timeouts plus two 1s retry delays
        assert!(started.elapsed() >= Duration::from_secs(22));
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_errors_exhaust_retries() {
        let transport = Arc::new(ScriptedTransport::with_default(Step::Fail(
            "connection refused".to_string(),
        )));
        let client = client(&transport);

        let result = client.fetch_point(&point(46.0, 8.0, 1)).await;

        match result {
            Err(FetchError::Network { attempts, message }) => {
                assert_eq!(attempts, 4);
                assert!(message.contains("connection refused"));
            }
            other => panic!("expected network error, got {other:?}"),
        }
        assert_eq!(transport.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_400_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::with_default(Step::status(
            400,
            "invalid coordinates",
        )));
        let client = client(&transport);

        let result = client.fetch_point(&point(46.0, 8.0, 1)).await;

        assert_eq!(
            result,
            Err(FetchError::Api {
                status: 400,
                body: "invalid coordinates".to_string()
            })
        );
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_are_not_retried_either() {
        let transport = Arc::new(ScriptedTransport::with_default(Step::status(503, "down")));
        let client = client(&transport);

        let result = client.fetch_point(&point(46.0, 8.0, 1)).await;

        assert!(matches!(result, Err(FetchError::Api { status: 503, .. })));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_body_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::with_default(Step::status(
            200,
            r#"{"temperature": "hot"}"#,
        )));
        let client = client(&transport);

        let result = client.fetch_point(&point(46.0, 8.0, 1)).await;

        assert!(matches!(result, Err(FetchError::MalformedResponse { .. })));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_targets_weather_endpoint() {
        let transport = Arc::new(ScriptedTransport::default());
        let config = ApiConfig {
            base_url: "https://weather.example.com/api/".to_string(),
            ..ApiConfig::default()
        };
        let client =
            WeatherClient::with_transport(transport.clone(), config, BatchPolicy::default());

        client.fetch_point(&point(46.5, 7.25, 42)).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls[0].url, "https://weather.example.com/api/weather");
        assert_eq!(
            calls[0].request,
            WeatherRequest {
                lat: 46.5,
                lon: 7.25,
                timestamp: 42
            }
        );
        let body = serde_json::to_value(calls[0].request).unwrap();
        assert_eq!(body, serde_json::json!({"lat": 46.5, "lon": 7.25, "timestamp": 42}));
    }

    #[test]
    fn test_parse_weather_rejects_out_of_range() {
        let result = parse_weather(r#"{"temperature": 1, "feelsLike": 0, "humidity": 150}"#);
        assert!(matches!(result, Err(FetchError::MalformedResponse { .. })));
    }

    #[test]
    fn test_retry_delay_without_jitter_is_fixed() {
        let transport = Arc::new(ScriptedTransport::default());
        let client = client(&transport);
        assert_eq!(client.retry_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_retry_delay_jitter_stays_in_bounds() {
        let transport = Arc::new(ScriptedTransport::default());
        let config = ApiConfig {
            retry_jitter: 0.5,
            ..ApiConfig::default()
        };
        let client =
            WeatherClient::with_transport(transport, config, BatchPolicy::default());
        for _ in 0..50 {
            let delay = client.retry_delay();
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1500));
        }
    }

    #[rstest::rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(-0.5)]
    fn test_unusable_jitter_falls_back_to_fixed_delay(#[case] retry_jitter: f64) {
        let transport = Arc::new(ScriptedTransport::default());
        let config = ApiConfig {
            retry_jitter,
            ..ApiConfig::default()
        };
        let client = WeatherClient::with_transport(transport, config, BatchPolicy::default());
        assert_eq!(client.retry_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_api_config_from_weather_config() {
        let weather = WeatherConfig {
            base_url: "https://wx.example.com".to_string(),
            timeout_ms: 2500,
            max_retries: 1,
            retry_delay_ms: 250,
            retry_jitter: 0.1,
        };
        let config = ApiConfig::from(&weather);
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.retry_delay, Duration::from_millis(250));
        assert_eq!(config.max_retries, 1);
    }
}
