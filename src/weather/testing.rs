//! Scripted transport for exercising the client without a network

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, sleep};

use super::client::{RawResponse, TransportError, WeatherRequest, WeatherTransport};
use crate::models::ForecastPoint;

pub(crate) fn point(lat: f64, lon: f64, timestamp: i64) -> ForecastPoint {
    ForecastPoint::new(lat, lon, timestamp, 0.0)
}

/// What the transport does for one call
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Respond {
        status: u16,
        body: String,
        latency: Duration,
    },
    /// Never answers; only the client timeout ends the call
    Hang,
    Fail(String),
}

impl Step {
    pub(crate) fn ok(temperature: f64) -> Self {
        Self::ok_after(temperature, Duration::ZERO)
    }

    pub(crate) fn ok_after(temperature: f64, latency: Duration) -> Self {
        Step::Respond {
            status: 200,
            body: format!(r#"{{"temperature": {temperature}, "feelsLike": {temperature}}}"#),
            latency,
        }
    }

    pub(crate) fn status(status: u16, body: &str) -> Self {
        Step::Respond {
            status,
            body: body.to_string(),
            latency: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub url: String,
    pub request: WeatherRequest,
    pub started: Instant,
}

/// Answers per point timestamp from a queue of steps, falling back to a default
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<i64, VecDeque<Step>>>,
    default: Step,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::echoing_after(Duration::ZERO)
    }
}

impl ScriptedTransport {
    /// Echoes the timestamp back as the temperature
    pub(crate) fn echoing_after(latency: Duration) -> Self {
        Self::with_default(Step::Respond {
            status: 200,
            body: String::new(),
            latency,
        })
    }

    pub(crate) fn with_default(default: Step) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            default,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn script(&self, timestamp: i64, steps: Vec<Step>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(timestamp, steps.into_iter().collect());
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_step(&self, timestamp: i64) -> Step {
        self.scripts
            .lock()
            .unwrap()
            .get_mut(&timestamp)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.default.clone())
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl WeatherTransport for ScriptedTransport {
    async fn post_weather(
        &self,
        url: &str,
        request: &WeatherRequest,
    ) -> Result<RawResponse, TransportError> {
        self.calls.lock().unwrap().push(Call {
            url: url.to_string(),
            request: *request,
            started: Instant::now(),
        });
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        match self.next_step(request.timestamp) {
            Step::Respond {
                status,
                body,
                latency,
            } => {
                if !latency.is_zero() {
                    sleep(latency).await;
                }
                let body = if body.is_empty() {
                    format!(
                        r#"{{"temperature": {t}, "feelsLike": {t}}}"#,
                        t = request.timestamp
                    )
                } else {
                    body
                };
                Ok(RawResponse { status, body })
            }
            Step::Hang => std::future::pending().await,
            Step::Fail(message) => Err(TransportError(message)),
        }
    }
}
