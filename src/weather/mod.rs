//! Weather module
//!
//! Batched weather retrieval for forecast points along a route:
//! - Point validation before anything touches the network
//! - Per-point fetching with timeout and bounded retries
//! - Batch scheduling with bounded concurrency and a pause between batches

pub mod batch;
pub mod client;
pub mod error;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{BatchPolicy, fetch_weather_for_points};
pub use client::{
    ApiConfig, HttpTransport, RawResponse, TransportError, WeatherClient, WeatherRequest,
    WeatherTransport, parse_weather, validate_point,
};
pub use error::FetchError;
