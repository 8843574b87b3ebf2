use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    SunRideError, VERSION,
    forecast::{RouteForecastService, RouteOptions},
    models::{ForecastPoint, PointWeather, RouteForecast},
};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RouteForecastService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/forecast", post(forecast_route))
        .route("/weather/points", post(weather_for_points))
        .with_state(state)
}

/// Error body returned by every endpoint
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request<S: Into<String>>(message: S) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<SunRideError> for ApiError {
    fn from(err: SunRideError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!("Request failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.user_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": VERSION }))
}

fn parse_number(field: &str, text: &str) -> Result<f64, ApiError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| ApiError::bad_request(format!("{field} must be a number, got '{text}'")))
}

async fn forecast_route(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RouteForecast>, ApiError> {
    let mut gpx: Option<Bytes> = None;
    let mut options = RouteOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        debug!("Received multipart field '{}'", name);

        if name == "gpx" {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("failed to read GPX upload: {e}")))?;
            gpx = Some(bytes);
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| ApiError::bad_request(format!("failed to read field {name}: {e}")))?;
        match name.as_str() {
            "startTime" => {
                let start = DateTime::parse_from_rfc3339(text.trim()).map_err(|_| {
                    ApiError::bad_request(format!("startTime must be RFC 3339, got '{text}'"))
                })?;
                options.start_time = Some(start.with_timezone(&Utc));
            }
            "averageSpeed" => options.average_speed_kmh = Some(parse_number(&name, &text)?),
            "interval" => options.interval_km = Some(parse_number(&name, &text)?),
            _ => debug!("Ignoring unknown field '{}'", name),
        }
    }

    let gpx = gpx.ok_or_else(|| ApiError::bad_request("missing 'gpx' file field"))?;
    let forecast = state.service.forecast_gpx(&gpx, options).await?;
    Ok(Json(forecast))
}

async fn weather_for_points(
    State(state): State<AppState>,
    Json(points): Json<Vec<ForecastPoint>>,
) -> Result<Json<Vec<PointWeather>>, ApiError> {
    let max_points = state.service.max_points();
    if points.len() > max_points {
        return Err(SunRideError::validation(format!(
            "at most {max_points} points per request, got {}",
            points.len()
        ))
        .into());
    }

    let outcomes = state.service.client().fetch_outcomes(&points).await;
    Ok(Json(outcomes))
}
