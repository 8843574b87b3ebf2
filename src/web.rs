use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, extract::DefaultBodyLimit};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use crate::api::{self, AppState};
use crate::forecast::RouteForecastService;
use crate::gpx::MAX_GPX_BYTES;

/// Room for multipart boundaries and the small option fields next to the GPX file
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn app(service: Arc<RouteForecastService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router(AppState { service }))
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(
                    MAX_GPX_BYTES + MULTIPART_OVERHEAD_BYTES,
                ))
                .layer(cors)
                .layer(DefaultBodyLimit::disable()),
        )
}

pub async fn run(service: Arc<RouteForecastService>, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://localhost:{}", port);
    axum::serve(listener, app(service))
        .await
        .with_context(|| "Web server stopped unexpectedly")
}
