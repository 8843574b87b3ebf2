//! GPX upload validation and parsing
//!
//! Reads `trk/trkseg/trkpt` points, falling back to `rte/rtept` for
//! planned routes without a recorded track.

use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::{debug, info};

use crate::models::point::coordinate_problem;
use crate::models::{ParsedRoute, TrackPoint};
use crate::{Result, SunRideError};

/// Largest accepted GPX upload (10 MiB)
pub const MAX_GPX_BYTES: usize = 10 * 1024 * 1024;

/// Fewest points that still describe a route
pub const MIN_ROUTE_POINTS: usize = 2;

#[derive(Debug, Deserialize)]
struct GpxDocument {
    #[serde(default)]
    metadata: Option<GpxMetadata>,
    #[serde(rename = "trk", default)]
    tracks: Vec<GpxTrack>,
    #[serde(rename = "rte", default)]
    routes: Vec<GpxRoute>,
}

#[derive(Debug, Deserialize)]
struct GpxMetadata {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GpxTrack {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "trkseg", default)]
    segments: Vec<GpxSegment>,
}

#[derive(Debug, Deserialize)]
struct GpxSegment {
    #[serde(rename = "trkpt", default)]
    points: Vec<GpxPoint>,
}

#[derive(Debug, Deserialize)]
struct GpxRoute {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "rtept", default)]
    points: Vec<GpxPoint>,
}

#[derive(Debug, Deserialize)]
struct GpxPoint {
    #[serde(rename = "@lat")]
    lat: f64,
    #[serde(rename = "@lon")]
    lon: f64,
    #[serde(default)]
    ele: Option<f64>,
    #[serde(default)]
    time: Option<String>,
}

impl GpxPoint {
    fn to_track_point(&self, index: usize) -> Result<TrackPoint> {
        if let Some(problem) = coordinate_problem(self.lat, self.lon) {
            return Err(SunRideError::gpx(format!("point {index}: {problem}")));
        }

        let time = self.time.as_deref().and_then(|raw| {
            DateTime::parse_from_rfc3339(raw.trim())
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| debug!("Ignoring unparsable time '{}' at point {}: {}", raw, index, e))
                .ok()
        });

        Ok(TrackPoint {
            lat: self.lat,
            lon: self.lon,
            elevation: self.ele,
            time,
        })
    }
}

/// Check the raw upload before handing it to the XML parser
pub fn validate_gpx_bytes(bytes: &[u8]) -> Result<&str> {
    if bytes.is_empty() {
        return Err(SunRideError::gpx("file is empty"));
    }
    if bytes.len() > MAX_GPX_BYTES {
        return Err(SunRideError::gpx(format!(
            "file is {} bytes, the limit is {} bytes",
            bytes.len(),
            MAX_GPX_BYTES
        )));
    }
    let content =
        std::str::from_utf8(bytes).map_err(|_| SunRideError::gpx("file is not valid UTF-8"))?;
    if !content.contains("<gpx") {
        return Err(SunRideError::gpx("missing <gpx> root element"));
    }
    Ok(content)
}

/// Parse a GPX document into a route
pub fn parse_gpx(bytes: &[u8]) -> Result<ParsedRoute> {
    let content = validate_gpx_bytes(bytes)?;
    let document: GpxDocument =
        from_str(content).map_err(|e| SunRideError::gpx(format!("invalid GPX XML: {e}")))?;

    let track_points: Vec<&GpxPoint> = document
        .tracks
        .iter()
        .flat_map(|track| track.segments.iter())
        .flat_map(|segment| segment.points.iter())
        .collect();

    let (raw_points, source) = if track_points.is_empty() {
        let route_points: Vec<&GpxPoint> = document
            .routes
            .iter()
            .flat_map(|route| route.points.iter())
            .collect();
        (route_points, "route")
    } else {
        (track_points, "track")
    };

    if raw_points.len() < MIN_ROUTE_POINTS {
        return Err(SunRideError::gpx(format!(
            "found {} points, at least {} are required",
            raw_points.len(),
            MIN_ROUTE_POINTS
        )));
    }

    let points = raw_points
        .iter()
        .enumerate()
        .map(|(index, point)| point.to_track_point(index))
        .collect::<Result<Vec<_>>>()?;

    let name = document
        .tracks
        .iter()
        .find_map(|t| t.name.clone())
        .or_else(|| document.routes.iter().find_map(|r| r.name.clone()))
        .or_else(|| document.metadata.and_then(|m| m.name))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    info!(
        "Parsed GPX {} '{}' with {} points",
        source,
        name.as_deref().unwrap_or("unnamed"),
        points.len()
    );

    Ok(ParsedRoute { name, points })
}
