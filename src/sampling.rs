//! Forecast point generation
//!
//! Resamples a GPX track at fixed distance intervals. Each target distance is
//! mapped to the nearest recorded track point, and the arrival time is
//! estimated from a constant average speed.

use chrono::{DateTime, Datelike, TimeDelta, Utc};
use tracing::debug;

use crate::config::RouteConfig;
use crate::models::{ForecastPoint, ParsedRoute};
use crate::{Result, SunRideError};

/// Last year an RFC 3339 timestamp can express
const MAX_TIMESTAMP_YEAR: i32 = 9999;

/// How forecast points are laid out along a route
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingOptions {
    /// Distance between forecast points in kilometers
    pub interval_km: f64,
    /// Assumed riding speed in km/h
    pub average_speed_kmh: f64,
    /// Departure time at the first track point
    pub start_time: DateTime<Utc>,
    /// Refuse routes that would need more points than this
    pub max_points: usize,
}

impl SamplingOptions {
    #[must_use]
    pub fn from_config(config: &RouteConfig, start_time: DateTime<Utc>) -> Self {
        Self {
            interval_km: config.interval_km,
            average_speed_kmh: config.average_speed_kmh,
            start_time,
            max_points: config.max_points,
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.interval_km.is_finite() || self.interval_km <= 0.0 {
            return Err(SunRideError::validation(format!(
                "forecast interval must be a positive distance, got: {}",
                self.interval_km
            )));
        }
        if !self.average_speed_kmh.is_finite() || self.average_speed_kmh <= 0.0 {
            return Err(SunRideError::validation(format!(
                "average speed must be positive, got: {}",
                self.average_speed_kmh
            )));
        }
        Ok(())
    }

    /// Estimated arrival after riding `distance_km`
    ///
    /// Fails when the arrival cannot be written as an RFC 3339 timestamp,
    /// e.g. for a vanishingly small speed or a start at the end of year 9999.
    pub fn arrival_time(&self, distance_km: f64) -> Result<DateTime<Utc>> {
        let seconds = (distance_km / self.average_speed_kmh * 3600.0).round();
        let offset = if seconds.is_finite() && seconds.abs() < i64::MAX as f64 {
            TimeDelta::try_seconds(seconds as i64)
        } else {
            None
        };

        offset
            .and_then(|offset| self.start_time.checked_add_signed(offset))
            .filter(|arrival| (0..=MAX_TIMESTAMP_YEAR).contains(&arrival.year()))
            .ok_or_else(|| {
                SunRideError::validation(format!(
                    "arrival after {distance_km:.1} km at {} km/h is out of range; check start time and average speed",
                    self.average_speed_kmh
                ))
            })
    }
}

/// Distances at which forecasts are wanted: every interval, plus the finish
fn target_distances(total_km: f64, options: &SamplingOptions) -> Result<Vec<f64>> {
    let mut targets = Vec::new();
    let mut step = 0u32;
    loop {
        let target = f64::from(step) * options.interval_km;
        if target >= total_km {
            break;
        }
        targets.push(target);
        if targets.len() >= options.max_points {
            return Err(too_many_points(total_km, options));
        }
        step += 1;
    }
    targets.push(total_km);
    Ok(targets)
}

fn too_many_points(total_km: f64, options: &SamplingOptions) -> SunRideError {
    SunRideError::validation(format!(
        "a {:.1} km route at {} km intervals needs more than {} forecast points; use a larger interval",
        total_km, options.interval_km, options.max_points
    ))
}

/// Generate forecast points along a parsed route
pub fn generate_forecast_points(
    route: &ParsedRoute,
    options: &SamplingOptions,
) -> Result<Vec<ForecastPoint>> {
    options.validate()?;
    if route.points.is_empty() {
        return Err(SunRideError::validation("route has no points"));
    }

    let cumulative = route.cumulative_distances();
    let total_km = cumulative.last().copied().unwrap_or(0.0);
    let targets = target_distances(total_km, options)?;

    let mut points = Vec::with_capacity(targets.len());
    let mut cursor = 0;
    for target in targets {
        // |cumulative - target| falls then rises, so the nearest index only moves forward
        while cursor + 1 < cumulative.len()
            && (cumulative[cursor + 1] - target).abs() <= (cumulative[cursor] - target).abs()
        {
            cursor += 1;
        }

        let nearest = &route.points[cursor];
        points.push(ForecastPoint::new(
            nearest.lat,
            nearest.lon,
            options.arrival_time(target)?.timestamp(),
            target,
        ));
    }

    debug!(
        "Generated {} forecast points over {:.2} km",
        points.len(),
        total_km
    );
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrackPoint;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn options(interval_km: f64) -> SamplingOptions {
        SamplingOptions {
            interval_km,
            average_speed_kmh: 20.0,
            start_time: start(),
            max_points: 100,
        }
    }

    /// Straight northbound route with a track point every 0.01 degrees (~1.11 km)
    fn straight_route(segments: usize) -> ParsedRoute {
        ParsedRoute {
            name: Some("Straight".to_string()),
            points: (0..=segments)
                .map(|i| TrackPoint::new(46.0 + i as f64 * 0.01, 8.0))
                .collect(),
        }
    }

    #[test]
    fn test_points_every_interval_plus_finish() {
        let route = straight_route(20); // ~22.2 km
        let total = route.total_distance_km();
        let points = generate_forecast_points(&route, &options(5.0)).unwrap();

        let distances: Vec<f64> = points.iter().map(|p| p.distance).collect();
        assert_eq!(distances[..5], [0.0, 5.0, 10.0, 15.0, 20.0]);
        assert_eq!(points.len(), 6);
        assert_eq!(distances[5], total);
    }

    #[test]
    fn test_first_and_last_points_match_track_ends() {
        let route = straight_route(20);
        let points = generate_forecast_points(&route, &options(5.0)).unwrap();

        let first = points.first().unwrap();
        let last = points.last().unwrap();
        assert_eq!((first.lat, first.lon), (46.0, 8.0));
        assert_eq!(last.lat, route.points.last().unwrap().lat);
    }

    #[test]
    fn test_nearest_track_point_is_chosen() {
        let route = straight_route(20);
        let points = generate_forecast_points(&route, &options(5.0)).unwrap();

        // 5 km lies between track points 4 (~4.45 km) and 5 (~5.56 km); 4 is closer
        assert!((points[1].lat - 46.04).abs() < 1e-9, "{}", points[1].lat);
    }

    #[test]
    fn test_timestamps_follow_average_speed() {
        let route = straight_route(20);
        let points = generate_forecast_points(&route, &options(5.0)).unwrap();

        let start_ts = start().timestamp();
        assert_eq!(points[0].timestamp, start_ts);
        // 5 km at 20 km/h is 15 minutes
        assert_eq!(points[1].timestamp, start_ts + 900);
        assert!(points.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_short_route_gets_start_and_finish() {
        let route = straight_route(1); // ~1.1 km
        let points = generate_forecast_points(&route, &options(5.0)).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].distance, 0.0);
    }

    #[test]
    fn test_zero_length_route_gets_single_point() {
        let route = ParsedRoute {
            name: None,
            points: vec![TrackPoint::new(46.0, 8.0), TrackPoint::new(46.0, 8.0)],
        };
        let points = generate_forecast_points(&route, &options(5.0)).unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_all_generated_points_are_valid() {
        let route = straight_route(30);
        let points = generate_forecast_points(&route, &options(2.5)).unwrap();
        assert!(points.iter().all(ForecastPoint::is_valid));
    }

    #[test]
    fn test_too_many_points_rejected() {
        let route = straight_route(20);
        let mut opts = options(0.1);
        opts.max_points = 50;
        let err = generate_forecast_points(&route, &opts).unwrap_err();
        assert!(err.to_string().contains("larger interval"));
    }

    #[test]
    fn test_tiny_speed_is_rejected_not_overflowed() {
        let route = straight_route(5);
        let mut opts = options(5.0);
        opts.average_speed_kmh = 1e-300;

        let err = generate_forecast_points(&route, &opts).unwrap_err();

        assert!(err.is_client_error());
        assert!(err.to_string().contains("out of range"), "{err}");
    }

    #[test]
    fn test_arrival_past_year_9999_is_rejected() {
        let route = straight_route(5);
        let mut opts = options(5.0);
        opts.start_time = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();

        let err = generate_forecast_points(&route, &opts).unwrap_err();

        assert!(err.is_client_error());
    }

    #[test]
    fn test_arrival_time_at_constant_speed() {
        let opts = options(5.0);
        assert_eq!(opts.arrival_time(0.0).unwrap(), start());
        assert_eq!(
            opts.arrival_time(10.0).unwrap(),
            start() + TimeDelta::minutes(30)
        );
    }

    #[test]
    fn test_invalid_options_rejected() {
        let route = straight_route(5);
        assert!(generate_forecast_points(&route, &options(0.0)).is_err());

        let mut opts = options(5.0);
        opts.average_speed_kmh = -3.0;
        assert!(generate_forecast_points(&route, &opts).is_err());
    }
}
