use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use sunride::{RouteForecast, RouteForecastService, RouteOptions, SunRideConfig, logging, web};

#[derive(Parser)]
#[command(
    name = "sunride",
    version,
    about = "SunRide: weather forecasts along your GPX routes"
)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch weather along a GPX route
    Forecast {
        /// GPX file to analyse
        #[arg(long)]
        gpx: PathBuf,
        /// Departure time (RFC 3339), defaults to now
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        /// Average speed in km/h
        #[arg(long)]
        speed: Option<f64>,
        /// Distance between forecast points in km
        #[arg(long)]
        interval: Option<f64>,
        /// Print the full forecast as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

fn print_forecast(forecast: &RouteForecast) {
    let summary = &forecast.summary;
    println!(
        "Route: {}, {:.1} km, {} forecast points",
        summary.name.as_deref().unwrap_or("Unnamed route"),
        summary.total_distance_km,
        summary.forecast_points
    );
    println!(
        "Start {}, estimated finish {}",
        summary.start_time.format("%Y-%m-%d %H:%M UTC"),
        summary.estimated_finish.format("%H:%M UTC")
    );
    println!();

    for entry in &forecast.points {
        let time = DateTime::<Utc>::from_timestamp(entry.point.timestamp, 0)
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| "--:--".to_string());
        let conditions = match (entry.outcome.weather(), entry.outcome.error()) {
            (Some(weather), _) => match weather.format_wind() {
                Some(wind) => format!("{}  {}", weather.format_temperature(), wind),
                None => weather.format_temperature(),
            },
            (None, Some(error)) => format!("no weather ({error})"),
            (None, None) => "no weather".to_string(),
        };
        println!("{:>7.1} km  {}  {}", entry.point.distance, time, conditions);
    }

    println!();
    if forecast.is_total_failure() {
        println!("The weather service did not answer for any point of this route.");
    }
    println!(
        "Weather available for {}/{} points",
        forecast.weather_available,
        forecast.points.len()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = SunRideConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose)?;

    let service = Arc::new(RouteForecastService::from_config(&config)?);

    match cli.command {
        Command::Forecast {
            gpx,
            start,
            speed,
            interval,
            json,
        } => {
            let options = RouteOptions {
                start_time: start,
                average_speed_kmh: speed,
                interval_km: interval,
            };
            let forecast = service
                .forecast_gpx_file(&gpx, options)
                .await
                .with_context(|| format!("Failed to forecast {}", gpx.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&forecast)?);
            } else {
                print_forecast(&forecast);
            }
        }
        Command::Serve { port } => {
            web::run(service, port.unwrap_or(config.server.port)).await?;
        }
    }

    Ok(())
}
