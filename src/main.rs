use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use routecast::{
    Route, RouteWeatherConfig, RouteWeatherEngine, RouteWeatherError, TravelMode, WeatherForecast,
    logging,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Weather along a travel route", long_about = None)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full integration report: timeline, segments, validation, patterns and risk
    Analyze {
        /// Route JSON file
        #[arg(long)]
        route: PathBuf,
        /// Forecast pool JSON file (array of forecasts)
        #[arg(long)]
        weather: PathBuf,
        /// Departure time (RFC 3339), defaults to now
        #[arg(long)]
        start: Option<DateTime<Utc>>,
    },
    /// Route/weather consistency audit
    Validate {
        #[arg(long)]
        route: PathBuf,
        #[arg(long)]
        weather: PathBuf,
        #[arg(long)]
        start: Option<DateTime<Utc>>,
    },
    /// Travel-mode risk for a set of forecasts
    Risk {
        /// walking, cycling, driving, flying, sailing or cruise
        #[arg(long)]
        mode: String,
        #[arg(long)]
        weather: PathBuf,
    },
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .map_err(RouteWeatherError::from)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value = serde_json::from_str(&content)
        .map_err(RouteWeatherError::from)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(value)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{output}");
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = RouteWeatherConfig::load_from_path(cli.config)?;
    logging::init(&config.logging)?;
    let engine = RouteWeatherEngine::new(config);

    match cli.command {
        Command::Analyze {
            route,
            weather,
            start,
        } => {
            let route: Route = read_json(&route)?;
            let pool: Vec<WeatherForecast> = read_json(&weather)?;
            let start = start.unwrap_or_else(Utc::now);
            info!(
                "Analyzing {} waypoints against {} forecasts",
                route.waypoints.len(),
                pool.len()
            );

            let report = engine.integrate(&route, &pool, start)?;
            print_json(&report)
        }
        Command::Validate {
            route,
            weather,
            start,
        } => {
            let route: Route = read_json(&route)?;
            let pool: Vec<WeatherForecast> = read_json(&weather)?;
            let result = engine.validate_consistency(&route, &pool, start.unwrap_or_else(Utc::now));
            print_json(&result)
        }
        Command::Risk { mode, weather } => {
            let mode: TravelMode = mode.parse()?;
            let pool: Vec<WeatherForecast> = read_json(&weather)?;
            print_json(&engine.assess_travel_mode_risk(mode, &pool))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<RouteWeatherError>() {
                Some(engine_err) => {
                    eprintln!("Error [{}]: {}", engine_err.code(), engine_err.user_message());
                    eprintln!("{err:#}");
                    for suggestion in engine_err.suggestions() {
                        eprintln!("  - {suggestion}");
                    }
                }
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
