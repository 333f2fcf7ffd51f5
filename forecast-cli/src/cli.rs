use std::sync::Arc;

use anyhow::{Context, anyhow};
use chrono::Local;
use clap::{Parser, Subcommand};
use forecast_core::{
    Config, Coordinate, FetchError, FetchState, ForecastClient, ForecastPayload,
    ForecastStateMachine, OpenWeatherClient, StateReceiver,
};
use inquire::{Confirm, CustomType, Password, Text};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Weather forecast CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the provider API key and the default location.
    Configure,

    /// Show current, hourly and daily forecast for a location.
    Show {
        /// Latitude; defaults to the configured location.
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,

        /// Longitude; defaults to the configured location.
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,

        /// Display name for the location.
        #[arg(long)]
        name: Option<String>,

        /// Print the decoded forecast as JSON.
        #[arg(long)]
        json: bool,

        /// Exit on failure instead of offering to retry.
        #[arg(long)]
        no_retry: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { lat, lon, name, json, no_retry } => {
                let config = Config::load()?;
                let coordinate = resolve_coordinate(&config, lat, lon, name);
                tracing::debug!(?coordinate, "resolved location");
                let client = OpenWeatherClient::from_config(&config)?;
                show(ForecastStateMachine::new(client), coordinate, json, !no_retry).await
            }
        }
    }
}

fn resolve_coordinate(
    config: &Config,
    lat: Option<f64>,
    lon: Option<f64>,
    name: Option<String>,
) -> Coordinate {
    match (lat, lon) {
        (Some(lat), Some(lon)) => {
            let name = name.unwrap_or_else(|| format!("{lat:.4}, {lon:.4}"));
            Coordinate::new(name, lat, lon)
        }
        _ => {
            let mut coordinate = config.location.clone();
            if let Some(name) = name {
                coordinate.name = name;
            }
            coordinate
        }
    }
}

async fn show<C: ForecastClient + 'static>(
    machine: ForecastStateMachine<C>,
    coordinate: Coordinate,
    json: bool,
    interactive_retry: bool,
) -> anyhow::Result<()> {
    let mut updates = machine.subscribe();

    loop {
        let handle = machine.trigger(coordinate.clone());
        let outcome = next_outcome(&mut updates, &coordinate).await?;
        handle.await.context("Forecast task panicked")?;

        match outcome {
            Ok(payload) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(payload.as_ref())?);
                } else {
                    print!("{}", render::forecast(&coordinate, &payload, &Local));
                }
                return Ok(());
            }
            Err(err) => {
                eprintln!("{}", render::error_message(&err));

                let retry = interactive_retry
                    && Confirm::new("Retry?")
                        .with_default(true)
                        .prompt()
                        .context("Failed to read retry answer")?;
                if !retry {
                    return Err(anyhow::Error::new(err).context("Forecast fetch failed"));
                }
            }
        }
    }
}

/// Render transitions until the current fetch settles.
async fn next_outcome(
    updates: &mut StateReceiver,
    coordinate: &Coordinate,
) -> anyhow::Result<Result<Arc<ForecastPayload>, FetchError>> {
    while let Some(update) = updates.recv().await {
        match update.state {
            FetchState::Idle => {}
            FetchState::Loading => eprintln!("{}", render::loading(coordinate)),
            FetchState::Loaded(payload) => return Ok(Ok(payload)),
            FetchState::Failed(err) => return Ok(Err(err)),
        }
    }

    Err(anyhow!("State machine closed before the fetch settled"))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key.trim().to_string());

    let change_location = Confirm::new(&format!(
        "Change default location (currently {})?",
        config.location.name
    ))
    .with_default(false)
    .prompt()
    .context("Failed to read answer")?;

    if change_location {
        let current = config.location.clone();
        let name = Text::new("Location name:")
            .with_default(&current.name)
            .prompt()
            .context("Failed to read location name")?;
        let lat = CustomType::<f64>::new("Latitude:")
            .with_default(current.lat)
            .with_error_message("Please type a valid number")
            .prompt()
            .context("Failed to read latitude")?;
        let lon = CustomType::<f64>::new("Longitude:")
            .with_default(current.lon)
            .with_error_message("Please type a valid number")
            .prompt()
            .context("Failed to read longitude")?;
        config.location = Coordinate::new(name, lat, lon);
    }

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}
