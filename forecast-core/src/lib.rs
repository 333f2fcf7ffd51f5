//! Core library for the `forecast` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The forecast client contract and its OpenWeather implementation
//! - The observable fetch state machine
//! - Shared domain models (coordinates, observations, daily summaries)
//!
//! It is used by `forecast-cli`, but any other frontend can subscribe to the
//! same state machine.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod state;

pub use client::{ForecastClient, OpenWeatherClient};
pub use config::{Config, ProviderConfig};
pub use error::{FetchError, TransportKind};
pub use model::{Condition, Coordinate, DailySummary, ForecastPayload, Observation, TemperatureEnvelope};
pub use state::{FetchState, ForecastStateMachine, StateReceiver, StateUpdate};
