use async_trait::async_trait;

use crate::{error::FetchError, model::{Coordinate, ForecastPayload}};

pub mod openweather;

pub use openweather::{OpenWeatherClient, decode_payload};

/// A single-shot forecast source: one request per call, no retries, no
/// caching and no deduplication of concurrent calls.
#[async_trait]
pub trait ForecastClient: Send + Sync {
    async fn fetch_forecast(&self, coordinate: &Coordinate) -> Result<ForecastPayload, FetchError>;
}

