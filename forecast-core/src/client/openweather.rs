use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::{
    config::Config,
    error::FetchError,
    model::{Coordinate, ForecastPayload},
};

use super::ForecastClient;

/// Client for the OpenWeather One Call endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            http,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.api_key()?;
        Self::new(config.provider.base_url.clone(), api_key, config.timeout()?)
    }
}

#[async_trait]
impl ForecastClient for OpenWeatherClient {
    async fn fetch_forecast(&self, coordinate: &Coordinate) -> Result<ForecastPayload, FetchError> {
        tracing::debug!(lat = coordinate.lat, lon = coordinate.lon, "requesting forecast");

        let lat = coordinate.lat.to_string();
        let lon = coordinate.lon.to_string();

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "forecast request failed"))?;

        let status = res.status();
        if !status.is_success() {
            return decode_payload(status, &[]);
        }

        let body = res.bytes().await?;
        decode_payload(status, &body)
    }
}

/// Classify a provider response. The status is checked before the body, so a
/// non-2xx response is reported as such even when its body is empty.
pub fn decode_payload(status: StatusCode, body: &[u8]) -> Result<ForecastPayload, FetchError> {
    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "provider returned non-success status");
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(FetchError::NoData);
    }

    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(error = %e, "failed to decode forecast body");
        FetchError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "current": {
            "dt": 1, "temp": 10.0, "humidity": 50, "wind_speed": 1.0,
            "weather": [{ "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }]
        },
        "hourly": [],
        "daily": []
    }"#;

    #[test]
    fn status_is_checked_before_body() {
        let err = decode_payload(StatusCode::NOT_FOUND, b"").unwrap_err();
        assert_eq!(err, FetchError::HttpStatus(404));
    }

    #[test]
    fn error_body_is_not_parsed() {
        let err = decode_payload(StatusCode::UNAUTHORIZED, br#"{"cod":401,"message":"Invalid API key"}"#)
            .unwrap_err();
        assert_eq!(err, FetchError::HttpStatus(401));
    }

    #[test]
    fn empty_success_body_is_no_data() {
        assert_eq!(decode_payload(StatusCode::OK, b"").unwrap_err(), FetchError::NoData);
        assert_eq!(decode_payload(StatusCode::OK, b" \n").unwrap_err(), FetchError::NoData);
    }

    #[test]
    fn malformed_body_is_decode_error() {
        let err = decode_payload(StatusCode::OK, br#"{"hourly": [], "daily": []}"#).unwrap_err();
        match err {
            FetchError::Decode(details) => assert!(details.contains("current"), "{details}"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn any_2xx_is_accepted() {
        let payload = decode_payload(StatusCode::from_u16(203).expect("valid"), MINIMAL.as_bytes())
            .expect("decodes");
        assert_eq!(payload.current.humidity, 50);
        assert_eq!(payload.current.primary_condition().map(|c| c.id), Some(800));
    }

    #[test]
    fn from_config_requires_api_key() {
        let err = OpenWeatherClient::from_config(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn from_config_uses_configured_base_url() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.provider.base_url = "http://localhost:1234/onecall".into();

        let client = OpenWeatherClient::from_config(&cfg).expect("client");
        assert_eq!(client.base_url, "http://localhost:1234/onecall");
    }

    #[test]
    fn from_config_rejects_zero_timeout() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.provider.timeout_secs = 0;

        let err = OpenWeatherClient::from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn empty_conditions_are_decode_errors() {
        let current_empty = br#"{
            "current": { "dt": 1, "temp": 10.0, "humidity": 50, "wind_speed": 1.0, "weather": [] },
            "hourly": [],
            "daily": []
        }"#;
        assert!(matches!(
            decode_payload(StatusCode::OK, current_empty),
            Err(FetchError::Decode(_))
        ));

        let daily_empty = br#"{
            "current": {
                "dt": 1, "temp": 10.0, "humidity": 50, "wind_speed": 1.0,
                "weather": [{ "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }]
            },
            "hourly": [],
            "daily": [{
                "dt": 1,
                "temp": { "day": 1.0, "min": 0.0, "max": 2.0, "night": 0.5, "eve": 1.5, "morn": 0.2 },
                "weather": []
            }]
        }"#;
        assert!(matches!(
            decode_payload(StatusCode::OK, daily_empty),
            Err(FetchError::Decode(_))
        ));
    }
}
