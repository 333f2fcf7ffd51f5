use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};

/// Location to forecast. Only `lat`/`lon` are sent to the provider; `name`
/// is carried along for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self { name: name.into(), lat, lon }
    }

    /// São Paulo, used when nothing else is configured.
    pub fn sao_paulo() -> Self {
        Self::new("São Paulo", -23.6814346, -46.9249599)
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        Self::sao_paulo()
    }
}

/// Decoded One Call body. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPayload {
    pub current: Observation,
    pub hourly: Vec<Observation>,
    pub daily: Vec<DailySummary>,
}

/// A point-in-time reading, used for both `current` and each hourly slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "dt")]
    pub timestamp: i64,
    #[serde(rename = "temp")]
    pub temperature: f64,
    pub humidity: i64,
    pub wind_speed: f64,
    #[serde(rename = "weather", deserialize_with = "non_empty_conditions")]
    pub conditions: Vec<Condition>,
}

impl Observation {
    pub fn primary_condition(&self) -> Option<&Condition> {
        self.conditions.first()
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: i64,
    #[serde(rename = "main")]
    pub category: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    #[serde(rename = "dt")]
    pub timestamp: i64,
    #[serde(rename = "temp")]
    pub temperature: TemperatureEnvelope,
    #[serde(rename = "weather", deserialize_with = "non_empty_conditions")]
    pub conditions: Vec<Condition>,
}

impl DailySummary {
    pub fn primary_condition(&self) -> Option<&Condition> {
        self.conditions.first()
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.timestamp)
    }
}

/// Temperatures across one day, already in the requested unit system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureEnvelope {
    pub day: f64,
    pub min: f64,
    pub max: f64,
    pub night: f64,
    #[serde(rename = "eve")]
    pub evening: f64,
    #[serde(rename = "morn")]
    pub morning: f64,
}

/// The provider always sends at least one condition; an empty list is
/// treated as a malformed body.
fn non_empty_conditions<'de, D>(deserializer: D) -> Result<Vec<Condition>, D::Error>
where
    D: Deserializer<'de>,
{
    let conditions = Vec::<Condition>::deserialize(deserializer)?;
    if conditions.is_empty() {
        return Err(de::Error::invalid_length(0, &"at least one weather condition"));
    }
    Ok(conditions)
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> serde_json::Value {
        serde_json::json!({
            "lat": -23.68,
            "lon": -46.92,
            "timezone": "America/Sao_Paulo",
            "current": {
                "dt": 1700000000,
                "temp": 21.5,
                "feels_like": 21.0,
                "humidity": 60,
                "wind_speed": 3.2,
                "weather": [
                    { "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }
                ]
            },
            "hourly": [
                {
                    "dt": 1700003600,
                    "temp": 22.0,
                    "humidity": 58,
                    "wind_speed": 3.5,
                    "weather": [
                        { "id": 801, "main": "Clouds", "description": "few clouds", "icon": "02d" }
                    ]
                }
            ],
            "daily": [
                {
                    "dt": 1699977600,
                    "temp": { "day": 24.1, "min": 17.3, "max": 26.8, "night": 18.0, "eve": 22.4, "morn": 17.9 },
                    "weather": [
                        { "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }
                    ]
                },
                {
                    "dt": 1700064000,
                    "temp": { "day": 25.0, "min": 18.0, "max": 27.5, "night": 19.2, "eve": 23.0, "morn": 18.4 },
                    "weather": [
                        { "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }
                    ]
                }
            ]
        })
    }

    #[test]
    fn decodes_fixture_values_exactly() {
        let payload: ForecastPayload = serde_json::from_value(fixture()).expect("fixture decodes");

        assert_eq!(payload.current.temperature, 21.5);
        assert_eq!(payload.current.humidity, 60);
        assert_eq!(payload.current.wind_speed, 3.2);
        assert_eq!(payload.current.timestamp, 1700000000);
        assert_eq!(payload.hourly.len(), 1);
        assert_eq!(payload.daily.len(), 2);

        assert_eq!(payload.daily[0].temperature.min, 17.3);
        assert_eq!(payload.daily[1].temperature.evening, 23.0);
        assert_eq!(payload.daily[1].temperature.morning, 18.4);

        let cond = payload.current.primary_condition().expect("has condition");
        assert_eq!(cond.category, "Clear");
        assert_eq!(cond.icon, "01d");
    }

    #[test]
    fn reencoding_is_idempotent() {
        let first: ForecastPayload = serde_json::from_value(fixture()).expect("fixture decodes");
        let encoded = serde_json::to_string(&first).expect("encodes");
        let second: ForecastPayload = serde_json::from_str(&encoded).expect("re-decodes");

        assert_eq!(first, second);
        assert!(encoded.contains("\"wind_speed\":3.2"));
    }

    #[test]
    fn missing_current_is_rejected() {
        let mut value = fixture();
        if let Some(obj) = value.as_object_mut() {
            obj.remove("current");
        }

        let err = serde_json::from_value::<ForecastPayload>(value).unwrap_err();
        assert!(err.to_string().contains("current"));
    }

    #[test]
    fn empty_sequences_are_valid() {
        let mut value = fixture();
        value["hourly"] = serde_json::json!([]);
        value["daily"] = serde_json::json!([]);

        let payload: ForecastPayload = serde_json::from_value(value).expect("decodes");
        assert!(payload.hourly.is_empty());
        assert!(payload.daily.is_empty());
    }

    #[test]
    fn empty_current_conditions_are_rejected() {
        let mut value = fixture();
        value["current"]["weather"] = serde_json::json!([]);

        let err = serde_json::from_value::<ForecastPayload>(value).unwrap_err();
        assert!(err.to_string().contains("at least one weather condition"), "{err}");
    }

    #[test]
    fn empty_daily_conditions_are_rejected() {
        let mut value = fixture();
        value["daily"][1]["weather"] = serde_json::json!([]);

        assert!(serde_json::from_value::<ForecastPayload>(value).is_err());
    }

    #[test]
    fn timestamp_converts_to_utc() {
        let payload: ForecastPayload = serde_json::from_value(fixture()).expect("fixture decodes");
        let time = payload.current.time().expect("in range");
        assert_eq!(time.timestamp(), 1700000000);
    }

    #[test]
    fn default_coordinate_is_sao_paulo() {
        let c = Coordinate::default();
        assert_eq!(c.name, "São Paulo");
        assert_eq!(c.lat, -23.6814346);
        assert_eq!(c.lon, -46.9249599);
    }
}
