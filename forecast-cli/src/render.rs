//! Human-friendly terminal output for fetch states.

use std::fmt::{Display, Write};

use chrono::{DateTime, TimeZone, Timelike};
use forecast_core::{Coordinate, FetchError, ForecastPayload};

const DAY_START_HOUR: u32 = 6;
const NIGHT_START_HOUR: u32 = 18;
const MAX_HOURLY_ROWS: usize = 12;

pub fn celsius(temp: f64) -> String {
    format!("{}°C", temp.round() as i64)
}

/// Provider wind speed is m/s in metric units.
pub fn wind_kmh(speed_mps: f64) -> String {
    format!("{:.0} km/h", speed_mps * 3.6)
}

fn local_time<Tz: TimeZone>(ts: i64, tz: &Tz) -> Option<DateTime<Tz>> {
    DateTime::from_timestamp(ts, 0).map(|utc| utc.with_timezone(tz))
}

/// `HH:00` for an hourly slot.
pub fn hour_label<Tz: TimeZone>(ts: i64, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    local_time(ts, tz)
        .map(|t| t.format("%H:00").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// Upper-case short weekday, e.g. `MON`.
pub fn weekday_label<Tz: TimeZone>(ts: i64, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    local_time(ts, tz)
        .map(|t| t.format("%a").to_string().to_uppercase())
        .unwrap_or_else(|| "---".to_string())
}

pub fn is_daytime<Tz: TimeZone>(ts: i64, tz: &Tz) -> bool {
    local_time(ts, tz)
        .map(|t| (DAY_START_HOUR..NIGHT_START_HOUR).contains(&t.hour()))
        .unwrap_or(true)
}

/// Terminal glyph for an OpenWeather icon key such as `10d`.
pub fn icon_glyph(icon: &str) -> &'static str {
    let night = icon.ends_with('n');
    match icon.get(..2) {
        Some("01") if night => "🌙",
        Some("01") => "☀️",
        Some("02") => "🌤️",
        Some("03") | Some("04") => "☁️",
        Some("09") => "🌧️",
        Some("10") => "🌦️",
        Some("11") => "⛈️",
        Some("13") => "❄️",
        Some("50") => "🌫️",
        _ => "·",
    }
}

pub fn loading(coordinate: &Coordinate) -> String {
    format!("Fetching forecast for {}...", coordinate.name)
}

/// User-facing text for a failed fetch.
pub fn error_message(err: &FetchError) -> String {
    match err {
        FetchError::Transport { .. } if err.is_connect() => {
            "No internet connection. Check your connection and try again.".to_string()
        }
        FetchError::Transport { .. } if err.is_timeout() => {
            "The request took too long to respond. Please try again later.".to_string()
        }
        FetchError::Transport { details, .. } => format!("Connection error: {details}"),
        FetchError::HttpStatus(401) => {
            "The provider rejected the API key (HTTP 401). Run `forecast configure`.".to_string()
        }
        FetchError::HttpStatus(code) => format!("The provider responded with HTTP status {code}."),
        FetchError::NoData => "The provider returned no data.".to_string(),
        FetchError::Decode(details) => format!("Unexpected forecast format: {details}"),
    }
}

pub fn forecast<Tz: TimeZone>(coordinate: &Coordinate, payload: &ForecastPayload, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let mut out = String::new();
    let current = &payload.current;
    let period = if is_daytime(current.timestamp, tz) { "day" } else { "night" };

    let _ = writeln!(out, "{} ({period})", coordinate.name);
    let (glyph, description) = current
        .primary_condition()
        .map(|c| (icon_glyph(&c.icon), c.description.as_str()))
        .unwrap_or(("·", "unknown"));
    let _ = writeln!(out, "  {glyph} {}  {description}", celsius(current.temperature));
    let _ = writeln!(
        out,
        "  Humidity {}%   Wind {}",
        current.humidity,
        wind_kmh(current.wind_speed)
    );

    if !payload.hourly.is_empty() {
        let _ = writeln!(out, "\nHourly");
        for slot in payload.hourly.iter().take(MAX_HOURLY_ROWS) {
            let glyph = slot.primary_condition().map(|c| icon_glyph(&c.icon)).unwrap_or("·");
            let _ = writeln!(
                out,
                "  {}  {glyph}  {}",
                hour_label(slot.timestamp, tz),
                celsius(slot.temperature)
            );
        }
    }

    if !payload.daily.is_empty() {
        let _ = writeln!(out, "\nDaily");
        for day in &payload.daily {
            let glyph = day.primary_condition().map(|c| icon_glyph(&c.icon)).unwrap_or("·");
            let _ = writeln!(
                out,
                "  {}  {glyph}  min {}  max {}",
                weekday_label(day.timestamp, tz),
                celsius(day.temperature.min),
                celsius(day.temperature.max)
            );
        }
    }

    out
}
