//! Pure display formatting: no side effects, no caching.
//!
//! Both temperature units are always rendered together; the unit preference
//! declared in [`crate::config::Config`] is intentionally not consulted here.

use chrono::DateTime;

use crate::model::WeatherSnapshot;

pub fn celsius(kelvin: f64) -> f64 {
    kelvin - 273.15
}

pub fn fahrenheit(kelvin: f64) -> f64 {
    kelvin * 9.0 / 5.0 - 459.67
}

/// `"{name} ({country})"`, same shape as the index display names.
pub fn place_name(snapshot: &WeatherSnapshot) -> String {
    format!("{} ({})", snapshot.name, snapshot.country)
}

/// Both units, exactly two decimal places each.
pub fn temperature_string(kelvin: f64) -> String {
    format!("{:.2} °C / {:.2} °F", celsius(kelvin), fahrenheit(kelvin))
}

/// Weather description with its first letter capitalized.
pub fn weather_description(description: &str) -> String {
    let mut chars = description.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Human-readable date/time for a forecast row. Rendered in UTC so the same
/// payload formats identically everywhere.
pub fn forecast_timestamp(timestamp: i64) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_constants() {
        assert!((celsius(273.15) - 0.0).abs() < 1e-9);
        assert!((fahrenheit(273.15) - 32.0).abs() < 1e-9);
    }

    #[test]
    fn temperature_string_has_two_decimals_in_both_units() {
        assert_eq!(temperature_string(273.15), "0.00 °C / 32.00 °F");
        assert_eq!(temperature_string(287.554), "14.40 °C / 57.93 °F");
    }

    #[test]
    fn place_name_matches_index_format() {
        let snap = WeatherSnapshot {
            name: "London".into(),
            country: "GB".into(),
            temperature_k: 280.0,
            description: "light rain".into(),
        };
        assert_eq!(place_name(&snap), "London (GB)");
    }

    #[test]
    fn description_is_capitalized() {
        assert_eq!(weather_description("light rain"), "Light rain");
        assert_eq!(weather_description("Mist"), "Mist");
        assert_eq!(weather_description(""), "");
    }

    #[test]
    fn forecast_timestamp_renders_utc() {
        assert_eq!(forecast_timestamp(1451649600), "2016-01-01 12:00:00");
    }
}
