use serde::{Deserialize, Serialize};

/// One record of the static city dataset.
///
/// The historical OpenWeatherMap `city.list.json` ships the id under `_id`,
/// newer dumps under `id`; both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    #[serde(alias = "_id")]
    pub id: i64,
    pub name: String,
    /// ISO country code, e.g. "GB".
    pub country: String,
}

impl CityRecord {
    /// The display string cities are keyed by externally: `"{name} ({country})"`.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.country)
    }
}

/// Normalized current-weather payload.
///
/// Temperature is kept in the source unit (Kelvin); derived Celsius and
/// Fahrenheit strings are computed on demand by the formatter, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub name: String,
    pub country: String,
    pub temperature_k: f64,
    pub description: String,
}

/// Normalized forecast payload: the city it belongs to plus its entries,
/// ordered by timestamp ascending as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSet {
    pub city_name: String,
    pub country: String,
    pub entries: Vec<ForecastEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Unix timestamp; forecast entries are addressed by exact match on it.
    pub timestamp: i64,
    pub temperature_k: f64,
    pub description: String,
}

impl ForecastSet {
    /// Exact-match drill-down; first match wins if the API ever returned
    /// duplicate timestamps.
    pub fn entry_at(&self, timestamp: i64) -> Option<&ForecastEntry> {
        self.entries.iter().find(|e| e.timestamp == timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_format() {
        let city = CityRecord { id: 2643743, name: "London".into(), country: "GB".into() };
        assert_eq!(city.display_name(), "London (GB)");
    }

    #[test]
    fn city_record_accepts_underscore_id() {
        let city: CityRecord =
            serde_json::from_str(r#"{"_id":2643743,"name":"London","country":"GB"}"#).unwrap();
        assert_eq!(city.id, 2643743);

        let city: CityRecord =
            serde_json::from_str(r#"{"id":2643743,"name":"London","country":"GB"}"#).unwrap();
        assert_eq!(city.id, 2643743);
    }

    #[test]
    fn entry_at_is_exact_and_first_match_wins() {
        let set = ForecastSet {
            city_name: "London".into(),
            country: "GB".into(),
            entries: vec![
                ForecastEntry { timestamp: 100, temperature_k: 280.0, description: "rain".into() },
                ForecastEntry { timestamp: 100, temperature_k: 281.0, description: "mist".into() },
                ForecastEntry { timestamp: 200, temperature_k: 282.0, description: "sun".into() },
            ],
        };

        assert_eq!(set.entry_at(100).unwrap().description, "rain");
        assert_eq!(set.entry_at(200).unwrap().description, "sun");
        assert!(set.entry_at(150).is_none());
    }
}
