use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::model::CityRecord;

/// Static mapping from display name (`"{name} ({country})"`) to city record.
///
/// Built once at startup from the line-delimited `city.list.json` dataset
/// and never mutated afterwards. Display-name collisions resolve
/// last-write-wins in load order.
#[derive(Debug, Clone)]
pub struct CityIndex {
    by_display: HashMap<String, CityRecord>,
    names: Vec<String>,
}

impl CityIndex {
    /// Build the index from an iterator of records.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = CityRecord>,
    {
        let mut by_display = HashMap::new();
        for record in records {
            by_display.insert(record.display_name(), record);
        }

        let mut names: Vec<String> = by_display.keys().cloned().collect();
        names.sort_by_key(|name| name.to_lowercase());

        Self { by_display, names }
    }

    /// Load the index from a line-delimited JSON file, one city per line.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open city dataset: {}", path.display()))?;

        let mut records = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line
                .with_context(|| format!("Failed to read city dataset: {}", path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: CityRecord = serde_json::from_str(&line).with_context(|| {
                format!("Malformed city record at {}:{}", path.display(), lineno + 1)
            })?;
            records.push(record);
        }

        Ok(Self::from_records(records))
    }

    pub fn lookup(&self, display_name: &str) -> Option<&CityRecord> {
        self.by_display.get(display_name)
    }

    /// All display names, sorted case-insensitively for listing.
    pub fn display_names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.by_display.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_display.is_empty()
    }
}
