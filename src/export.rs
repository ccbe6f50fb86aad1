use std::fs::File;
use std::path::Path;

use csv::{Reader, Writer};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::record::{
    Behavior, Category, Sighting, SightingId, UserId, format_date, format_time, non_empty,
    parse_date, parse_time,
};

/// Flat CSV layout of a sighting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvRow {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub animal_name: String,
    pub category: String,
    pub quantity: String,
    pub behavior: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub photo_url: String,
}

impl From<&Sighting> for CsvRow {
    fn from(s: &Sighting) -> Self {
        Self {
            id: s.id.to_string(),
            user_id: s.user_id.as_ref().map(|u| u.to_string()).unwrap_or_default(),
            username: s.username.clone(),
            animal_name: s.animal_name.clone(),
            category: s.category.to_string(),
            quantity: s.quantity.to_string(),
            behavior: s.behavior.map(|b| b.to_string()).unwrap_or_default(),
            latitude: s.latitude,
            longitude: s.longitude,
            address: s.address.clone(),
            description: s.description.clone(),
            date: format_date(s.date),
            time: format_time(s.time),
            photo_url: s.photo_url.clone().unwrap_or_default(),
        }
    }
}

impl CsvRow {
    /// A draft sighting with a fresh local id; the exported id is not reused.
    pub fn into_draft(self) -> Sighting {
        Sighting {
            id: SightingId::local(),
            user_id: non_empty(self.user_id).map(UserId::new),
            username: self.username.trim().to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            address: self.address,
            animal_name: self.animal_name,
            category: Category::normalize(&self.category),
            quantity: self.quantity.trim().parse::<u32>().unwrap_or(1).max(1),
            behavior: Behavior::parse_optional(&self.behavior),
            description: self.description,
            date: parse_date(&self.date),
            time: parse_time(&self.time),
            photo_url: non_empty(self.photo_url),
        }
    }
}

/// Save sightings to a CSV file.
pub fn save_to_csv(records: &[Sighting], path: &Path) -> Result<(), ApiError> {
    let file = File::create(path)?;
    let mut writer = Writer::from_writer(file);

    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }

    writer.flush()?;
    info!("Saved {} sightings to {}", records.len(), path.display());
    Ok(())
}

/// Read sighting drafts from a CSV file. Rows that fail to parse are skipped.
pub fn load_from_csv(path: &Path) -> Result<Vec<Sighting>, ApiError> {
    let mut reader = Reader::from_path(path)?;
    let mut drafts = Vec::new();

    for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
        match row {
            Ok(row) if row.animal_name.trim().is_empty() => {
                warn!("Skipping row {} of {}: no species", line + 1, path.display());
            }
            Ok(row) => drafts.push(row.into_draft()),
            Err(e) => warn!("Skipping row {} of {}: {}", line + 1, path.display(), e),
        }
    }

    info!("Read {} sightings from {}", drafts.len(), path.display());
    Ok(drafts)
}
