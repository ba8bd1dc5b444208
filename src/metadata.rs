// src/metadata.rs

use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// One image with enough EXIF data to be placed on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoTaggedRecord {
    pub path: PathBuf,
    pub timestamp: NaiveDateTime,
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: Option<f64>,
    pub bearing: Option<f64>,
}

/// Outcome of reading one image.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Record(GeoTaggedRecord),
    /// Latitude, longitude or capture time is missing. Not an error.
    Insufficient,
}

impl Extraction {
    pub fn into_record(self) -> Option<GeoTaggedRecord> {
        match self {
            Extraction::Record(record) => Some(record),
            Extraction::Insufficient => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub records: Vec<GeoTaggedRecord>,
}

impl Layer {
    /// Builds the layer for one folder, named after the folder and sorted by capture time.
    pub fn from_folder(folder: &Path, mut records: Vec<GeoTaggedRecord>) -> Self {
        sort_by_timestamp(&mut records);
        Self {
            name: base_name(&folder.to_string_lossy()),
            records,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackReference {
    pub path: PathBuf,
    pub name: String,
}

impl TrackReference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = base_name(&path.to_string_lossy());
        Self { path, name }
    }
}

/// Stable ascending sort; records with equal timestamps keep their order.
pub fn sort_by_timestamp(records: &mut [GeoTaggedRecord]) {
    records.sort_by_key(|record| record.timestamp);
}

/// Last path component, treating both `/` and `\` as separators.
pub fn base_name(path: &str) -> String {
    path.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_string()
}
