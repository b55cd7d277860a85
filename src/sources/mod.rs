//! Sample sources API

use serde::Deserialize;
use time::OffsetDateTime;

use crate::error::SourceError;
use crate::tracking::sample::LocationSample;

/// Sample source
pub trait SampleSource {
    /// Fetch the samples recorded during the period, in arrival order
    fn fetch(
        &mut self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<LocationSample>, SourceError>;
}

/// Source field names
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldsConfiguration {
    pub route: String,
    pub time: String,
    /// Combined "lat,lon" field
    pub coordinates: String,
    pub latitude: String,
    pub longitude: String,
    pub accuracy: String,
    pub speed: String,
    pub heading: String,
    /// Combined field holds "lon,lat"
    pub flip_coordinates: bool,
}

impl Default for FieldsConfiguration {
    fn default() -> Self {
        Self {
            route: "route".to_string(),
            time: "time".to_string(),
            coordinates: "coordinates".to_string(),
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
            accuracy: "accuracy".to_string(),
            speed: "speed".to_string(),
            heading: "heading".to_string(),
            flip_coordinates: false,
        }
    }
}

#[cfg(feature = "csv")]
mod csv_file;

#[cfg(feature = "csv")]
pub use csv_file::CsvSource;
