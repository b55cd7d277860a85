//! CSV file source integration

use std::io::Read;

use csv::{Reader, StringRecord};
use log::debug;
use time::format_description::well_known;
use time::OffsetDateTime;

use super::{FieldsConfiguration, SampleSource};
use crate::error::SourceError;
use crate::tracking::coordinate::Coordinate;
use crate::tracking::sample::LocationSample;

/// CSV samples source, eg.: a location log export
pub struct CsvSource<T>
where
    T: Read,
{
    rdr: Reader<T>,
    fields: FieldsConfiguration,
    route: Option<String>,
}

impl<T> CsvSource<T>
where
    T: Read,
{
    pub fn new(rdr: Reader<T>, fields: Option<FieldsConfiguration>) -> Self {
        Self {
            rdr,
            fields: fields.unwrap_or_default(),
            route: None,
        }
    }

    /// Keep only the rows of this route
    pub fn for_route(mut self, route_id: &str) -> Self {
        self.route = Some(route_id.to_string());

        self
    }
}

impl<T> SampleSource for CsvSource<T>
where
    T: Read,
{
    fn fetch(
        &mut self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<LocationSample>, SourceError> {
        let mut samples = vec![];

        let mut header = self.rdr.headers()?.clone();
        let header_idx = parse_header(&self.fields, &mut header)?;

        for (i, row) in self.rdr.records().enumerate() {
            let mut rec = row?;

            if rec.len() < 2 {
                continue;
            }

            let parsed = parse_row(&header_idx, &self.fields, &mut rec).map_err(|message| {
                SourceError::Row {
                    row: i + 1,
                    message,
                }
            })?;

            let (route, sample) = match parsed {
                Some(p) => p,
                None => {
                    debug!("Row {} without coordinates skipped", i + 1);
                    continue;
                }
            };

            if let (Some(wanted), Some(route)) = (&self.route, &route) {
                if wanted != route {
                    continue;
                }
            }

            if start <= sample.recorded_at && sample.recorded_at <= end {
                samples.push(sample);
            }
        }

        Ok(samples)
    }
}

/// Coordinates location in the row
#[derive(Debug)]
enum CoordinatesIndex {
    Combined(usize),
    Split { latitude: usize, longitude: usize },
}

/// Field to index map
#[derive(Debug)]
struct FieldsIndex {
    coordinates: CoordinatesIndex,
    time: usize,
    route: Option<usize>,
    accuracy: Option<usize>,
    speed: Option<usize>,
    heading: Option<usize>,
}

fn parse_header(
    fields: &FieldsConfiguration,
    header: &mut StringRecord,
) -> Result<FieldsIndex, SourceError> {
    header.trim();

    let find = |name: &str| header.iter().position(|h| h.to_lowercase() == name);

    let time = find(&fields.time).ok_or(SourceError::MissingHeader("time"))?;

    let coordinates = match find(&fields.coordinates) {
        Some(c) => CoordinatesIndex::Combined(c),
        None => match (find(&fields.latitude), find(&fields.longitude)) {
            (Some(latitude), Some(longitude)) => CoordinatesIndex::Split {
                latitude,
                longitude,
            },
            _ => return Err(SourceError::MissingHeader("coordinates")),
        },
    };

    Ok(FieldsIndex {
        coordinates,
        time,
        route: find(&fields.route),
        accuracy: find(&fields.accuracy),
        speed: find(&fields.speed),
        heading: find(&fields.heading),
    })
}

fn parse_row(
    header: &FieldsIndex,
    fields: &FieldsConfiguration,
    row: &mut StringRecord,
) -> Result<Option<(Option<String>, LocationSample)>, String> {
    row.trim();

    let (lat, lng) = match header.coordinates {
        CoordinatesIndex::Combined(idx) => {
            let raw = row.get(idx).unwrap_or_default();
            let separator = match raw {
                s if s.contains(',') => ",",
                s if s.contains(';') => ";",
                _ => " ",
            };
            let parts: Vec<&str> = raw.split(separator).map(|s| s.trim()).collect();
            if parts.len() != 2 {
                return Ok(None);
            }

            let (ilat, ilng) = if fields.flip_coordinates { (1, 0) } else { (0, 1) };
            (parts[ilat], parts[ilng])
        }
        CoordinatesIndex::Split {
            latitude,
            longitude,
        } => {
            let lat = row.get(latitude).unwrap_or_default();
            let lng = row.get(longitude).unwrap_or_default();
            if lat.is_empty() || lng.is_empty() {
                return Ok(None);
            }

            (lat, lng)
        }
    };

    let latitude = lat
        .parse::<f64>()
        .map_err(|e| format!("Invalid latitude format: {}", e))?;
    let longitude = lng
        .parse::<f64>()
        .map_err(|e| format!("Invalid longitude format: {}", e))?;

    let time = match row.get(header.time) {
        Some(d) => OffsetDateTime::parse(d, &well_known::Rfc3339)
            .map_err(|e| format!("Failed on parse the time: {}", e)),
        None => Err("Time field not found".to_string()),
    }?;

    // range checks belong to the ingestor, not to the source
    let mut sample = LocationSample::basic(
        Coordinate {
            latitude,
            longitude,
        },
        time,
    );

    let optional = |idx: Option<usize>, name: &str| -> Result<Option<f64>, String> {
        match idx.and_then(|i| row.get(i)).filter(|d| !d.is_empty()) {
            Some(d) => d
                .parse::<f64>()
                .map(Some)
                .map_err(|e| format!("Invalid {} format: {}", name, e)),
            None => Ok(None),
        }
    };
    sample.accuracy_meters = optional(header.accuracy, "accuracy")?;
    sample.speed_mps = optional(header.speed, "speed")?;
    sample.heading_degrees = optional(header.heading, "heading")?;

    let route = header
        .route
        .and_then(|i| row.get(i))
        .filter(|d| !d.is_empty())
        .map(|d| d.to_string());

    Ok(Some((route, sample)))
}
