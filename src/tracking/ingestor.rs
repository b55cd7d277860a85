//! Sample validation and history

use log::{debug, warn};
use time::OffsetDateTime;

use super::coordinate::{haversine_distance_km, Coordinate};
use super::sample::LocationSample;
use crate::error::{Result, TrackingError};

/// Default limit for the reported fix accuracy
pub const DEFAULT_MAX_ACCURACY_METERS: f64 = 100.0;

/// Acknowledgement of a recorded sample
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Accepted {
    /// Position of the sample in the history
    pub sequence: usize,
    pub coordinate: Coordinate,
    pub recorded_at: OffsetDateTime,
}

/// Validates the incoming samples of one route and keeps the accepted ones
#[derive(Clone, Debug)]
pub struct LocationIngestor {
    max_accuracy_meters: f64,
    history: Vec<LocationSample>,
    distance_traveled_km: f64,
}

impl LocationIngestor {
    pub fn new() -> Self {
        Self::with_max_accuracy(DEFAULT_MAX_ACCURACY_METERS)
    }

    pub fn with_max_accuracy(max_accuracy_meters: f64) -> Self {
        Self {
            max_accuracy_meters,
            history: vec![],
            distance_traveled_km: 0.0,
        }
    }

    /// Run the validation chain without touching the history
    pub fn check(&self, sample: &LocationSample) -> Result<()> {
        sample.coordinate.validate()?;
        sample.validate_readings()?;

        if let Some(last) = self.history.last() {
            if sample.recorded_at < last.recorded_at {
                return Err(TrackingError::StaleSample {
                    recorded_at: sample.recorded_at,
                    last_accepted: last.recorded_at,
                });
            }
        }

        if let Some(acc) = sample.accuracy_meters {
            if acc > self.max_accuracy_meters {
                return Err(TrackingError::LowAccuracy {
                    accuracy_meters: acc,
                    max_meters: self.max_accuracy_meters,
                });
            }
        }

        Ok(())
    }

    /// Validate and append the sample
    pub fn record(&mut self, sample: LocationSample) -> Result<Accepted> {
        if let Err(e) = self.check(&sample) {
            warn!("Sample at {} rejected: {}", sample.recorded_at, e);
            return Err(e);
        }

        if let Some(last) = self.history.last() {
            self.distance_traveled_km += haversine_distance_km(&last.coordinate, &sample.coordinate)?;
        }

        let accepted = Accepted {
            sequence: self.history.len(),
            coordinate: sample.coordinate,
            recorded_at: sample.recorded_at,
        };
        debug!(
            "Sample #{} accepted at {}, {:.5},{:.5}",
            accepted.sequence,
            accepted.recorded_at,
            accepted.coordinate.latitude,
            accepted.coordinate.longitude
        );
        self.history.push(sample);

        Ok(accepted)
    }

    pub fn current_position(&self) -> Option<Coordinate> {
        self.latest().map(|s| s.coordinate)
    }

    pub fn latest(&self) -> Option<&LocationSample> {
        self.history.last()
    }

    pub fn history(&self) -> &[LocationSample] {
        &self.history
    }

    /// Accepted samples recorded at or after `since`
    pub fn history_since(&self, since: OffsetDateTime) -> &[LocationSample] {
        let idx = self.history.partition_point(|s| s.recorded_at < since);

        &self.history[idx..]
    }

    pub fn distance_traveled_km(&self) -> f64 {
        self.distance_traveled_km
    }

    pub fn max_accuracy_meters(&self) -> f64 {
        self.max_accuracy_meters
    }
}

impl Default for LocationIngestor {
    fn default() -> Self {
        Self::new()
    }
}
