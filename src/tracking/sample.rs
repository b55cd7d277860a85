//! Location sample definition

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::coordinate::{mps_to_kmh, Coordinate};
use crate::error::{Result, TrackingError};

/// GPS fix reported by the vehicle device
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub coordinate: Coordinate,
    pub accuracy_meters: Option<f64>,
    pub speed_mps: Option<f64>,
    pub heading_degrees: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

impl LocationSample {
    pub fn basic(coordinate: Coordinate, recorded_at: OffsetDateTime) -> Self {
        Self {
            coordinate,
            accuracy_meters: None,
            speed_mps: None,
            heading_degrees: None,
            recorded_at,
        }
    }

    /// Sample stamped with the current time
    pub fn now(coordinate: Coordinate) -> Self {
        Self::basic(coordinate, OffsetDateTime::now_utc())
    }

    pub fn accuracy(mut self, meters: f64) -> Self {
        self.accuracy_meters = Some(meters);

        self
    }

    pub fn speed(mut self, mps: f64) -> Self {
        self.speed_mps = Some(mps);

        self
    }

    pub fn heading(mut self, degrees: f64) -> Self {
        self.heading_degrees = Some(degrees);

        self
    }

    /// Range checks of the optional readings
    pub fn validate_readings(&self) -> Result<()> {
        if let Some(acc) = self.accuracy_meters {
            if acc.is_nan() || acc < 0.0 {
                return Err(TrackingError::InvalidReading {
                    field: "accuracy",
                    value: acc,
                });
            }
        }

        if let Some(speed) = self.speed_mps {
            if speed.is_nan() || speed < 0.0 {
                return Err(TrackingError::InvalidReading {
                    field: "speed",
                    value: speed,
                });
            }
        }

        if let Some(heading) = self.heading_degrees {
            if !(0.0..360.0).contains(&heading) {
                return Err(TrackingError::InvalidReading {
                    field: "heading",
                    value: heading,
                });
            }
        }

        Ok(())
    }

    /// Row handed to the location log store
    pub fn to_log(&self, route_id: &str) -> LocationLog {
        LocationLog {
            route_id: route_id.to_string(),
            latitude: self.coordinate.latitude,
            longitude: self.coordinate.longitude,
            accuracy_meters: self.accuracy_meters,
            speed_kmh: self.speed_mps.map(mps_to_kmh),
            heading: self.heading_degrees,
            recorded_at: self.recorded_at,
            source: LogSource::Gps,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    Gps,
    Manual,
}

/// Persisted form of an accepted sample
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationLog {
    #[serde(rename = "route")]
    pub route_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
    pub speed_kmh: Option<f64>,
    pub heading: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
    pub source: LogSource,
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn readings() -> Result<()> {
        let c = Coordinate::new(40.9903, 29.0230)?;
        let t = datetime!(2024-09-02 7:30 UTC);

        LocationSample::basic(c, t)
            .accuracy(8.0)
            .speed(0.0)
            .heading(359.9)
            .validate_readings()?;

        let bad_heading = LocationSample::basic(c, t).heading(360.0);
        assert_eq!(
            Err(TrackingError::InvalidReading {
                field: "heading",
                value: 360.0
            }),
            bad_heading.validate_readings()
        );
        assert!(LocationSample::basic(c, t).speed(-1.0).validate_readings().is_err());
        assert!(LocationSample::basic(c, t).accuracy(f64::NAN).validate_readings().is_err());

        Ok(())
    }

    #[test]
    fn log_row() -> std::result::Result<(), String> {
        let c = Coordinate::new(40.9903, 29.0230).map_err(|e| e.to_string())?;
        let sample = LocationSample::basic(c, datetime!(2024-09-02 7:30 UTC))
            .speed(10.0)
            .heading(90.0);

        let log = sample.to_log("1");
        assert_eq!(Some(36.0), log.speed_kmh.map(|s| s.round()));

        let json = serde_json::to_value(&log).map_err(|e| e.to_string())?;
        assert_eq!("1", json["route"]);
        assert_eq!("gps", json["source"]);
        assert_eq!("2024-09-02T07:30:00Z", json["recordedAt"]);
        assert_eq!(90.0, json["heading"]);

        Ok(())
    }
}
