//! Tracking errors

use thiserror::Error;
use time::OffsetDateTime;

/// Failures of the tracking core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackingError {
    #[error("invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    #[error("stale sample: recorded at {recorded_at}, last accepted at {last_accepted}")]
    StaleSample {
        recorded_at: OffsetDateTime,
        last_accepted: OffsetDateTime,
    },
    #[error("low accuracy: {accuracy_meters}m exceeds {max_meters}m")]
    LowAccuracy { accuracy_meters: f64, max_meters: f64 },
    #[error("invalid {field} reading: {value}")]
    InvalidReading { field: &'static str, value: f64 },
    #[error("invalid average speed: {0} km/h")]
    InvalidSpeed(f64),
    #[error("duplicate stop order {order} on route `{route_id}`")]
    DuplicateOrder { route_id: String, order: u32 },
    #[error("session for route `{0}` is stopped")]
    SessionStopped(String),
    #[error("invalid tracking option `{name}`: {value}")]
    InvalidOption { name: &'static str, value: f64 },
    #[error("invalid offset of stop `{stop_id}`: {minutes} minutes")]
    InvalidStopOffset { stop_id: String, minutes: f64 },
    #[error("arrival time at stop `{stop_id}` is out of range")]
    TimeOutOfRange { stop_id: String },
}

impl TrackingError {
    /// Routine rejections are logged and skipped by the caller; the
    /// others point to broken configuration upstream.
    pub fn is_routine(&self) -> bool {
        matches!(
            self,
            TrackingError::StaleSample { .. }
                | TrackingError::LowAccuracy { .. }
                | TrackingError::InvalidReading { .. }
                | TrackingError::SessionStopped(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TrackingError>;

/// Failures while reading samples or route files
#[derive(Error, Debug)]
pub enum SourceError {
    #[cfg(feature = "csv")]
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("{0} header not found")]
    MissingHeader(&'static str),
    #[error("row {row}: {message}")]
    Row { row: usize, message: String },
    #[error("failed on parse the time: {0}")]
    Time(#[from] time::error::Parse),
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn routine_rejections() {
        let stale = TrackingError::StaleSample {
            recorded_at: datetime!(2024-09-02 7:00 UTC),
            last_accepted: datetime!(2024-09-02 7:01 UTC),
        };
        assert!(stale.is_routine());
        assert!(TrackingError::SessionStopped("r1".to_string()).is_routine());
        assert!(!TrackingError::InvalidSpeed(0.0).is_routine());
        assert!(!TrackingError::TimeOutOfRange {
            stop_id: "s1".to_string()
        }
        .is_routine());
        assert!(!TrackingError::DuplicateOrder {
            route_id: "r1".to_string(),
            order: 2
        }
        .is_routine());
    }

    #[test]
    fn display() {
        let err = TrackingError::LowAccuracy {
            accuracy_meters: 250.0,
            max_meters: 100.0,
        };
        assert_eq!("low accuracy: 250m exceeds 100m", err.to_string());
    }
}
