//! Tracking options

use serde::{Deserialize, Serialize};

use super::eta::{check_speed, DEFAULT_AVERAGE_SPEED_KMH};
use super::ingestor::DEFAULT_MAX_ACCURACY_METERS;
use crate::error::{Result, TrackingError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingOptions {
    /// Fixes reporting a worse accuracy are dropped
    pub max_accuracy_meters: f64,
    pub average_speed_kmh: f64,
    /// Distance at which a stop counts as reached
    pub arrival_radius_meters: f64,
    /// Longer gaps between samples start a new GPX segment
    pub max_segment_gap_minutes: u32,
}

impl TrackingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        check_speed(self.average_speed_kmh)?;

        if self.max_accuracy_meters.is_nan() || self.max_accuracy_meters < 0.0 {
            return Err(TrackingError::InvalidOption {
                name: "max_accuracy_meters",
                value: self.max_accuracy_meters,
            });
        }
        if self.arrival_radius_meters.is_nan() || self.arrival_radius_meters < 0.0 {
            return Err(TrackingError::InvalidOption {
                name: "arrival_radius_meters",
                value: self.arrival_radius_meters,
            });
        }

        Ok(())
    }
}

impl Default for TrackingOptions {
    fn default() -> Self {
        Self {
            max_accuracy_meters: DEFAULT_MAX_ACCURACY_METERS,
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
            arrival_radius_meters: 50.0,
            max_segment_gap_minutes: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml() -> std::result::Result<(), String> {
        let op: TrackingOptions =
            serde_yaml::from_str("average_speed_kmh: 22.5").map_err(|e| e.to_string())?;

        assert_eq!(
            TrackingOptions {
                average_speed_kmh: 22.5,
                ..TrackingOptions::default()
            },
            op
        );
        op.validate().map_err(|e| e.to_string())?;

        Ok(())
    }

    #[test]
    fn invalid() {
        let op = TrackingOptions {
            average_speed_kmh: 0.0,
            ..TrackingOptions::new()
        };
        assert_eq!(Err(TrackingError::InvalidSpeed(0.0)), op.validate());

        let op = TrackingOptions {
            arrival_radius_meters: -1.0,
            ..TrackingOptions::new()
        };
        assert!(op.validate().is_err());

        let op = TrackingOptions {
            max_accuracy_meters: f64::NAN,
            ..TrackingOptions::new()
        };
        assert!(matches!(
            op.validate(),
            Err(TrackingError::InvalidOption {
                name: "max_accuracy_meters",
                ..
            })
        ));
    }
}
