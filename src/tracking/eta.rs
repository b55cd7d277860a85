//! Straight-line ETA projection
//!
//! Distances are accumulated stop to stop along great circles, starting
//! at the current position, and converted to time with one average speed.
//! There is no road network behind it: the average speed is the knob
//! callers recalibrate per route.

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use super::coordinate::{haversine_distance_km, Coordinate};
use super::route::Stop;
use crate::error::{Result, TrackingError};

/// Urban service route default
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 30.0;

/// Projection for a single stop
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StopEta {
    pub stop: Stop,
    #[serde(with = "time::serde::rfc3339")]
    pub projected_arrival: OffsetDateTime,
    /// Cumulative distance from the current position
    pub distance_remaining_km: f64,
}

impl StopEta {
    pub fn minutes_away(&self, as_of: OffsetDateTime) -> f64 {
        (self.projected_arrival - as_of).as_seconds_f64() / 60.0
    }
}

/// Average speeds must be positive and finite
pub fn check_speed(average_speed_kmh: f64) -> Result<()> {
    if average_speed_kmh.is_nan() || average_speed_kmh <= 0.0 || average_speed_kmh.is_infinite() {
        return Err(TrackingError::InvalidSpeed(average_speed_kmh));
    }

    Ok(())
}

/// `at` moved by `minutes`, an error when the result leaves the
/// representable range
pub(crate) fn after_minutes(
    at: OffsetDateTime,
    minutes: f64,
    stop_id: &str,
) -> Result<OffsetDateTime> {
    let out_of_range = || TrackingError::TimeOutOfRange {
        stop_id: stop_id.to_string(),
    };

    let seconds = minutes * 60.0;
    if !seconds.is_finite() || seconds.abs() >= i64::MAX as f64 {
        return Err(out_of_range());
    }

    at.checked_add(Duration::seconds_f64(seconds))
        .ok_or_else(out_of_range)
}

/// Project the arrival at each of the `remaining` stops, in order
pub fn project(
    current: &Coordinate,
    remaining: &[Stop],
    average_speed_kmh: f64,
    as_of: OffsetDateTime,
) -> Result<Vec<StopEta>> {
    check_speed(average_speed_kmh)?;

    let mut etas = Vec::with_capacity(remaining.len());
    let mut previous = *current;
    let mut total_km = 0.0;

    for stop in remaining {
        total_km += haversine_distance_km(&previous, &stop.coordinate)?;
        previous = stop.coordinate;

        let minutes = total_km / average_speed_kmh * 60.0;
        etas.push(StopEta {
            projected_arrival: after_minutes(as_of, minutes, &stop.id)?,
            stop: stop.clone(),
            distance_remaining_km: total_km,
        });
    }

    Ok(etas)
}

/// ETA projection bound to one average speed
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EtaEstimator {
    average_speed_kmh: f64,
}

impl EtaEstimator {
    pub fn new(average_speed_kmh: f64) -> Result<Self> {
        check_speed(average_speed_kmh)?;

        Ok(Self { average_speed_kmh })
    }

    pub fn average_speed_kmh(&self) -> f64 {
        self.average_speed_kmh
    }

    pub fn project(
        &self,
        current: &Coordinate,
        remaining: &[Stop],
        as_of: OffsetDateTime,
    ) -> Result<Vec<StopEta>> {
        project(current, remaining, self.average_speed_kmh, as_of)
    }
}

impl Default for EtaEstimator {
    fn default() -> Self {
        Self {
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn line() -> Result<Vec<Stop>> {
        // one hundredth of a degree of latitude is ~1.112 km
        Ok(vec![
            Stop::new("a", "A", Coordinate::new(41.01, 29.0)?, 1),
            Stop::new("b", "B", Coordinate::new(41.02, 29.0)?, 2),
            Stop::new("c", "C", Coordinate::new(41.03, 29.0)?, 3),
        ])
    }

    #[test]
    fn empty_remaining() -> Result<()> {
        let etas = project(
            &Coordinate::new(41.0, 29.0)?,
            &[],
            30.0,
            datetime!(2024-09-02 7:30 UTC),
        )?;
        assert!(etas.is_empty());

        Ok(())
    }

    #[test]
    fn invalid_speed() -> Result<()> {
        let here = Coordinate::new(41.0, 29.0)?;
        let as_of = datetime!(2024-09-02 7:30 UTC);

        assert_eq!(
            Err(TrackingError::InvalidSpeed(0.0)),
            project(&here, &line()?, 0.0, as_of)
        );
        assert!(project(&here, &line()?, -12.0, as_of).is_err());
        assert!(project(&here, &[], 0.0, as_of).is_err());
        assert!(EtaEstimator::new(f64::NAN).is_err());
        assert!(EtaEstimator::new(f64::INFINITY).is_err());

        Ok(())
    }

    #[test]
    fn crawling_speed() -> Result<()> {
        let here = Coordinate::new(41.0, 29.0)?;
        let as_of = datetime!(2024-09-02 7:30 UTC);

        // 1.112 km at 1e-9 km/h lands far past the last representable date
        assert_eq!(
            Err(TrackingError::TimeOutOfRange {
                stop_id: "a".to_string()
            }),
            project(&here, &line()?, 1e-9, as_of)
        );
        assert!(project(&here, &line()?, f64::MIN_POSITIVE, as_of).is_err());

        // slow but representable
        let etas = project(&here, &line()?, 0.01, as_of)?;
        assert!(etas[2].minutes_away(as_of) > 19_000.0);

        Ok(())
    }

    #[test]
    fn cumulative() -> Result<()> {
        let as_of = datetime!(2024-09-02 7:30 UTC);
        let etas = EtaEstimator::default().project(&Coordinate::new(41.0, 29.0)?, &line()?, as_of)?;

        assert_eq!(3, etas.len());
        let ids: Vec<&str> = etas.iter().map(|e| e.stop.id.as_str()).collect();
        assert_eq!(vec!["a", "b", "c"], ids);

        for (i, eta) in etas.iter().enumerate() {
            let expected = 1.112 * (i + 1) as f64;
            assert!((eta.distance_remaining_km - expected).abs() < 0.01);
        }

        // 3.336 km at 30 km/h is about 6.7 minutes
        let minutes = etas[2].minutes_away(as_of);
        assert!((minutes - 6.67).abs() < 0.05, "got {}", minutes);
        assert!(etas[0].projected_arrival < etas[1].projected_arrival);

        Ok(())
    }
}
