//! Tracking session: ingestion, stop progress and ETA snapshots of one route

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;
use time::OffsetDateTime;

use super::coordinate::{within_radius, Coordinate};
use super::eta::{after_minutes, EtaEstimator, StopEta};
use super::ingestor::LocationIngestor;
use super::options::TrackingOptions;
use super::route::{Route, StopStatus};
use super::sample::LocationSample;
use crate::error::{Result, TrackingError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No accepted sample yet
    Idle,
    Tracking,
    /// Final stop reached
    Completed,
    /// Cancelled, no more samples
    Stopped,
}

/// Stop still ahead of the vehicle
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RemainingStop {
    #[serde(flatten)]
    pub eta: StopEta,
    /// Session start plus the stop's planned offset
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_arrival: OffsetDateTime,
    /// Positive when running late
    pub delay_minutes: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StopProgress {
    pub stop_id: String,
    pub order: u32,
    pub status: StopStatus,
}

/// Immutable view of a session after an accepted sample
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackingSnapshot {
    pub route_id: String,
    pub state: SessionState,
    pub current_position: Coordinate,
    #[serde(with = "time::serde::rfc3339")]
    pub last_sample_at: OffsetDateTime,
    pub remaining_stops: Vec<RemainingStop>,
    pub total_distance_remaining_km: f64,
    pub distance_traveled_km: f64,
    pub stops: Vec<StopProgress>,
}

/// Result of feeding one sample
#[derive(Clone, Debug, PartialEq)]
pub enum Update {
    Accepted(Arc<TrackingSnapshot>),
    /// The session is untouched, `last` is the snapshot still in place
    Rejected {
        reason: TrackingError,
        last: Option<Arc<TrackingSnapshot>>,
    },
}

impl Update {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Update::Accepted(_))
    }

    pub fn snapshot(&self) -> Option<&Arc<TrackingSnapshot>> {
        match self {
            Update::Accepted(snap) => Some(snap),
            Update::Rejected { last, .. } => last.as_ref(),
        }
    }

    pub fn rejection(&self) -> Option<&TrackingError> {
        match self {
            Update::Accepted(_) => None,
            Update::Rejected { reason, .. } => Some(reason),
        }
    }
}

/// Stop progress derived from a position
#[derive(Clone, Copy, Debug, PartialEq)]
struct Progress {
    /// Index of the furthest stop reached so far
    reached: Option<usize>,
    /// Index of the stop the vehicle is standing at
    at_stop: Option<usize>,
}

/// Single-writer tracking of one vehicle on one route
pub struct TrackingSession {
    route: Route,
    options: TrackingOptions,
    ingestor: LocationIngestor,
    estimator: EtaEstimator,
    state: SessionState,
    reached: Option<usize>,
    started_at: Option<OffsetDateTime>,
    snapshot: Option<Arc<TrackingSnapshot>>,
}

impl TrackingSession {
    pub fn new(route: Route, options: TrackingOptions) -> Result<Self> {
        options.validate()?;

        if !route.is_active {
            warn!("Tracking inactive route `{}`", route.id);
        }

        Ok(Self {
            ingestor: LocationIngestor::with_max_accuracy(options.max_accuracy_meters),
            estimator: EtaEstimator::new(options.average_speed_kmh)?,
            route,
            options,
            state: SessionState::Idle,
            reached: None,
            started_at: None,
            snapshot: None,
        })
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn options(&self) -> &TrackingOptions {
        &self.options
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn history(&self) -> &[LocationSample] {
        self.ingestor.history()
    }

    pub fn distance_traveled_km(&self) -> f64 {
        self.ingestor.distance_traveled_km()
    }

    /// Latest snapshot, `None` while idle
    pub fn snapshot(&self) -> Option<Arc<TrackingSnapshot>> {
        self.snapshot.clone()
    }

    /// Feed a sample. Rejections leave the session as it was.
    pub fn update(&mut self, sample: LocationSample) -> Update {
        match self.try_update(sample) {
            Ok(snap) => Update::Accepted(snap),
            Err(reason) => {
                warn!("Route `{}`: sample rejected: {}", self.route.id, reason);
                Update::Rejected {
                    reason,
                    last: self.snapshot.clone(),
                }
            }
        }
    }

    /// Feed every sample of the channel until all senders hang up
    pub fn drain(&mut self, rx: &Receiver<LocationSample>) -> Vec<Update> {
        rx.iter().map(|sample| self.update(sample)).collect()
    }

    /// Cancel the session; later samples are refused
    pub fn stop(&mut self) {
        if self.state == SessionState::Stopped {
            return;
        }

        self.transition(SessionState::Stopped);

        if let Some(last) = &self.snapshot {
            let mut snap = TrackingSnapshot::clone(last);
            snap.state = SessionState::Stopped;
            self.snapshot = Some(Arc::new(snap));
        }
    }

    fn try_update(&mut self, sample: LocationSample) -> Result<Arc<TrackingSnapshot>> {
        if self.state == SessionState::Stopped {
            return Err(TrackingError::SessionStopped(self.route.id.clone()));
        }

        self.ingestor.check(&sample)?;

        // everything is computed before the first mutation
        let progress = self.progress(&sample.coordinate)?;
        let state = match self.state {
            SessionState::Completed => SessionState::Completed,
            _ if self.is_final(progress.reached) => SessionState::Completed,
            _ => SessionState::Tracking,
        };
        let started_at = self.started_at.unwrap_or(sample.recorded_at);
        let remaining = if state == SessionState::Completed {
            vec![]
        } else {
            self.remaining(&sample, progress.reached, started_at)?
        };

        let accepted = self.ingestor.record(sample)?;

        let snap = Arc::new(TrackingSnapshot {
            route_id: self.route.id.clone(),
            state,
            current_position: accepted.coordinate,
            last_sample_at: accepted.recorded_at,
            total_distance_remaining_km: remaining
                .last()
                .map(|r| r.eta.distance_remaining_km)
                .unwrap_or(0.0),
            remaining_stops: remaining,
            distance_traveled_km: self.ingestor.distance_traveled_km(),
            stops: self.stop_progress(progress),
        });

        self.started_at = Some(started_at);
        self.reached = progress.reached;
        self.transition(state);
        self.snapshot = Some(snap.clone());

        Ok(snap)
    }

    fn progress(&self, position: &Coordinate) -> Result<Progress> {
        let mut progress = Progress {
            reached: self.reached,
            at_stop: None,
        };

        let nearest = match self.route.nearest_stop_index(position)? {
            Some(idx) => idx,
            None => return Ok(progress),
        };

        let stop = &self.route.stops()[nearest];
        if within_radius(position, &stop.coordinate, self.options.arrival_radius_meters)? {
            progress.at_stop = Some(nearest);
            progress.reached = progress.reached.max(Some(nearest));
        } else if nearest > 0 {
            // closer to a later stop: the ones before are behind us
            progress.reached = progress.reached.max(Some(nearest - 1));
        }

        Ok(progress)
    }

    fn is_final(&self, reached: Option<usize>) -> bool {
        match reached {
            Some(idx) => idx + 1 == self.route.stops().len(),
            None => false,
        }
    }

    fn remaining(
        &self,
        sample: &LocationSample,
        reached: Option<usize>,
        started_at: OffsetDateTime,
    ) -> Result<Vec<RemainingStop>> {
        let stops = match reached {
            Some(idx) => self.route.remaining_stops_from(self.route.stops()[idx].order),
            None => self.route.stops(),
        };

        let etas = self
            .estimator
            .project(&sample.coordinate, stops, sample.recorded_at)?;

        etas.into_iter()
            .map(|eta| -> Result<RemainingStop> {
                let scheduled =
                    after_minutes(started_at, eta.stop.estimated_offset_minutes, &eta.stop.id)?;
                let delay = (eta.projected_arrival - scheduled).as_seconds_f64() / 60.0;

                Ok(RemainingStop {
                    eta,
                    scheduled_arrival: scheduled,
                    delay_minutes: delay,
                })
            })
            .collect()
    }

    fn stop_progress(&self, progress: Progress) -> Vec<StopProgress> {
        self.route
            .stops()
            .iter()
            .enumerate()
            .map(|(idx, stop)| {
                let status = if progress.at_stop == Some(idx) {
                    StopStatus::Arrived
                } else if progress.reached.map_or(false, |r| idx <= r) {
                    StopStatus::Departed
                } else {
                    StopStatus::Pending
                };

                StopProgress {
                    stop_id: stop.id.clone(),
                    order: stop.order,
                    status,
                }
            })
            .collect()
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            info!("Route `{}`: {:?} -> {:?}", self.route.id, self.state, next);
            self.state = next;
        }
    }
}
