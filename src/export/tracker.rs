//! Track builder for a session history

use gpx::{Track, TrackSegment, Waypoint};
use time::Duration;

use crate::tracking::sample::LocationSample;

pub struct Tracker {
    /// Vehicle plate, device...
    pub vehicle: String,
    /// Route name
    pub name: String,
    /// Max gap between two samples of a segment, in minutes
    pub max_segment_gap: u32,
    /// Data source, eg.: driver app
    pub source: Option<String>,
}

impl Tracker {
    /// Start a new tracker instance
    pub fn new(vehicle: String, name: String) -> Self {
        Self {
            vehicle,
            name,
            source: None,
            max_segment_gap: 5, // 5 minutes
        }
    }

    pub fn max_segment_gap(&mut self, max: u32) -> &mut Self {
        self.max_segment_gap = if max < 1 { 1 } else { max };

        self
    }

    pub fn source(&mut self, source: String) -> &mut Self {
        self.source = Some(source);

        self
    }

    /// Build the track from samples already in time order
    pub fn build(&self, samples: &[LocationSample]) -> Track {
        let mut track = Track::new();
        track.name = Some(self.name.clone());
        track.description = Some(format!("Tracked by `{}`", self.vehicle));
        track.source = self.source.clone();

        let max_gap = Duration::minutes(self.max_segment_gap as i64);
        let mut seg = TrackSegment::new();
        let mut previous: Option<&LocationSample> = None;

        // A silent device longer than the gap opens a new segment
        for sample in samples {
            if let Some(prev) = previous {
                if sample.recorded_at - prev.recorded_at > max_gap {
                    track.segments.push(std::mem::replace(&mut seg, TrackSegment::new()));
                }
            }

            let mut wp = Waypoint::new(sample.coordinate.into());
            wp.time = Some(sample.recorded_at.into());
            wp.speed = sample.speed_mps;

            seg.points.push(wp);
            previous = Some(sample);
        }

        if !seg.points.is_empty() {
            track.segments.push(seg);
        }

        track
    }
}
