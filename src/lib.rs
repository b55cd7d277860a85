//! service-tracker - GPS tracking and ETA projection for school service routes

pub mod error;
pub mod export;
pub mod sources;
pub mod tracking;

pub use error::{Result, SourceError, TrackingError};
pub use export::gpx::GpxGenerator;
pub use export::tracker::Tracker;
pub use sources::{FieldsConfiguration, SampleSource};
pub use tracking::coordinate::{haversine_distance_km, within_radius, Coordinate};
pub use tracking::eta::{project, EtaEstimator, StopEta};
pub use tracking::ingestor::{Accepted, LocationIngestor};
pub use tracking::options::TrackingOptions;
pub use tracking::route::{Route, Stop, StopStatus};
pub use tracking::sample::{LocationLog, LocationSample};
pub use tracking::session::{SessionState, TrackingSession, TrackingSnapshot, Update};
