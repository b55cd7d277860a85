//! GPX generator API

use gpx::{Gpx, GpxVersion, Route as GpxRoute, Waypoint};

use super::tracker::Tracker;
use crate::tracking::route::Route;
use crate::tracking::session::TrackingSession;

pub struct GpxGenerator {
    pub routes: Vec<GpxRoute>,
    pub tracks: Vec<gpx::Track>,
}

impl GpxGenerator {
    pub fn empty() -> Self {
        Self {
            routes: vec![],
            tracks: vec![],
        }
    }

    /// Planned stops plus the accepted history of the session
    pub fn from_session(session: &TrackingSession) -> Self {
        let route = session.route();
        let vehicle = route
            .vehicle_plate
            .clone()
            .unwrap_or_else(|| route.id.clone());

        let track = Tracker::new(vehicle, route.name.clone())
            .max_segment_gap(session.options().max_segment_gap_minutes)
            .source("service-tracker".to_string())
            .build(session.history());

        let mut gen = Self::empty();
        gen.routes.push(stops_route(route));
        gen.tracks.push(track);

        gen
    }

    pub fn generate(self) -> Gpx {
        let mut gpx: Gpx = Default::default();
        gpx.version = GpxVersion::Gpx11;
        gpx.creator = Some("service-tracker".to_string());
        gpx.routes = self.routes;
        gpx.tracks = self.tracks;

        gpx
    }
}

fn stops_route(route: &Route) -> GpxRoute {
    let mut groute = GpxRoute::default();
    groute.name = Some(route.name.clone());
    groute.points = route
        .stops()
        .iter()
        .map(|stop| {
            let mut wp = Waypoint::new(stop.coordinate.into());
            wp.name = Some(stop.name.clone());
            wp.description = Some(format!("+{} min", stop.estimated_offset_minutes));
            wp
        })
        .collect();

    groute
}
