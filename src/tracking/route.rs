//! Service route and stop definitions

use serde::{Deserialize, Serialize};

use super::coordinate::{haversine_distance_km, Coordinate};
use crate::error::{Result, TrackingError};

/// A pickup/drop-off point of a route
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub coordinate: Coordinate,
    /// Traversal sequence, unique within the route
    pub order: u32,
    /// Expected minutes from the route start
    #[serde(default)]
    pub estimated_offset_minutes: f64,
}

impl Stop {
    pub fn new(id: &str, name: &str, coordinate: Coordinate, order: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            coordinate,
            order,
            estimated_offset_minutes: 0.0,
        }
    }

    pub fn offset(mut self, minutes: f64) -> Self {
        self.estimated_offset_minutes = minutes;

        self
    }
}

/// Where the vehicle stands with a stop
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopStatus {
    Pending,
    Arrived,
    Departed,
}

/// Service route: stops always sorted by `order`, no duplicated orders
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRoute", into = "RawRoute")]
pub struct Route {
    pub id: String,
    pub name: String,
    pub vehicle_plate: Option<String>,
    pub is_active: bool,
    stops: Vec<Stop>,
}

impl Route {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            vehicle_plate: None,
            is_active: true,
            stops: vec![],
        }
    }

    /// Build a route from unsorted stops
    pub fn with_stops(id: &str, name: &str, stops: Vec<Stop>) -> Result<Self> {
        let mut route = Self::new(id, name);
        for stop in stops {
            route.add_stop(stop)?;
        }

        Ok(route)
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Insert the stop at its place in the traversal sequence
    pub fn add_stop(&mut self, stop: Stop) -> Result<()> {
        stop.coordinate.validate()?;

        let minutes = stop.estimated_offset_minutes;
        if !minutes.is_finite() || minutes < 0.0 {
            return Err(TrackingError::InvalidStopOffset {
                stop_id: stop.id,
                minutes,
            });
        }

        match self.stops.binary_search_by_key(&stop.order, |s| s.order) {
            Ok(_) => Err(TrackingError::DuplicateOrder {
                route_id: self.id.clone(),
                order: stop.order,
            }),
            Err(idx) => {
                self.stops.insert(idx, stop);
                Ok(())
            }
        }
    }

    pub fn stop_by_order(&self, order: u32) -> Option<&Stop> {
        self.stops
            .binary_search_by_key(&order, |s| s.order)
            .ok()
            .map(|idx| &self.stops[idx])
    }

    pub fn final_stop(&self) -> Option<&Stop> {
        self.stops.last()
    }

    /// Stops still ahead once the stop with `current_order` was reached
    pub fn remaining_stops_from(&self, current_order: u32) -> &[Stop] {
        let idx = self.stops.partition_point(|s| s.order <= current_order);

        &self.stops[idx..]
    }

    /// Index of the stop closest to `position`. On ties the lowest
    /// order wins. `None` for a route without stops.
    pub fn nearest_stop_index(&self, position: &Coordinate) -> Result<Option<usize>> {
        let mut nearest: Option<(usize, f64)> = None;

        for (idx, stop) in self.stops.iter().enumerate() {
            let d = haversine_distance_km(position, &stop.coordinate)?;
            match nearest {
                Some((_, best)) if d >= best => {}
                _ => nearest = Some((idx, d)),
            }
        }

        Ok(nearest.map(|(idx, _)| idx))
    }
}

/// Route as it comes from the route configuration, before validation
#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawRoute {
    id: String,
    name: String,
    #[serde(default)]
    vehicle_plate: Option<String>,
    #[serde(default = "active_default")]
    is_active: bool,
    #[serde(default)]
    stops: Vec<Stop>,
}

fn active_default() -> bool {
    true
}

impl TryFrom<RawRoute> for Route {
    type Error = TrackingError;

    fn try_from(raw: RawRoute) -> Result<Self> {
        let mut route = Route::with_stops(&raw.id, &raw.name, raw.stops)?;
        route.vehicle_plate = raw.vehicle_plate;
        route.is_active = raw.is_active;

        Ok(route)
    }
}

impl From<Route> for RawRoute {
    fn from(route: Route) -> Self {
        Self {
            id: route.id,
            name: route.name,
            vehicle_plate: route.vehicle_plate,
            is_active: route.is_active,
            stops: route.stops,
        }
    }
}
