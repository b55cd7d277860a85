use time::macros::datetime;

use super::gpx::GpxGenerator;
use super::tracker::Tracker;
use crate::tracking::coordinate::Coordinate;
use crate::tracking::options::TrackingOptions;
use crate::tracking::route::{Route, Stop};
use crate::tracking::sample::LocationSample;
use crate::tracking::session::TrackingSession;

fn at(lat: f64, lon: f64) -> Coordinate {
    Coordinate {
        latitude: lat,
        longitude: lon,
    }
}

#[test]
fn simple_track() {
    let p1 = LocationSample::basic(at(-26.31832, -48.8702222), datetime!(2021-05-24 0:00 UTC));
    let p2 = LocationSample::basic(at(-26.3185919, -48.8619776), datetime!(2021-05-24 0:03 UTC))
        .speed(4.5);
    let p3 = LocationSample::basic(at(-26.3185861, -48.8619871), datetime!(2021-05-24 0:05 UTC));

    let track = Tracker::new("34 ABC 123".to_string(), "Sabah Servisi".to_string())
        .source("driver app v0.1".to_string())
        .build(&[p1.clone(), p2.clone(), p3.clone()]);
    assert_eq!(1, track.segments.len());
    assert_eq!(Some("Sabah Servisi".to_string()), track.name);
    assert_eq!(Some("Tracked by `34 ABC 123`".to_string()), track.description);
    assert_eq!(Some("driver app v0.1".to_string()), track.source);

    let segment = &track.segments[0];
    assert_eq!(3, segment.points.len());
    assert_eq!(geo::Point::from(p1.coordinate), segment.points[0].point());
    assert_eq!(Some(p1.recorded_at.into()), segment.points[0].time);
    assert_eq!(Some(4.5), segment.points[1].speed);
    assert_eq!(geo::Point::from(p3.coordinate), segment.points[2].point());
}

#[test]
fn gap_splits_segments() {
    let samples = vec![
        LocationSample::basic(at(41.0, 29.0), datetime!(2024-09-02 7:30 UTC)),
        LocationSample::basic(at(41.001, 29.0), datetime!(2024-09-02 7:31 UTC)),
        // signal lost for 12 minutes
        LocationSample::basic(at(41.01, 29.0), datetime!(2024-09-02 7:43 UTC)),
        LocationSample::basic(at(41.011, 29.0), datetime!(2024-09-02 7:48 UTC)),
    ];

    let track = Tracker::new("dev".to_string(), "gap".to_string()).build(&samples);
    assert_eq!(2, track.segments.len());
    assert_eq!(2, track.segments[0].points.len());
    assert_eq!(2, track.segments[1].points.len());

    let track = Tracker::new("dev".to_string(), "gap".to_string())
        .max_segment_gap(15)
        .build(&samples);
    assert_eq!(1, track.segments.len());

    let empty = Tracker::new("dev".to_string(), "none".to_string()).build(&[]);
    assert!(empty.segments.is_empty());
}

#[test]
fn session_gpx() -> Result<(), String> {
    let mut route = Route::with_stops(
        "7",
        "Akşam Servisi",
        vec![
            Stop::new("a", "Okul", at(41.0082, 28.9784), 1),
            Stop::new("b", "Kadıköy Merkez", at(40.9903, 29.0230), 2).offset(25.0),
        ],
    )
    .map_err(|e| e.to_string())?;
    route.vehicle_plate = Some("34 XYZ 456".to_string());

    let mut session =
        TrackingSession::new(route, TrackingOptions::default()).map_err(|e| e.to_string())?;
    session.update(LocationSample::basic(at(41.0082, 28.9784), datetime!(2024-09-02 16:00 UTC)));
    session.update(LocationSample::basic(at(41.0, 29.0), datetime!(2024-09-02 16:05 UTC)));

    let doc = GpxGenerator::from_session(&session).generate();
    assert_eq!(Some("service-tracker".to_string()), doc.creator);
    assert_eq!(1, doc.routes.len());
    assert_eq!(2, doc.routes[0].points.len());
    assert_eq!(Some("Kadıköy Merkez".to_string()), doc.routes[0].points[1].name);
    assert_eq!(1, doc.tracks.len());
    assert_eq!(
        Some("Tracked by `34 XYZ 456`".to_string()),
        doc.tracks[0].description
    );
    assert_eq!(2, doc.tracks[0].segments[0].points.len());

    let mut out = vec![];
    gpx::write(&doc, &mut out).map_err(|e| e.to_string())?;
    let xml = String::from_utf8(out).map_err(|e| e.to_string())?;
    assert!(xml.contains("<trkseg>"));
    assert!(xml.contains("Akşam Servisi"));

    Ok(())
}
