//! service-tracker cli - replay GPS samples of a service route and project ETAs

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::sync::mpsc;
use std::thread;

use argopt::{cmd_group, subcmd};
use csv::Reader;
use log::info;
use serde::Deserialize;
use time::format_description::well_known;
use time::OffsetDateTime;

use service_tracker::sources::CsvSource;
use service_tracker::{
    project, Coordinate, FieldsConfiguration, GpxGenerator, Route, SampleSource, SourceError,
    TrackingOptions, TrackingSession, Update,
};

/// CLI of service-tracker - Follow a school service route from its GPS log
#[cmd_group(commands = [replay, eta])]
fn main() -> Result<(), String> {}

/// Replay a CSV location log through a tracking session, one JSON snapshot per line
#[subcmd]
fn replay(
    /// Route definition, YAML
    route: String,
    /// CSV location log
    csv_path: String,
    /// Start time, RFC3339 format
    start: String,
    /// End time, RFC3339 format
    end: String,
    /// Write the tracked history to this GPX file
    #[opt(long)]
    gpx_out: Option<String>,
    /// Fields and tracking configuration. Default: .servis.yaml, ~/.servis.yaml
    #[opt(long)]
    config: Option<String>,
) -> Result<(), String> {
    init_logging();

    let start = OffsetDateTime::parse(&start, &well_known::Rfc3339)
        .map_err(|e| format!("Failed on parse the start time: {}", e))?;
    let end = OffsetDateTime::parse(&end, &well_known::Rfc3339)
        .map_err(|e| format!("Failed on parse the end time: {}", e))?;

    let route = load_route(&route).map_err(|e| format!("Failed on load the route: {}", e))?;

    let csv = File::open(csv_path).map_err(|e| format!("Failed on open the CSV file: {}", e))?;
    let (fields, options) = load_configs(config);

    let mut source = CsvSource::new(Reader::from_reader(csv), Some(fields)).for_route(&route.id);
    let samples = source.fetch(start, end).map_err(|e| e.to_string())?;
    info!("{} samples loaded for route `{}`", samples.len(), route.id);

    let mut session = TrackingSession::new(route, options).map_err(|e| e.to_string())?;

    // the log plays the device: samples cross a channel into the session
    let (tx, rx) = mpsc::channel();
    let device = thread::spawn(move || {
        for sample in samples {
            if tx.send(sample).is_err() {
                break;
            }
        }
    });
    let updates = session.drain(&rx);
    device.join().map_err(|_| "Device replay thread panicked")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut rejected = 0;
    for update in &updates {
        match update {
            Update::Accepted(snap) => {
                serde_json::to_writer(&mut out, snap.as_ref()).map_err(|e| e.to_string())?;
                writeln!(out).map_err(|e| e.to_string())?;
            }
            Update::Rejected { .. } => rejected += 1,
        }
    }
    info!(
        "{} samples accepted, {} rejected, {:.2} km traveled, session {:?}",
        updates.len() - rejected,
        rejected,
        session.distance_traveled_km(),
        session.state()
    );

    if let Some(destination) = gpx_out {
        let destination = File::create(destination)
            .map_err(|e| format!("Failed on create the destination file: {}", e))?;

        let doc = GpxGenerator::from_session(&session).generate();

        let mut writer = BufWriter::new(destination);
        gpx::write(&doc, &mut writer).map_err(|e| e.to_string())?;
    }

    Ok(())
}

/// Project the arrival at the remaining stops from a position
#[subcmd]
fn eta(
    /// Route definition, YAML
    route: String,
    /// Current latitude
    latitude: f64,
    /// Current longitude
    longitude: f64,
    /// Order of the last stop already reached
    #[opt(long)]
    after_order: Option<u32>,
    /// Average speed in km/h, overrides the configuration
    #[opt(long)]
    speed: Option<f64>,
    /// Fields and tracking configuration. Default: .servis.yaml, ~/.servis.yaml
    #[opt(long)]
    config: Option<String>,
) -> Result<(), String> {
    init_logging();

    let route = load_route(&route).map_err(|e| format!("Failed on load the route: {}", e))?;
    let (_, options) = load_configs(config);

    let here = Coordinate::new(latitude, longitude).map_err(|e| e.to_string())?;
    let stops = match after_order {
        Some(order) => route.remaining_stops_from(order),
        None => route.stops(),
    };

    let etas = project(
        &here,
        stops,
        speed.unwrap_or(options.average_speed_kmh),
        OffsetDateTime::now_utc(),
    )
    .map_err(|e| e.to_string())?;

    let json = serde_json::to_string_pretty(&etas).map_err(|e| e.to_string())?;
    println!("{}", json);

    Ok(())
}

fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

fn load_route(path: &str) -> Result<Route, SourceError> {
    let yaml = fs::read_to_string(path)?;

    Ok(serde_yaml::from_str(&yaml)?)
}

/// Load the current config
fn load_configs(provided: Option<String>) -> (FieldsConfiguration, TrackingOptions) {
    let mut options = vec![];

    if let Some(sprovided) = provided {
        options.push(sprovided);
    }

    options.push(".servis.yaml".to_string());

    if let Some(home) = dirs::home_dir() {
        if let Some(shome) = home.to_str() {
            options.push(format!("{}/.servis.yaml", shome));
        }
    }

    let mut yaml: Option<String> = None;
    for fi in options {
        if let Ok(s) = fs::read_to_string(fi) {
            yaml = Some(s);
            break;
        }
    }

    if let Some(s) = yaml {
        match serde_yaml::from_str::<Configs>(&s) {
            Ok(conf) => return (conf.fields, conf.tracking),
            Err(e) => log::warn!("Ignoring invalid configuration: {}", e),
        }
    }

    (FieldsConfiguration::default(), TrackingOptions::default())
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
struct Configs {
    #[serde(default)]
    pub fields: FieldsConfiguration,
    #[serde(default)]
    pub tracking: TrackingOptions,
}

#[test]
fn parse_configs() -> Result<(), String> {
    let yaml = "{}";

    let conf: Configs = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;

    assert_eq!(
        Configs {
            fields: FieldsConfiguration::default(),
            tracking: TrackingOptions {
                max_accuracy_meters: 100.0,
                average_speed_kmh: 30.0,
                arrival_radius_meters: 50.0,
                max_segment_gap_minutes: 5,
            }
        },
        conf
    );

    let yaml = "\nfields:\n  time: recorded_at\ntracking:\n  average_speed_kmh: 25";

    let conf: Configs = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;

    assert_eq!("recorded_at", conf.fields.time);
    assert_eq!("coordinates", conf.fields.coordinates);
    assert_eq!(25.0, conf.tracking.average_speed_kmh);
    assert_eq!(100.0, conf.tracking.max_accuracy_meters);

    Ok(())
}
