//! End-to-end coverage: a GTFS fixture directory in, artifacts out,
//! then a RAPTOR query against the resulting network.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use gtfsraptor::gtfs::{Feed, GtfsFileNames};
use gtfsraptor::pipeline::{self, ConvertConfig, OutputFormat};
use gtfsraptor::raptor::Engine;
use gtfsraptor::shared::Time;
use gtfsraptor::transform::{self, TransformConfig};
use gtfsraptor::validate;
use tempfile::TempDir;

fn write_file(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

/// A three-stop linear route (A->B->C) with two trips an hour apart.
fn linear_feed_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "stops.txt",
        "stop_id,stop_name,stop_lat,stop_lon\nA,Stop A,0.0,0.0\nB,Stop B,0.0,0.01\nC,Stop C,0.0,0.02\n",
    );
    write_file(
        dir.path(),
        "routes.txt",
        "route_id,route_short_name,route_long_name,route_type\nR1,1,Line One,3\n",
    );
    write_file(
        dir.path(),
        "trips.txt",
        "route_id,service_id,trip_id,direction_id\nR1,WD,T1,0\nR1,WD,T2,0\n",
    );
    write_file(
        dir.path(),
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         T1,08:00:00,08:00:00,A,1\nT1,08:10:00,08:10:00,B,2\nT1,08:20:00,08:20:00,C,3\n\
         T2,09:00:00,09:00:00,A,1\nT2,09:10:00,09:10:00,B,2\nT2,09:20:00,09:20:00,C,3\n",
    );
    dir
}

#[test]
fn linear_route_boards_earliest_trip() {
    let feed_dir = linear_feed_dir();
    let feed = Feed::read_from_dir(feed_dir.path(), &GtfsFileNames::default()).unwrap();
    let report = validate::validate(&feed);
    assert!(report.valid, "{:?}", report.errors);

    let network = transform::build_network(&feed, &TransformConfig::default());
    assert_eq!(network.routes.len(), 1);
    assert_eq!(network.routes[0].trips.len(), 2);

    let engine = Engine::new(&network);
    let a = feed.internal_of_stop("A").unwrap();
    let c = feed.internal_of_stop("C").unwrap();
    let itinerary = engine
        .query(a, c, Time::from_seconds(8 * 3600))
        .unwrap()
        .expect("a journey should exist");
    assert_eq!(itinerary.arrival_time.as_seconds(), 8 * 3600 + 1200);
    assert_eq!(itinerary.transit_leg_count(), 1);
}

/// A hub H branches into two directions (H->X and H->Y); canonicalizing
/// by `(route_id, direction_id)` should keep both patterns distinct.
#[test]
fn branching_directions_stay_separate_routes() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "stops.txt",
        "stop_id,stop_name,stop_lat,stop_lon\nH,Hub,0.0,0.0\nX,Stop X,0.0,0.01\nY,Stop Y,0.0,-0.01\n",
    );
    write_file(
        dir.path(),
        "routes.txt",
        "route_id,route_short_name,route_long_name,route_type\nR1,1,,3\n",
    );
    write_file(
        dir.path(),
        "trips.txt",
        "route_id,service_id,trip_id,direction_id\nR1,WD,OUT,0\nR1,WD,BACK,1\n",
    );
    write_file(
        dir.path(),
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         OUT,08:00:00,08:00:00,H,1\nOUT,08:10:00,08:10:00,X,2\n\
         BACK,08:00:00,08:00:00,H,1\nBACK,08:10:00,08:10:00,Y,2\n",
    );

    let feed = Feed::read_from_dir(dir.path(), &GtfsFileNames::default()).unwrap();
    let network = transform::build_network(&feed, &TransformConfig::default());
    assert_eq!(network.routes.len(), 2);
    let mut stop_ids: Vec<Vec<u32>> = network.routes.iter().map(|r| r.stops.clone()).collect();
    stop_ids.sort();
    assert_ne!(stop_ids[0], stop_ids[1]);
}

/// Two disconnected stops, only reachable via a generated walking
/// footpath.
#[test]
fn footpath_transfer_connects_otherwise_disjoint_stops() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "stops.txt",
        "stop_id,stop_name,stop_lat,stop_lon\nP,Platform P,0.0,0.0\nQ,Platform Q,0.0,0.001\n",
    );
    write_file(
        dir.path(),
        "routes.txt",
        "route_id,route_short_name,route_long_name,route_type\nR1,1,,3\n",
    );
    write_file(
        dir.path(),
        "trips.txt",
        "route_id,service_id,trip_id,direction_id\nR1,WD,T1,0\n",
    );
    write_file(
        dir.path(),
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\nT1,08:00:00,08:00:00,Q,1\n",
    );

    let feed = Feed::read_from_dir(dir.path(), &GtfsFileNames::default()).unwrap();
    let config = TransformConfig {
        gen_transfers: true,
        transfer_cutoff_m: 500.0,
        ..TransformConfig::default()
    };
    let network = transform::build_network(&feed, &config);

    let p = feed.internal_of_stop("P").unwrap();
    let q = feed.internal_of_stop("Q").unwrap();
    let stop = &network.stops[p as usize];
    assert!(stop.transfers.iter().any(|t| t.target_stop == q));

    let engine = Engine::new(&network);
    let itinerary = engine
        .query(p, q, Time::from_seconds(0))
        .unwrap()
        .expect("a walking transfer should reach Q");
    assert_eq!(itinerary.transit_leg_count(), 0);
}

/// A trip missing an intermediate stop's time is partial; with
/// `allow_partial_trips` unset it is dropped entirely from the network.
#[test]
fn partial_trip_is_rejected_by_default() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "stops.txt",
        "stop_id,stop_name,stop_lat,stop_lon\nA,Stop A,0.0,0.0\nB,Stop B,0.0,0.01\nC,Stop C,0.0,0.02\n",
    );
    write_file(
        dir.path(),
        "routes.txt",
        "route_id,route_short_name,route_long_name,route_type\nR1,1,,3\n",
    );
    write_file(
        dir.path(),
        "trips.txt",
        "route_id,service_id,trip_id,direction_id\nR1,WD,FULL,0\nR1,WD,PARTIAL,0\n",
    );
    write_file(
        dir.path(),
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         FULL,08:00:00,08:00:00,A,1\nFULL,08:10:00,08:10:00,B,2\nFULL,08:20:00,08:20:00,C,3\n\
         PARTIAL,09:00:00,09:00:00,A,1\nPARTIAL,,,B,2\nPARTIAL,09:20:00,09:20:00,C,3\n",
    );

    let feed = Feed::read_from_dir(dir.path(), &GtfsFileNames::default()).unwrap();
    let network = transform::build_network(&feed, &TransformConfig::default());
    assert_eq!(network.routes[0].trips.len(), 1);
    assert_eq!(network.routes[0].trips[0].external_id.as_ref(), "FULL");

    let with_partial = transform::build_network(
        &feed,
        &TransformConfig {
            allow_partial_trips: true,
            ..TransformConfig::default()
        },
    );
    assert_eq!(with_partial.routes[0].trips.len(), 2);
    assert!(with_partial.routes[0].trips.iter().any(|t| t.partial));
}

/// An inverted `stop_sequence` within a trip is caught by validation
/// before the transformer ever runs.
#[test]
fn validation_catches_inverted_stop_sequence() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "stops.txt",
        "stop_id,stop_name,stop_lat,stop_lon\nA,Stop A,0.0,0.0\nB,Stop B,0.0,0.01\n",
    );
    write_file(
        dir.path(),
        "routes.txt",
        "route_id,route_short_name,route_long_name,route_type\nR1,1,,3\n",
    );
    write_file(
        dir.path(),
        "trips.txt",
        "route_id,service_id,trip_id,direction_id\nR1,WD,T1,0\n",
    );
    write_file(
        dir.path(),
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\nT1,08:10:00,08:10:00,B,2\nT1,08:00:00,08:00:00,A,1\n",
    );

    let feed = Feed::read_from_dir(dir.path(), &GtfsFileNames::default()).unwrap();
    let report = validate::validate(&feed);
    assert!(!report.valid);
    assert!(report.errors.iter().any(|e| e.contains("unordered stop_sequence")));
}

#[test]
fn convert_writes_artifacts_and_passes_its_own_validator() {
    let feed_dir = linear_feed_dir();
    let out_dir = TempDir::new().unwrap();

    let config = ConvertConfig {
        input: feed_dir.path().to_path_buf(),
        output: out_dir.path().to_path_buf(),
        format: OutputFormat::Both,
        ..ConvertConfig::default()
    };
    pipeline::convert(&config).unwrap();

    for name in ["routes.bin", "stops.bin", "index.bin", "manifest.json", "routes.json"] {
        assert!(out_dir.path().join(name).is_file(), "missing {name}");
    }

    let report = pipeline::check_artifacts(out_dir.path()).unwrap();
    assert!(report.valid, "{:?}", report.errors);
}

#[test]
fn convert_rejects_failing_validation() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "stops.txt",
        "stop_id,stop_name,stop_lat,stop_lon\nA,Stop A,0.0,0.0\n",
    );
    write_file(dir.path(), "routes.txt", "route_id,route_short_name,route_long_name,route_type\n");
    write_file(dir.path(), "trips.txt", "route_id,service_id,trip_id,direction_id\n");
    write_file(
        dir.path(),
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n",
    );

    let out_dir = TempDir::new().unwrap();
    let config = ConvertConfig {
        input: dir.path().to_path_buf(),
        output: out_dir.path().to_path_buf(),
        ..ConvertConfig::default()
    };
    let err = pipeline::convert(&config).unwrap_err();
    assert!(matches!(err, pipeline::Error::ValidationFailed(_)));
}

#[test]
fn convert_rejects_lyon_mode() {
    let feed_dir = linear_feed_dir();
    let out_dir = TempDir::new().unwrap();
    let config = ConvertConfig {
        input: feed_dir.path().to_path_buf(),
        output: out_dir.path().to_path_buf(),
        mode: pipeline::PeriodMode::Lyon,
        ..ConvertConfig::default()
    };
    let err = pipeline::convert(&config).unwrap_err();
    assert!(err.is_usage_error());
}

#[test]
fn manifest_outputs_and_inputs_are_recorded() {
    let feed_dir = linear_feed_dir();
    let out_dir = TempDir::new().unwrap();
    let config = ConvertConfig {
        input: feed_dir.path().to_path_buf(),
        output: out_dir.path().to_path_buf(),
        ..ConvertConfig::default()
    };
    pipeline::convert(&config).unwrap();

    let manifest_bytes = fs::read(out_dir.path().join("manifest.json")).unwrap();
    let manifest: BTreeMap<String, serde_json::Value> = serde_json::from_slice(&manifest_bytes).unwrap();
    assert!(manifest.contains_key("outputs"));
    assert!(manifest.contains_key("created_at"));
}
