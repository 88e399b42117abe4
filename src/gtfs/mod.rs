//! Feed Reader (C1): parses a GTFS directory into normalized, ID-assigned
//! in-memory tables. Referential integrity (trip → route, stop_time →
//! trip/stop) is deliberately *not* enforced here — that is the Feed
//! Validator's job (C2) — but malformed time fields and malformed
//! coordinates fail fast, matching the source-level parsing error kinds.

pub mod config;
pub mod models;

pub use config::GtfsFileNames;

use std::{
    collections::HashMap,
    path::Path,
    sync::Arc,
    time::Instant,
};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::shared::{geo::BadCoordinate, Coordinate, Time};
use models::{GtfsAgency, GtfsCalendar, GtfsCalendarDate, GtfsRoute, GtfsStop, GtfsStopTime, GtfsTransfer, GtfsTrip};

#[derive(Error, Debug)]
pub enum Error {
    #[error("missing required file: {0}")]
    MissingRequiredFile(String),
    #[error("bad CSV row in {file} at record {index}: {source}")]
    BadCsvRow {
        file: String,
        index: usize,
        #[source]
        source: csv::Error,
    },
    #[error("bad time format: {0:?}")]
    BadTimeFormat(String),
    #[error("bad coordinate for stop {stop_id}: {source}")]
    BadCoordinate {
        stop_id: String,
        #[source]
        source: BadCoordinate,
    },
    #[error("unknown id: {0}")]
    UnknownId(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A normalized stop with its lexicographically-assigned internal ID.
#[derive(Debug, Clone)]
pub struct Stop {
    pub id: u32,
    pub external_id: Arc<str>,
    pub name: String,
    pub coordinate: Coordinate,
}

/// A raw GTFS route, keyed by its own internal ID (distinct from the
/// direction-disambiguated route IDs the transformer assigns later).
#[derive(Debug, Clone)]
pub struct RouteRow {
    pub id: u32,
    pub external_id: Arc<str>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub route_type: i32,
}

#[derive(Debug, Clone)]
pub struct TripRow {
    pub id: u32,
    pub external_id: Arc<str>,
    pub route_id: Arc<str>,
    pub service_id: Arc<str>,
    pub direction_id: u8,
}

/// `arrival_time`/`departure_time` are `None` for interpolated intermediate
/// stops left blank in the source file; only a trip's first and last stop
/// are required to carry an explicit time.
#[derive(Debug, Clone)]
pub struct StopTimeRow {
    pub trip_id: Arc<str>,
    pub stop_id: Arc<str>,
    pub stop_sequence: u32,
    pub arrival_time: Option<Time>,
    pub departure_time: Option<Time>,
}

#[derive(Debug, Clone)]
pub struct TransferRow {
    pub from_stop_id: Arc<str>,
    pub to_stop_id: Arc<str>,
    pub min_transfer_time: Option<i32>,
}

/// A loaded, ID-normalized GTFS feed. Entity vectors are sorted
/// lexicographically by external ID; an entity's position in its vector
/// equals its internal ID.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub agencies: Vec<Arc<str>>,
    pub stops: Vec<Stop>,
    pub routes: Vec<RouteRow>,
    pub trips: Vec<TripRow>,
    pub stop_times: Vec<StopTimeRow>,
    pub transfers: Vec<TransferRow>,
    pub calendar: Vec<GtfsCalendar>,
    pub calendar_dates: Vec<GtfsCalendarDate>,

    pub(crate) stop_index: HashMap<Arc<str>, u32>,
    pub(crate) route_index: HashMap<Arc<str>, u32>,
    pub(crate) trip_index: HashMap<Arc<str>, u32>,
}

impl Feed {
    pub fn read_from_dir<P: AsRef<Path>>(dir: P, names: &GtfsFileNames) -> Result<Self, Error> {
        let dir = dir.as_ref();
        let started = Instant::now();

        let agencies = read_agencies(dir, names)?;

        let mut raw_stops = read_required_table::<GtfsStop>(dir, &names.stops_path)?;
        raw_stops.sort_by(|a, b| a.stop_id.cmp(&b.stop_id));
        let mut stop_index = HashMap::with_capacity(raw_stops.len());
        let mut stops = Vec::with_capacity(raw_stops.len());
        for (i, row) in raw_stops.into_iter().enumerate() {
            let id = i as u32;
            let external_id: Arc<str> = Arc::from(row.stop_id.as_str());
            let coordinate =
                Coordinate::new(row.stop_lat, row.stop_lon).map_err(|source| Error::BadCoordinate {
                    stop_id: row.stop_id.clone(),
                    source,
                })?;
            stop_index.insert(external_id.clone(), id);
            stops.push(Stop {
                id,
                external_id,
                name: row.stop_name,
                coordinate,
            });
        }

        let mut raw_routes = read_required_table::<GtfsRoute>(dir, &names.routes_path)?;
        raw_routes.sort_by(|a, b| a.route_id.cmp(&b.route_id));
        let mut route_index = HashMap::with_capacity(raw_routes.len());
        let mut routes = Vec::with_capacity(raw_routes.len());
        for (i, row) in raw_routes.into_iter().enumerate() {
            let id = i as u32;
            let external_id: Arc<str> = Arc::from(row.route_id.as_str());
            route_index.insert(external_id.clone(), id);
            routes.push(RouteRow {
                id,
                external_id,
                short_name: row.route_short_name,
                long_name: row.route_long_name,
                route_type: row.route_type,
            });
        }

        let calendar = read_optional_table::<GtfsCalendar>(dir, &names.calendar_path)?;
        let calendar_dates = read_optional_table::<GtfsCalendarDate>(dir, &names.calendar_dates_path)?;
        if calendar.is_empty() && calendar_dates.is_empty() {
            debug!("feed has neither calendar.txt nor calendar_dates.txt; period split will be unavailable");
        }

        let mut raw_trips = read_required_table::<GtfsTrip>(dir, &names.trips_path)?;
        raw_trips.sort_by(|a, b| a.trip_id.cmp(&b.trip_id));
        let mut trip_index = HashMap::with_capacity(raw_trips.len());
        let mut trips = Vec::with_capacity(raw_trips.len());
        for (i, row) in raw_trips.into_iter().enumerate() {
            let id = i as u32;
            let external_id: Arc<str> = Arc::from(row.trip_id.as_str());
            trip_index.insert(external_id.clone(), id);
            trips.push(TripRow {
                id,
                external_id,
                route_id: Arc::from(row.route_id.as_str()),
                service_id: Arc::from(row.service_id.as_str()),
                direction_id: row.direction_id.unwrap_or(0),
            });
        }

        let raw_stop_times = read_required_table::<GtfsStopTime>(dir, &names.stop_times_path)?;
        let mut stop_times = Vec::with_capacity(raw_stop_times.len());
        for row in raw_stop_times {
            let arrival_time = parse_optional_time(&row.arrival_time)?;
            let departure_time = parse_optional_time(&row.departure_time)?;
            stop_times.push(StopTimeRow {
                trip_id: Arc::from(row.trip_id.as_str()),
                stop_id: Arc::from(row.stop_id.as_str()),
                stop_sequence: row.stop_sequence,
                arrival_time,
                departure_time,
            });
        }

        let raw_transfers = read_optional_table::<GtfsTransfer>(dir, &names.transfers_path)?;
        let transfers = raw_transfers
            .into_iter()
            .map(|row| TransferRow {
                from_stop_id: Arc::from(row.from_stop_id.as_str()),
                to_stop_id: Arc::from(row.to_stop_id.as_str()),
                min_transfer_time: row.min_transfer_time,
            })
            .collect();

        info!(
            stops = stops.len(),
            routes = routes.len(),
            trips = trips.len(),
            stop_times = stop_times.len(),
            "read GTFS feed in {:.2?}",
            started.elapsed()
        );

        Ok(Self {
            agencies,
            stops,
            routes,
            trips,
            stop_times,
            transfers,
            calendar,
            calendar_dates,
            stop_index,
            route_index,
            trip_index,
        })
    }

    pub fn internal_of_stop(&self, external_id: &str) -> Result<u32, Error> {
        self.stop_index
            .get(external_id)
            .copied()
            .ok_or_else(|| Error::UnknownId(external_id.to_string()))
    }

    pub fn internal_of_route(&self, external_id: &str) -> Result<u32, Error> {
        self.route_index
            .get(external_id)
            .copied()
            .ok_or_else(|| Error::UnknownId(external_id.to_string()))
    }

    pub fn internal_of_trip(&self, external_id: &str) -> Result<u32, Error> {
        self.trip_index
            .get(external_id)
            .copied()
            .ok_or_else(|| Error::UnknownId(external_id.to_string()))
    }

    /// Groups stop_time row indices by trip, preserving the order each
    /// trip's rows appeared in the source file — required so the
    /// validator can detect an unsorted `stop_sequence` as authored,
    /// rather than after any normalizing sort.
    pub fn stop_time_indices_by_trip(&self) -> HashMap<Arc<str>, Vec<usize>> {
        let mut groups: HashMap<Arc<str>, Vec<usize>> = HashMap::new();
        for (i, row) in self.stop_times.iter().enumerate() {
            groups.entry(row.trip_id.clone()).or_default().push(i);
        }
        groups
    }
}

fn read_agencies(dir: &Path, names: &GtfsFileNames) -> Result<Vec<Arc<str>>, Error> {
    let primary = read_optional_table::<GtfsAgency>(dir, &names.agency_path)?;
    let rows = if !primary.is_empty() {
        primary
    } else {
        let fallback = read_optional_table::<GtfsAgency>(dir, &names.agency_path_fallback)?;
        if fallback.is_empty() {
            warn!("feed has neither agency.txt nor agencies.txt");
        }
        fallback
    };
    Ok(rows.into_iter().map(|a| Arc::from(a.agency_name.as_str())).collect())
}

/// Parses a GTFS time-of-day field, treating a blank field as an
/// unspecified (interpolated) time rather than a format error.
fn parse_optional_time(raw: &str) -> Result<Option<Time>, Error> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    Time::from_hms(raw).map(Some).ok_or_else(|| Error::BadTimeFormat(raw.to_string()))
}

fn read_required_table<T: DeserializeOwned>(dir: &Path, file_name: &str) -> Result<Vec<T>, Error> {
    let path = dir.join(file_name);
    if !path.is_file() {
        return Err(Error::MissingRequiredFile(file_name.to_string()));
    }
    read_table_at(&path, file_name)
}

fn read_optional_table<T: DeserializeOwned>(dir: &Path, file_name: &str) -> Result<Vec<T>, Error> {
    let path = dir.join(file_name);
    if !path.is_file() {
        return Ok(Vec::new());
    }
    read_table_at(&path, file_name)
}

/// Reads a whole CSV table into memory, stripping a leading UTF-8 BOM if
/// present.
fn read_table_at<T: DeserializeOwned>(path: &Path, file_name: &str) -> Result<Vec<T>, Error> {
    let bytes = std::fs::read(path)?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(bytes);
    let mut rows = Vec::new();
    for (i, result) in reader.deserialize().enumerate() {
        let record: T = result.map_err(|source| Error::BadCsvRow {
            file: file_name.to_string(),
            index: i,
            source,
        })?;
        rows.push(record);
    }
    Ok(rows)
}
