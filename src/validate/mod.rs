//! Feed Validator (C2): checks referential integrity and ordering
//! invariants the reader deliberately leaves unchecked. Produces a report
//! rather than failing fast, so a caller can see every problem in one
//! pass instead of fixing them one `BadCsvRow` at a time.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::gtfs::Feed;

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: BTreeMap<String, usize>,
}

impl ValidationReport {
    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

pub fn validate(feed: &Feed) -> ValidationReport {
    let mut report = ValidationReport::default();

    report.stats.insert("agencies".into(), feed.agencies.len());
    report.stats.insert("stops".into(), feed.stops.len());
    report.stats.insert("routes".into(), feed.routes.len());
    report.stats.insert("trips".into(), feed.trips.len());
    report.stats.insert("stop_times".into(), feed.stop_times.len());
    report.stats.insert("transfers".into(), feed.transfers.len());

    if feed.routes.is_empty() {
        report.error("feed has zero routes");
    }

    for stop in &feed.stops {
        if stop.name.trim().is_empty() {
            report.warn(format!("stop {} has an empty stop_name", stop.external_id));
        }
    }

    for trip in &feed.trips {
        if feed.internal_of_route(&trip.route_id).is_err() {
            report.error(format!(
                "trip {} references missing route {}",
                trip.external_id, trip.route_id
            ));
        }
    }

    let groups = feed.stop_time_indices_by_trip();
    for (trip_id, indices) in &groups {
        if feed.internal_of_trip(trip_id).is_err() {
            report.error(format!("stop_time references missing trip {trip_id}"));
            continue;
        }

        let rows: Vec<_> = indices.iter().map(|&i| &feed.stop_times[i]).collect();

        for row in &rows {
            if feed.internal_of_stop(&row.stop_id).is_err() {
                report.error(format!(
                    "stop_time references missing stop {} in trip {trip_id}",
                    row.stop_id
                ));
            }
        }

        let sequences: Vec<u32> = rows.iter().map(|r| r.stop_sequence).collect();
        let mut sorted = sequences.clone();
        sorted.sort_unstable();
        if sequences != sorted || has_duplicate(&sorted) {
            report.error(format!("unordered stop_sequence in trip {trip_id}"));
        }

        match (rows.first(), rows.last()) {
            (Some(first), Some(last))
                if first.arrival_time.is_none() || last.departure_time.is_none() =>
            {
                report.error(format!(
                    "first arrival or last departure undefined for trip {trip_id}"
                ));
            }
            _ => {}
        }

        check_time_regressions(&rows, trip_id, &mut report);
    }

    for transfer in &feed.transfers {
        if let Some(seconds) = transfer.min_transfer_time {
            if seconds < 0 || seconds > 3600 {
                report.warn(format!(
                    "transfer {}->{} has out-of-range min_transfer_time {seconds}",
                    transfer.from_stop_id, transfer.to_stop_id
                ));
            }
        }
    }

    report.valid = report.errors.is_empty();
    if report.valid {
        info!(warnings = report.warnings.len(), "feed passed validation");
    } else {
        warn!(errors = report.errors.len(), "feed failed validation");
    }
    report
}

fn has_duplicate(sorted: &[u32]) -> bool {
    sorted.windows(2).any(|w| w[0] == w[1])
}

fn check_time_regressions(
    rows: &[&crate::gtfs::StopTimeRow],
    trip_id: &str,
    report: &mut ValidationReport,
) {
    let mut last_time = None;
    for row in rows {
        for candidate in [row.arrival_time, row.departure_time] {
            let Some(t) = candidate else { continue };
            if let Some(prev) = last_time {
                if t < prev {
                    report.warn(format!("time regression within trip {trip_id}"));
                }
            }
            last_time = Some(t);
        }
    }
}
