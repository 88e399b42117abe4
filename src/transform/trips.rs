//! Trip alignment: maps each trip in a canonicalized route onto that
//! route's canonical stop pattern, flags trips missing a canonical stop
//! as partial, and orders the survivors.

use std::collections::HashMap;

use tracing::warn;

use crate::gtfs::Feed;

use super::routes::CanonicalRoute;
use super::{TimeSlot, Trip};

/// Returns the aligned, sorted trips for a canonical route plus the
/// number of trips dropped for being partial.
pub fn align(feed: &Feed, canonical: &CanonicalRoute, allow_partial: bool) -> (Vec<Trip>, usize) {
    let stop_time_groups = feed.stop_time_indices_by_trip();
    let mut trips = Vec::with_capacity(canonical.trip_ids.len());
    let mut dropped = 0usize;

    for &trip_id in &canonical.trip_ids {
        let trip_row = &feed.trips[trip_id as usize];
        let Some(indices) = stop_time_groups.get(&trip_row.external_id) else {
            continue;
        };

        let mut time_by_stop: HashMap<u32, i32> = HashMap::new();
        for &i in indices {
            let row = &feed.stop_times[i];
            let Ok(stop_id) = feed.internal_of_stop(&row.stop_id) else {
                continue;
            };
            if let Some(t) = row.arrival_time.or(row.departure_time) {
                time_by_stop.insert(stop_id, t.as_seconds());
            }
        }

        if time_by_stop.is_empty() {
            dropped += 1;
            continue;
        }

        let mut times = Vec::with_capacity(canonical.stops.len());
        let mut partial = false;
        for &stop_id in &canonical.stops {
            match time_by_stop.get(&stop_id) {
                Some(&t) => times.push(TimeSlot::Defined(t)),
                None => {
                    times.push(TimeSlot::Missing);
                    partial = true;
                }
            }
        }

        if partial && !allow_partial {
            dropped += 1;
            warn!(trip = %trip_row.external_id, "dropping partial trip");
            continue;
        }

        trips.push(Trip {
            internal_id: trip_id,
            external_id: trip_row.external_id.clone(),
            service_id: trip_row.service_id.clone(),
            times,
            partial,
        });
    }

    trips.sort_by(|a, b| {
        first_defined_key(a)
            .cmp(&first_defined_key(b))
            .then(a.internal_id.cmp(&b.internal_id))
    });

    (trips, dropped)
}

/// `first_defined_time` as a total-order key: partial trips with no
/// defined time at all sort after every trip that has one.
fn first_defined_key(trip: &Trip) -> (bool, i32) {
    match trip.first_defined_time() {
        Some(t) => (false, t),
        None => (true, 0),
    }
}
