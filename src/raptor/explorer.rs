//! The round-based scan: route queue construction, trip boarding via
//! binary search, and footpath relaxation.

use std::collections::{HashMap, HashSet};

use bitvec::prelude::*;

use crate::shared::Time;
use crate::transform::{Network, Route};

use super::state::{Parent, RoundState, INF};

pub fn run(network: &Network, source: u32, departure: Time, max_rounds: u32) -> RoundState {
    let stop_count = network.stops.len();
    let mut state = RoundState::new(stop_count, max_rounds);
    state.rounds[0][source as usize] = departure.as_seconds();

    let routes_by_id: HashMap<u32, &Route> = network.routes.iter().map(|r| (r.id, r)).collect();

    let mut marked: BitVec<usize, Lsb0> = bitvec!(usize, Lsb0; 0; stop_count);
    marked.set(source as usize, true);

    for k in 1..=max_rounds as usize {
        if !marked.any() {
            break;
        }

        state.rounds[k] = state.rounds[k - 1].clone();
        state.parents[k] = state.parents[k - 1].clone();
        let previous_round = state.rounds[k - 1].clone();

        let mut queue: Vec<u32> = marked
            .iter_ones()
            .filter_map(|s| network.stop_to_routes.get(s))
            .flatten()
            .copied()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        queue.sort_unstable();

        let mut next_marked: BitVec<usize, Lsb0> = bitvec!(usize, Lsb0; 0; stop_count);
        for route_id in queue {
            if let Some(&route) = routes_by_id.get(&route_id) {
                scan_route(route, &previous_round, &mut state.rounds[k], &mut state.parents[k], &mut next_marked);
            }
        }

        let transit_marked: Vec<u32> = next_marked.iter_ones().map(|s| s as u32).collect();
        for stop_id in transit_marked {
            relax_transfers(network, stop_id, &mut state.rounds[k], &mut state.parents[k], &mut next_marked);
        }

        marked = next_marked;
    }

    state
}

fn scan_route(
    route: &Route,
    previous_round: &[i32],
    round_arrivals: &mut [i32],
    round_parents: &mut [Parent],
    marked: &mut BitVec<usize, Lsb0>,
) {
    let mut boarding: Option<(usize, u32)> = None;

    for (i, &stop_id) in route.stops.iter().enumerate() {
        if let Some((trip_idx, boarding_stop)) = boarding {
            let trip = &route.trips[trip_idx];
            if let Some(arrival) = trip.times[i].defined() {
                if arrival < round_arrivals[stop_id as usize] {
                    round_arrivals[stop_id as usize] = arrival;
                    round_parents[stop_id as usize] = Parent::Transit {
                        from_stop: boarding_stop,
                        route_id: route.id,
                        trip_internal_id: trip.internal_id,
                    };
                    marked.set(stop_id as usize, true);
                }
            }
        }

        let threshold = previous_round[stop_id as usize];
        if threshold == INF {
            continue;
        }

        if let Some(candidate_idx) = earliest_boardable_trip(route, i, threshold) {
            let adopt = match boarding {
                None => true,
                Some((current_idx, _)) => {
                    let current_time = route.trips[current_idx].times[i].defined().unwrap_or(INF);
                    let candidate_time = route.trips[candidate_idx].times[i].defined().unwrap_or(INF);
                    candidate_time < current_time
                }
            };
            if adopt {
                boarding = Some((candidate_idx, stop_id));
            }
        }
    }
}

/// Finds the earliest trip of `route` whose time at `stop_idx` is
/// defined and `>= threshold`, via binary search over trips sorted
/// ascending by first defined time (the transformer's trip ordering).
/// Assumes FIFO ordering: a route's relative trip order is the same at
/// every stop index, matching canonical RAPTOR's simplifying assumption.
fn earliest_boardable_trip(route: &Route, stop_idx: usize, threshold: i32) -> Option<usize> {
    let partition = route.trips.partition_point(|trip| match trip.times[stop_idx].defined() {
        Some(t) => t < threshold,
        None => true,
    });
    route.trips[partition..]
        .iter()
        .position(|trip| trip.times[stop_idx].defined().is_some())
        .map(|offset| partition + offset)
}

fn relax_transfers(
    network: &Network,
    from_stop: u32,
    round_arrivals: &mut [i32],
    round_parents: &mut [Parent],
    marked: &mut BitVec<usize, Lsb0>,
) {
    let Some(stop) = network.stops.get(from_stop as usize) else {
        return;
    };
    let base = round_arrivals[from_stop as usize];
    if base == INF {
        return;
    }
    for transfer in &stop.transfers {
        let candidate = base + transfer.walk_time_sec;
        let target = transfer.target_stop as usize;
        if candidate < round_arrivals[target] {
            round_arrivals[target] = candidate;
            round_parents[target] = Parent::Walk { from_stop };
            marked.set(target, true);
        }
    }
}
