//! Transformer (C3): turns a validated [`Feed`] into the in-memory
//! [`Network`] model the codec and query engine operate on. Route
//! canonicalization, trip alignment, transfer assembly, and the
//! stop→routes index all live here; period splitting is a thin filter
//! applied after the base network is built once.

pub mod periods;
pub mod routes;
pub mod transfers;
pub mod trips;

use std::{collections::HashSet, sync::Arc, time::Instant};

use tracing::{info, warn};

use crate::gtfs::Feed;
use crate::shared::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSlot {
    Defined(i32),
    Missing,
}

impl TimeSlot {
    pub fn defined(self) -> Option<i32> {
        match self {
            TimeSlot::Defined(t) => Some(t),
            TimeSlot::Missing => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Trip {
    pub internal_id: u32,
    pub external_id: Arc<str>,
    pub service_id: Arc<str>,
    pub times: Vec<TimeSlot>,
    pub partial: bool,
}

impl Trip {
    pub fn first_defined_time(&self) -> Option<i32> {
        self.times.iter().find_map(|t| t.defined())
    }
}

#[derive(Debug, Clone)]
pub struct Route {
    pub id: u32,
    pub name: String,
    pub stops: Vec<u32>,
    pub trips: Vec<Trip>,
}

#[derive(Debug, Clone)]
pub struct Transfer {
    pub target_stop: u32,
    pub walk_time_sec: i32,
}

#[derive(Debug, Clone)]
pub struct NetworkStop {
    pub id: u32,
    pub external_id: Arc<str>,
    pub name: String,
    pub coordinate: Coordinate,
    pub transfers: Vec<Transfer>,
}

#[derive(Debug, Clone)]
pub struct Network {
    pub stops: Vec<NetworkStop>,
    pub routes: Vec<Route>,
    /// Indexed by internal stop ID; each entry is a strictly ascending,
    /// deduplicated list of route IDs whose canonical pattern visits it.
    pub stop_to_routes: Vec<Vec<u32>>,
}

#[derive(Debug, Clone)]
pub struct TransformConfig {
    pub allow_partial_trips: bool,
    pub gen_transfers: bool,
    pub speed_walk_m_s: f64,
    pub transfer_cutoff_m: f64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            allow_partial_trips: false,
            gen_transfers: false,
            speed_walk_m_s: 1.33,
            transfer_cutoff_m: 500.0,
        }
    }
}

/// Builds the base network across the whole feed, independent of any
/// period split. Callers that split by period should call
/// [`filter_by_service`] on the result rather than rebuilding routes.
pub fn build_network(feed: &Feed, config: &TransformConfig) -> Network {
    use rayon::prelude::*;

    let started = Instant::now();

    // Alignment is independent per route, so it is safe to parallelize;
    // `par_iter().collect()` preserves the input (route ID) order, so
    // output stays deterministic regardless of the thread count a
    // caller's pool was built with.
    let canonical_routes = routes::canonicalize(feed);
    let aligned: Vec<(Option<Route>, usize)> = canonical_routes
        .into_par_iter()
        .map(|canonical| {
            let (trips, dropped) = trips::align(feed, &canonical, config.allow_partial_trips);
            if trips.is_empty() {
                (None, dropped)
            } else {
                let route = Route {
                    id: canonical.id,
                    name: canonical.name,
                    stops: canonical.stops,
                    trips,
                };
                (Some(route), dropped)
            }
        })
        .collect();

    let mut dropped_trips = 0usize;
    let mut built_routes = Vec::with_capacity(aligned.len());
    for (route, dropped) in aligned {
        dropped_trips += dropped;
        match route {
            Some(route) => built_routes.push(route),
            None => warn!("route has zero surviving trips; dropping"),
        }
    }
    built_routes.sort_by_key(|r| r.id);

    let stop_to_routes = build_stop_index(feed.stops.len(), &built_routes);
    let stop_transfers = transfers::assemble(feed, config);

    let stops = feed
        .stops
        .iter()
        .map(|s| NetworkStop {
            id: s.id,
            external_id: s.external_id.clone(),
            name: s.name.clone(),
            coordinate: s.coordinate,
            transfers: stop_transfers.get(&s.id).cloned().unwrap_or_default(),
        })
        .collect();

    info!(
        routes = built_routes.len(),
        dropped_trips,
        "transformed network in {:.2?}",
        started.elapsed()
    );

    Network {
        stops,
        routes: built_routes,
        stop_to_routes,
    }
}

/// Filters a base network's routes down to trips active in
/// `service_ids`, dropping routes with no surviving trips. Stop and
/// transfer data is shared unchanged since footpaths do not depend on
/// the service calendar.
pub fn filter_by_service(network: &Network, service_ids: &HashSet<Arc<str>>) -> Network {
    let mut routes = Vec::new();
    for route in &network.routes {
        let trips: Vec<Trip> = route
            .trips
            .iter()
            .filter(|t| service_ids.contains(&t.service_id))
            .cloned()
            .collect();
        if trips.is_empty() {
            continue;
        }
        routes.push(Route {
            id: route.id,
            name: route.name.clone(),
            stops: route.stops.clone(),
            trips,
        });
    }
    let stop_to_routes = build_stop_index(network.stops.len(), &routes);
    Network {
        stops: network.stops.clone(),
        routes,
        stop_to_routes,
    }
}

fn build_stop_index(stop_count: usize, routes: &[Route]) -> Vec<Vec<u32>> {
    let mut index = vec![Vec::new(); stop_count];
    for route in routes {
        for &stop_id in &route.stops {
            index[stop_id as usize].push(route.id);
        }
    }
    for routes_at_stop in &mut index {
        routes_at_stop.sort_unstable();
        routes_at_stop.dedup();
    }
    index
}
