//! Debug JSON writers: the same data the binary codec encodes, as
//! sorted-keys, pretty-printed JSON. Unlike the binary format, partial
//! trips are retained (with `null` in place of a missing time) since
//! JSON has no delta-stream sentinel problem to avoid.

use std::io::Write;

use serde::Serialize;
use serde_json::{to_value, to_writer_pretty, Result};

use crate::transform::Network;

#[derive(Serialize)]
struct RouteDoc {
    route_id_internal: u32,
    route_name: String,
    stops: Vec<u32>,
    trips: Vec<TripDoc>,
}

#[derive(Serialize)]
struct TripDoc {
    trip_id_internal: u32,
    partial: bool,
    times: Vec<Option<i32>>,
}

#[derive(Serialize)]
struct StopDoc {
    stop_id_internal: u32,
    name: String,
    lat: f64,
    lon: f64,
    route_ids: Vec<u32>,
    transfers: Vec<TransferDoc>,
}

#[derive(Serialize)]
struct TransferDoc {
    target_stop_id: u32,
    walk_time_sec: i32,
}

#[derive(Serialize)]
struct IndexDoc {
    stop_to_routes: Vec<StopRoutesDoc>,
}

#[derive(Serialize)]
struct StopRoutesDoc {
    stop_id: u32,
    route_ids: Vec<u32>,
}

pub fn write_routes<W: Write>(w: W, network: &Network) -> Result<()> {
    let docs: Vec<RouteDoc> = network
        .routes
        .iter()
        .map(|route| RouteDoc {
            route_id_internal: route.id,
            route_name: route.name.clone(),
            stops: route.stops.clone(),
            trips: route
                .trips
                .iter()
                .map(|t| TripDoc {
                    trip_id_internal: t.internal_id,
                    partial: t.partial,
                    times: t.times.iter().map(|slot| slot.defined()).collect(),
                })
                .collect(),
        })
        .collect();
    // Route through `Value` so the `BTreeMap`-backed `Map` sorts keys
    // alphabetically rather than emitting struct declaration order.
    to_writer_pretty(w, &to_value(docs)?)
}

pub fn write_stops<W: Write>(w: W, network: &Network) -> Result<()> {
    let docs: Vec<StopDoc> = network
        .stops
        .iter()
        .map(|stop| StopDoc {
            stop_id_internal: stop.id,
            name: stop.name.clone(),
            lat: stop.coordinate.lat,
            lon: stop.coordinate.lon,
            route_ids: network
                .stop_to_routes
                .get(stop.id as usize)
                .cloned()
                .unwrap_or_default(),
            transfers: stop
                .transfers
                .iter()
                .map(|t| TransferDoc {
                    target_stop_id: t.target_stop,
                    walk_time_sec: t.walk_time_sec,
                })
                .collect(),
        })
        .collect();
    to_writer_pretty(w, &to_value(docs)?)
}

pub fn write_index<W: Write>(w: W, network: &Network) -> Result<()> {
    let doc = IndexDoc {
        stop_to_routes: network
            .stops
            .iter()
            .map(|stop| StopRoutesDoc {
                stop_id: stop.id,
                route_ids: network
                    .stop_to_routes
                    .get(stop.id as usize)
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect(),
    };
    to_writer_pretty(w, &to_value(doc)?)
}
