//! Benchmarks the RAPTOR engine against a synthetic grid network, since
//! a real GTFS fixture of representative size is not checked in.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gtfsraptor::raptor::Engine;
use gtfsraptor::shared::{Coordinate, Time};
use gtfsraptor::transform::{Network, NetworkStop, Route, TimeSlot, Trip};

/// `routes` parallel routes, each visiting all `stops_per_route` stops
/// of a shared linear corridor, `trips_per_route` evenly-spaced trips
/// apart. Every route shares the same stop IDs, so route_to_stop fan-out
/// is representative of a trunk corridor rather than a single line.
fn synthetic_network(stops_per_route: usize, routes: usize, trips_per_route: usize) -> Network {
    let stops = (0..stops_per_route)
        .map(|i| NetworkStop {
            id: i as u32,
            external_id: Arc::from(format!("S{i}")),
            name: format!("Stop {i}"),
            coordinate: Coordinate::new(0.0, i as f64 * 0.001).unwrap(),
            transfers: Vec::new(),
        })
        .collect();

    let stop_ids: Vec<u32> = (0..stops_per_route as u32).collect();
    let mut built_routes = Vec::with_capacity(routes);
    let mut next_trip_id = 0u32;
    for route_idx in 0..routes {
        let mut trips = Vec::with_capacity(trips_per_route);
        for t in 0..trips_per_route {
            let start = (t as i32) * 600 + route_idx as i32 * 60;
            let times = (0..stops_per_route)
                .map(|i| TimeSlot::Defined(start + i as i32 * 120))
                .collect();
            trips.push(Trip {
                internal_id: next_trip_id,
                external_id: Arc::from(format!("T{route_idx}-{t}")),
                service_id: Arc::from("WD"),
                times,
                partial: false,
            });
            next_trip_id += 1;
        }
        built_routes.push(Route {
            id: route_idx as u32,
            name: format!("R{route_idx}"),
            stops: stop_ids.clone(),
            trips,
        });
    }

    let mut stop_to_routes = vec![Vec::new(); stops_per_route];
    for route in &built_routes {
        for &stop_id in &route.stops {
            stop_to_routes[stop_id as usize].push(route.id);
        }
    }

    Network {
        stops,
        routes: built_routes,
        stop_to_routes,
    }
}

fn bench_query(c: &mut Criterion) {
    let network = synthetic_network(200, 8, 40);
    let engine = Engine::new(&network);

    c.bench_function("raptor_query_end_to_end", |b| {
        b.iter(|| {
            let result = engine.query(black_box(0), black_box(199), Time::from_seconds(0)).unwrap();
            black_box(result)
        })
    });
}

criterion_group!(benches, bench_query);
criterion_main!(benches);
