//! RAPTOR Engine (C5): round-based earliest-arrival search over a
//! transformed [`Network`]. Forward-only — given a source, a target,
//! and a departure time, finds the earliest arrival and the journey
//! that achieves it.

pub mod explorer;
pub mod itinerary;
pub mod path;
pub mod state;

pub use itinerary::{Itinerary, Leg};

use thiserror::Error;

use crate::shared::Time;
use crate::transform::Network;

pub const DEFAULT_MAX_ROUNDS: u32 = 5;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown stop id: {0}")]
    UnknownStop(u32),
}

pub struct Engine<'n> {
    network: &'n Network,
    max_rounds: u32,
}

impl<'n> Engine<'n> {
    pub fn new(network: &'n Network) -> Self {
        Self::with_max_rounds(network, DEFAULT_MAX_ROUNDS)
    }

    pub fn with_max_rounds(network: &'n Network, max_rounds: u32) -> Self {
        Self { network, max_rounds }
    }

    /// Finds the earliest-arrival itinerary from `source` to `target`
    /// departing no earlier than `departure`. `Ok(None)` means no
    /// journey was found within `max_rounds` boardings — this is not an
    /// error condition.
    pub fn query(&self, source: u32, target: u32, departure: Time) -> Result<Option<Itinerary>, Error> {
        if source as usize >= self.network.stops.len() {
            return Err(Error::UnknownStop(source));
        }
        if target as usize >= self.network.stops.len() {
            return Err(Error::UnknownStop(target));
        }
        if source == target {
            return Ok(Some(Itinerary {
                arrival_time: departure,
                legs: Vec::new(),
                rounds_used: 0,
            }));
        }

        let state = explorer::run(self.network, source, departure, self.max_rounds);
        Ok(path::reconstruct(&state, source, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Coordinate;
    use crate::transform::{NetworkStop, Route, TimeSlot, Trip};
    use std::sync::Arc;

    /// Linear route A->B->C with two trips, matching the testable
    /// end-to-end scenario: querying A->C at 08:00 should board T1 and
    /// arrive at 08:20.
    fn linear_network() -> Network {
        let stops = vec![
            NetworkStop {
                id: 0,
                external_id: Arc::from("A"),
                name: "A".into(),
                coordinate: Coordinate::new(0.0, 0.0).unwrap(),
                transfers: vec![],
            },
            NetworkStop {
                id: 1,
                external_id: Arc::from("B"),
                name: "B".into(),
                coordinate: Coordinate::new(0.0, 0.01).unwrap(),
                transfers: vec![],
            },
            NetworkStop {
                id: 2,
                external_id: Arc::from("C"),
                name: "C".into(),
                coordinate: Coordinate::new(0.0, 0.02).unwrap(),
                transfers: vec![],
            },
        ];
        let t1 = Trip {
            internal_id: 0,
            external_id: Arc::from("T1"),
            service_id: Arc::from("WD"),
            times: vec![
                TimeSlot::Defined(8 * 3600),
                TimeSlot::Defined(8 * 3600 + 600),
                TimeSlot::Defined(8 * 3600 + 1200),
            ],
            partial: false,
        };
        let t2 = Trip {
            internal_id: 1,
            external_id: Arc::from("T2"),
            service_id: Arc::from("WD"),
            times: vec![
                TimeSlot::Defined(9 * 3600),
                TimeSlot::Defined(9 * 3600 + 600),
                TimeSlot::Defined(9 * 3600 + 1200),
            ],
            partial: false,
        };
        let route = Route {
            id: 0,
            name: "R1".into(),
            stops: vec![0, 1, 2],
            trips: vec![t1, t2],
        };
        Network {
            stops,
            routes: vec![route],
            stop_to_routes: vec![vec![0], vec![0], vec![0]],
        }
    }

    #[test]
    fn boards_the_earliest_trip_and_arrives_on_time() {
        let network = linear_network();
        let engine = Engine::new(&network);
        let itinerary = engine
            .query(0, 2, Time::from_seconds(8 * 3600))
            .unwrap()
            .expect("a journey should exist");
        assert_eq!(itinerary.arrival_time.as_seconds(), 8 * 3600 + 1200);
        assert_eq!(itinerary.legs.len(), 1);
        assert!(matches!(itinerary.legs[0], Leg::Transit { from_stop: 0, to_stop: 2, .. }));
    }

    #[test]
    fn departing_after_the_first_trip_boards_the_second() {
        let network = linear_network();
        let engine = Engine::new(&network);
        let itinerary = engine
            .query(0, 2, Time::from_seconds(8 * 3600 + 3000))
            .unwrap()
            .expect("a journey should exist");
        assert_eq!(itinerary.arrival_time.as_seconds(), 9 * 3600 + 1200);
    }

    #[test]
    fn unreachable_target_returns_none_not_an_error() {
        let stops = vec![
            NetworkStop {
                id: 0,
                external_id: Arc::from("A"),
                name: "A".into(),
                coordinate: Coordinate::new(0.0, 0.0).unwrap(),
                transfers: vec![],
            },
            NetworkStop {
                id: 1,
                external_id: Arc::from("Z"),
                name: "Z".into(),
                coordinate: Coordinate::new(10.0, 10.0).unwrap(),
                transfers: vec![],
            },
        ];
        let network = Network {
            stops,
            routes: vec![],
            stop_to_routes: vec![vec![], vec![]],
        };
        let engine = Engine::new(&network);
        let result = engine.query(0, 1, Time::from_seconds(0)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn unknown_stop_is_an_error() {
        let network = linear_network();
        let engine = Engine::new(&network);
        assert!(engine.query(0, 99, Time::from_seconds(0)).is_err());
    }
}
