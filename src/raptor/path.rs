//! Reconstructs an [`Itinerary`] from a settled [`RoundState`] by
//! walking parent pointers backward from target to source. Since every
//! round's arrays are seeded from the previous round, the final round's
//! parent array already holds each stop's overall-best justification —
//! no per-round bookkeeping is needed during the walk.

use crate::shared::Time;

use super::itinerary::{Itinerary, Leg};
use super::state::{Parent, RoundState, INF};

pub fn reconstruct(state: &RoundState, source: u32, target: u32) -> Option<Itinerary> {
    let last = state.rounds.len() - 1;
    let arrival = state.rounds[last][target as usize];
    if arrival == INF {
        return None;
    }

    let parents = &state.parents[last];
    let mut legs_rev = Vec::new();
    let mut current = target;
    let mut rounds_used = 0u32;

    while current != source {
        match parents[current as usize] {
            Parent::None => {
                unreachable!("reachable stop had no parent pointer while reconstructing a path")
            }
            Parent::Walk { from_stop } => {
                legs_rev.push(Leg::Walk {
                    from_stop,
                    to_stop: current,
                });
                current = from_stop;
            }
            Parent::Transit {
                from_stop,
                route_id,
                trip_internal_id,
            } => {
                legs_rev.push(Leg::Transit {
                    from_stop,
                    to_stop: current,
                    route_id,
                    trip_internal_id,
                });
                current = from_stop;
                rounds_used += 1;
            }
        }
    }

    legs_rev.reverse();
    Some(Itinerary {
        arrival_time: Time::from_seconds(arrival),
        legs: legs_rev,
        rounds_used,
    })
}
