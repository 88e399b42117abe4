//! Public result types for a RAPTOR query.

use crate::shared::Time;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leg {
    Walk {
        from_stop: u32,
        to_stop: u32,
    },
    Transit {
        from_stop: u32,
        to_stop: u32,
        route_id: u32,
        trip_internal_id: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Itinerary {
    pub arrival_time: Time,
    pub legs: Vec<Leg>,
    pub rounds_used: u32,
}

impl Itinerary {
    pub fn transit_leg_count(&self) -> usize {
        self.legs.iter().filter(|l| matches!(l, Leg::Transit { .. })).count()
    }
}
