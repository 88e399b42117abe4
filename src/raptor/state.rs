//! Per-round RAPTOR state: earliest-arrival and parent-pointer arrays.
//! Each round's arrays are seeded from the previous round, so
//! `rounds[k]` always holds the best arrival achievable in at most `k`
//! boardings — callers needing the overall best value read `rounds[K]`
//! directly rather than taking a minimum across rounds themselves.

/// Sentinel standing in for "+∞" — no arrival found yet.
pub const INF: i32 = i32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    None,
    Walk {
        from_stop: u32,
    },
    Transit {
        from_stop: u32,
        route_id: u32,
        trip_internal_id: u32,
    },
}

pub struct RoundState {
    pub rounds: Vec<Vec<i32>>,
    pub parents: Vec<Vec<Parent>>,
}

impl RoundState {
    pub fn new(stop_count: usize, max_rounds: u32) -> Self {
        Self {
            rounds: vec![vec![INF; stop_count]; max_rounds as usize + 1],
            parents: vec![vec![Parent::None; stop_count]; max_rounds as usize + 1],
        }
    }
}
