//! Route canonicalization: groups trips by `(route_id, direction_id)`,
//! picks a modal stop pattern per group, and assigns fresh sequential
//! route IDs by sorting the distinct group keys lexicographically.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::gtfs::Feed;

pub struct CanonicalRoute {
    pub id: u32,
    pub name: String,
    pub stops: Vec<u32>,
    pub trip_ids: Vec<u32>,
}

pub fn canonicalize(feed: &Feed) -> Vec<CanonicalRoute> {
    let stop_time_groups = feed.stop_time_indices_by_trip();

    let mut groups: BTreeMap<(Arc<str>, u8), Vec<u32>> = BTreeMap::new();
    for trip in &feed.trips {
        groups
            .entry((trip.route_id.clone(), trip.direction_id))
            .or_default()
            .push(trip.id);
    }

    let mut result = Vec::with_capacity(groups.len());
    for (next_id, ((route_id, _direction_id), trip_ids)) in groups.into_iter().enumerate() {
        let mut pattern_counts: HashMap<Vec<u32>, usize> = HashMap::new();

        for &trip_id in &trip_ids {
            let trip = &feed.trips[trip_id as usize];
            let Some(indices) = stop_time_groups.get(&trip.external_id) else {
                continue;
            };
            let mut rows: Vec<_> = indices.iter().map(|&i| &feed.stop_times[i]).collect();
            rows.sort_by_key(|r| r.stop_sequence);

            let mut sequence = Vec::with_capacity(rows.len());
            let mut resolvable = true;
            for row in &rows {
                match feed.internal_of_stop(&row.stop_id) {
                    Ok(stop_id) => sequence.push(stop_id),
                    Err(_) => {
                        resolvable = false;
                        break;
                    }
                }
            }
            if !resolvable || sequence.is_empty() {
                continue;
            }
            *pattern_counts.entry(sequence).or_insert(0) += 1;
        }

        let Some(canonical_stops) = pick_canonical_pattern(&pattern_counts) else {
            continue;
        };

        let route_row = feed
            .internal_of_route(&route_id)
            .ok()
            .and_then(|id| feed.routes.get(id as usize));
        let name = route_row
            .and_then(|r| r.short_name.clone().filter(|s| !s.is_empty()))
            .or_else(|| route_row.and_then(|r| r.long_name.clone().filter(|s| !s.is_empty())))
            .unwrap_or_else(|| route_id.to_string());

        result.push(CanonicalRoute {
            id: next_id as u32,
            name,
            stops: canonical_stops,
            trip_ids,
        });
    }

    result
}

/// Picks the modal stop sequence, breaking ties by lexicographically
/// smallest tuple — deterministic regardless of hash-map iteration order.
fn pick_canonical_pattern(pattern_counts: &HashMap<Vec<u32>, usize>) -> Option<Vec<u32>> {
    pattern_counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(seq, _)| seq.clone())
}
