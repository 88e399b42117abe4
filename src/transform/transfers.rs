//! Transfer assembly: starts from explicit GTFS `transfers.txt` rows,
//! optionally adds Haversine-distance-based walking links, then
//! deduplicates per (source, target) keeping the minimum walk time.

use std::collections::HashMap;

use tracing::warn;

use crate::gtfs::Feed;

use super::{Transfer, TransformConfig};

/// Returns, per source stop ID, a sorted-by-target, deduplicated
/// transfer list.
pub fn assemble(feed: &Feed, config: &TransformConfig) -> HashMap<u32, Vec<Transfer>> {
    let mut best: HashMap<(u32, u32), i32> = HashMap::new();

    for transfer in &feed.transfers {
        let (Ok(from), Ok(to)) = (
            feed.internal_of_stop(&transfer.from_stop_id),
            feed.internal_of_stop(&transfer.to_stop_id),
        ) else {
            warn!(
                from = %transfer.from_stop_id,
                to = %transfer.to_stop_id,
                "dropping transfer with unknown endpoint"
            );
            continue;
        };
        let walk_time = transfer.min_transfer_time.unwrap_or(0);
        insert_min(&mut best, from, to, walk_time);
    }

    if config.gen_transfers {
        for i in 0..feed.stops.len() {
            for j in (i + 1)..feed.stops.len() {
                let a = &feed.stops[i];
                let b = &feed.stops[j];
                let distance = a.coordinate.haversine_distance(&b.coordinate);
                if distance > config.transfer_cutoff_m {
                    continue;
                }
                let walk_time = (distance / config.speed_walk_m_s).floor() as i32;
                insert_min(&mut best, a.id, b.id, walk_time);
                insert_min(&mut best, b.id, a.id, walk_time);
            }
        }
    }

    let mut by_source: HashMap<u32, Vec<Transfer>> = HashMap::new();
    for ((from, to), walk_time_sec) in best {
        by_source.entry(from).or_default().push(Transfer {
            target_stop: to,
            walk_time_sec,
        });
    }
    for transfers in by_source.values_mut() {
        transfers.sort_by_key(|t| t.target_stop);
    }
    by_source
}

fn insert_min(best: &mut HashMap<(u32, u32), i32>, from: u32, to: u32, walk_time: i32) {
    if from == to {
        return;
    }
    best.entry((from, to))
        .and_modify(|existing| *existing = (*existing).min(walk_time))
        .or_insert(walk_time);
}
