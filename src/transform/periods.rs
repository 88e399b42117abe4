//! Service period classification: groups `service_id`s into named
//! periods by weekday-activity bitmask so a feed can be split into one
//! artifact set per period (weekday/weekend service, etc).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::gtfs::Feed;

/// A weekday activity bitmask, bit 0 = Monday .. bit 6 = Sunday.
type Bitmask = u8;

const WEEKDAY: Bitmask = 0b0011111;
const SATURDAY: Bitmask = 0b0100000;
const SUNDAY: Bitmask = 0b1000000;
const WEEKEND: Bitmask = SATURDAY | SUNDAY;
const DAILY: Bitmask = 0b1111111;

/// A named grouping of `service_id`s sharing a calendar pattern, sorted
/// by name for deterministic output ordering.
pub struct Period {
    pub name: String,
    pub service_ids: HashSet<Arc<str>>,
}

/// Classifies every `service_id` referenced by `calendar.txt` into a
/// named period by its weekday bitmask. When `calendar.txt` is absent
/// but `calendar_dates.txt` is present, falls back to one period per
/// `service_id`. Returns periods sorted by name.
pub fn split(feed: &Feed) -> Vec<Period> {
    if !feed.calendar.is_empty() {
        return split_by_calendar(feed);
    }
    split_by_calendar_dates(feed)
}

fn split_by_calendar(feed: &Feed) -> Vec<Period> {
    let mut by_mask: BTreeMap<Bitmask, HashSet<Arc<str>>> = BTreeMap::new();
    for row in &feed.calendar {
        let mask = bitmask(row);
        by_mask
            .entry(mask)
            .or_default()
            .insert(Arc::from(row.service_id.as_str()));
    }

    let mut named: HashMap<String, HashSet<Arc<str>>> = HashMap::new();
    let mut custom_index = 1usize;
    for (mask, service_ids) in by_mask {
        let name = match mask {
            WEEKDAY => "weekday".to_string(),
            SATURDAY => "saturday".to_string(),
            SUNDAY => "sunday".to_string(),
            WEEKEND => "weekend".to_string(),
            DAILY => "daily".to_string(),
            _ => {
                let name = format!("custom_{custom_index}");
                custom_index += 1;
                name
            }
        };
        named.entry(name).or_default().extend(service_ids);
    }

    let mut periods: Vec<Period> = named
        .into_iter()
        .map(|(name, service_ids)| Period { name, service_ids })
        .collect();
    periods.sort_by(|a, b| a.name.cmp(&b.name));
    periods
}

fn split_by_calendar_dates(feed: &Feed) -> Vec<Period> {
    let mut service_ids: Vec<Arc<str>> = feed
        .calendar_dates
        .iter()
        .map(|row| Arc::from(row.service_id.as_str()))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    service_ids.sort();

    service_ids
        .into_iter()
        .map(|service_id| Period {
            name: service_id.to_string(),
            service_ids: HashSet::from([service_id]),
        })
        .collect()
}

fn bitmask(row: &crate::gtfs::models::GtfsCalendar) -> Bitmask {
    let bit = |v: u8, shift: u8| if v != 0 { 1 << shift } else { 0 };
    bit(row.monday, 0)
        | bit(row.tuesday, 1)
        | bit(row.wednesday, 2)
        | bit(row.thursday, 3)
        | bit(row.friday, 4)
        | bit(row.saturday, 5)
        | bit(row.sunday, 6)
}
