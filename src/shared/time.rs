//! Seconds-since-midnight time values, shared by the transformer, the
//! binary codec, and the RAPTOR engine.

use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// A point in time expressed as seconds since the start of the service
/// day. Unbounded on the upper end: GTFS allows `HH` past 23 to represent
/// service that runs past midnight, so `100_000` (well over 24h) is a
/// legal value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Time(i32);

impl From<i32> for Time {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl Sub<Time> for Time {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        Duration(self.0 - rhs.0)
    }
}

impl Add<Duration> for Time {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign<Duration> for Time {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0
    }
}

impl Time {
    pub const MAX: Time = Time(i32::MAX);
    pub const MIN: Time = Time(i32::MIN);

    pub const fn from_seconds(secs: i32) -> Self {
        Self(secs)
    }

    pub const fn as_seconds(&self) -> i32 {
        self.0
    }

    pub fn to_hms_string(&self) -> String {
        let h = self.0 / 3600;
        let m = (self.0 % 3600) / 60;
        let s = self.0 % 60;
        format!("{:02}:{:02}:{:02}", h, m, s)
    }

    /// Parses a GTFS `HH:MM:SS` field. Any shape other than exactly three
    /// colon-separated integer fields is a parse failure; `HH` may exceed
    /// 23 or even 99 to encode post-midnight service.
    pub fn from_hms(time: &str) -> Option<Self> {
        let mut split = time.split(':');
        let hours: i32 = split.next()?.trim().parse().ok()?;
        let minutes: i32 = split.next()?.trim().parse().ok()?;
        let seconds: i32 = split.next()?.trim().parse().ok()?;
        if split.next().is_some() {
            return None;
        }
        Some(Self(hours * 3600 + minutes * 60 + seconds))
    }
}

/// A span of time in seconds. Used for transfer walk times, which may be
/// configured negative by a malformed feed (caught as a validation
/// warning rather than rejected outright).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration(i32);

impl From<i32> for Duration {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl Duration {
    pub const fn from_seconds(secs: i32) -> Self {
        Self(secs)
    }

    pub const fn as_seconds(&self) -> i32 {
        self.0
    }
}

impl Add for Duration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}
