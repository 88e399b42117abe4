//! Prefix-delta encoding for a route's per-trip time arrays: the first
//! value is stored absolute, every following value as the difference
//! from its predecessor. Halves the magnitude of most values in a
//! typical schedule, which favors the downstream varint-free fixed
//! encoding less than it would a general-purpose compressor, but costs
//! nothing to decode.

/// Encodes a non-empty sequence of times into `[t0, t1-t0, t2-t1, ...]`.
pub fn encode(times: &[i32]) -> Vec<i32> {
    if times.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(times.len());
    out.push(times[0]);
    for window in times.windows(2) {
        out.push(window[1] - window[0]);
    }
    out
}

/// Inverts [`encode`] via prefix sum.
pub fn decode(deltas: &[i32]) -> Vec<i32> {
    if deltas.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(deltas.len());
    out.push(deltas[0]);
    for &d in &deltas[1..] {
        out.push(out.last().copied().unwrap_or(0) + d);
    }
    out
}
