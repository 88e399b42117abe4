//! Binary writers/readers for `routes.bin`, `stops.bin`, `index.bin`.
//! All integers little-endian, strings are `u16`-length-prefixed UTF-8,
//! coordinates IEEE-754 `f64`. See the format tables this module
//! implements for the exact per-file layout.

use std::collections::HashMap;
use std::io::{self, Read, Write};

use thiserror::Error;
use tracing::warn;

use crate::transform::Network;

use super::delta;

pub const SCHEMA_VERSION: u16 = 1;

const ROUTES_MAGIC: [u8; 4] = *b"RRTS";
const STOPS_MAGIC: [u8; 4] = *b"RSTS";
const INDEX_MAGIC: [u8; 4] = *b"RIDX";

#[derive(Error, Debug)]
pub enum Error {
    #[error("bad magic bytes: expected {expected:?}, found {found:?}")]
    BadMagic { expected: [u8; 4], found: [u8; 4] },
    #[error("unsupported schema version {0}")]
    UnsupportedSchema(u16),
    #[error("truncated: expected {expected} more bytes")]
    Truncated { expected: usize },
    #[error("bad string encoding")]
    BadEncoding(#[from] std::string::FromUtf8Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

struct CountingWriter<W> {
    inner: W,
    position: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn write_string<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    let bytes = s.as_bytes();
    let len = bytes.len().min(u16::MAX as usize) as u16;
    w.write_all(&len.to_le_bytes())?;
    w.write_all(&bytes[..len as usize])
}

fn read_exact_checked<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<(), Error> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::Truncated { expected: buf.len() },
        _ => Error::Io(e),
    })
}

fn read_u32<R: Read>(r: &mut R) -> Result<u32, Error> {
    let mut buf = [0u8; 4];
    read_exact_checked(r, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u16<R: Read>(r: &mut R) -> Result<u16, Error> {
    let mut buf = [0u8; 2];
    read_exact_checked(r, &mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_i32<R: Read>(r: &mut R) -> Result<i32, Error> {
    let mut buf = [0u8; 4];
    read_exact_checked(r, &mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_u64<R: Read>(r: &mut R) -> Result<u64, Error> {
    let mut buf = [0u8; 8];
    read_exact_checked(r, &mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f64<R: Read>(r: &mut R) -> Result<f64, Error> {
    let mut buf = [0u8; 8];
    read_exact_checked(r, &mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

fn read_string<R: Read>(r: &mut R) -> Result<String, Error> {
    let len = read_u16(r)? as usize;
    let mut buf = vec![0u8; len];
    read_exact_checked(r, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

fn read_header<R: Read>(r: &mut R, expected: [u8; 4]) -> Result<(), Error> {
    let mut magic = [0u8; 4];
    read_exact_checked(r, &mut magic)?;
    if magic != expected {
        return Err(Error::BadMagic {
            expected,
            found: magic,
        });
    }
    let schema = read_u16(r)?;
    if schema != SCHEMA_VERSION {
        return Err(Error::UnsupportedSchema(schema));
    }
    Ok(())
}

/// Writes `routes.bin`, returning each route's byte offset within the
/// stream for `index.bin` to reference.
pub fn write_routes<W: Write>(w: W, network: &Network) -> Result<HashMap<u32, u64>, Error> {
    let mut cw = CountingWriter::new(w);
    cw.write_all(&ROUTES_MAGIC)?;
    cw.write_all(&SCHEMA_VERSION.to_le_bytes())?;
    cw.write_all(&(network.routes.len() as u32).to_le_bytes())?;

    let mut offsets = HashMap::with_capacity(network.routes.len());
    for route in &network.routes {
        offsets.insert(route.id, cw.position);
        cw.write_all(&route.id.to_le_bytes())?;
        write_string(&mut cw, &route.name)?;
        cw.write_all(&(route.stops.len() as u32).to_le_bytes())?;

        let complete_trips: Vec<_> = route.trips.iter().filter(|t| !t.partial).collect();
        let skipped = route.trips.len() - complete_trips.len();
        if skipped > 0 {
            warn!(route = route.id, skipped, "omitting partial trips from binary output");
        }
        cw.write_all(&(complete_trips.len() as u32).to_le_bytes())?;

        for &stop_id in &route.stops {
            cw.write_all(&stop_id.to_le_bytes())?;
        }

        for trip in complete_trips {
            cw.write_all(&trip.internal_id.to_le_bytes())?;
            let times: Vec<i32> = trip
                .times
                .iter()
                .map(|t| match t.defined() {
                    Some(v) => v,
                    None => unreachable!("complete trip had a missing time slot"),
                })
                .collect();
            for delta in delta::encode(&times) {
                cw.write_all(&delta.to_le_bytes())?;
            }
        }
    }
    Ok(offsets)
}

/// Writes `stops.bin`, returning each stop's byte offset within the
/// stream for `index.bin` to reference.
pub fn write_stops<W: Write>(w: W, network: &Network) -> Result<HashMap<u32, u64>, Error> {
    let mut cw = CountingWriter::new(w);
    cw.write_all(&STOPS_MAGIC)?;
    cw.write_all(&SCHEMA_VERSION.to_le_bytes())?;
    cw.write_all(&(network.stops.len() as u32).to_le_bytes())?;

    let mut offsets = HashMap::with_capacity(network.stops.len());
    for stop in &network.stops {
        offsets.insert(stop.id, cw.position);
        cw.write_all(&stop.id.to_le_bytes())?;
        write_string(&mut cw, &stop.name)?;
        cw.write_all(&stop.coordinate.lat.to_le_bytes())?;
        cw.write_all(&stop.coordinate.lon.to_le_bytes())?;

        let route_ids = network
            .stop_to_routes
            .get(stop.id as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        cw.write_all(&(route_ids.len() as u32).to_le_bytes())?;
        for &route_id in route_ids {
            cw.write_all(&route_id.to_le_bytes())?;
        }

        cw.write_all(&(stop.transfers.len() as u32).to_le_bytes())?;
        for transfer in &stop.transfers {
            cw.write_all(&transfer.target_stop.to_le_bytes())?;
            cw.write_all(&transfer.walk_time_sec.to_le_bytes())?;
        }
    }
    Ok(offsets)
}

/// Writes `index.bin` from a network and the byte offsets recorded
/// while writing `routes.bin`/`stops.bin`.
pub fn write_index<W: Write>(
    w: W,
    network: &Network,
    route_offsets: &HashMap<u32, u64>,
    stop_offsets: &HashMap<u32, u64>,
) -> Result<(), Error> {
    let mut cw = CountingWriter::new(w);
    cw.write_all(&INDEX_MAGIC)?;
    cw.write_all(&SCHEMA_VERSION.to_le_bytes())?;

    cw.write_all(&(network.stops.len() as u32).to_le_bytes())?;
    for stop in &network.stops {
        cw.write_all(&stop.id.to_le_bytes())?;
        let routes = network
            .stop_to_routes
            .get(stop.id as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        cw.write_all(&(routes.len() as u32).to_le_bytes())?;
        for &route_id in routes {
            cw.write_all(&route_id.to_le_bytes())?;
        }
    }

    let mut route_ids: Vec<u32> = network.routes.iter().map(|r| r.id).collect();
    route_ids.sort_unstable();
    cw.write_all(&(route_ids.len() as u32).to_le_bytes())?;
    for id in &route_ids {
        cw.write_all(&id.to_le_bytes())?;
        cw.write_all(&route_offsets.get(id).copied().unwrap_or(0).to_le_bytes())?;
    }

    let mut stop_ids: Vec<u32> = network.stops.iter().map(|s| s.id).collect();
    stop_ids.sort_unstable();
    cw.write_all(&(stop_ids.len() as u32).to_le_bytes())?;
    for id in &stop_ids {
        cw.write_all(&id.to_le_bytes())?;
        cw.write_all(&stop_offsets.get(id).copied().unwrap_or(0).to_le_bytes())?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DecodedRoute {
    pub id: u32,
    pub name: String,
    pub stops: Vec<u32>,
    pub trips: Vec<(u32, Vec<i32>)>,
}

pub fn read_routes<R: Read>(r: &mut R) -> Result<Vec<DecodedRoute>, Error> {
    read_header(r, ROUTES_MAGIC)?;
    let count = read_u32(r)?;
    let mut routes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let id = read_u32(r)?;
        let name = read_string(r)?;
        let stop_count = read_u32(r)? as usize;
        let trip_count = read_u32(r)?;
        let stops: Vec<u32> = (0..stop_count).map(|_| read_u32(r)).collect::<Result<_, _>>()?;
        let mut trips = Vec::with_capacity(trip_count as usize);
        for _ in 0..trip_count {
            let trip_id = read_u32(r)?;
            let deltas: Vec<i32> = (0..stop_count).map(|_| read_i32(r)).collect::<Result<_, _>>()?;
            trips.push((trip_id, delta::decode(&deltas)));
        }
        routes.push(DecodedRoute { id, name, stops, trips });
    }
    Ok(routes)
}

#[derive(Debug, Clone)]
pub struct DecodedStop {
    pub id: u32,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub route_ids: Vec<u32>,
    pub transfers: Vec<(u32, i32)>,
}

pub fn read_stops<R: Read>(r: &mut R) -> Result<Vec<DecodedStop>, Error> {
    read_header(r, STOPS_MAGIC)?;
    let count = read_u32(r)?;
    let mut stops = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let id = read_u32(r)?;
        let name = read_string(r)?;
        let lat = read_f64(r)?;
        let lon = read_f64(r)?;
        let route_count = read_u32(r)?;
        let route_ids: Vec<u32> = (0..route_count).map(|_| read_u32(r)).collect::<Result<_, _>>()?;
        let transfer_count = read_u32(r)?;
        let mut transfers = Vec::with_capacity(transfer_count as usize);
        for _ in 0..transfer_count {
            let target = read_u32(r)?;
            let walk_time = read_i32(r)?;
            transfers.push((target, walk_time));
        }
        stops.push(DecodedStop {
            id,
            name,
            lat,
            lon,
            route_ids,
            transfers,
        });
    }
    Ok(stops)
}

#[derive(Debug, Clone, Default)]
pub struct DecodedIndex {
    pub stop_to_routes: HashMap<u32, Vec<u32>>,
    pub route_offsets: HashMap<u32, u64>,
    pub stop_offsets: HashMap<u32, u64>,
}

pub fn read_index<R: Read>(r: &mut R) -> Result<DecodedIndex, Error> {
    read_header(r, INDEX_MAGIC)?;
    let mut index = DecodedIndex::default();

    let stop_count = read_u32(r)?;
    for _ in 0..stop_count {
        let stop_id = read_u32(r)?;
        let k = read_u32(r)?;
        let route_ids: Vec<u32> = (0..k).map(|_| read_u32(r)).collect::<Result<_, _>>()?;
        index.stop_to_routes.insert(stop_id, route_ids);
    }

    let route_offset_count = read_u32(r)?;
    for _ in 0..route_offset_count {
        let route_id = read_u32(r)?;
        let offset = read_u64(r)?;
        index.route_offsets.insert(route_id, offset);
    }

    let stop_offset_count = read_u32(r)?;
    for _ in 0..stop_offset_count {
        let stop_id = read_u32(r)?;
        let offset = read_u64(r)?;
        index.stop_offsets.insert(stop_id, offset);
    }

    Ok(index)
}

/// Checks only the magic and schema header, without decoding the rest
/// of the file — used by the `validate` CLI verb.
pub fn check_header<R: Read>(r: &mut R, file_kind: FileKind) -> Result<(), Error> {
    let magic = match file_kind {
        FileKind::Routes => ROUTES_MAGIC,
        FileKind::Stops => STOPS_MAGIC,
        FileKind::Index => INDEX_MAGIC,
    };
    read_header(r, magic)
}

#[derive(Debug, Clone, Copy)]
pub enum FileKind {
    Routes,
    Stops,
    Index,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Coordinate;
    use crate::transform::{NetworkStop, Route, TimeSlot, Trip};
    use std::sync::Arc;

    fn sample_network() -> Network {
        let stop_a = NetworkStop {
            id: 0,
            external_id: Arc::from("A"),
            name: "A".into(),
            coordinate: Coordinate::new(0.0, 0.0).unwrap(),
            transfers: vec![],
        };
        let stop_b = NetworkStop {
            id: 1,
            external_id: Arc::from("B"),
            name: "B".into(),
            coordinate: Coordinate::new(0.0, 0.01).unwrap(),
            transfers: vec![],
        };
        let trip = Trip {
            internal_id: 0,
            external_id: Arc::from("T1"),
            service_id: Arc::from("WD"),
            times: vec![TimeSlot::Defined(28_800), TimeSlot::Defined(29_400)],
            partial: false,
        };
        let route = Route {
            id: 0,
            name: "R1".into(),
            stops: vec![0, 1],
            trips: vec![trip],
        };
        Network {
            stops: vec![stop_a, stop_b],
            routes: vec![route],
            stop_to_routes: vec![vec![0], vec![0]],
        }
    }

    #[test]
    fn routes_bin_round_trips() {
        let network = sample_network();
        let mut buf = Vec::new();
        write_routes(&mut buf, &network).unwrap();
        let decoded = read_routes(&mut &buf[..]).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].stops, vec![0, 1]);
        assert_eq!(decoded[0].trips, vec![(0, vec![28_800, 29_400])]);
    }

    #[test]
    fn stops_bin_round_trips() {
        let network = sample_network();
        let mut buf = Vec::new();
        write_stops(&mut buf, &network).unwrap();
        let decoded = read_stops(&mut &buf[..]).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].route_ids, vec![0]);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let buf = vec![b'X', b'X', b'X', b'X', 1, 0];
        let err = read_routes(&mut &buf[..]).unwrap_err();
        assert!(matches!(err, Error::BadMagic { .. }));
    }

    #[test]
    fn truncated_file_is_rejected() {
        let buf = ROUTES_MAGIC.to_vec();
        let err = read_routes(&mut &buf[..]).unwrap_err();
        assert!(matches!(err, Error::Truncated { .. }));
    }
}
