//! Binary Codec (C4): fixed little-endian wire format for `routes.bin`,
//! `stops.bin`, `index.bin`, plus a sorted-keys JSON debug mirror.

pub mod binary;
pub mod delta;
pub mod json;

pub use binary::{Error, SCHEMA_VERSION};
