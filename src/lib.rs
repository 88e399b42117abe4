//! GTFS feed ingestion, validation, canonicalization, and a RAPTOR
//! journey-planning engine over the resulting compact network.

pub mod codec;
pub mod gtfs;
pub mod manifest;
pub mod pipeline;
pub mod raptor;
pub mod shared;
pub mod transform;
pub mod validate;
