//! Raw GTFS row shapes, deserialized directly from CSV. Extra columns a
//! real-world feed carries beyond these fields are ignored rather than
//! rejected — only the standard required/optional columns named in the
//! external-interfaces surface are modeled.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct GtfsAgency {
    pub agency_id: Option<String>,
    pub agency_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GtfsStop {
    pub stop_id: String,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GtfsRoute {
    pub route_id: String,
    pub route_short_name: Option<String>,
    pub route_long_name: Option<String>,
    pub route_type: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GtfsTrip {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
    #[serde(default)]
    pub direction_id: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GtfsStopTime {
    pub trip_id: String,
    pub arrival_time: String,
    pub departure_time: String,
    pub stop_id: String,
    pub stop_sequence: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GtfsTransfer {
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub min_transfer_time: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GtfsCalendar {
    pub service_id: String,
    pub monday: u8,
    pub tuesday: u8,
    pub wednesday: u8,
    pub thursday: u8,
    pub friday: u8,
    pub saturday: u8,
    pub sunday: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GtfsCalendarDate {
    pub service_id: String,
    pub date: String,
    pub exception_type: u8,
}
