/// File names expected inside a GTFS feed directory. Defaults match the
/// standard GTFS naming; `agency_path`/`agency_path_fallback` cover the
/// `agency.txt` vs `agencies.txt` naming split seen across real feeds.
#[derive(Debug, Clone)]
pub struct GtfsFileNames {
    pub stops_path: String,
    pub routes_path: String,
    pub trips_path: String,
    pub stop_times_path: String,
    pub transfers_path: String,
    pub calendar_path: String,
    pub calendar_dates_path: String,
    pub agency_path: String,
    pub agency_path_fallback: String,
}

impl Default for GtfsFileNames {
    fn default() -> Self {
        Self {
            stops_path: "stops.txt".into(),
            routes_path: "routes.txt".into(),
            trips_path: "trips.txt".into(),
            stop_times_path: "stop_times.txt".into(),
            transfers_path: "transfers.txt".into(),
            calendar_path: "calendar.txt".into(),
            calendar_dates_path: "calendar_dates.txt".into(),
            agency_path: "agency.txt".into(),
            agency_path_fallback: "agencies.txt".into(),
        }
    }
}
