use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use super::search_alert::TimeWindow;

/// One lookup against the availability source.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityQuery {
    pub from_station_id: String,
    pub to_station_id: String,
    pub date: NaiveDate,
    pub passenger_count: u32,
    pub departure_time_range: Option<TimeWindow>,
    pub cabin_class: Option<String>,
    pub high_speed_only: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CabinClassAvailability {
    pub cabin_class_id: String,
    #[serde(rename = "cabinClass", default)]
    pub cabin_class_name: Option<String>,
    pub availability_count: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateTrain {
    pub train_number: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    #[serde(default)]
    pub cabin_class_availabilities: Vec<CabinClassAvailability>,
    #[serde(default)]
    pub is_high_speed: bool,
}

impl CandidateTrain {
    /// Trip length in whole minutes, rounded to the nearest minute. An arrival
    /// before departure counts as zero.
    pub fn duration_minutes(&self) -> i64 {
        let seconds = (self.arrival_time - self.departure_time).num_seconds().max(0);
        (seconds as f64 / 60.0).round() as i64
    }
}
