use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde_json::json;

use crate::models::notification::Notification;
use crate::models::search_alert::SearchAlert;
use crate::models::train::{CabinClassAvailability, CandidateTrain};
use crate::stations::StationDirectory;

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d %B %Y").to_string()
}

pub fn format_time(at: DateTime<Utc>, offset: &FixedOffset) -> String {
    at.with_timezone(offset).format("%H:%M").to_string()
}

pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

pub fn route_label(stations: &StationDirectory, alert: &SearchAlert) -> String {
    format!(
        "{} → {}",
        stations.short_name(&alert.from_station_id),
        stations.short_name(&alert.to_station_id)
    )
}

pub fn expiration_notification(stations: &StationDirectory, alert: &SearchAlert) -> Notification {
    let route = route_label(stations, alert);
    Notification {
        user_id: alert.user_id,
        title: format!("❌ {} Alert Expired", route),
        body: format!(
            "❌ Your search alert has expired\n\n🚉 Route: {}\n📅 Date: {}",
            route,
            format_date(alert.date)
        ),
        data: None,
    }
}

/// The train and cabin entry an alert was satisfied by.
#[derive(Debug, Clone, Copy)]
pub struct SeatMatch<'a> {
    pub train: &'a CandidateTrain,
    pub availability: &'a CabinClassAvailability,
}

impl SeatMatch<'_> {
    pub fn cabin_class_name(&self) -> &str {
        self.availability
            .cabin_class_name
            .as_deref()
            .unwrap_or("Unknown")
    }
}

/// Status reason stored on the alert when it completes.
pub fn completed_reason(
    stations: &StationDirectory,
    alert: &SearchAlert,
    seat_match: &SeatMatch<'_>,
    offset: &FixedOffset,
) -> String {
    format!(
        "🎫 {} seats found: {} at time {}",
        seat_match.availability.availability_count,
        route_label(stations, alert),
        format_time(seat_match.train.departure_time, offset)
    )
}

pub fn seats_found_notification(
    stations: &StationDirectory,
    alert: &SearchAlert,
    seat_match: &SeatMatch<'_>,
    offset: &FixedOffset,
) -> Notification {
    let route = route_label(stations, alert);
    let train = seat_match.train;
    let seats = seat_match.availability.availability_count;
    let cabin_class_name = seat_match.cabin_class_name();
    let duration = train.duration_minutes();

    let body = format!(
        "✨ Great news! We found tickets for your journey!\n\n\
         🚄 Train: {}\n\n\
         🎫 Available Seats: {}\n\
         💺 Class: {}\n\n\
         🚉 Route: {}\n\n\
         🕒 Departure: {}\n\
         🕒 Arrival: {}\n\
         ⏱️ Duration: {}\n\n\
         📅 Date: {}",
        train.train_number,
        seats,
        cabin_class_name,
        route,
        format_time(train.departure_time, offset),
        format_time(train.arrival_time, offset),
        format_duration(duration),
        format_date(alert.date),
    );

    Notification {
        user_id: alert.user_id,
        title: format!("🎫 {} seats found: {}", seats, route),
        body,
        data: Some(json!({
            "type": "SEATS_FOUND",
            "alertId": alert.id,
            "fromStationId": alert.from_station_id,
            "toStationId": alert.to_station_id,
            "date": alert.date.to_string(),
            "cabinClass": alert.cabin_class,
            "trainNumber": train.train_number,
            "departureTime": train.departure_time.to_rfc3339(),
            "arrivalTime": train.arrival_time.to_rfc3339(),
            "availableSeats": seats,
            "cabinClassName": cabin_class_name,
            "duration": duration,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::testing::{alert, train};

    fn istanbul() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn stations() -> StationDirectory {
        StationDirectory::from_pairs([("X", "ANKARA GAR, Ankara"), ("Y", "ISTANBUL, Pendik")])
    }

    #[test]
    fn test_helpers() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(format_date(date), "01 June 2025");
        assert_eq!(format_duration(255), "4h 15m");
        assert_eq!(format_duration(45), "0h 45m");
        assert_eq!(format_duration(-75), "0h 0m");

        let at = "2025-06-01T05:30:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(format_time(at, &istanbul()), "08:30");
    }

    #[test]
    fn test_expiration_notification_text() {
        let alert = alert("X", "Y", NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), "1");

        let notification = expiration_notification(&stations(), &alert);

        assert_eq!(notification.user_id, alert.user_id);
        assert!(notification.title.contains("Ankara gar → Istanbul"));
        assert!(notification.body.contains("01 June 2025"));
        assert!(notification.data.is_none());
    }

    #[test]
    fn test_seats_found_notification_payload() {
        let alert = alert("X", "Y", NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), "1");
        let train = train("81004", "2025-06-01T05:30:00Z", "2025-06-01T09:45:00Z", &[("1", 3)]);
        let seat_match = SeatMatch {
            train: &train,
            availability: &train.cabin_class_availabilities[0],
        };

        let notification = seats_found_notification(&stations(), &alert, &seat_match, &istanbul());

        assert!(notification.title.starts_with("🎫 3 seats found"));
        assert!(notification.body.contains("🚄 Train: 81004"));
        assert!(notification.body.contains("🕒 Departure: 08:30"));
        assert!(notification.body.contains("🕒 Arrival: 12:45"));
        assert!(notification.body.contains("⏱️ Duration: 4h 15m"));

        let data = notification.data.unwrap();
        assert_eq!(data["type"], "SEATS_FOUND");
        assert_eq!(data["availableSeats"], 3);
        assert_eq!(data["duration"], 255);
        assert_eq!(data["cabinClassName"], "Class 1");
        assert_eq!(data["date"], "2025-06-01");

        let reason = completed_reason(&stations(), &alert, &seat_match, &istanbul());
        assert!(reason.contains("3 seats found"));
        assert!(reason.ends_with("at time 08:30"));
    }

    #[test]
    fn test_arrival_before_departure_reports_zero_duration() {
        let alert = alert("X", "Y", NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), "1");
        let train = train("81004", "2025-06-01T05:30:00Z", "2025-06-01T04:15:00Z", &[("1", 3)]);
        let seat_match = SeatMatch {
            train: &train,
            availability: &train.cabin_class_availabilities[0],
        };

        let notification = seats_found_notification(&stations(), &alert, &seat_match, &istanbul());

        assert!(notification.body.contains("⏱️ Duration: 0h 0m"));
        assert_eq!(notification.data.unwrap()["duration"], 0);
    }
}
