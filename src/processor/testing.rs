//! In-memory doubles for the engine's ports, plus fixture builders.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::notification::Notification;
use crate::models::search_alert::{AlertStatus, AlertUpdate, SearchAlert, TimeWindow};
use crate::models::train::{AvailabilityQuery, CabinClassAvailability, CandidateTrain};
use crate::ports::{AlertStore, AvailabilityError, AvailabilityPort, NotificationSink, StoreError};

/// A pending, active alert with an all-day window.
pub fn alert(from: &str, to: &str, date: NaiveDate, cabin_class: &str) -> SearchAlert {
    SearchAlert {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        from_station_id: from.to_string(),
        to_station_id: to.to_string(),
        date,
        cabin_class: cabin_class.to_string(),
        departure_time_range: Some(TimeWindow {
            start: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
        }),
        high_speed_only: false,
        is_active: true,
        status: AlertStatus::Pending,
        status_reason: None,
        last_checked: None,
        deleted_at: None,
    }
}

/// A train with `(cabin class id, seats)` entries; class names are "Class <id>".
pub fn train(number: &str, departure: &str, arrival: &str, seats: &[(&str, u32)]) -> CandidateTrain {
    CandidateTrain {
        train_number: number.to_string(),
        departure_time: departure.parse::<DateTime<Utc>>().unwrap(),
        arrival_time: arrival.parse::<DateTime<Utc>>().unwrap(),
        cabin_class_availabilities: seats
            .iter()
            .map(|(id, count)| CabinClassAvailability {
                cabin_class_id: id.to_string(),
                cabin_class_name: Some(format!("Class {}", id)),
                availability_count: *count,
            })
            .collect(),
        is_high_speed: false,
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    alerts: Mutex<Vec<SearchAlert>>,
    listing: Mutex<Option<Vec<SearchAlert>>>,
    failing_reads: Mutex<HashSet<Uuid>>,
    fail_listing: Mutex<bool>,
    deletes_before_transition: Mutex<HashSet<Uuid>>,
}

impl InMemoryStore {
    pub fn new(alerts: Vec<SearchAlert>) -> Self {
        Self {
            alerts: Mutex::new(alerts),
            ..Default::default()
        }
    }

    pub fn get(&self, id: Uuid) -> Option<SearchAlert> {
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub fn alert(&self, id: Uuid) -> SearchAlert {
        self.get(id).expect("alert exists")
    }

    /// Pins what the next `list_eligible_alerts` returns, so alerts can change after being listed.
    pub fn set_listing(&self, alerts: Vec<SearchAlert>) {
        *self.listing.lock().unwrap() = Some(alerts);
    }

    pub fn set_status(&self, id: Uuid, status: AlertStatus) {
        self.modify(id, |a| {
            a.status = status;
            a.is_active = status == AlertStatus::Pending;
        });
    }

    pub fn soft_delete(&self, id: Uuid) {
        self.modify(id, |a| a.deleted_at = Some(Utc::now()));
    }

    pub fn remove(&self, id: Uuid) {
        self.alerts.lock().unwrap().retain(|a| a.id != id);
    }

    pub fn fail_reads_of(&self, id: Uuid) {
        self.failing_reads.lock().unwrap().insert(id);
    }

    pub fn fail_listing(&self) {
        *self.fail_listing.lock().unwrap() = true;
    }

    /// Soft-deletes the alert right before the first update that would change
    /// its status, as if the user deleted it between the engine's read and write.
    pub fn delete_before_transition(&self, id: Uuid) {
        self.deletes_before_transition.lock().unwrap().insert(id);
    }

    fn modify(&self, id: Uuid, f: impl FnOnce(&mut SearchAlert)) {
        if let Some(alert) = self.alerts.lock().unwrap().iter_mut().find(|a| a.id == id) {
            f(alert);
        }
    }
}

#[async_trait]
impl AlertStore for InMemoryStore {
    async fn list_eligible_alerts(&self) -> Result<Vec<SearchAlert>, StoreError> {
        if *self.fail_listing.lock().unwrap() {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        if let Some(listing) = self.listing.lock().unwrap().take() {
            return Ok(listing);
        }
        Ok(self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.is_active && a.is_actionable() && a.departure_time_range.is_some())
            .cloned()
            .collect())
    }

    async fn get_alert(&self, id: Uuid) -> Result<Option<SearchAlert>, StoreError> {
        if self.failing_reads.lock().unwrap().contains(&id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        Ok(self.get(id))
    }

    async fn update_alert(&self, id: Uuid, update: AlertUpdate) -> Result<bool, StoreError> {
        if update.status.is_some() && self.deletes_before_transition.lock().unwrap().remove(&id) {
            self.soft_delete(id);
        }
        let mut alerts = self.alerts.lock().unwrap();
        let Some(alert) = alerts.iter_mut().find(|a| a.id == id && a.is_actionable()) else {
            return Ok(false);
        };
        if let Some(is_active) = update.is_active {
            alert.is_active = is_active;
        }
        if let Some(status) = update.status {
            alert.status = status;
        }
        if let Some(reason) = update.status_reason {
            alert.status_reason = Some(reason);
        }
        if let Some(at) = update.last_checked {
            alert.last_checked = Some(at);
        }
        Ok(true)
    }
}

/// Replies with a fixed result and records every query it receives.
pub struct FakeAvailability {
    result: Result<Vec<CandidateTrain>, AvailabilityError>,
    queries: Mutex<Vec<AvailabilityQuery>>,
}

impl FakeAvailability {
    pub fn trains(trains: Vec<CandidateTrain>) -> Self {
        Self::with_result(Ok(trains))
    }

    pub fn upstream_error(reason: &str) -> Self {
        Self::with_result(Err(AvailabilityError::Upstream(reason.to_string())))
    }

    pub fn internal_error(reason: &str) -> Self {
        Self::with_result(Err(AvailabilityError::Internal(reason.to_string())))
    }

    fn with_result(result: Result<Vec<CandidateTrain>, AvailabilityError>) -> Self {
        Self {
            result,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn queries(&self) -> Vec<AvailabilityQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AvailabilityPort for FakeAvailability {
    async fn query(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<Vec<CandidateTrain>, AvailabilityError> {
        self.queries.lock().unwrap().push(query.clone());
        self.result.clone()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingNotifier {
    fn send(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}
