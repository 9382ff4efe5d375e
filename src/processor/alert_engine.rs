use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::models::search_alert::{AlertUpdate, GroupKey, SearchAlert, TimeWindow};
use crate::models::train::{AvailabilityQuery, CandidateTrain};
use crate::ports::{AlertStore, AvailabilityError, AvailabilityPort, NotificationSink, StoreError};
use crate::processor::format::{self, SeatMatch};
use crate::processor::grouper::{group_alerts, AlertGroup};
use crate::stations::StationDirectory;

pub const REASON_NO_TIME_RANGE: &str = "No departure time range provided";
pub const REASON_DATE_PASSED: &str = "Search date has passed";
pub const REASON_TECHNICAL_ERROR: &str = "Search failed due to technical error";

/// Counts from one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub alerts: usize,
    pub groups: usize,
    pub queries: usize,
    pub completed: usize,
    pub expired: usize,
    pub failed: usize,
    pub pending: usize,
    pub skipped: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AlertOutcome {
    Skipped,
    InvalidConfig,
    Expired,
    Completed,
    NotFound,
    UpstreamError,
}

impl PassReport {
    fn record(&mut self, outcome: AlertOutcome) {
        match outcome {
            AlertOutcome::Skipped => self.skipped += 1,
            AlertOutcome::InvalidConfig => self.failed += 1,
            AlertOutcome::Expired => self.expired += 1,
            AlertOutcome::Completed => self.completed += 1,
            AlertOutcome::NotFound | AlertOutcome::UpstreamError => self.pending += 1,
        }
    }
}

#[derive(Debug, Error)]
enum ProcessError {
    /// Confined to the alert being processed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Poisons the whole group.
    #[error("group query failed: {0}")]
    Group(String),
}

/// Result of the single availability lookup a group is allowed per pass.
enum GroupQuery {
    NotIssued,
    Trains(Arc<Vec<CandidateTrain>>),
    Unavailable,
}

/// Reconciles stored search alerts against upstream seat availability.
///
/// A pass loads every eligible alert, queries the availability source once
/// per (origin, destination, date), and moves each alert to COMPLETED or
/// FAILED when warranted. Passes must not overlap; the scheduler awaits each
/// one before starting the next.
pub struct AlertEngine {
    store: Arc<dyn AlertStore>,
    availability: Arc<dyn AvailabilityPort>,
    notifier: Arc<dyn NotificationSink>,
    stations: Arc<StationDirectory>,
    local_offset: FixedOffset,
}

impl AlertEngine {
    pub fn new(
        store: Arc<dyn AlertStore>,
        availability: Arc<dyn AvailabilityPort>,
        notifier: Arc<dyn NotificationSink>,
        stations: Arc<StationDirectory>,
        local_offset: FixedOffset,
    ) -> Self {
        Self {
            store,
            availability,
            notifier,
            stations,
            local_offset,
        }
    }

    pub async fn run_pass(&self) -> Result<PassReport, StoreError> {
        self.run_pass_at(Utc::now()).await
    }

    pub async fn run_pass_at(&self, now: DateTime<Utc>) -> Result<PassReport, StoreError> {
        info!("Starting search alerts processing");
        let mut report = PassReport::default();

        let alerts = self.store.list_eligible_alerts().await?;
        report.alerts = alerts.len();
        if alerts.is_empty() {
            info!("No active alerts found");
            return Ok(report);
        }

        let groups = group_alerts(alerts);
        report.groups = groups.len();
        info!(
            alerts = report.alerts,
            groups = report.groups,
            "Grouped active alerts"
        );

        let total = groups.len();
        for (i, group) in groups.iter().enumerate() {
            info!(group = %group.key, "Processing group {}/{}", i + 1, total);
            self.process_group(group, now, &mut report).await;
        }

        info!(?report, "Completed processing all groups");
        Ok(report)
    }

    async fn process_group(&self, group: &AlertGroup, now: DateTime<Utc>, report: &mut PassReport) {
        let mut query = GroupQuery::NotIssued;

        for alert in &group.alerts {
            match self
                .process_alert(&group.key, alert, &mut query, now, report)
                .await
            {
                Ok(outcome) => report.record(outcome),
                Err(ProcessError::Store(e)) => {
                    error!(alert_id = %alert.id, error = %e, "Failed to process alert");
                    report.errors += 1;
                }
                Err(ProcessError::Group(reason)) => {
                    error!(group = %group.key, %reason, "Error processing search group");
                    self.fail_group(group, report).await;
                    return;
                }
            }
        }
    }

    async fn process_alert(
        &self,
        key: &GroupKey,
        alert: &SearchAlert,
        query: &mut GroupQuery,
        now: DateTime<Utc>,
        report: &mut PassReport,
    ) -> Result<AlertOutcome, ProcessError> {
        let current = match self.store.get_alert(alert.id).await? {
            Some(current) if current.is_actionable() => current,
            Some(stored) => {
                debug!(
                    alert_id = %stored.id,
                    status = %stored.status,
                    is_active = stored.is_active,
                    reason = ?stored.status_reason,
                    deleted = stored.deleted_at.is_some(),
                    "Alert skipped - deleted or not pending"
                );
                return Ok(AlertOutcome::Skipped);
            }
            None => {
                debug!(alert_id = %alert.id, "Alert skipped - no longer stored");
                return Ok(AlertOutcome::Skipped);
            }
        };
        debug!(alert_id = %current.id, last_checked = ?current.last_checked, "Checking alert");

        let Some(window) = current.departure_time_range else {
            self.store
                .update_alert(
                    current.id,
                    AlertUpdate::failed(REASON_NO_TIME_RANGE).with_last_checked(now),
                )
                .await?;
            warn!(alert_id = %current.id, "Alert failed - no departure time range");
            return Ok(AlertOutcome::InvalidConfig);
        };

        let today = now.with_timezone(&self.local_offset).date_naive();
        if current.date < today {
            let applied = self
                .store
                .update_alert(
                    current.id,
                    AlertUpdate::failed(REASON_DATE_PASSED).with_last_checked(now),
                )
                .await?;
            if !applied {
                return Ok(AlertOutcome::Skipped);
            }
            self.notifier
                .send(format::expiration_notification(&self.stations, &current));
            info!(alert_id = %current.id, date = %current.date, "Alert expired - past date");
            return Ok(AlertOutcome::Expired);
        }

        let trains = self.group_trains(key, query, report).await?;

        self.store
            .update_alert(current.id, AlertUpdate::checked(now))
            .await?;

        let Some(trains) = trains else {
            info!(alert_id = %current.id, "Upstream unavailable, alert stays pending");
            return Ok(AlertOutcome::UpstreamError);
        };

        let Some(seat_match) = find_first_match(&trains, &current, window, &self.local_offset)
        else {
            debug!(alert_id = %current.id, candidates = trains.len(), "No seats yet");
            return Ok(AlertOutcome::NotFound);
        };

        let reason =
            format::completed_reason(&self.stations, &current, &seat_match, &self.local_offset);
        let applied = self
            .store
            .update_alert(current.id, AlertUpdate::completed(reason))
            .await?;
        if !applied {
            return Ok(AlertOutcome::Skipped);
        }

        self.notifier.send(format::seats_found_notification(
            &self.stations,
            &current,
            &seat_match,
            &self.local_offset,
        ));
        info!(
            alert_id = %current.id,
            train = %seat_match.train.train_number,
            seats = seat_match.availability.availability_count,
            "Alert completed - seats found"
        );
        Ok(AlertOutcome::Completed)
    }

    /// Issues the group's query on first use and replays its result afterwards.
    /// `None` means the source was unavailable this pass.
    async fn group_trains(
        &self,
        key: &GroupKey,
        query: &mut GroupQuery,
        report: &mut PassReport,
    ) -> Result<Option<Arc<Vec<CandidateTrain>>>, ProcessError> {
        match query {
            GroupQuery::Trains(trains) => return Ok(Some(trains.clone())),
            GroupQuery::Unavailable => return Ok(None),
            GroupQuery::NotIssued => {}
        }

        report.queries += 1;
        let request = AvailabilityQuery {
            from_station_id: key.from_station_id.clone(),
            to_station_id: key.to_station_id.clone(),
            date: key.date,
            passenger_count: 1,
            departure_time_range: None,
            cabin_class: None,
            high_speed_only: false,
        };

        match self.availability.query(&request).await {
            Ok(trains) => {
                debug!(group = %key, trains = trains.len(), "Availability query returned");
                let trains = Arc::new(trains);
                *query = GroupQuery::Trains(trains.clone());
                Ok(Some(trains))
            }
            Err(AvailabilityError::Upstream(reason)) => {
                warn!(group = %key, %reason, "Availability query failed");
                *query = GroupQuery::Unavailable;
                Ok(None)
            }
            Err(AvailabilityError::Internal(reason)) => Err(ProcessError::Group(reason)),
        }
    }

    /// Last-resort handling for a group whose processing broke down: every
    /// member that is still pending and not deleted is failed.
    async fn fail_group(&self, group: &AlertGroup, report: &mut PassReport) {
        for alert in &group.alerts {
            let current = match self.store.get_alert(alert.id).await {
                Ok(Some(current)) if current.is_actionable() => current,
                Ok(_) => {
                    debug!(alert_id = %alert.id, "Alert skipped - deleted or not pending");
                    continue;
                }
                Err(e) => {
                    error!(alert_id = %alert.id, error = %e, "Failed to reload alert");
                    report.errors += 1;
                    continue;
                }
            };

            match self
                .store
                .update_alert(current.id, AlertUpdate::failed(REASON_TECHNICAL_ERROR))
                .await
            {
                Ok(true) => {
                    report.failed += 1;
                    warn!(alert_id = %current.id, "Alert failed - technical error");
                }
                Ok(false) => {}
                Err(e) => {
                    error!(alert_id = %current.id, error = %e, "Failed to mark alert as failed");
                    report.errors += 1;
                }
            }
        }
    }
}

/// First train, in upstream order, that satisfies the alert's filters, paired
/// with its first cabin entry for the alert's class that still has seats.
fn find_first_match<'a>(
    trains: &'a [CandidateTrain],
    alert: &SearchAlert,
    window: TimeWindow,
    offset: &FixedOffset,
) -> Option<SeatMatch<'a>> {
    trains
        .iter()
        .filter(|train| !alert.high_speed_only || train.is_high_speed)
        .filter(|train| window.contains(train.departure_time.with_timezone(offset).time()))
        .find_map(|train| {
            train
                .cabin_class_availabilities
                .iter()
                .find(|a| a.cabin_class_id == alert.cabin_class && a.availability_count > 0)
                .map(|availability| SeatMatch {
                    train,
                    availability,
                })
        })
}
