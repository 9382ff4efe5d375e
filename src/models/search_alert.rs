use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertStatus {
    Pending,
    Completed,
    Failed,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Pending => "PENDING",
            AlertStatus::Completed => "COMPLETED",
            AlertStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(AlertStatus::Pending),
            "COMPLETED" => Ok(AlertStatus::Completed),
            "FAILED" => Ok(AlertStatus::Failed),
            other => Err(format!("unknown alert status '{}'", other)),
        }
    }
}

/// Wall-clock departure window, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= time && time <= self.end
        } else {
            // Window wraps past midnight, e.g. 22:00-02:00.
            time >= self.start || time <= self.end
        }
    }
}

/// (origin, destination, date): the unit of upstream query deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub from_station_id: String,
    pub to_station_id: String,
    pub date: NaiveDate,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.from_station_id, self.to_station_id, self.date)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchAlert {
    pub id: Uuid,
    pub user_id: Uuid,
    pub from_station_id: String,
    pub to_station_id: String,
    pub date: NaiveDate,
    pub cabin_class: String,
    pub departure_time_range: Option<TimeWindow>,
    pub high_speed_only: bool,
    pub is_active: bool,
    pub status: AlertStatus,
    pub status_reason: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SearchAlert {
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            from_station_id: self.from_station_id.clone(),
            to_station_id: self.to_station_id.clone(),
            date: self.date,
        }
    }

    /// True while the engine may still act on this alert.
    pub fn is_actionable(&self) -> bool {
        self.status == AlertStatus::Pending && self.deleted_at.is_none()
    }
}

/// Partial update of an alert's mutable fields.
///
/// Built only through the constructors below so that a status change always
/// clears `is_active` in the same write. The store applies an update only while
/// the stored alert is still PENDING and not soft-deleted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertUpdate {
    pub is_active: Option<bool>,
    pub status: Option<AlertStatus>,
    pub status_reason: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl AlertUpdate {
    pub fn checked(at: DateTime<Utc>) -> Self {
        Self {
            last_checked: Some(at),
            ..Default::default()
        }
    }

    pub fn completed(reason: impl Into<String>) -> Self {
        Self::transition(AlertStatus::Completed, reason)
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::transition(AlertStatus::Failed, reason)
    }

    pub fn with_last_checked(mut self, at: DateTime<Utc>) -> Self {
        self.last_checked = Some(at);
        self
    }

    fn transition(status: AlertStatus, reason: impl Into<String>) -> Self {
        Self {
            is_active: Some(false),
            status: Some(status),
            status_reason: Some(reason.into()),
            last_checked: None,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct SearchAlertRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub from_station_id: String,
    pub to_station_id: String,
    pub date: NaiveDate,
    pub cabin_class: String,
    pub departure_start: Option<NaiveTime>,
    pub departure_end: Option<NaiveTime>,
    pub high_speed_only: bool,
    pub is_active: bool,
    pub status: String, // text column, one of PENDING / COMPLETED / FAILED
    pub status_reason: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<SearchAlertRow> for SearchAlert {
    type Error = String;

    fn try_from(row: SearchAlertRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<AlertStatus>()?;
        let departure_time_range = match (row.departure_start, row.departure_end) {
            (Some(start), Some(end)) => Some(TimeWindow { start, end }),
            (None, None) => None,
            _ => return Err("departure time range has only one bound".to_string()),
        };

        Ok(SearchAlert {
            id: row.id,
            user_id: row.user_id,
            from_station_id: row.from_station_id,
            to_station_id: row.to_station_id,
            date: row.date,
            cabin_class: row.cabin_class,
            departure_time_range,
            high_speed_only: row.high_speed_only,
            is_active: row.is_active,
            status,
            status_reason: row.status_reason,
            last_checked: row.last_checked,
            deleted_at: row.deleted_at,
        })
    }
}
