//! Boundaries of the reconciliation engine.
//!
//! The engine only talks to storage, the availability source and the push
//! pipeline through these traits; `main` wires the concrete adapters in.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::notification::Notification;
use crate::models::search_alert::{AlertUpdate, SearchAlert};
use crate::models::train::{AvailabilityQuery, CandidateTrain};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AvailabilityError {
    /// The source answered with an error or no data; worth retrying next pass.
    #[error("upstream unavailable: {0}")]
    Upstream(String),
    /// Anything the engine can't reason about, e.g. a malformed response.
    #[error("availability query failed: {0}")]
    Internal(String),
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Active, PENDING, not deleted alerts that have a time window, oldest first.
    async fn list_eligible_alerts(&self) -> Result<Vec<SearchAlert>, StoreError>;

    async fn get_alert(&self, id: Uuid) -> Result<Option<SearchAlert>, StoreError>;

    /// Applies `update` if the alert is still PENDING and not soft-deleted.
    /// Returns whether a row was changed.
    async fn update_alert(&self, id: Uuid, update: AlertUpdate) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait AvailabilityPort: Send + Sync {
    async fn query(&self, query: &AvailabilityQuery)
        -> Result<Vec<CandidateTrain>, AvailabilityError>;
}

/// Best-effort push delivery. Implementations must not block the caller.
pub trait NotificationSink: Send + Sync {
    fn send(&self, notification: Notification);
}
