use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::search_alert::{AlertUpdate, SearchAlert, SearchAlertRow};
use crate::ports::{AlertStore, StoreError};

pub mod queries;

pub type DbPool = Pool<Postgres>;

pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// `search_alerts` table access for the reconciliation engine.
pub struct PgAlertStore {
    pool: DbPool,
}

impl PgAlertStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertStore for PgAlertStore {
    async fn list_eligible_alerts(&self) -> Result<Vec<SearchAlert>, StoreError> {
        let rows: Vec<SearchAlertRow> = sqlx::query_as(queries::SELECT_ELIGIBLE_ALERTS)
            .fetch_all(&self.pool)
            .await?;

        let mut alerts = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            match SearchAlert::try_from(row) {
                Ok(alert) => alerts.push(alert),
                // A corrupt row must not block every other alert.
                Err(reason) => warn!(alert_id = %id, %reason, "Skipping malformed alert row"),
            }
        }

        info!("Found {} active alerts", alerts.len());
        Ok(alerts)
    }

    async fn get_alert(&self, id: Uuid) -> Result<Option<SearchAlert>, StoreError> {
        let row: Option<SearchAlertRow> = sqlx::query_as(queries::SELECT_ALERT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|row| match SearchAlert::try_from(row) {
            Ok(alert) => Some(alert),
            Err(reason) => {
                warn!(alert_id = %id, %reason, "Malformed alert row");
                None
            }
        }))
    }

    async fn update_alert(&self, id: Uuid, update: AlertUpdate) -> Result<bool, StoreError> {
        let result = sqlx::query(queries::UPDATE_PENDING_ALERT)
            .bind(id)
            .bind(update.is_active)
            .bind(update.status.map(|s| s.as_str()))
            .bind(update.status_reason)
            .bind(update.last_checked)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
