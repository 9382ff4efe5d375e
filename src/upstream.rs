use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::train::{AvailabilityQuery, CandidateTrain};
use crate::ports::{AvailabilityError, AvailabilityPort};

/// Client for the crawler service that searches the railway site.
pub struct HttpAvailabilityClient {
    client: reqwest::Client,
    url: String,
}

impl HttpAvailabilityClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeRangeBody {
    start: String,
    end: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    from_station_id: &'a str,
    to_station_id: &'a str,
    /// `DD-MM-YYYY 00:00:00`, the format the railway site expects.
    date: String,
    passenger_count: u32,
    departure_time_range: Option<TimeRangeBody>,
    preferred_cabin_class: Option<&'a str>,
    want_high_speed_train: bool,
}

impl<'a> From<&'a AvailabilityQuery> for SearchRequest<'a> {
    fn from(query: &'a AvailabilityQuery) -> Self {
        Self {
            from_station_id: &query.from_station_id,
            to_station_id: &query.to_station_id,
            date: query.date.format("%d-%m-%Y 00:00:00").to_string(),
            passenger_count: query.passenger_count,
            departure_time_range: query.departure_time_range.map(|w| TimeRangeBody {
                start: w.start.format("%H:%M").to_string(),
                end: w.end.format("%H:%M").to_string(),
            }),
            preferred_cabin_class: query.cabin_class.as_deref(),
            want_high_speed_train: query.high_speed_only,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    error: Option<String>,
}

/// Maps a crawler reply onto the engine's error taxonomy.
fn interpret(status: StatusCode, body: &[u8]) -> Result<Vec<CandidateTrain>, AvailabilityError> {
    let parsed = serde_json::from_slice::<SearchResponse>(body);

    if !status.is_success() {
        let reason = parsed
            .ok()
            .and_then(|r| r.error)
            .unwrap_or_else(|| format!("HTTP {}", status));
        return Err(AvailabilityError::Upstream(reason));
    }

    let response =
        parsed.map_err(|e| AvailabilityError::Internal(format!("malformed response: {}", e)))?;
    if let Some(error) = response.error {
        return Err(AvailabilityError::Upstream(error));
    }

    // Entries that do not decode are dropped; the rest still count.
    let trains = response
        .data
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(i, raw)| match serde_json::from_value::<CandidateTrain>(raw) {
            Ok(train) => Some(train),
            Err(e) => {
                warn!(index = i, error = %e, "Dropping undecodable train from availability reply");
                None
            }
        })
        .collect();
    Ok(trains)
}

#[async_trait]
impl AvailabilityPort for HttpAvailabilityClient {
    async fn query(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<Vec<CandidateTrain>, AvailabilityError> {
        let request = SearchRequest::from(query);
        debug!(url = %self.url, ?request, "Querying availability");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AvailabilityError::Upstream(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| AvailabilityError::Upstream(e.to_string()))?;

        interpret(status, &body)
    }
}
