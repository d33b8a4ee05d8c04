use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use tracing::info;

use crate::config::BookingsConfig;
use crate::error::SyncError;
use crate::http_client::{build_client, expect_success, parse_base_url, trip_resource_url};
use crate::models::BookingRecord;

/// Источник пассажиров поездки - подсистема бронирований.
#[async_trait]
pub trait BookingSource: Send + Sync {
    async fn passengers(&self, trip_id: &str) -> Result<Vec<BookingRecord>, SyncError>;
}

#[derive(Clone)]
pub struct BookingClient {
    base_url: Url,
    http_client: reqwest::Client,
}

impl BookingClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SyncError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            http_client: build_client(timeout)?,
        })
    }

    pub fn from_config(config: &BookingsConfig) -> Result<Self, SyncError> {
        Self::new(&config.base_url, config.timeout())
    }
}

#[async_trait]
impl BookingSource for BookingClient {
    async fn passengers(&self, trip_id: &str) -> Result<Vec<BookingRecord>, SyncError> {
        let url = trip_resource_url(&self.base_url, trip_id, "passengers")?;
        info!("Fetching booked passengers: {}", url);

        let response = self.http_client.get(url).send().await?;
        let records = expect_success(response)?.json::<Vec<BookingRecord>>().await?;
        info!("Trip {} has {} booking records", trip_id, records.len());
        Ok(records)
    }
}
