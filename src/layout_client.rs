//! Клиент сервера сохранённых раскладок.
//!
//! Сервер хранит номера поездки целиком: чтение отдаёт список номеров,
//! запись заменяет его полностью и возвращает номера с присвоенными id.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::info;

use crate::config::LayoutStoreConfig;
use crate::error::SyncError;
use crate::http_client::{build_client, expect_success, parse_base_url, trip_resource_url};
use crate::models::{RoomDraft, StoredRoom};

#[async_trait]
pub trait LayoutStore: Send + Sync {
    /// `Ok(None)` - для поездки ещё ничего не сохранено.
    async fn fetch(&self, trip_id: &str) -> Result<Option<Vec<StoredRoom>>, SyncError>;

    /// Полная замена раскладки. Возвращает то, что сервер теперь хранит.
    async fn replace(&self, trip_id: &str, rooms: &[RoomDraft]) -> Result<Vec<StoredRoom>, SyncError>;
}

#[derive(Clone)]
pub struct LayoutClient {
    base_url: Url,
    http_client: reqwest::Client,
}

impl LayoutClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SyncError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            http_client: build_client(timeout)?,
        })
    }

    pub fn from_config(config: &LayoutStoreConfig) -> Result<Self, SyncError> {
        Self::new(&config.base_url, config.timeout())
    }

    fn rooms_url(&self, trip_id: &str) -> Result<Url, SyncError> {
        trip_resource_url(&self.base_url, trip_id, "rooms")
    }
}

#[async_trait]
impl LayoutStore for LayoutClient {
    async fn fetch(&self, trip_id: &str) -> Result<Option<Vec<StoredRoom>>, SyncError> {
        let url = self.rooms_url(trip_id)?;
        info!("Fetching stored layout: {}", url);

        let response = self.http_client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let rooms = expect_success(response)?.json::<Vec<StoredRoom>>().await?;
        Ok(Some(rooms))
    }

    async fn replace(&self, trip_id: &str, rooms: &[RoomDraft]) -> Result<Vec<StoredRoom>, SyncError> {
        let url = self.rooms_url(trip_id)?;
        info!("Replacing stored layout with {} rooms: {}", rooms.len(), url);

        let response = self.http_client.put(url).json(rooms).send().await?;
        let stored = expect_success(response)?.json::<Vec<StoredRoom>>().await?;
        Ok(stored)
    }
}
