//! Общие куски для клиентов внешних сервисов.

use reqwest::{Response, Url};
use std::time::Duration;

use crate::error::SyncError;

/// HTTP-клиент с таймаутом. Таймаут - такая же ошибка транспорта, как и любая другая.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, SyncError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

pub fn parse_base_url(raw: &str) -> Result<Url, SyncError> {
    Url::parse(raw).map_err(|_| SyncError::InvalidBaseUrl(raw.to_string()))
}

/// `{base}/trips/{trip_id}/{leaf}`. id поездки кодируется как один сегмент пути.
pub fn trip_resource_url(base: &Url, trip_id: &str, leaf: &str) -> Result<Url, SyncError> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| SyncError::InvalidBaseUrl(base.to_string()))?;
        segments.pop_if_empty().extend(["trips", trip_id, leaf]);
    }
    Ok(url)
}

pub fn expect_success(response: Response) -> Result<Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SyncError::UnexpectedStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}
