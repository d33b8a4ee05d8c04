//! sync.rs
//!
//! Координатор синхронизации: связывает сессию расселения с внешними
//! хранилищами.
//!
//! 1.  **load**: пассажиры из бронирований и сохранённая раскладка запрашиваются
//!     параллельно. Без пассажиров открывать нечего, поэтому их ошибка валит
//!     открытие. Ошибка раскладки - нет: сессия стартует с пустой.
//! 2.  **save**: решение принимается под замком сессии (`begin_save`), запрос
//!     идёт без замка, ответ применяется снова под замком (`finish_save`).
//!     Пока запрос в полёте, оператор может продолжать работу, а повторные
//!     сохранения отбрасываются.
//! 3.  **refresh_passengers**: перечитывает бронирования в открытой сессии.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::booking_client::{BookingClient, BookingSource};
use crate::config::Config;
use crate::engine::{RoomingSession, SaveReport, SaveStart};
use crate::error::{EngineError, RoomingError, SyncError};
use crate::layout_client::{LayoutClient, LayoutStore};

pub type SharedSession = Arc<Mutex<RoomingSession>>;

/// Итог запроса на сохранение.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved(SaveReport),
    /// Изменений нет, в сеть не ходили.
    SkippedClean,
    /// Другое сохранение ещё не завершилось.
    SkippedInFlight,
}

#[derive(Clone)]
pub struct SyncCoordinator {
    layouts: Arc<dyn LayoutStore>,
    bookings: Arc<dyn BookingSource>,
}

impl SyncCoordinator {
    pub fn new(layouts: Arc<dyn LayoutStore>, bookings: Arc<dyn BookingSource>) -> Self {
        Self { layouts, bookings }
    }

    pub fn from_config(config: &Config) -> Result<Self, SyncError> {
        let layouts = LayoutClient::from_config(&config.layout_store)?;
        let bookings = BookingClient::from_config(&config.bookings)?;
        Ok(Self::new(Arc::new(layouts), Arc::new(bookings)))
    }

    /// Загружает сессию, находящуюся в `Loading`.
    ///
    /// Обмен идёт в отдельной задаче, чтобы ушедший вызывающий не оставил
    /// сессию в `Loading` навсегда.
    pub async fn load(&self, session: &SharedSession) -> Result<(), SyncError> {
        let trip_id = session.lock().await.trip_id().to_string();
        let layouts = self.layouts.clone();
        let bookings = self.bookings.clone();
        let session = session.clone();

        tokio::spawn(async move {
            info!("Loading rooming session for trip {}", trip_id);
            let (records, layout) = tokio::join!(bookings.passengers(&trip_id), layouts.fetch(&trip_id));
            let records = records?;
            session.lock().await.finish_load(records, layout);
            Ok::<(), SyncError>(())
        })
        .await?
    }

    /// Сохраняет раскладку, если есть что сохранять.
    ///
    /// Ошибка сети возвращается вызывающему, локальное состояние при этом не
    /// меняется и остаётся «грязным». Повторов нет: следующую попытку делает оператор.
    pub async fn save(&self, session: &SharedSession) -> Result<SaveOutcome, RoomingError> {
        let start = session.lock().await.begin_save();

        let ticket = match start {
            SaveStart::Send(ticket) => ticket,
            SaveStart::Clean => {
                debug!("Nothing to save");
                return Ok(SaveOutcome::SkippedClean);
            }
            SaveStart::AlreadySaving => {
                info!("Save already in flight, request dropped");
                return Ok(SaveOutcome::SkippedInFlight);
            }
            SaveStart::NotReady => return Err(EngineError::NotReady.into()),
        };

        let layouts = self.layouts.clone();
        let session = session.clone();

        let report = tokio::spawn(async move {
            info!(
                "Saving {} rooms of trip {} (request {})",
                ticket.drafts.len(),
                ticket.trip_id,
                ticket.request_id
            );
            let result = layouts.replace(&ticket.trip_id, &ticket.drafts).await;
            let report = session.lock().await.finish_save(ticket.request_id, result);
            report
        })
        .await
        .map_err(SyncError::from)??;

        Ok(SaveOutcome::Saved(report))
    }

    /// Перечитывает пассажиров. Возвращает число выселенных из номеров.
    pub async fn refresh_passengers(&self, session: &SharedSession) -> Result<usize, RoomingError> {
        let trip_id = session.lock().await.trip_id().to_string();
        let records = self.bookings.passengers(&trip_id).await?;
        let removed = session.lock().await.refresh_passengers(records)?;
        Ok(removed)
    }
}
