use thiserror::Error;
use uuid::Uuid;

use crate::engine::assignment::Location;
use crate::models::{PassengerId, RoomClass, RoomId};

/// Ошибки локальных (синхронных) операций над сессией.
///
/// Ни одна из них не меняет состояние: операция либо применяется целиком,
/// либо отклоняется.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    #[error("passenger {0} is not part of this trip")]
    UnknownPassenger(PassengerId),

    #[error("passenger {passenger} is not in {from}")]
    NotInSource { passenger: PassengerId, from: Location },

    #[error("room {room} ({class}) is full: at most {max} occupants")]
    RoomFull { room: RoomId, class: RoomClass, max: usize },

    #[error("session is still loading")]
    NotReady,
}

/// Ошибки обмена с внешними хранилищами (раскладка номеров, бронирования).
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with unexpected status {status}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid base url {0}")]
    InvalidBaseUrl(String),

    #[error("save completion {0} does not match the request in flight")]
    StaleCompletion(Uuid),

    #[error("background sync task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
#[error("unknown room class: {0}")]
pub struct UnknownRoomClass(pub String);

/// Общая ошибка для вызовов, которые и трогают сессию, и ходят в сеть.
#[derive(Debug, Error)]
pub enum RoomingError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}
