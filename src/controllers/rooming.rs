use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::engine::Location;
use crate::error::{EngineError, RoomingError, SyncError};
use crate::models::{Capacity, PassengerId, RoomClass, RoomId};
use crate::services::SharedSession;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/room-classes", get(room_classes))
        .route("/trips/{trip_id}/rooming", get(get_session).delete(close_session))
        .route("/trips/{trip_id}/rooming/open", post(open_session))
        .route("/trips/{trip_id}/rooming/rooms", post(create_room))
        .route("/trips/{trip_id}/rooming/rooms/{room_id}", delete(delete_room))
        .route("/trips/{trip_id}/rooming/rooms/{room_id}/note", patch(set_note))
        .route("/trips/{trip_id}/rooming/move", patch(move_passenger))
        .route("/trips/{trip_id}/rooming/save", post(save_session))
        .route("/trips/{trip_id}/rooming/passengers/refresh", post(refresh_passengers))
}

type ApiError = (StatusCode, Json<Value>);

/* ---------- helpers ---------- */

fn reject(status: StatusCode, message: &str, detail: impl std::fmt::Display) -> ApiError {
    (
        status,
        Json(json!({ "message": message, "detail": detail.to_string() })),
    )
}

fn engine_error(e: EngineError) -> ApiError {
    let (status, message) = match &e {
        EngineError::RoomFull { .. } => (StatusCode::CONFLICT, "Номер заполнен"),
        EngineError::RoomNotFound(_) => (StatusCode::NOT_FOUND, "Номер не найден"),
        EngineError::UnknownPassenger(_) => (StatusCode::NOT_FOUND, "Пассажир не найден в поездке"),
        EngineError::NotInSource { .. } => (StatusCode::CONFLICT, "Пассажир находится в другом месте"),
        EngineError::NotReady => (StatusCode::CONFLICT, "Сессия ещё загружается"),
    };
    reject(status, message, e)
}

fn sync_error(e: SyncError) -> ApiError {
    error!("External store failure: {}", e);
    match e {
        SyncError::StaleCompletion(_) => reject(StatusCode::CONFLICT, "Ответ на устаревшее сохранение", e),
        _ => reject(StatusCode::BAD_GATEWAY, "Внешний сервис недоступен", e),
    }
}

fn rooming_error(e: RoomingError) -> ApiError {
    match e {
        RoomingError::Engine(e) => engine_error(e),
        RoomingError::Sync(e) => sync_error(e),
    }
}

async fn session_of(state: &AppState, trip_id: &str) -> Result<SharedSession, ApiError> {
    state.sessions.get(trip_id).await.ok_or_else(|| {
        reject(
            StatusCode::NOT_FOUND,
            "Сессия расселения не открыта",
            format!("trip {}", trip_id),
        )
    })
}

/* ---------- CATALOG ---------- */

#[derive(Debug, Serialize)]
struct RoomClassResponse {
    class: RoomClass,
    capacity: Capacity,
}

// GET /api/room-classes
async fn room_classes() -> impl IntoResponse {
    let classes: Vec<RoomClassResponse> = RoomClass::ALL
        .iter()
        .map(|&class| RoomClassResponse {
            class,
            capacity: class.capacity(),
        })
        .collect();
    Json(classes)
}

/* ---------- SESSION ---------- */

// POST /api/trips/{trip_id}/rooming/open
async fn open_session(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .sessions
        .open(&trip_id, &state.sync)
        .await
        .map_err(sync_error)?;

    let view = session.lock().await.view();
    Ok(Json(view))
}

// GET /api/trips/{trip_id}/rooming
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = session_of(&state, &trip_id).await?;
    let mut session = session.lock().await;
    session.mark_seen();
    Ok(Json(session.view()))
}

// DELETE /api/trips/{trip_id}/rooming
async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.sessions.close(&trip_id).await {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(reject(
            StatusCode::NOT_FOUND,
            "Сессия расселения не открыта",
            format!("trip {}", trip_id),
        )),
    }
}

/* ---------- ROOMS ---------- */

#[derive(Debug, Deserialize)]
struct CreateRoomRequest {
    class: String,
    #[serde(default)]
    note: Option<String>,
}

// POST /api/trips/{trip_id}/rooming/rooms
async fn create_room(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let class: RoomClass = req
        .class
        .parse()
        .map_err(|e| reject(StatusCode::UNPROCESSABLE_ENTITY, "Неизвестный класс номера", e))?;

    let session = session_of(&state, &trip_id).await?;
    let mut session = session.lock().await;
    let room_id = session.create_room(class, req.note).map_err(engine_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "room_id": room_id, "session": session.view() })),
    ))
}

// DELETE /api/trips/{trip_id}/rooming/rooms/{room_id}
async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path((trip_id, room_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let session = session_of(&state, &trip_id).await?;
    let mut session = session.lock().await;
    session
        .delete_room(&RoomId::from(room_id))
        .map_err(engine_error)?;
    Ok(Json(session.view()))
}

#[derive(Debug, Deserialize)]
struct NoteRequest {
    #[serde(default)]
    note: String,
}

// PATCH /api/trips/{trip_id}/rooming/rooms/{room_id}/note
async fn set_note(
    State(state): State<Arc<AppState>>,
    Path((trip_id, room_id)): Path<(String, String)>,
    Json(req): Json<NoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = session_of(&state, &trip_id).await?;
    let mut session = session.lock().await;
    session
        .set_note(&RoomId::from(room_id), req.note)
        .map_err(engine_error)?;
    Ok(Json(session.view()))
}

/* ---------- ASSIGNMENT ---------- */

// Перетаскивание пассажира: "pool" или id номера с обеих сторон
#[derive(Debug, Deserialize)]
struct MoveRequest {
    passenger_id: PassengerId,
    from: Location,
    to: Location,
}

// PATCH /api/trips/{trip_id}/rooming/move
async fn move_passenger(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
    Json(req): Json<MoveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = session_of(&state, &trip_id).await?;
    let mut session = session.lock().await;
    let outcome = session
        .move_passenger(&req.passenger_id, &req.from, &req.to)
        .map_err(engine_error)?;

    Ok(Json(json!({ "outcome": outcome, "session": session.view() })))
}

/* ---------- SYNC ---------- */

// POST /api/trips/{trip_id}/rooming/save
async fn save_session(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = session_of(&state, &trip_id).await?;
    let outcome = state.sync.save(&session).await.map_err(rooming_error)?;

    let view = session.lock().await.view();
    Ok(Json(json!({ "save": outcome, "session": view })))
}

// POST /api/trips/{trip_id}/rooming/passengers/refresh
async fn refresh_passengers(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = session_of(&state, &trip_id).await?;
    let removed = state
        .sync
        .refresh_passengers(&session)
        .await
        .map_err(rooming_error)?;

    let view = session.lock().await.view();
    Ok(Json(json!({ "removed_from_rooms": removed, "session": view })))
}
