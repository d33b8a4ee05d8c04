use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Capacity, Occupancy, Passenger, RoomClass, RoomId};

/// Снимок сессии для экрана расселения.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub trip_id: String,
    pub state: &'static str,
    pub dirty: bool,
    pub passenger_count: usize,
    pub rooms: Vec<RoomView>,
    pub unassigned: Vec<Passenger>,
    pub under_filled: Vec<RoomId>,
    pub load_notice: Option<String>,
    pub last_save_error: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomView {
    pub id: RoomId,
    pub class: RoomClass,
    pub capacity: Capacity,
    pub note: Option<String>,
    pub occupancy: Occupancy,
    /// Отсортированы по `original_order`.
    pub occupants: Vec<Passenger>,
}
