//! Сессия расселения одной поездки.
//!
//! Пул пассажиров, реестр номеров и базовый снимок живут в одном объекте,
//! который создаётся при открытии поездки и выбрасывается при закрытии.
//! Состояние синхронизации - явный автомат `SyncState`:
//!
//! ```text
//! Loading -> Synced <-> Dirty -> Saving -> Synced | Dirty
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::assignment::{self, Location, MoveOutcome};
use super::pool::PassengerPool;
use super::registry::RoomRegistry;
use super::snapshot::{is_dirty, Snapshot};
use crate::error::{EngineError, SyncError};
use crate::models::{
    BookingRecord, Passenger, PassengerId, Room, RoomClass, RoomDraft, RoomId, RoomView,
    SessionView, StoredRoom,
};

pub type TripId = String;

/// Состояние синхронизации сессии с сервером раскладки.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncState {
    /// Сессия открыта, раскладка ещё не получена. Локальные операции запрещены.
    Loading,
    /// Текущий снимок совпадает с базовым.
    Synced,
    /// Есть несохранённые изменения.
    Dirty,
    /// Запрос на замену раскладки в полёте. Локальные правки разрешены.
    Saving {
        request_id: Uuid,
        /// Снимок того, что ушло на сервер.
        sent: Snapshot,
        started_at: DateTime<Utc>,
    },
}

impl SyncState {
    pub fn label(&self) -> &'static str {
        match self {
            SyncState::Loading => "loading",
            SyncState::Synced => "synced",
            SyncState::Dirty => "dirty",
            SyncState::Saving { .. } => "saving",
        }
    }
}

/// Что решила сессия в ответ на просьбу сохраниться.
#[derive(Debug)]
pub enum SaveStart {
    /// Нужно отправить раскладку; сессия перешла в `Saving`.
    Send(SaveTicket),
    /// Сохранение уже идёт - запрос молча отбрасывается.
    AlreadySaving,
    /// Изменений нет - писать нечего.
    Clean,
    /// Сессия ещё загружается.
    NotReady,
}

#[derive(Debug, Clone)]
pub struct SaveTicket {
    pub request_id: Uuid,
    pub trip_id: TripId,
    pub drafts: Vec<RoomDraft>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveReport {
    pub rooms: usize,
    /// Реестр заменён серверными номерами (не было правок во время сохранения).
    pub reconciled: bool,
    pub dirty: bool,
}

#[derive(Debug)]
pub struct RoomingSession {
    trip_id: TripId,
    passengers: PassengerPool,
    rooms: RoomRegistry,
    baseline: Snapshot,
    state: SyncState,
    load_notice: Option<String>,
    last_save_error: Option<String>,
    last_synced_at: Option<DateTime<Utc>>,
    touched_at: DateTime<Utc>,
}

impl RoomingSession {
    pub fn opening(trip_id: impl Into<TripId>) -> Self {
        Self {
            trip_id: trip_id.into(),
            passengers: PassengerPool::new(),
            rooms: RoomRegistry::new(),
            baseline: Snapshot::empty(),
            state: SyncState::Loading,
            load_notice: None,
            last_save_error: None,
            last_synced_at: None,
            touched_at: Utc::now(),
        }
    }

    /// Завершает загрузку: пассажиры из бронирований, номера из сохранённой раскладки.
    ///
    /// `Ok(None)` - раскладки ещё нет, это не ошибка. При ошибке загрузки сессия
    /// стартует с нуля номеров и базовым снимком «нет номеров», так что первое же
    /// сохранение создаст всю раскладку.
    pub fn finish_load(
        &mut self,
        records: Vec<BookingRecord>,
        layout: Result<Option<Vec<StoredRoom>>, SyncError>,
    ) {
        if !matches!(self.state, SyncState::Loading) {
            warn!("Trip {} is already loaded, ignoring repeated load", self.trip_id);
            return;
        }

        self.passengers.initialize(records);

        let rooms = match layout {
            Ok(Some(stored)) => normalize_stored_rooms(&self.passengers, stored),
            Ok(None) => {
                info!("No stored layout for trip {}, starting with zero rooms", self.trip_id);
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to load layout for trip {}: {}. Starting with zero rooms", self.trip_id, e);
                self.load_notice = Some(format!(
                    "Не удалось загрузить сохранённое расселение ({}). Работаем с пустой раскладкой",
                    e
                ));
                Vec::new()
            }
        };

        self.rooms.replace(rooms);
        self.baseline = self.current_snapshot();
        self.state = SyncState::Synced;
        if self.load_notice.is_none() {
            self.last_synced_at = Some(Utc::now());
        }
        self.touch();

        info!(
            "Trip {} opened: {} passengers, {} rooms",
            self.trip_id,
            self.passengers.len(),
            self.rooms.len()
        );
    }

    // === Чтение ===

    pub fn trip_id(&self) -> &str {
        &self.trip_id
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn passengers(&self) -> &PassengerPool {
        &self.passengers
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn baseline(&self) -> &Snapshot {
        &self.baseline
    }

    pub fn current_snapshot(&self) -> Snapshot {
        Snapshot::compute(self.rooms.iter())
    }

    pub fn is_dirty(&self) -> bool {
        is_dirty(&self.current_snapshot(), &self.baseline)
    }

    pub fn unassigned(&self) -> Vec<&Passenger> {
        self.passengers.unassigned(&self.rooms)
    }

    /// Номера, заполненные меньше минимума своего класса. Только для информации.
    pub fn under_filled_rooms(&self) -> Vec<RoomId> {
        self.rooms
            .iter()
            .filter(|room| room.occupants.len() < room.capacity().min)
            .map(|room| room.id.clone())
            .collect()
    }

    pub fn load_notice(&self) -> Option<&str> {
        self.load_notice.as_deref()
    }

    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    pub fn touched_at(&self) -> DateTime<Utc> {
        self.touched_at
    }

    /// Раскладка в том виде, в каком она уходит на сервер.
    pub fn drafts(&self) -> Vec<RoomDraft> {
        self.rooms
            .iter()
            .map(|room| {
                let mut occupants = room.occupants.clone();
                self.passengers.sort_ids(&mut occupants);
                RoomDraft {
                    class: room.class,
                    note: room.note.clone(),
                    occupants,
                }
            })
            .collect()
    }

    pub fn view(&self) -> SessionView {
        let rooms = self
            .rooms
            .iter()
            .map(|room| {
                let mut occupants: Vec<Passenger> = room
                    .occupants
                    .iter()
                    .filter_map(|id| self.passengers.get(id))
                    .cloned()
                    .collect();
                occupants.sort_by_key(|p| p.original_order);

                RoomView {
                    id: room.id.clone(),
                    class: room.class,
                    capacity: room.capacity(),
                    note: room.note.clone(),
                    occupancy: room.occupancy(),
                    occupants,
                }
            })
            .collect();

        SessionView {
            trip_id: self.trip_id.clone(),
            state: self.state.label(),
            dirty: self.is_dirty(),
            passenger_count: self.passengers.len(),
            rooms,
            unassigned: self.unassigned().into_iter().cloned().collect(),
            under_filled: self.under_filled_rooms(),
            load_notice: self.load_notice.clone(),
            last_save_error: self.last_save_error.clone(),
            last_synced_at: self.last_synced_at,
        }
    }

    // === Локальные изменения ===

    pub fn create_room(&mut self, class: RoomClass, note: Option<String>) -> Result<RoomId, EngineError> {
        self.ensure_ready()?;
        let id = self.rooms.create_room(class, note);
        debug!("Room {} ({}) created on trip {}", id, class, self.trip_id);
        self.after_mutation();
        Ok(id)
    }

    pub fn delete_room(&mut self, id: &RoomId) -> Result<Room, EngineError> {
        self.ensure_ready()?;
        let room = self.rooms.delete_room(id)?;
        debug!(
            "Room {} deleted on trip {}, {} passengers back in pool",
            id,
            self.trip_id,
            room.occupants.len()
        );
        self.after_mutation();
        Ok(room)
    }

    pub fn set_note(&mut self, id: &RoomId, text: impl Into<String>) -> Result<(), EngineError> {
        self.ensure_ready()?;
        self.rooms.set_note(id, text)?;
        self.after_mutation();
        Ok(())
    }

    pub fn move_passenger(
        &mut self,
        passenger: &PassengerId,
        from: &Location,
        to: &Location,
    ) -> Result<MoveOutcome, EngineError> {
        self.ensure_ready()?;
        match assignment::move_passenger(&self.passengers, &mut self.rooms, passenger, from, to) {
            Ok(outcome) => {
                if outcome == MoveOutcome::Moved {
                    self.after_mutation();
                }
                Ok(outcome)
            }
            Err(e) => {
                warn!("Move rejected on trip {}: {}", self.trip_id, e);
                Err(e)
            }
        }
    }

    /// Перечитывает список пассажиров. Пропавшие из бронирований выселяются из номеров.
    /// Возвращает число выселенных.
    pub fn refresh_passengers(&mut self, records: Vec<BookingRecord>) -> Result<usize, EngineError> {
        self.ensure_ready()?;
        self.passengers.initialize(records);

        let passengers = &self.passengers;
        let removed = self.rooms.retain_occupants(|id| passengers.contains(id));
        if removed > 0 {
            warn!(
                "{} passengers of trip {} are no longer booked and were removed from their rooms",
                removed, self.trip_id
            );
        }

        self.after_mutation();
        Ok(removed)
    }

    // === Сохранение ===

    /// Первая половина сохранения: решает, нужен ли запрос, и если да -
    /// переводит сессию в `Saving` и отдаёт раскладку для отправки.
    pub fn begin_save(&mut self) -> SaveStart {
        match self.state {
            SyncState::Loading => return SaveStart::NotReady,
            SyncState::Saving { .. } => return SaveStart::AlreadySaving,
            SyncState::Synced | SyncState::Dirty => {}
        }

        let current = self.current_snapshot();
        if !is_dirty(&current, &self.baseline) {
            self.state = SyncState::Synced;
            return SaveStart::Clean;
        }

        let request_id = Uuid::new_v4();
        debug!("Trip {} save {} sends {}", self.trip_id, request_id, current.fingerprint());

        self.state = SyncState::Saving {
            request_id,
            sent: current,
            started_at: Utc::now(),
        };

        SaveStart::Send(SaveTicket {
            request_id,
            trip_id: self.trip_id.clone(),
            drafts: self.drafts(),
        })
    }

    /// Вторая половина сохранения: применяет ответ сервера.
    ///
    /// При успехе серверный ответ становится базовым снимком. Если за время
    /// запроса раскладку не трогали, реестр заменяется серверными номерами
    /// (временные id уступают настоящим, жильцы в исходном порядке). Если
    /// трогали - локальные номера остаются, и сессия остаётся «грязной»
    /// относительно нового базового снимка. При ошибке локальное состояние
    /// не меняется.
    pub fn finish_save(
        &mut self,
        request_id: Uuid,
        result: Result<Vec<StoredRoom>, SyncError>,
    ) -> Result<SaveReport, SyncError> {
        let sent = match &self.state {
            SyncState::Saving { request_id: in_flight, sent, .. } if *in_flight == request_id => sent.clone(),
            _ => {
                warn!("Ignoring stale save completion {} on trip {}", request_id, self.trip_id);
                return Err(SyncError::StaleCompletion(request_id));
            }
        };

        match result {
            Ok(stored) => {
                let server_rooms = normalize_stored_rooms(&self.passengers, stored);
                let baseline = Snapshot::compute(&server_rooms);
                let edited = self.current_snapshot() != sent;

                if edited {
                    info!("Trip {} was edited while saving, keeping local rooms", self.trip_id);
                } else {
                    self.rooms.replace(server_rooms);
                }

                self.baseline = baseline;
                self.last_synced_at = Some(Utc::now());
                self.last_save_error = None;
                self.load_notice = None;
                self.settle_state();

                let report = SaveReport {
                    rooms: self.baseline.len(),
                    reconciled: !edited,
                    dirty: self.is_dirty(),
                };
                info!(
                    "Trip {} saved: {} rooms, state {}",
                    self.trip_id,
                    report.rooms,
                    self.state.label()
                );
                Ok(report)
            }
            Err(e) => {
                error!("Saving layout of trip {} failed: {}", self.trip_id, e);
                self.last_save_error = Some(e.to_string());
                self.settle_state();
                Err(e)
            }
        }
    }

    // === Служебное ===

    fn ensure_ready(&self) -> Result<(), EngineError> {
        match self.state {
            SyncState::Loading => Err(EngineError::NotReady),
            _ => Ok(()),
        }
    }

    fn touch(&mut self) {
        self.touched_at = Utc::now();
    }

    pub fn mark_seen(&mut self) {
        self.touch();
    }

    fn after_mutation(&mut self) {
        self.touch();
        if !matches!(self.state, SyncState::Saving { .. }) {
            self.settle_state();
        }
    }

    fn settle_state(&mut self) {
        self.state = if self.is_dirty() {
            SyncState::Dirty
        } else {
            SyncState::Synced
        };
    }
}

/// Приводит номера с сервера к инвариантам движка.
///
/// Неизвестный класс - номер отбрасывается. Неизвестные пассажиры и повторы
/// (пассажир уже в предыдущем номере) отбрасываются. Жильцы сортируются по
/// `original_order`, всё сверх максимума класса возвращается в пул.
fn normalize_stored_rooms(pool: &PassengerPool, stored: Vec<StoredRoom>) -> Vec<Room> {
    let mut placed: HashSet<PassengerId> = HashSet::new();
    let mut rooms = Vec::with_capacity(stored.len());

    for StoredRoom { id, class, note, occupants } in stored {
        let class = match class.parse::<RoomClass>() {
            Ok(class) => class,
            Err(e) => {
                warn!("Dropping stored room {}: {}", id, e);
                continue;
            }
        };

        let mut kept: Vec<PassengerId> = occupants
            .into_iter()
            .filter(|passenger| {
                if !pool.contains(passenger) {
                    warn!("Stored room {} lists unknown passenger {}, dropped", id, passenger);
                    false
                } else if placed.contains(passenger) {
                    warn!("Passenger {} is listed in several stored rooms, keeping the first", passenger);
                    false
                } else {
                    true
                }
            })
            .collect();
        pool.sort_ids(&mut kept);
        kept.dedup();

        let max = class.capacity().max;
        if kept.len() > max {
            let overflow = kept.split_off(max);
            warn!(
                "Stored room {} ({}) is over capacity, {} passengers back to pool",
                id,
                class,
                overflow.len()
            );
        }

        placed.extend(kept.iter().cloned());
        rooms.push(Room {
            id: RoomId::Stored(id),
            class,
            note: note.filter(|n| !n.is_empty()),
            occupants: kept,
        });
    }

    rooms
}
