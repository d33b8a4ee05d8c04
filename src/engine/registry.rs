use crate::error::EngineError;
use crate::models::{PassengerId, Room, RoomClass, RoomId};

/// Номера, созданные для поездки, в порядке создания.
#[derive(Debug, Default, Clone)]
pub struct RoomRegistry {
    rooms: Vec<Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rooms(rooms: Vec<Room>) -> Self {
        Self { rooms }
    }

    /// Добавляет пустой номер с временным id. Пустой номер всегда помещается.
    pub fn create_room(&mut self, class: RoomClass, note: Option<String>) -> RoomId {
        let room = Room::provisional(class, note.and_then(normalize_note));
        let id = room.id.clone();
        self.rooms.push(room);
        id
    }

    /// Удаляет номер. Его жильцы не теряются: пул вычисляется из реестра,
    /// поэтому они сразу оказываются среди нерасселённых.
    pub fn delete_room(&mut self, id: &RoomId) -> Result<Room, EngineError> {
        let index = self
            .position(id)
            .ok_or_else(|| EngineError::RoomNotFound(id.clone()))?;
        Ok(self.rooms.remove(index))
    }

    /// Заменяет заметку. Пустая строка снимает заметку.
    pub fn set_note(&mut self, id: &RoomId, text: impl Into<String>) -> Result<(), EngineError> {
        let room = self
            .get_mut(id)
            .ok_or_else(|| EngineError::RoomNotFound(id.clone()))?;
        room.note = normalize_note(text.into());
        Ok(())
    }

    pub fn get(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.iter().find(|room| &room.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &RoomId) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|room| &room.id == id)
    }

    pub(super) fn position(&self, id: &RoomId) -> Option<usize> {
        self.rooms.iter().position(|room| &room.id == id)
    }

    pub(super) fn room_at(&self, index: usize) -> &Room {
        &self.rooms[index]
    }

    pub(super) fn room_at_mut(&mut self, index: usize) -> &mut Room {
        &mut self.rooms[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.iter()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Номер, в котором сейчас живёт пассажир.
    pub fn room_of(&self, passenger: &PassengerId) -> Option<&Room> {
        self.rooms.iter().find(|room| room.contains(passenger))
    }

    pub fn assigned_count(&self) -> usize {
        self.rooms.iter().map(|room| room.occupants.len()).sum()
    }

    /// Убирает жильцов, для которых `keep` вернул false. Возвращает сколько убрано.
    pub(crate) fn retain_occupants<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&PassengerId) -> bool,
    {
        let mut removed = 0;
        for room in &mut self.rooms {
            let before = room.occupants.len();
            room.occupants.retain(|id| keep(id));
            removed += before - room.occupants.len();
        }
        removed
    }

    pub(crate) fn replace(&mut self, rooms: Vec<Room>) {
        self.rooms = rooms;
    }
}

fn normalize_note(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
