use serde::Serialize;

use crate::models::{PassengerId, Room};

/// Каноническая запись одного номера: класс, отсортированные жильцы, заметка.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SnapshotRoom {
    pub class: &'static str,
    pub occupants: Vec<PassengerId>,
    pub note: String,
}

/// Каноническая форма раскладки для сравнения.
///
/// Не зависит ни от id номеров, ни от порядка номеров и жильцов: после
/// сохранения сервер выдаёт новые id и может переставить номера, и это не
/// должно выглядеть как несохранённое изменение.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    rooms: Vec<SnapshotRoom>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn compute<'a, I>(rooms: I) -> Self
    where
        I: IntoIterator<Item = &'a Room>,
    {
        let mut rooms: Vec<SnapshotRoom> = rooms
            .into_iter()
            .map(|room| {
                let mut occupants = room.occupants.clone();
                occupants.sort();
                SnapshotRoom {
                    class: room.class.as_str(),
                    occupants,
                    note: room.note.clone().unwrap_or_default(),
                }
            })
            .collect();
        // класс, затем состав, затем заметка - порядок полей SnapshotRoom
        rooms.sort();

        Self { rooms }
    }

    pub fn rooms(&self) -> &[SnapshotRoom] {
        &self.rooms
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Строковая форма снимка, для логов.
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Есть ли несохранённые изменения относительно базового снимка.
pub fn is_dirty(current: &Snapshot, baseline: &Snapshot) -> bool {
    current != baseline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RoomClass, RoomId};

    fn room(id: &str, class: RoomClass, occupants: &[&str], note: Option<&str>) -> Room {
        Room {
            id: id.parse().unwrap(),
            class,
            note: note.map(str::to_string),
            occupants: occupants.iter().map(|p| PassengerId::from(*p)).collect(),
        }
    }

    #[test]
    fn snapshot_ignores_room_ids_and_ordering() {
        let local = vec![
            room(&RoomId::provisional().to_string(), RoomClass::Tripla, &["c", "a", "b"], None),
            room(&RoomId::provisional().to_string(), RoomClass::Doppia, &["e", "d"], Some("culla")),
        ];
        let server = vec![
            room("77", RoomClass::Doppia, &["d", "e"], Some("culla")),
            room("78", RoomClass::Tripla, &["b", "a", "c"], None),
        ];

        let local = Snapshot::compute(&local);
        let server = Snapshot::compute(&server);
        assert!(!is_dirty(&local, &server));
        assert_eq!(local.fingerprint(), server.fingerprint());
    }

    #[test]
    fn snapshot_sees_note_and_membership_changes() {
        let base = Snapshot::compute(&[room("1", RoomClass::Doppia, &["a", "b"], None)]);

        let noted = Snapshot::compute(&[room("1", RoomClass::Doppia, &["a", "b"], Some("piano terra"))]);
        assert!(is_dirty(&noted, &base));

        let swapped = Snapshot::compute(&[room("1", RoomClass::Doppia, &["a", "c"], None)]);
        assert!(is_dirty(&swapped, &base));
    }

    #[test]
    fn missing_note_equals_empty_note() {
        let none = Snapshot::compute(&[room("1", RoomClass::Singola, &["a"], None)]);
        let empty = Snapshot::compute(&[room("1", RoomClass::Singola, &["a"], Some(""))]);
        assert!(!is_dirty(&none, &empty));
    }

    #[test]
    fn snapshot_is_never_dirty_against_itself() {
        let snapshot = Snapshot::compute(&[room("9", RoomClass::Quadrupla, &["x", "y", "z"], None)]);
        assert!(!is_dirty(&snapshot, &snapshot));
        assert!(!is_dirty(&Snapshot::empty(), &Snapshot::compute(std::iter::empty::<&Room>())));
    }
}
