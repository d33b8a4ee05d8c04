use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::registry::RoomRegistry;
use crate::models::{BookingRecord, Passenger, PassengerId};

/// Все пассажиры поездки со стабильным исходным порядком.
///
/// Кто из них «в пуле», не хранится: это вычисляется из реестра номеров
/// в `unassigned`, чтобы два источника правды не могли разойтись.
#[derive(Debug, Default, Clone)]
pub struct PassengerPool {
    /// Всегда отсортированы по `original_order`.
    passengers: Vec<Passenger>,
    index: HashMap<PassengerId, usize>,
    /// Порядок запоминается и для тех, кто пропал из списка бронирований,
    /// чтобы при возвращении пассажир встал на прежнее место.
    known_orders: HashMap<PassengerId, usize>,
    next_order: usize,
}

impl PassengerPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<BookingRecord>) -> Self {
        let mut pool = Self::new();
        pool.initialize(records);
        pool
    }

    /// Строит список пассажиров из записей бронирований.
    ///
    /// Повторный вызов сохраняет `original_order` уже известных id, новые id
    /// добавляются в конец в порядке входного списка. Дубликаты id игнорируются.
    pub fn initialize(&mut self, records: Vec<BookingRecord>) {
        let mut passengers = Vec::with_capacity(records.len());
        let mut seen = HashSet::with_capacity(records.len());
        let next_order = &mut self.next_order;

        for record in records {
            if !seen.insert(record.id.clone()) {
                debug!("Duplicate booking record for passenger {} ignored", record.id);
                continue;
            }

            let original_order = *self
                .known_orders
                .entry(record.id.clone())
                .or_insert_with(|| {
                    let order = *next_order;
                    *next_order += 1;
                    order
                });

            passengers.push(Passenger { original_order, record });
        }

        passengers.sort_by_key(|p| p.original_order);
        self.index = passengers
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id().clone(), i))
            .collect();
        self.passengers = passengers;
    }

    pub fn len(&self) -> usize {
        self.passengers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passengers.is_empty()
    }

    pub fn contains(&self, id: &PassengerId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &PassengerId) -> Option<&Passenger> {
        self.index.get(id).map(|&i| &self.passengers[i])
    }

    /// Все пассажиры в исходном порядке.
    pub fn iter(&self) -> impl Iterator<Item = &Passenger> {
        self.passengers.iter()
    }

    pub fn order_of(&self, id: &PassengerId) -> Option<usize> {
        self.get(id).map(|p| p.original_order)
    }

    /// Сортирует id по `original_order`; неизвестные id уходят в конец.
    pub fn sort_ids(&self, ids: &mut [PassengerId]) {
        ids.sort_by_key(|id| self.order_of(id).unwrap_or(usize::MAX));
    }

    /// Пассажиры, которых нет ни в одном номере, в исходном порядке.
    pub fn unassigned(&self, rooms: &RoomRegistry) -> Vec<&Passenger> {
        let assigned: HashSet<&PassengerId> = rooms
            .iter()
            .flat_map(|room| room.occupants.iter())
            .collect();

        self.passengers
            .iter()
            .filter(|p| !assigned.contains(p.id()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoomClass;

    fn records(ids: &[&str]) -> Vec<BookingRecord> {
        ids.iter()
            .map(|id| BookingRecord::new(*id, format!("Passenger {}", id)))
            .collect()
    }

    fn ids(passengers: &[&Passenger]) -> Vec<String> {
        passengers.iter().map(|p| p.id().to_string()).collect()
    }

    #[test]
    fn initialize_assigns_order_by_position() {
        let pool = PassengerPool::from_records(records(&["c", "a", "b"]));

        assert_eq!(pool.order_of(&"c".into()), Some(0));
        assert_eq!(pool.order_of(&"a".into()), Some(1));
        assert_eq!(pool.order_of(&"b".into()), Some(2));
    }

    #[test]
    fn reinitialize_keeps_known_orders_and_appends_newcomers() {
        let mut pool = PassengerPool::from_records(records(&["a", "b", "c"]));

        // "b" пропал, "d" новый, порядок входа перемешан
        pool.initialize(records(&["d", "c", "a"]));

        assert_eq!(pool.len(), 3);
        assert_eq!(pool.order_of(&"a".into()), Some(0));
        assert_eq!(pool.order_of(&"c".into()), Some(2));
        assert_eq!(pool.order_of(&"d".into()), Some(3));
        let all: Vec<_> = pool.iter().collect();
        assert_eq!(ids(&all), vec!["a", "c", "d"]);

        // "b" вернулся - прежнее место
        pool.initialize(records(&["b", "d", "c", "a"]));
        assert_eq!(pool.order_of(&"b".into()), Some(1));
    }

    #[test]
    fn duplicate_records_are_ignored() {
        let pool = PassengerPool::from_records(records(&["a", "a", "b"]));
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.order_of(&"b".into()), Some(1));
    }

    #[test]
    fn unassigned_excludes_room_occupants_and_keeps_order() {
        let pool = PassengerPool::from_records(records(&["a", "b", "c", "d"]));
        let mut rooms = RoomRegistry::new();
        let room = rooms.create_room(RoomClass::Doppia, None);
        rooms.get_mut(&room).unwrap().occupants = vec!["c".into(), "a".into()];

        assert_eq!(ids(&pool.unassigned(&rooms)), vec!["b", "d"]);
    }

    #[test]
    fn sort_ids_uses_original_order() {
        let pool = PassengerPool::from_records(records(&["a", "b", "c"]));
        let mut list: Vec<PassengerId> = vec!["c".into(), "zz".into(), "a".into()];
        pool.sort_ids(&mut list);
        assert_eq!(list, vec!["a".into(), "c".into(), PassengerId::from("zz")]);
    }
}
