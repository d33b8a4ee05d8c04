use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use super::pool::PassengerPool;
use super::registry::RoomRegistry;
use crate::error::EngineError;
use crate::models::{PassengerId, RoomId};

/// Откуда или куда перемещается пассажир: пул нерасселённых или конкретный номер.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    Pool,
    Room(RoomId),
}

const POOL: &str = "pool";

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Pool => f.write_str(POOL),
            Location::Room(id) => write!(f, "room {}", id),
        }
    }
}

impl FromStr for Location {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case(POOL) {
            return Ok(Location::Pool);
        }
        s.parse().map(Location::Room)
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Location::Pool => serializer.serialize_str(POOL),
            Location::Room(id) => id.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RoomId::deserialize(deserializer)? {
            RoomId::Stored(raw) if raw.eq_ignore_ascii_case(POOL) => Ok(Location::Pool),
            id => Ok(Location::Room(id)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOutcome {
    Moved,
    /// Источник и назначение совпадают.
    Unchanged,
}

/// Перемещает пассажира из `from` в `to` одной атомарной операцией.
///
/// Все проверки выполняются до первой мутации: при отказе (нет места,
/// пассажира нет в источнике, номер не найден) ни источник, ни назначение
/// не меняются. После успешного перемещения пассажир находится не более чем
/// в одном номере.
pub fn move_passenger(
    pool: &PassengerPool,
    rooms: &mut RoomRegistry,
    passenger: &PassengerId,
    from: &Location,
    to: &Location,
) -> Result<MoveOutcome, EngineError> {
    if !pool.contains(passenger) {
        return Err(EngineError::UnknownPassenger(passenger.clone()));
    }

    let not_in_source = || EngineError::NotInSource {
        passenger: passenger.clone(),
        from: from.clone(),
    };

    let source = match from {
        Location::Pool => {
            if rooms.room_of(passenger).is_some() {
                return Err(not_in_source());
            }
            None
        }
        Location::Room(id) => {
            let index = rooms
                .position(id)
                .ok_or_else(|| EngineError::RoomNotFound(id.clone()))?;
            if !rooms.room_at(index).contains(passenger) {
                return Err(not_in_source());
            }
            Some(index)
        }
    };

    let destination = match to {
        Location::Pool => None,
        Location::Room(id) => Some(
            rooms
                .position(id)
                .ok_or_else(|| EngineError::RoomNotFound(id.clone()))?,
        ),
    };

    if source == destination {
        return Ok(MoveOutcome::Unchanged);
    }

    if let Some(index) = destination {
        let room = rooms.room_at(index);
        if room.is_full() {
            return Err(EngineError::RoomFull {
                room: room.id.clone(),
                class: room.class,
                max: room.capacity().max,
            });
        }
    }

    if let Some(index) = source {
        rooms.room_at_mut(index).occupants.retain(|id| id != passenger);
    }
    if let Some(index) = destination {
        rooms.room_at_mut(index).occupants.push(passenger.clone());
    }

    Ok(MoveOutcome::Moved)
}
