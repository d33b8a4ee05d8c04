use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{opaque_id, PassengerId};
use crate::error::UnknownRoomClass;

/// Класс номера. Названия - как в прайсах агентства.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomClass {
    Singola,
    Doppia,
    Matrimoniale,
    Tripla,
    Quadrupla,
}

/// Допустимое заполнение номера, границы включительно.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capacity {
    pub min: usize,
    pub max: usize,
}

/// Информационный флаг заполненности. Сохранение он не блокирует.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupancy {
    Empty,
    UnderFilled,
    Ok,
    Full,
}

impl Capacity {
    pub fn classify(&self, occupants: usize) -> Occupancy {
        if occupants == 0 {
            Occupancy::Empty
        } else if occupants < self.min {
            Occupancy::UnderFilled
        } else if occupants < self.max {
            Occupancy::Ok
        } else {
            Occupancy::Full
        }
    }
}

impl RoomClass {
    pub const ALL: [RoomClass; 5] = [
        RoomClass::Singola,
        RoomClass::Doppia,
        RoomClass::Matrimoniale,
        RoomClass::Tripla,
        RoomClass::Quadrupla,
    ];

    /// Таблица вместимости.
    pub const fn capacity(self) -> Capacity {
        match self {
            RoomClass::Singola => Capacity { min: 1, max: 1 },
            RoomClass::Doppia => Capacity { min: 2, max: 2 },
            RoomClass::Matrimoniale => Capacity { min: 2, max: 2 },
            RoomClass::Tripla => Capacity { min: 3, max: 3 },
            RoomClass::Quadrupla => Capacity { min: 3, max: 4 },
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            RoomClass::Singola => "Singola",
            RoomClass::Doppia => "Doppia",
            RoomClass::Matrimoniale => "Matrimoniale",
            RoomClass::Tripla => "Tripla",
            RoomClass::Quadrupla => "Quadrupla",
        }
    }
}

impl fmt::Display for RoomClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomClass {
    type Err = UnknownRoomClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "singola" | "single" => Ok(RoomClass::Singola),
            "doppia" | "double" => Ok(RoomClass::Doppia),
            "matrimoniale" => Ok(RoomClass::Matrimoniale),
            "tripla" | "triple" => Ok(RoomClass::Tripla),
            "quadrupla" | "quadruple" => Ok(RoomClass::Quadrupla),
            _ => Err(UnknownRoomClass(s.to_string())),
        }
    }
}

/// Идентификатор номера: временный (до первого сохранения) или выданный сервером.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoomId {
    Provisional(Uuid),
    Stored(String),
}

const PROVISIONAL_PREFIX: &str = "tmp-";

impl RoomId {
    pub fn provisional() -> Self {
        RoomId::Provisional(Uuid::new_v4())
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, RoomId::Provisional(_))
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomId::Provisional(uuid) => write!(f, "{}{}", PROVISIONAL_PREFIX, uuid),
            RoomId::Stored(id) => f.write_str(id),
        }
    }
}

impl FromStr for RoomId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let provisional = s
            .strip_prefix(PROVISIONAL_PREFIX)
            .and_then(|rest| Uuid::parse_str(rest).ok());

        Ok(match provisional {
            Some(uuid) => RoomId::Provisional(uuid),
            None => RoomId::Stored(s.to_string()),
        })
    }
}

impl From<String> for RoomId {
    fn from(raw: String) -> Self {
        raw.parse().unwrap_or_else(|never: Infallible| match never {})
    }
}

impl Serialize for RoomId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RoomId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        opaque_id(deserializer).map(RoomId::from)
    }
}

/// Номер в реестре сессии.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub class: RoomClass,
    pub note: Option<String>,
    /// Порядок вставки; при отображении сортируется по `original_order`.
    pub occupants: Vec<PassengerId>,
}

impl Room {
    pub fn provisional(class: RoomClass, note: Option<String>) -> Self {
        Self {
            id: RoomId::provisional(),
            class,
            note,
            occupants: Vec::new(),
        }
    }

    pub fn capacity(&self) -> Capacity {
        self.class.capacity()
    }

    pub fn is_full(&self) -> bool {
        self.occupants.len() >= self.capacity().max
    }

    pub fn contains(&self, passenger: &PassengerId) -> bool {
        self.occupants.contains(passenger)
    }

    pub fn occupancy(&self) -> Occupancy {
        self.capacity().classify(self.occupants.len())
    }
}
