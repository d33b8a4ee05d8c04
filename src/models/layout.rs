use serde::{Deserialize, Serialize};

use super::{opaque_id, PassengerId, RoomClass};

/// Номер в том виде, в каком его хранит и возвращает сервер раскладки.
///
/// Класс оставлен строкой: неизвестные классы отбрасываются при нормализации,
/// а не роняют всю загрузку.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRoom {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub class: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub occupants: Vec<PassengerId>,
}

/// Желаемый номер в запросе на полную замену раскладки. Без id: их выдаёт сервер.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDraft {
    pub class: RoomClass,
    pub note: Option<String>,
    pub occupants: Vec<PassengerId>,
}
