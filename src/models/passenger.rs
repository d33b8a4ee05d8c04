use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::opaque_id;

/// Непрозрачный идентификатор пассажира из системы бронирований.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PassengerId(String);

impl PassengerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PassengerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PassengerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PassengerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for PassengerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        opaque_id(deserializer).map(PassengerId)
    }
}

/// Запись из системы бронирований. Копируется как есть, движок её не проверяет.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: PassengerId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Прочие атрибуты бронирования (место посадки, коды и т.п.).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BookingRecord {
    pub fn new(id: impl Into<PassengerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            phone: None,
            origin: None,
            reference: None,
            status: None,
            extra: Map::new(),
        }
    }
}

/// Пассажир поездки. `original_order` назначается один раз и больше не меняется:
/// это единственный ключ сортировки при отображении и сериализации.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Passenger {
    pub original_order: usize,
    #[serde(flatten)]
    pub record: BookingRecord,
}

impl Passenger {
    pub fn id(&self) -> &PassengerId {
        &self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }
}
