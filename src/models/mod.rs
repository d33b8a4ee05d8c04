pub mod passenger;
pub mod room;
pub mod layout;
pub mod view;

pub use passenger::{BookingRecord, Passenger, PassengerId};
pub use room::{Capacity, Occupancy, Room, RoomClass, RoomId};
pub use layout::{RoomDraft, StoredRoom};
pub use view::{RoomView, SessionView};

use serde::{Deserialize, Deserializer};

/// Идентификаторы внешних систем приходят то строкой, то числом.
/// Храним их одинаково - как непрозрачную строку.
pub(crate) fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Signed(n) => n.to_string(),
        RawId::Unsigned(n) => n.to_string(),
    })
}
