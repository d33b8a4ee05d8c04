//! Движок расселения: всё, что происходит в памяти одной сессии.
//!
//! Модули здесь синхронные. Сеть живёт в `services::sync`, который
//! вызывает `RoomingSession::begin_save` / `finish_save` вокруг запроса.

pub mod pool;
pub mod registry;
pub mod assignment;
pub mod snapshot;
pub mod session;

pub use assignment::{Location, MoveOutcome};
pub use pool::PassengerPool;
pub use registry::RoomRegistry;
pub use session::{RoomingSession, SaveReport, SaveStart, SaveTicket, SyncState, TripId};
pub use snapshot::{is_dirty, Snapshot};
