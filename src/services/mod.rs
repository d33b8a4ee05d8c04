pub mod sync;

pub use sync::{SaveOutcome, SharedSession, SyncCoordinator};
