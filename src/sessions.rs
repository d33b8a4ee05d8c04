use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::engine::{RoomingSession, SyncState, TripId};
use crate::error::SyncError;
use crate::services::{SharedSession, SyncCoordinator};

/// Открытые сессии расселения процесса, по одной на поездку.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<TripId, SharedSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Открывает сессию поездки. Повторное открытие возвращает уже открытую.
    ///
    /// Сессия регистрируется в состоянии `Loading` до загрузки, так что
    /// параллельное открытие той же поездки не запускает вторую загрузку.
    /// Если загрузить пассажиров не удалось, сессия убирается, даже когда
    /// вызывающий уже не ждёт ответа.
    pub async fn open(&self, trip_id: &str, sync: &SyncCoordinator) -> Result<SharedSession, SyncError> {
        let session = {
            let mut sessions = self.sessions.write().await;
            if let Some(existing) = sessions.get(trip_id) {
                return Ok(existing.clone());
            }
            let session = Arc::new(Mutex::new(RoomingSession::opening(trip_id)));
            sessions.insert(trip_id.to_string(), session.clone());
            session
        };

        let sessions = self.sessions.clone();
        let sync = sync.clone();
        let loading = session.clone();
        let trip_id = trip_id.to_string();

        tokio::spawn(async move {
            let result = sync.load(&loading).await;
            if let Err(e) = &result {
                error!("Failed to open rooming session for trip {}: {}", trip_id, e);
                let mut sessions = sessions.write().await;
                if sessions.get(&trip_id).is_some_and(|s| Arc::ptr_eq(s, &loading)) {
                    sessions.remove(&trip_id);
                }
            }
            result
        })
        .await??;

        Ok(session)
    }

    pub async fn get(&self, trip_id: &str) -> Option<SharedSession> {
        self.sessions.read().await.get(trip_id).cloned()
    }

    /// Закрывает сессию. Несохранённые изменения теряются.
    pub async fn close(&self, trip_id: &str) -> Option<SharedSession> {
        let removed = self.sessions.write().await.remove(trip_id)?;
        if removed.lock().await.is_dirty() {
            warn!("Rooming session for trip {} closed with unsaved changes", trip_id);
        } else {
            info!("Rooming session for trip {} closed", trip_id);
        }
        Some(removed)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Выбрасывает синхронизированные сессии, которых не трогали дольше `ttl`,
    /// и так и не загрузившиеся. Несохранённые и сохраняющиеся остаются.
    /// Сессии, которые кто-то держит прямо сейчас, пропускаются.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let cutoff = Utc::now() - ttl;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|trip_id, session| {
            if Arc::strong_count(session) > 1 {
                return true;
            }
            let Ok(session) = session.try_lock() else {
                return true;
            };
            if session.touched_at() >= cutoff {
                return true;
            }
            match session.state() {
                SyncState::Synced => {
                    info!("Evicting idle rooming session for trip {}", trip_id);
                    false
                }
                SyncState::Loading => {
                    warn!(
                        "Rooming session for trip {} stuck loading since {}, evicting it",
                        trip_id,
                        session.touched_at()
                    );
                    false
                }
                state => {
                    warn!(
                        "Rooming session for trip {} is idle since {} but {}, keeping it",
                        trip_id,
                        session.touched_at(),
                        state.label()
                    );
                    true
                }
            }
        });

        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingRecord;

    async fn insert_loaded(registry: &SessionRegistry, trip_id: &str) -> SharedSession {
        let mut session = RoomingSession::opening(trip_id);
        session.finish_load(vec![BookingRecord::new("p1", "Anna")], Ok(None));
        let shared = Arc::new(Mutex::new(session));
        registry
            .sessions
            .write()
            .await
            .insert(trip_id.to_string(), shared.clone());
        shared
    }

    #[tokio::test]
    async fn eviction_keeps_dirty_sessions() {
        let registry = SessionRegistry::new();
        insert_loaded(&registry, "clean").await;
        let dirty = insert_loaded(&registry, "dirty").await;
        dirty
            .lock()
            .await
            .create_room(crate::models::RoomClass::Singola, None)
            .unwrap();

        let evicted = registry.evict_idle(Duration::zero() - Duration::seconds(1)).await;

        assert_eq!(evicted, 1);
        assert!(registry.get("clean").await.is_none());
        assert!(registry.get("dirty").await.is_some());
    }

    #[tokio::test]
    async fn stale_loading_sessions_are_evicted() {
        let registry = SessionRegistry::new();
        registry
            .sessions
            .write()
            .await
            .insert("stuck".to_string(), Arc::new(Mutex::new(RoomingSession::opening("stuck"))));

        assert_eq!(registry.evict_idle(Duration::minutes(30)).await, 0);
        assert_eq!(registry.evict_idle(Duration::zero() - Duration::seconds(1)).await, 1);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn sessions_in_use_by_a_request_are_not_evicted() {
        let registry = SessionRegistry::new();
        insert_loaded(&registry, "trip").await;

        let in_use = registry.get("trip").await.unwrap();
        assert_eq!(registry.evict_idle(Duration::zero() - Duration::seconds(1)).await, 0);
        assert!(registry.get("trip").await.is_some());

        drop(in_use);
        assert_eq!(registry.evict_idle(Duration::zero() - Duration::seconds(1)).await, 1);
    }

    #[tokio::test]
    async fn recently_touched_sessions_survive() {
        let registry = SessionRegistry::new();
        insert_loaded(&registry, "trip").await;

        assert_eq!(registry.evict_idle(Duration::minutes(30)).await, 0);
        assert_eq!(registry.len().await, 1);

        assert!(registry.close("trip").await.is_some());
        assert!(registry.is_empty().await);
    }
}
