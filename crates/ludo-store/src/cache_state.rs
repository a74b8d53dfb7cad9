use crate::error::StoreError;
use crate::event::GameEvent;
use crate::records::RoomStatePatch;
use crate::repository::Repository;
use ludo_cache::Cache;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

struct RoomSlot<S> {
    state: S,
    revision: u64,
    dirty: bool,
}

/// In-process authoritative runtime state, one [`tokio::sync::Mutex`] slot
/// per room providing the strict-FIFO `runExclusive` guarantee of §5 (a
/// single outstanding task per room; unrelated rooms never block each
/// other). `S` is the room coordinator's own game-board type: this crate
/// never inspects it beyond serializing it for the durable flush.
pub struct GameStateCache<S, R> {
    rooms: RwLock<HashMap<String, Arc<Mutex<RoomSlot<S>>>>>,
    shared_cache: Option<Arc<dyn Cache>>,
    store: Arc<R>,
    flush_interval: Duration,
    cache_ttl: Duration,
}

impl<S, R> GameStateCache<S, R>
where
    S: Clone + Send + Sync + serde::Serialize + for<'de> serde::Deserialize<'de> + 'static,
    R: Repository + Send + Sync + 'static,
{
    pub fn new(store: Arc<R>, shared_cache: Option<Arc<dyn Cache>>, flush_interval: Duration, cache_ttl: Duration) -> Self {
        Self { rooms: RwLock::new(HashMap::new()), shared_cache, store, flush_interval, cache_ttl }
    }

    /// Inserts a freshly created room's initial state into memory.
    pub async fn prime(&self, room_id: &str, state: S) {
        let slot = Arc::new(Mutex::new(RoomSlot { state, revision: 0, dirty: true }));
        self.rooms.write().await.insert(room_id.to_string(), slot);
    }

    async fn slot(&self, room_id: &str) -> Option<Arc<Mutex<RoomSlot<S>>>> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Read-only snapshot of the current in-memory state, for GET-style
    /// endpoints that don't need a `runExclusive` mutation.
    pub async fn snapshot(&self, room_id: &str) -> Option<S> {
        let slot = self.slot(room_id).await?;
        let guard = slot.lock().await;
        Some(guard.state.clone())
    }

    pub async fn contains(&self, room_id: &str) -> bool {
        self.rooms.read().await.contains_key(room_id)
    }

    pub async fn room_ids(&self) -> Vec<String> {
        self.rooms.read().await.keys().cloned().collect()
    }

    /// §5 `runExclusive`: serializes `task` against every other call for the
    /// same `room_id`. `task` reads/mutates the in-memory state and returns
    /// whatever the caller needs plus whether the mutation should be
    /// considered dirty (almost always `true`). `task` is async so that
    /// dependent shared-cache/engagement reporting can suspend *inside* the
    /// critical section (§5 "performed inside the critical section so the
    /// revision-stamped patch ... reflects all dependent mutations").
    pub async fn run_exclusive<T, F, Fut>(&self, room_id: &str, task: F) -> Result<(T, u64), StoreError>
    where
        F: FnOnce(&mut S, u64) -> Fut,
        Fut: std::future::Future<Output = (T, bool)>,
    {
        let slot = self.slot(room_id).await.ok_or_else(|| StoreError::RoomNotFound(room_id.to_string()))?;
        let mut guard = slot.lock().await;
        let (result, mutated) = task(&mut guard.state, guard.revision).await;
        if mutated {
            guard.revision += 1;
            guard.dirty = true;
        }
        let revision = guard.revision;
        Ok((result, revision))
    }

    pub async fn evict(&self, room_id: &str) {
        self.rooms.write().await.remove(room_id);
        if let Some(cache) = &self.shared_cache {
            let _ = cache.delete(&ludo_cache::keys::room_state(room_id)).await;
            let _ = cache.delete(&ludo_cache::keys::room_moves(room_id)).await;
        }
    }

    /// Mirrors the current state into the shared cache, if configured.
    /// Errors are logged and swallowed — the in-memory copy stays
    /// authoritative (§7 propagation policy).
    pub async fn mirror(&self, room_id: &str) {
        let Some(cache) = &self.shared_cache else { return };
        let Some(slot) = self.slot(room_id).await else { return };
        let guard = slot.lock().await;
        let snapshot = serde_json::json!({ "revision": guard.revision, "state": &guard.state });
        drop(guard);
        if let Err(err) = ludo_cache::CacheExt::set_json(cache.as_ref(), &ludo_cache::keys::room_state(room_id), &snapshot, Some(self.cache_ttl)).await {
            log::warn!("shared cache mirror write failed for room {room_id}: {err}");
        }
    }

    pub async fn append_move_log(&self, room_id: &str, entry: &str, max_items: usize, ttl: Duration) {
        let Some(cache) = &self.shared_cache else { return };
        if let Err(err) = cache.push_log(&ludo_cache::keys::room_moves(room_id), entry.to_string(), max_items, Some(ttl)).await {
            log::warn!("shared cache move log push failed for room {room_id}: {err}");
        }
    }

    pub async fn append_event(&self, event: GameEvent) {
        if let Err(err) = self.store.append_event(&event).await {
            log::warn!("event log append failed for room {}: {err}", event.room_id);
        }
    }

    /// Background flusher body (§4.5 "Flushing"): iterates every dirty room,
    /// composes a full-state replace, and clears the dirty flag. Runs on a
    /// `flush_interval`-period timer; call once more at shutdown to force a
    /// synchronous final flush.
    pub async fn flush_dirty(&self, to_patch: impl Fn(&S, u64) -> RoomStatePatch) {
        let room_ids: Vec<String> = self.rooms.read().await.keys().cloned().collect();
        for room_id in room_ids {
            let Some(slot) = self.slot(&room_id).await else { continue };
            let patch = {
                let mut guard = slot.lock().await;
                if !guard.dirty {
                    continue;
                }
                let patch = to_patch(&guard.state, guard.revision);
                guard.dirty = false;
                patch
            };
            if let Err(err) = self.store.upsert_room_state(&room_id, patch).await {
                log::warn!("durable flush failed for room {room_id}, will retry next tick: {err}");
                if let Some(slot) = self.slot(&room_id).await {
                    slot.lock().await.dirty = true;
                }
            }
        }
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    /// Graceful-shutdown hook: one final synchronous flush of
    /// every dirty room so a SIGTERM/SIGINT never loses the interval between
    /// the last tick and process exit. Same body as a periodic tick; kept as
    /// a distinctly named entry point so the signal handler's intent reads
    /// clearly at the call site.
    pub async fn shutdown(&self, to_patch: impl Fn(&S, u64) -> RoomStatePatch) {
        log::info!("flushing {} dirty room(s) before shutdown", self.rooms.read().await.len());
        self.flush_dirty(to_patch).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{RoomDocument, SeatDocument, TeamDocument, UserDocument};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Minimal in-memory `Repository` double: records every upsert and can
    /// be armed to fail the next one, for exercising `flush_dirty`'s retry
    /// path without a real MongoDB connection.
    #[derive(Default)]
    struct FakeStore {
        upserts: Mutex<Vec<(String, RoomStatePatch)>>,
        fail_next: AtomicBool,
    }

    impl Repository for FakeStore {
        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
        async fn upsert_room_state(&self, room_id: &str, patch: RoomStatePatch) -> Result<(), StoreError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(StoreError::RoomNotFound(room_id.to_string()));
            }
            self.upserts.lock().await.push((room_id.to_string(), patch));
            Ok(())
        }
        async fn get_room(&self, _room_id: &str) -> Result<Option<RoomDocument>, StoreError> {
            Ok(None)
        }
        async fn get_room_by_code(&self, _code: &str) -> Result<Option<RoomDocument>, StoreError> {
            Ok(None)
        }
        async fn list_public_waiting_rooms(&self) -> Result<Vec<RoomDocument>, StoreError> {
            Ok(Vec::new())
        }
        async fn create_room(&self, _room: &RoomDocument) -> Result<(), StoreError> {
            Ok(())
        }
        async fn delete_room(&self, _room_id: &str) -> Result<(), StoreError> {
            Ok(())
        }
        async fn update_room_host(&self, _room_id: &str, _host_seat_id: Option<&str>) -> Result<(), StoreError> {
            Ok(())
        }
        async fn upsert_seat(&self, _seat: &SeatDocument) -> Result<(), StoreError> {
            Ok(())
        }
        async fn get_seats(&self, _room_id: &str) -> Result<Vec<SeatDocument>, StoreError> {
            Ok(Vec::new())
        }
        async fn delete_seat(&self, _room_id: &str, _user_id: &str) -> Result<(), StoreError> {
            Ok(())
        }
        async fn upsert_team(&self, _team: &TeamDocument) -> Result<(), StoreError> {
            Ok(())
        }
        async fn get_teams(&self, _room_id: &str) -> Result<Vec<TeamDocument>, StoreError> {
            Ok(Vec::new())
        }
        async fn append_event(&self, _event: &GameEvent) -> Result<(), StoreError> {
            Ok(())
        }
        async fn recent_events(&self, _room_id: &str, _limit: i64) -> Result<Vec<GameEvent>, StoreError> {
            Ok(Vec::new())
        }
        async fn get_user(&self, _user_id: &str) -> Result<Option<UserDocument>, StoreError> {
            Ok(None)
        }
    }

    fn test_cache(store: FakeStore) -> GameStateCache<i32, FakeStore> {
        GameStateCache::new(Arc::new(store), None, Duration::from_secs(2), Duration::from_secs(60))
    }

    fn patch_of(state: &i32, _revision: u64) -> RoomStatePatch {
        RoomStatePatch { status: "waiting".into(), current_player_index: None, game_board: serde_json::json!(state) }
    }

    #[tokio::test]
    async fn run_exclusive_increments_revision_only_when_mutated() {
        let cache = test_cache(FakeStore::default());
        cache.prime("room-1", 0).await;

        let (_, revision) = cache.run_exclusive("room-1", |state, _rev| async move {
            *state += 1;
            ((), true)
        }).await.unwrap();
        assert_eq!(revision, 1);

        let (_, revision) = cache.run_exclusive("room-1", |_state, _rev| async move { ((), false) }).await.unwrap();
        assert_eq!(revision, 1, "a non-mutating task must not bump the revision");
    }

    #[tokio::test]
    async fn run_exclusive_on_unknown_room_errors() {
        let cache = test_cache(FakeStore::default());
        let result = cache.run_exclusive("missing", |state: &mut i32, _rev| async move {
            *state += 1;
            ((), true)
        }).await;
        assert!(matches!(result, Err(StoreError::RoomNotFound(room)) if room == "missing"));
    }

    /// §8: concurrent `runExclusive(r, ...)` submissions for the same room
    /// complete in submission order and never interleave.
    #[tokio::test]
    async fn concurrent_run_exclusive_calls_serialize_without_lost_updates() {
        let cache = Arc::new(test_cache(FakeStore::default()));
        cache.prime("room-1", 0).await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.run_exclusive("room-1", |state, _rev| async move {
                    *state += 1;
                    ((), true)
                }).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(cache.snapshot("room-1").await, Some(20));
    }

    #[tokio::test]
    async fn flush_dirty_writes_once_then_clears_the_dirty_flag() {
        let cache = test_cache(FakeStore::default());
        cache.prime("room-1", 7).await;

        cache.flush_dirty(patch_of).await;
        assert_eq!(cache.store.upserts.lock().await.len(), 1);

        // Nothing mutated the room since the first flush, so the second
        // tick must not re-issue the upsert.
        cache.flush_dirty(patch_of).await;
        assert_eq!(cache.store.upserts.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn flush_failure_re_marks_the_room_dirty_for_retry() {
        let store = FakeStore::default();
        store.fail_next.store(true, Ordering::SeqCst);
        let cache = test_cache(store);
        cache.prime("room-1", 1).await;

        cache.flush_dirty(patch_of).await;
        assert_eq!(cache.store.upserts.lock().await.len(), 0, "the failed write must not be recorded");

        cache.flush_dirty(patch_of).await;
        assert_eq!(cache.store.upserts.lock().await.len(), 1, "the retry tick picks the room back up");
    }

    #[tokio::test]
    async fn shutdown_force_flushes_dirty_rooms() {
        let cache = test_cache(FakeStore::default());
        cache.prime("room-1", 3).await;
        cache.shutdown(patch_of).await;
        assert_eq!(cache.store.upserts.lock().await.len(), 1);
    }
}
