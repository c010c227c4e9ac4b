use dashmap::DashMap;
use tracing::{debug, info};

use crate::{db::{RoomEntry, Store}, AppResult};

/// In-memory view of the registered rooms, shared by every request.
///
/// The store stays the source of truth. [`RoomRegistry::refresh`] merges its rows into the map
/// one key at a time, so readers see either the old or the new entry for a key and never a
/// half-loaded map. Entries removed from the store stay visible until the process restarts.
pub struct RoomRegistry {
    rooms: DashMap<String, RoomEntry>,
    store: Option<Store>,
}

impl RoomRegistry {
    pub fn new(store: Option<Store>) -> Self {
        Self {
            rooms: DashMap::new(),
            store,
        }
    }

    pub fn get(&self, key: &str) -> Option<RoomEntry> {
        self.rooms.get(key).map(|entry| entry.value().clone())
    }

    pub fn put(&self, entry: RoomEntry) {
        debug!(key = %entry.key, url = %entry.url, "room mapped");
        self.rooms.insert(entry.key.clone(), entry);
    }

    /// Display name for a key, if the key is registered.
    pub fn name_of(&self, key: &str) -> Option<String> {
        self.rooms.get(key).map(|entry| entry.name.clone())
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn store(&self) -> Option<&Store> {
        self.store.as_ref()
    }

    /// Reloads every room from the store. A no-op without a store.
    pub async fn refresh(&self) -> AppResult<usize> {
        let Some(store) = &self.store else {
            return Ok(0);
        };

        let rooms = store.query_rooms().await?;
        let count = rooms.len();
        for entry in rooms {
            self.rooms.insert(entry.key.clone(), entry);
        }

        info!(count, cached = self.rooms.len(), "room registry refreshed");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use super::*;

    #[test]
    fn put_then_get() {
        let registry = RoomRegistry::new(None);
        assert!(registry.get("ops").is_none());

        let entry = RoomEntry::new("ops", "Ops", "http://ops");
        registry.put(entry.clone());
        assert_eq!(registry.get("ops"), Some(entry));
        assert!(registry.get("OPS").is_none());

        registry.put(RoomEntry::new("ops", "Ops 2", "http://ops2"));
        assert_eq!(registry.get("ops").unwrap().url, "http://ops2");
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn refresh_without_store_is_noop() {
        let registry = RoomRegistry::new(None);
        registry.put(RoomEntry::new("ops", "Ops", "http://ops"));
        assert_eq!(registry.refresh().await.unwrap(), 0);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn refresh_merges_and_never_removes() {
        let store = Store::memory().await.unwrap();
        store.upsert_room(&RoomEntry::new("ops", "Ops", "http://ops"), "ub", "r1").await.unwrap();

        let registry = RoomRegistry::new(Some(store.clone()));
        registry.put(RoomEntry::new("stale", "Gone", "http://gone"));
        registry.put(RoomEntry::new("ops", "Old", "http://old"));

        assert_eq!(registry.refresh().await.unwrap(), 1);
        assert_eq!(registry.get("ops"), Some(RoomEntry::new("ops", "Ops", "http://ops")));
        assert!(registry.get("stale").is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn readers_during_refresh_see_whole_entries() {
        let store = Store::memory().await.unwrap();
        for i in 0..50 {
            let key = format!("room{i}");
            let entry = RoomEntry::new(&key, &key, format!("http://{key}"));
            store.upsert_room(&entry, "ub", &key).await.unwrap();
        }

        let registry = Arc::new(RoomRegistry::new(Some(store)));
        let done = Arc::new(AtomicBool::new(false));
        let reader = {
            let registry = registry.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    for i in 0..50 {
                        if let Some(entry) = registry.get(&format!("room{i}")) {
                            assert_eq!(entry.url, format!("http://{}", entry.key));
                        }
                    }
                }
            })
        };

        for _ in 0..20 {
            registry.refresh().await.unwrap();
        }
        done.store(true, Ordering::Release);

        reader.join().unwrap();
        assert_eq!(registry.len(), 50);
    }
}
