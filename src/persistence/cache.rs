use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::store::SharedStore;
use crate::error::{StorageError, StorageResult};
use crate::log;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedScrollPosition {
    pub x: f64,
    pub y: f64,
}

impl SavedScrollPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Route key for a path: everything before the fragment.
pub fn route_key(path: &str) -> &str {
    path.split('#').next().unwrap_or(path)
}

type PositionMap = BTreeMap<String, SavedScrollPosition>;

/// One saved position per route, stored as a single JSON map.
///
/// Every write is one `SessionStore::update` of the whole map, so caches
/// sharing a store (clones or separately constructed) never lose each other's
/// routes, and writers for the same route are last-write-wins.
#[derive(Clone)]
pub struct PositionCache {
    store: SharedStore,
    key: String,
}

impl std::fmt::Debug for PositionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionCache").field("key", &self.key).finish()
    }
}

impl PositionCache {
    pub fn new(store: SharedStore, namespace: &str) -> Self {
        Self {
            store,
            key: format!("{}:scroll-positions", namespace),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    fn read_map(&self) -> StorageResult<PositionMap> {
        match self.store.get(&self.key)? {
            None => Ok(PositionMap::new()),
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| StorageError::Corrupt(self.key.clone(), e)),
        }
    }

    fn update<F>(&self, apply: F) -> StorageResult<()>
    where
        F: FnOnce(&mut PositionMap),
    {
        let mut apply = Some(apply);
        self.store.update(&self.key, &mut |current| {
            let mut map = match current {
                None => PositionMap::new(),
                Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                    log::warn(&format!(
                        "Discarding corrupt positions under '{}': {}",
                        self.key, err
                    ));
                    PositionMap::new()
                }),
            };
            if let Some(apply) = apply.take() {
                apply(&mut map);
            }
            serde_json::to_string(&map).map_err(StorageError::Encode)
        })
    }

    pub fn save(&self, route: &str, position: SavedScrollPosition) -> StorageResult<()> {
        let route = route_key(route).to_string();
        self.update(|map| {
            map.insert(route, position);
        })
    }

    pub fn load(&self, route: &str) -> StorageResult<Option<SavedScrollPosition>> {
        Ok(self.read_map()?.get(route_key(route)).copied())
    }

    pub fn remove(&self, route: &str) -> StorageResult<()> {
        let route = route_key(route);
        self.update(|map| {
            map.remove(route);
        })
    }

    pub fn clear_all(&self) -> StorageResult<()> {
        self.store.remove(&self.key)
    }

    pub fn routes(&self) -> StorageResult<Vec<String>> {
        Ok(self.read_map()?.into_keys().collect())
    }
}
