//! In-memory cache for everything the provider resolved during the session.
//!
//! Nothing is persisted. Beatmap sets are kept by id and additionally
//! indexed per difficulty, so a difficulty switch can be resolved without a
//! network round trip.

use crate::difficulty::DeepDifficultyData;
use crate::models::{BeatmapId, CachedDiffEntry, MapsetData, MapsetId};
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct ProviderCache {
    mapsets: HashMap<MapsetId, Rc<MapsetData>>,
    diffs: HashMap<BeatmapId, CachedDiffEntry>,
    deep: HashMap<BeatmapId, DeepDifficultyData>,
    /// Limit on cached sets and on deep entries (to prevent unbounded growth)
    max_size: usize,
}

impl Default for ProviderCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderCache {
    pub fn new() -> Self {
        Self::with_max_size(1000)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            mapsets: HashMap::new(),
            diffs: HashMap::new(),
            deep: HashMap::new(),
            max_size: max_size.max(2),
        }
    }

    pub fn mapset(&self, id: MapsetId) -> Option<Rc<MapsetData>> {
        self.mapsets.get(&id).cloned()
    }

    /// Stores a set and indexes each of its difficulties.
    ///
    /// Sets are evicted whole, together with their difficulty entries, so a
    /// cached set always resolves every one of its difficulties.
    pub fn insert_mapset(&mut self, data: Rc<MapsetData>) {
        self.remove_mapset(data.id);

        if self.mapsets.len() >= self.max_size {
            let evicted: Vec<MapsetId> = self
                .mapsets
                .keys()
                .take((self.max_size / 2).max(1))
                .copied()
                .collect();
            for id in evicted {
                self.remove_mapset(id);
            }
        }

        for map in &data.beatmaps {
            self.diffs.insert(
                map.id,
                CachedDiffEntry {
                    mapset_id: data.id,
                    map: map.clone(),
                },
            );
        }
        self.mapsets.insert(data.id, data);
    }

    fn remove_mapset(&mut self, id: MapsetId) {
        let Some(data) = self.mapsets.remove(&id) else {
            return;
        };
        for map in &data.beatmaps {
            if self.diffs.get(&map.id).is_some_and(|entry| entry.mapset_id == id) {
                self.diffs.remove(&map.id);
            }
        }
    }

    pub fn diff_entry(&self, id: BeatmapId) -> Option<&CachedDiffEntry> {
        self.diffs.get(&id)
    }

    pub fn deep(&self, id: BeatmapId) -> Option<&DeepDifficultyData> {
        self.deep.get(&id)
    }

    pub fn insert_deep(&mut self, id: BeatmapId, data: DeepDifficultyData) {
        evict_half(&mut self.deep, self.max_size);
        self.deep.insert(id, data);
    }

    pub fn clear(&mut self) {
        self.mapsets.clear();
        self.diffs.clear();
        self.deep.clear();
    }
}

// Simple eviction: clear half the table when full
fn evict_half<K: Clone + Eq + Hash, V>(table: &mut HashMap<K, V>, max_size: usize) {
    if table.len() < max_size {
        return;
    }
    let keys_to_remove: Vec<K> = table.keys().take(max_size / 2).cloned().collect();
    for key in keys_to_remove {
        table.remove(&key);
    }
}
