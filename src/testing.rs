//! Test fixtures: beatmap builders and a scripted provider.

use crate::difficulty::{DeepDifficultyData, DifficultyBreakdown};
use crate::enrich::Pipeline;
use crate::models::settings::PipelineSettings;
use crate::models::beatmap::GameMode;
use crate::models::{BeatmapId, BeatmapVariant, CachedDiffEntry, MapsetData, MapsetId};
use crate::provider::{DataProvider, ProviderCache, ProviderError};
use crate::view::{BlockSeed, Page};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

pub fn variant(id: u32, difficulty_rating: f64) -> BeatmapVariant {
    BeatmapVariant {
        id: BeatmapId(id),
        beatmapset_id: None,
        version: format!("Diff {id}"),
        mode: GameMode::Osu,
        difficulty_rating,
        bpm: 180.0,
        max_combo: 1000,
        ar: 9.0,
        cs: 4.0,
        accuracy: 8.0,
        drain: 6.0,
    }
}

pub fn mapset(id: u32, beatmaps: Vec<BeatmapVariant>) -> MapsetData {
    MapsetData {
        id: MapsetId(id),
        artist: "Artist".to_string(),
        title: format!("Mapset {id}"),
        creator: "Mapper".to_string(),
        beatmaps: beatmaps
            .into_iter()
            .map(|map| BeatmapVariant {
                beatmapset_id: Some(MapsetId(id)),
                ..map
            })
            .collect(),
    }
}

pub fn deep(pp: f64) -> DeepDifficultyData {
    DeepDifficultyData {
        pp,
        stars: 5.0,
        difficulty: Some(DifficultyBreakdown {
            aim: 2.5,
            speed: 2.1,
            n_circles: 300,
            n_sliders: 120,
            speed_note_count: 180.0,
            flashlight: 1.5,
        }),
    }
}

/// One row holding a block per mapset id.
pub fn listing(ids: &[u32]) -> Rc<Page> {
    Rc::new(Page::with_rows(vec![
        ids.iter().copied().map(BlockSeed::for_mapset).collect(),
    ]))
}

pub fn pipeline_for(
    provider: &Rc<FakeProvider>,
    page: &Rc<Page>,
) -> Rc<Pipeline<FakeProvider, Page>> {
    Pipeline::new(Rc::clone(provider), Rc::clone(page), PipelineSettings::default())
}

/// Scripted answer to a mapset fetch.
#[derive(Debug, Clone)]
pub enum Scripted {
    Found(MapsetData),
    Missing,
    Fail,
}

/// Provider answering from scripts instead of the network.
///
/// Each mapset has a queue of answers; the last one repeats. Deep data is
/// only served for ids registered with [`FakeProvider::remote_deep`].
#[derive(Default)]
pub struct FakeProvider {
    scripts: RefCell<HashMap<MapsetId, VecDeque<Scripted>>>,
    remote_deep: RefCell<HashMap<BeatmapId, DeepDifficultyData>>,
    cache: RefCell<ProviderCache>,
    mapset_fetches: Cell<usize>,
    deep_fetches: Cell<usize>,
    resets: Cell<usize>,
}

impl FakeProvider {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn script(&self, id: u32, answers: Vec<Scripted>) {
        self.scripts.borrow_mut().insert(MapsetId(id), answers.into());
    }

    pub fn remote_deep(&self, id: u32, data: DeepDifficultyData) {
        self.remote_deep.borrow_mut().insert(BeatmapId(id), data);
    }

    pub fn seed_mapset(&self, data: MapsetData) {
        self.cache.borrow_mut().insert_mapset(Rc::new(data));
    }

    pub fn seed_deep(&self, id: u32, data: DeepDifficultyData) {
        self.cache.borrow_mut().insert_deep(BeatmapId(id), data);
    }

    pub fn mapset_fetches(&self) -> usize {
        self.mapset_fetches.get()
    }

    pub fn deep_fetches(&self) -> usize {
        self.deep_fetches.get()
    }

    pub fn resets(&self) -> usize {
        self.resets.get()
    }

    fn next_answer(&self, id: MapsetId) -> Scripted {
        let mut scripts = self.scripts.borrow_mut();
        let Some(queue) = scripts.get_mut(&id) else {
            return Scripted::Missing;
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap_or(Scripted::Missing)
        } else {
            queue.front().cloned().unwrap_or(Scripted::Missing)
        }
    }
}

impl DataProvider for FakeProvider {
    async fn fetch_mapset(&self, id: MapsetId) -> Result<Option<Rc<MapsetData>>, ProviderError> {
        self.mapset_fetches.set(self.mapset_fetches.get() + 1);
        tokio::task::yield_now().await;

        match self.next_answer(id) {
            Scripted::Found(data) => {
                let data = Rc::new(data);
                self.cache.borrow_mut().insert_mapset(Rc::clone(&data));
                Ok(Some(data))
            }
            Scripted::Missing => Ok(None),
            Scripted::Fail => Err(ProviderError::UnexpectedStatus {
                url: format!("https://osu.ppy.sh/api/v2/beatmapsets/{id}"),
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            }),
        }
    }

    async fn fetch_deep_difficulty(
        &self,
        id: BeatmapId,
    ) -> Result<DeepDifficultyData, ProviderError> {
        self.deep_fetches.set(self.deep_fetches.get() + 1);
        tokio::task::yield_now().await;

        let data = self
            .remote_deep
            .borrow()
            .get(&id)
            .cloned()
            .ok_or(ProviderError::EmptyBeatmapFile(id))?;
        self.cache.borrow_mut().insert_deep(id, data.clone());
        Ok(data)
    }

    fn cached_deep_difficulty(&self, id: BeatmapId) -> Option<DeepDifficultyData> {
        self.cache.borrow().deep(id).cloned()
    }

    fn cached_diff_entry(&self, id: BeatmapId) -> Option<CachedDiffEntry> {
        self.cache.borrow().diff_entry(id).cloned()
    }

    fn reset(&self) {
        self.resets.set(self.resets.get() + 1);
        self.cache.borrow_mut().clear();
    }
}
