//! Data provider: resolves beatmap sets and difficulty data.
//!
//! The pipeline only talks to a [`DataProvider`]; [`OsuApiProvider`] is the
//! production implementation backed by the osu! API v2 and rosu-pp.

pub mod cache;
pub mod osu_api;

pub use cache::ProviderCache;
pub use osu_api::OsuApiProvider;

use crate::difficulty::{CalcError, DeepDifficultyData};
use crate::models::{BeatmapId, CachedDiffEntry, MapsetData, MapsetId};
use std::rc::Rc;

/// Error type for provider failures.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{url} returned {status}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("osu! API credentials are not configured")]
    MissingCredentials,
    #[error("beatmap {0} has no downloadable file")]
    EmptyBeatmapFile(BeatmapId),
    #[error("difficulty calculation failed: {0}")]
    Calculation(#[from] CalcError),
}

/// Source of beatmap metadata consumed by the enrichment pipeline.
///
/// Fetches may suspend; cache lookups never do.
#[allow(async_fn_in_trait)]
pub trait DataProvider {
    /// Resolves a beatmap set. `Ok(None)` when the set does not exist.
    async fn fetch_mapset(&self, id: MapsetId) -> Result<Option<Rc<MapsetData>>, ProviderError>;

    async fn fetch_deep_difficulty(&self, id: BeatmapId)
    -> Result<DeepDifficultyData, ProviderError>;

    fn cached_deep_difficulty(&self, id: BeatmapId) -> Option<DeepDifficultyData>;

    fn cached_diff_entry(&self, id: BeatmapId) -> Option<CachedDiffEntry>;

    /// Drops every cached record.
    fn reset(&self);
}
