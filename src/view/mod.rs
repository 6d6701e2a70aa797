//! View adapter: how the pipeline reads from and writes into the page.
//!
//! Blocks, rows and popups are opaque handles; every accessor goes through
//! the adapter so the pipeline never depends on a concrete document model.
//! [`Page`] is the in-memory implementation used by the CLI and the tests.

pub mod html;
pub mod page;

pub use page::{BlockSeed, Page};
#[cfg(test)]
pub use page::PpView;

use crate::models::{BeatmapId, MapsetId};
use crate::system::{Action, PageSignal, PopupHandler, RowsHandler, SwitchHandler};
use std::fmt;

/// A row container holding one or more beatmap set blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowHandle(pub usize);

/// A rendered beatmap set block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHandle(pub usize);

/// A difficulty popup of one beatmap set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PopupHandle(pub usize);

impl fmt::Display for BlockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("beatmap listing is not present on the page")]
    ListingNotFound,
    #[error("{0} has no beatmap set link")]
    MissingMapsetId(BlockHandle),
    #[error("{block} links to an invalid beatmap set id {raw:?}")]
    InvalidMapsetId { block: BlockHandle, raw: String },
    #[error("{0} is no longer on the page")]
    Detached(BlockHandle),
    #[error("no block on the page shows mapset {0}")]
    NoBlockForMapset(MapsetId),
}

/// Page operations the enrichment pipeline depends on.
#[allow(async_fn_in_trait)]
pub trait ViewAdapter {
    /// Current beatmap set rows. May legitimately be empty.
    async fn fetch_rows(&self) -> Result<Vec<RowHandle>, ViewError>;

    /// Non-recursive child additions under `container`.
    fn on_rows_added(&self, container: &str, handler: RowsHandler);

    /// Every mount of an element matching `kind`.
    fn on_element(&self, kind: &str, handler: PopupHandler);

    fn blocks_in_rows(&self, rows: &[RowHandle]) -> Vec<BlockHandle>;

    fn mapset_id(&self, block: BlockHandle) -> Result<MapsetId, ViewError>;

    /// Raw `beatmapId` attribute, if stamped.
    fn beatmap_id(&self, block: BlockHandle) -> Option<String>;

    /// Stamps `mapsetId`, and `beatmapId` when given.
    fn stamp_ids(
        &self,
        block: BlockHandle,
        mapset_id: MapsetId,
        beatmap_id: Option<BeatmapId>,
    ) -> Result<(), ViewError>;

    fn block_by_mapset(&self, mapset_id: MapsetId) -> Option<BlockHandle>;

    /// Block whose displayed difficulty is exactly `beatmap_id`.
    fn block_displaying(&self, beatmap_id: &str) -> Option<BlockHandle>;

    fn has_tooltip(&self, beatmap_id: BeatmapId) -> bool;

    fn remove_tooltip(&self, beatmap_id: BeatmapId);

    fn show_tooltip(
        &self,
        block: BlockHandle,
        beatmap_id: BeatmapId,
        text: &str,
    ) -> Result<(), ViewError>;

    /// Replaces the info region content (and any failure placeholder).
    fn mount_info(&self, block: BlockHandle, text: &str) -> Result<(), ViewError>;

    fn mount_failure(&self, block: BlockHandle, retry: Action) -> Result<(), ViewError>;

    fn remove_failure(&self, block: BlockHandle);

    /// Creates the PP region once; later calls are no-ops.
    fn ensure_pp_region(&self, block: BlockHandle) -> Result<(), ViewError>;

    fn mount_pp(&self, block: BlockHandle, pp: f64) -> Result<(), ViewError>;

    fn mount_pp_button(&self, block: BlockHandle, on_click: Action) -> Result<(), ViewError>;

    fn mount_deep_info_button(&self, block: BlockHandle, on_click: Action)
    -> Result<(), ViewError>;

    /// Drops a deep-info control left by a previously displayed difficulty.
    fn remove_deep_info_button(&self, block: BlockHandle);

    fn update_difficulty_indicator(
        &self,
        mapset_id: MapsetId,
        beatmap_id: BeatmapId,
    ) -> Result<(), ViewError>;

    /// Intercepts clicks on the difficulty selectors inside `popup`.
    fn wire_difficulty_switches(&self, popup: PopupHandle, handler: SwitchHandler);

    fn dispatch(&self, signal: PageSignal);
}
