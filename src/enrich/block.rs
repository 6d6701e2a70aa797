//! Per-block enrichment and the controls mounted into a block.

use super::format::{beatmap_summary, difficulty_breakdown, representative_variant};
use super::{EnrichError, Pipeline};
use crate::models::{BeatmapId, BeatmapVariant, MapsetId};
use crate::provider::DataProvider;
use crate::system::task;
use crate::view::{BlockHandle, ViewAdapter, ViewError};
use log::{debug, error, warn};
use std::rc::Rc;

const NO_BREAKDOWN: &str = "No difficulty breakdown for this mode";

impl<P, V> Pipeline<P, V>
where
    P: DataProvider + 'static,
    V: ViewAdapter + 'static,
{
    /// Enriches one block. Errors end up in the log, never in the caller.
    pub async fn enrich_one(self: &Rc<Self>, block: BlockHandle) {
        match self.try_enrich(block).await {
            Ok(()) => {}
            Err(EnrichError::View(err)) => warn!("ENRICH: skipping {block}: {err}"),
            Err(err) => error!("ENRICH: failed to get beatmap data for {block}: {err}"),
        }
    }

    pub async fn try_enrich(self: &Rc<Self>, block: BlockHandle) -> Result<(), EnrichError> {
        let mapset_id = self.view.mapset_id(block)?;
        debug!("ENRICH: {block} -> mapset {mapset_id}");

        let data = match self.provider.fetch_mapset(mapset_id).await {
            Ok(data) => data,
            Err(err) => {
                self.show_failure(block);
                return Err(err.into());
            }
        };
        let Some(map) = representative_variant(data.as_deref()) else {
            self.show_failure(block);
            return Err(EnrichError::NotFound(mapset_id));
        };

        self.render_variant(block, mapset_id, map)?;
        Ok(())
    }

    fn render_variant(
        self: &Rc<Self>,
        block: BlockHandle,
        mapset_id: MapsetId,
        map: &BeatmapVariant,
    ) -> Result<(), ViewError> {
        self.view.stamp_ids(block, mapset_id, Some(map.id))?;
        self.view.remove_failure(block);
        self.view.mount_info(block, &beatmap_summary(map))?;

        if map.mode.is_standard() {
            let on_click = self.action(move |pipeline| {
                task(async move { pipeline.on_deep_info_click(block).await })
            });
            self.view.mount_deep_info_button(block, on_click)?;
        } else {
            self.view.remove_deep_info_button(block);
        }
        self.attach_pp_affordance(block, map.id)
    }

    /// Replaces the block's info with the failure placeholder and its retry.
    fn show_failure(self: &Rc<Self>, block: BlockHandle) {
        let retry = self.action(move |pipeline| task(async move { pipeline.retry(block).await }));
        if let Err(err) = self.view.mount_failure(block, retry) {
            warn!("ENRICH: cannot show failure on {block}: {err}");
        }
    }

    async fn retry(self: &Rc<Self>, block: BlockHandle) {
        debug!("ENRICH: retrying {block}");
        match self.try_enrich(block).await {
            Ok(()) => self.view.remove_failure(block),
            Err(err) => error!("ENRICH: retry failed for {block}: {err}"),
        }
    }

    /// PP from the cache when known, otherwise a one-shot "compute PP" control.
    pub fn attach_pp_affordance(
        self: &Rc<Self>,
        block: BlockHandle,
        beatmap_id: BeatmapId,
    ) -> Result<(), ViewError> {
        self.view.ensure_pp_region(block)?;
        match self.provider.cached_deep_difficulty(beatmap_id) {
            Some(deep) => self.view.mount_pp(block, deep.pp),
            None => {
                let on_click = self.action(move |pipeline| {
                    task(async move { pipeline.compute_pp(block, beatmap_id).await })
                });
                self.view.mount_pp_button(block, on_click)
            }
        }
    }

    async fn compute_pp(self: &Rc<Self>, block: BlockHandle, beatmap_id: BeatmapId) {
        match self.provider.fetch_deep_difficulty(beatmap_id).await {
            Ok(deep) => {
                debug!("ENRICH: beatmap {beatmap_id}: {:.2}★, {:.2}pp", deep.stars, deep.pp);
                if let Err(err) = self.view.mount_pp(block, deep.pp) {
                    warn!("ENRICH: dropping pp for beatmap {beatmap_id}: {err}");
                }
            }
            Err(err) => error!("ENRICH: failed to compute pp for beatmap {beatmap_id}: {err}"),
        }
    }

    /// Toggles the deep difficulty tooltip of the block's displayed beatmap.
    pub async fn on_deep_info_click(self: &Rc<Self>, block: BlockHandle) {
        let Some(raw) = self.view.beatmap_id(block) else {
            warn!("ENRICH: {block} has no displayed beatmap");
            return;
        };
        let Ok(beatmap_id) = raw.parse::<BeatmapId>() else {
            warn!("ENRICH: {block} displays invalid beatmapId {raw:?}");
            return;
        };

        if self.view.has_tooltip(beatmap_id) {
            self.view.remove_tooltip(beatmap_id);
            return;
        }

        let deep = match self.provider.fetch_deep_difficulty(beatmap_id).await {
            Ok(deep) => deep,
            Err(err) => {
                error!("ENRICH: failed to get difficulty data for beatmap {beatmap_id}: {err}");
                return;
            }
        };

        let text = deep
            .difficulty
            .as_ref()
            .map_or_else(|| NO_BREAKDOWN.to_string(), difficulty_breakdown);
        let shown = self
            .view
            .mount_pp(block, deep.pp)
            .and_then(|()| self.view.show_tooltip(block, beatmap_id, &text));
        if let Err(err) = shown {
            warn!("ENRICH: dropping deep info for beatmap {beatmap_id}: {err}");
        }
    }
}
