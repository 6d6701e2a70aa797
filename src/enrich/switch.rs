//! Difficulty switching: shows another difficulty of a set in its block.
//!
//! The switch is resolved from the provider's difficulty index only. When the
//! id is unknown, the host is asked to reload provider state and the lookup
//! is tried once more after a grace period.

use super::format::{SwitchTarget, beatmap_summary};
use super::{EnrichError, Pipeline};
use crate::models::{BeatmapId, CachedDiffEntry};
use crate::provider::DataProvider;
use crate::system::PageSignal;
use crate::view::ViewAdapter;
use log::{debug, error, info, warn};
use std::rc::Rc;

/// How a switch request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// A block already shows the requested difficulty.
    AlreadyDisplayed,
    Displayed(BeatmapId),
    DisplayedAfterReload(BeatmapId),
    Failed,
}

impl<P, V> Pipeline<P, V>
where
    P: DataProvider + 'static,
    V: ViewAdapter + 'static,
{
    pub async fn handle_difficulty_switch(
        self: &Rc<Self>,
        target: impl Into<SwitchTarget>,
    ) -> SwitchOutcome {
        let target = target.into();
        let raw = target.to_string();

        if let Some(block) = self.view.block_displaying(&raw) {
            debug!("SWITCH: {block} already shows beatmap {raw}");
            return SwitchOutcome::AlreadyDisplayed;
        }

        // An invalid id stays unresolvable and takes the reload path.
        let beatmap_id = target.numeric();

        if let Some(entry) = self.lookup(beatmap_id) {
            return self.finish_switch(&entry, SwitchOutcome::Displayed(entry.map.id));
        }

        info!("SWITCH: beatmap {raw} is not cached, requesting a reload");
        self.view.dispatch(PageSignal::ReloadExtensionRequested);
        tokio::time::sleep(self.settings.reload_grace()).await;

        match self.lookup(beatmap_id) {
            Some(entry) => {
                self.finish_switch(&entry, SwitchOutcome::DisplayedAfterReload(entry.map.id))
            }
            None => {
                error!(
                    "SWITCH: beatmap {raw} is still unknown after reloading; \
                     check your connection and refresh the page"
                );
                SwitchOutcome::Failed
            }
        }
    }

    fn lookup(&self, beatmap_id: Option<BeatmapId>) -> Option<CachedDiffEntry> {
        beatmap_id.and_then(|id| self.provider.cached_diff_entry(id))
    }

    fn finish_switch(
        self: &Rc<Self>,
        entry: &CachedDiffEntry,
        done: SwitchOutcome,
    ) -> SwitchOutcome {
        match self.apply_switch(entry) {
            Ok(()) => done,
            Err(err) => {
                warn!("SWITCH: cannot show beatmap {}: {err}", entry.map.id);
                SwitchOutcome::Failed
            }
        }
    }

    /// Renders a cached difficulty into the block of its set.
    pub fn apply_switch(self: &Rc<Self>, entry: &CachedDiffEntry) -> Result<(), EnrichError> {
        let block = self
            .view
            .block_by_mapset(entry.mapset_id)
            .ok_or(EnrichError::BlockGone(entry.mapset_id))?;

        self.view.mount_info(block, &beatmap_summary(&entry.map))?;
        self.attach_pp_affordance(block, entry.map.id)?;
        self.view.update_difficulty_indicator(entry.mapset_id, entry.map.id)?;
        debug!("SWITCH: {block} now shows beatmap {}", entry.map.id);
        Ok(())
    }
}
