//! Enrichment pipeline.
//!
//! Turns the beatmap set blocks of a listing into enriched blocks: resolves
//! each set through the [`DataProvider`], renders the representative
//! difficulty through the [`ViewAdapter`] and wires the interactive controls
//! (retry, compute PP, deep info, difficulty switches).
//!
//! Everything runs on one thread. Per-block work of a batch is spawned on
//! the current `LocalSet`, so callers of [`Pipeline::initialize`] and
//! [`Pipeline::enrich_rows`] must be inside one.

pub mod block;
pub mod format;
pub mod switch;

pub use switch::SwitchOutcome;

use crate::models::MapsetId;
use crate::models::settings::PipelineSettings;
use crate::provider::{DataProvider, ProviderError};
use crate::system::{Action, LocalTask, task};
use crate::view::{PopupHandle, RowHandle, ViewAdapter, ViewError};
use log::{debug, error, info};
use std::rc::Rc;
use tokio::task::JoinSet;

#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error(transparent)]
    View(#[from] ViewError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("no beatmap data for mapset {0}")]
    NotFound(MapsetId),
    #[error("mapset {0} is no longer on the page")]
    BlockGone(MapsetId),
}

pub struct Pipeline<P, V> {
    provider: Rc<P>,
    view: Rc<V>,
    settings: PipelineSettings,
}

impl<P, V> Pipeline<P, V>
where
    P: DataProvider + 'static,
    V: ViewAdapter + 'static,
{
    pub fn new(provider: Rc<P>, view: Rc<V>, settings: PipelineSettings) -> Rc<Self> {
        Rc::new(Self {
            provider,
            view,
            settings,
        })
    }

    pub fn provider(&self) -> &Rc<P> {
        &self.provider
    }

    pub fn view(&self) -> &Rc<V> {
        &self.view
    }

    /// Enriches what is already on the page and starts following the page.
    ///
    /// Subscriptions are armed even when the current rows cannot be read.
    pub async fn initialize(self: &Rc<Self>) {
        let rows = match self.view.fetch_rows().await {
            Ok(rows) => rows,
            Err(err) => {
                error!("ENRICH: failed to read beatmap rows: {err}");
                Vec::new()
            }
        };

        self.arm_subscriptions();

        if rows.is_empty() {
            info!("ENRICH: no beatmap rows on the page yet");
        } else {
            self.enrich_rows(rows).await;
        }
    }

    fn arm_subscriptions(self: &Rc<Self>) {
        self.view.on_rows_added(
            &self.settings.listing_selector,
            self.handler(|pipeline, rows: Vec<RowHandle>| {
                task(async move { pipeline.enrich_rows(rows).await })
            }),
        );
        self.view.on_element(
            &self.settings.popup_selector,
            self.handler(|pipeline, popup: PopupHandle| {
                pipeline.wire_popup(popup);
                task(async {})
            }),
        );
        debug!(
            "ENRICH: watching {} and {}",
            self.settings.listing_selector, self.settings.popup_selector
        );
    }

    /// Enriches every block of `rows` concurrently and waits for all of them.
    pub async fn enrich_rows(self: &Rc<Self>, rows: Vec<RowHandle>) {
        let blocks = self.view.blocks_in_rows(&rows);
        debug!("ENRICH: {} blocks in {} rows", blocks.len(), rows.len());

        let mut tasks = JoinSet::new();
        for block in blocks {
            let pipeline = Rc::clone(self);
            tasks.spawn_local(async move { pipeline.enrich_one(block).await });
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                error!("ENRICH: block task aborted: {err}");
            }
        }
    }

    fn wire_popup(self: &Rc<Self>, popup: PopupHandle) {
        debug!("ENRICH: wiring difficulty popup {}", popup.0);
        self.view.wire_difficulty_switches(
            popup,
            self.handler(|pipeline, raw_id: String| {
                task(async move {
                    pipeline.handle_difficulty_switch(raw_id).await;
                })
            }),
        );
    }

    /// Control callback holding the pipeline weakly, since the view owns it.
    fn action(self: &Rc<Self>, run: impl Fn(Rc<Self>) -> LocalTask + 'static) -> Action {
        let pipeline = Rc::downgrade(self);
        Rc::new(move || match pipeline.upgrade() {
            Some(pipeline) => run(pipeline),
            None => task(async {}),
        })
    }

    fn handler<T: 'static>(
        self: &Rc<Self>,
        run: impl Fn(Rc<Self>, T) -> LocalTask + 'static,
    ) -> Rc<dyn Fn(T) -> LocalTask> {
        let pipeline = Rc::downgrade(self);
        Rc::new(move |arg: T| match pipeline.upgrade() {
            Some(pipeline) => run(pipeline, arg),
            None => task(async {}),
        })
    }
}
