use crate::enrich::Pipeline;
use crate::models::Settings;
use crate::provider::{DataProvider, OsuApiProvider};
use crate::system::{LocalTask, PageSignal};
use crate::view::{BlockHandle, Page};
use anyhow::Context;
use log::{debug, info, warn};
use std::rc::Rc;

/// User interactions replayed against the page after the initial enrichment.
#[derive(Debug, Clone, Default)]
pub struct Interactions {
    /// Further listing pages, appended in order.
    pub appended_pages: Vec<String>,
    /// Clicks every failure placeholder's retry control.
    pub retry: bool,
    /// Beatmap ids picked from a difficulty popup, in order.
    pub switches: Vec<String>,
    pub compute_pp: bool,
    pub deep_info: bool,
}

pub struct App<P> {
    page: Rc<Page>,
    pipeline: Rc<Pipeline<P, Page>>,
}

impl App<OsuApiProvider> {
    pub fn new(settings: &Settings, html: &str) -> anyhow::Result<Self> {
        let provider = OsuApiProvider::new(settings.api.clone(), settings.cache.max_entries)
            .context("failed to build the osu! API client")?;
        Ok(Self::with_provider(Rc::new(provider), settings, html))
    }
}

impl<P: DataProvider + 'static> App<P> {
    pub fn with_provider(provider: Rc<P>, settings: &Settings, html: &str) -> Self {
        let page = Rc::new(Page::from_html(html));
        let pipeline = Pipeline::new(provider, Rc::clone(&page), settings.pipeline.clone());
        install_reload_routine(&pipeline);
        Self { page, pipeline }
    }

    /// Enriches the listing, replays `interactions` and returns the resulting
    /// report. Must run inside a `LocalSet`.
    pub async fn run(&self, interactions: &Interactions) -> String {
        self.pipeline.initialize().await;

        for content in &interactions.appended_pages {
            self.page.append_html(content).await;
        }
        if interactions.retry {
            self.click_all("retry", Page::click_retry).await;
        }
        for raw in &interactions.switches {
            self.switch_from_popup(raw).await;
        }
        if interactions.compute_pp {
            self.click_all("compute pp", Page::click_pp_button).await;
        }
        if interactions.deep_info {
            self.click_all("deep info", Page::click_deep_info).await;
        }

        self.page.render_report()
    }

    /// Opens a popup holding `raw` and picks it, like a click on a selector.
    async fn switch_from_popup(&self, raw: &str) {
        let (popup, mounted) = self.page.open_popup(vec![raw.to_string()]);
        mounted.await;
        match self.page.click_switch(popup, 0) {
            Some(switch) => {
                info!("APP: switching to beatmap {raw}");
                switch.await;
            }
            None => warn!("APP: difficulty popup was not wired, ignoring {raw}"),
        }
    }

    async fn click_all(&self, control: &str, click: fn(&Page, BlockHandle) -> Option<LocalTask>) {
        let mut clicked = 0;
        for block in self.page.blocks() {
            if let Some(action) = click(&self.page, block) {
                action.await;
                clicked += 1;
            }
        }
        debug!("APP: clicked {control} on {clicked} blocks");
    }
}

/// On `reloadExtensionRequested`, drops the provider state and enriches
/// every row again, which refills the difficulty index.
pub fn install_reload_routine<P: DataProvider + 'static>(pipeline: &Rc<Pipeline<P, Page>>) {
    let weak = Rc::downgrade(pipeline);
    pipeline.view().bus().listen(Rc::new(move |signal| {
        let Some(pipeline) = weak.upgrade() else {
            return;
        };
        match signal {
            PageSignal::ReloadExtensionRequested => {
                info!("APP: reloading provider state");
                pipeline.provider().reset();
                let rows = pipeline.view().rows();
                tokio::task::spawn_local(async move { pipeline.enrich_rows(rows).await });
            }
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::SwitchOutcome;
    use crate::models::BeatmapId;
    use crate::testing::{FakeProvider, Scripted, deep, mapset, variant};
    use crate::view::ViewAdapter;
    use tokio::task::LocalSet;

    const LISTING_HTML: &str = r#"
        <div class="beatmapsets__items">
            <div class="beatmapsets__items-row">
                <div class="beatmapsets__item">
                    <a href="https://osu.ppy.sh/beatmapsets/100">cover</a>
                    <div class="beatmapset-panel__info-row--title">FREEDOM DiVE</div>
                </div>
            </div>
        </div>
    "#;

    const NEXT_PAGE_HTML: &str = r#"
        <div class="beatmapsets__items">
            <div class="beatmapsets__items-row">
                <div class="beatmapsets__item">
                    <a href="https://osu.ppy.sh/beatmapsets/200">cover</a>
                    <div class="beatmapset-panel__info-row--title">Blue Zenith</div>
                </div>
            </div>
        </div>
    "#;

    #[tokio::test(start_paused = true)]
    async fn test_run_enriches_and_switches() {
        LocalSet::new()
            .run_until(async {
                let provider = FakeProvider::new();
                provider.script(
                    100,
                    vec![Scripted::Found(mapset(100, vec![variant(1, 4.2), variant(2, 5.8)]))],
                );
                let app =
                    App::with_provider(Rc::clone(&provider), &Settings::default(), LISTING_HTML);

                let interactions = Interactions {
                    switches: vec!["1".to_string()],
                    ..Interactions::default()
                };
                let report = app.run(&interactions).await;

                assert!(report.contains("[mapset 100] FREEDOM DiVE (beatmap 1)"));
                assert!(report.contains("4.2★ bpm 180"));
                assert!(report.contains("pp: [compute]"));
                assert_eq!(provider.resets(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_refills_index_before_retry() {
        LocalSet::new()
            .run_until(async {
                let provider = FakeProvider::new();
                provider.script(100, vec![Scripted::Found(mapset(100, vec![variant(2, 5.8)]))]);
                let app =
                    App::with_provider(Rc::clone(&provider), &Settings::default(), LISTING_HTML);
                app.run(&Interactions::default()).await;

                provider.script(
                    100,
                    vec![Scripted::Found(mapset(100, vec![variant(2, 5.8), variant(3, 4.0)]))],
                );
                let outcome = app.pipeline.handle_difficulty_switch("3").await;

                assert_eq!(outcome, SwitchOutcome::DisplayedAfterReload(BeatmapId(3)));
                assert_eq!(provider.resets(), 1);
                assert_eq!(provider.mapset_fetches(), 2);
                let block = app.page.blocks()[0];
                assert_eq!(app.page.beatmap_id(block).as_deref(), Some("3"));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_replays_page_interactions() {
        LocalSet::new()
            .run_until(async {
                let provider = FakeProvider::new();
                provider.script(
                    100,
                    vec![
                        Scripted::Fail,
                        Scripted::Found(mapset(100, vec![variant(1, 4.2)])),
                    ],
                );
                provider.script(200, vec![Scripted::Found(mapset(200, vec![variant(20, 6.5)]))]);
                provider.remote_deep(1, deep(150.0));
                provider.remote_deep(20, deep(320.0));
                let app =
                    App::with_provider(Rc::clone(&provider), &Settings::default(), LISTING_HTML);

                let interactions = Interactions {
                    appended_pages: vec![NEXT_PAGE_HTML.to_string()],
                    retry: true,
                    compute_pp: true,
                    deep_info: true,
                    ..Interactions::default()
                };
                let report = app.run(&interactions).await;

                assert!(report.contains("[mapset 100] FREEDOM DiVE (beatmap 1)"));
                assert!(report.contains("[mapset 200] Blue Zenith (beatmap 20)"));
                assert!(!report.contains("Failed to get beatmap data"));
                assert!(report.contains("pp: 150.00"));
                assert!(report.contains("pp: 320.00"));
                assert_eq!(report.matches("tooltip: Aim diff: 2.5").count(), 2);
                assert_eq!(provider.mapset_fetches(), 3);
            })
            .await;
    }
}
