//! In-memory document model of a beatmap listing page.
//!
//! Holds the rows and blocks of the listing plus everything the pipeline
//! mounts into them. Clicking a control hands back the task its callback
//! produced so the caller decides where to run it.

use super::html::{self, LISTING, Listing, POPUP_GROUP};
use super::{BlockHandle, PopupHandle, RowHandle, ViewAdapter, ViewError};
use crate::models::{BeatmapId, MapsetId};
use crate::system::{
    Action, LocalTask, PageBus, PageSignal, PopupHandler, RowsHandler, SwitchHandler,
};
use scraper::Html;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;

pub const MAPSET_ATTR: &str = "mapsetId";
pub const BEATMAP_ATTR: &str = "beatmapId";

/// What the page renders for a block before enrichment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockSeed {
    pub title: String,
    /// Link to the beatmap set page.
    pub href: Option<String>,
}

#[cfg(test)]
impl BlockSeed {
    pub fn for_mapset(id: u32) -> Self {
        Self {
            title: format!("Mapset {id}"),
            href: Some(format!("https://osu.ppy.sh/beatmapsets/{id}")),
        }
    }
}

/// Observable state of a block's PP region.
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PpView {
    Empty,
    Value(f64),
    /// "Compute PP" control waiting for a click.
    Button,
}

enum InfoRegion {
    Empty,
    Summary(String),
    Failed(Action),
}

enum PpRegion {
    Empty,
    Value(f64),
    Button(Action),
}

struct BlockNode {
    seed: BlockSeed,
    attributes: BTreeMap<String, String>,
    info: InfoRegion,
    info_renders: usize,
    pp: Option<PpRegion>,
    pp_regions_created: usize,
    deep_info: Option<Action>,
}

impl BlockNode {
    fn new(seed: BlockSeed) -> Self {
        Self {
            seed,
            attributes: BTreeMap::new(),
            info: InfoRegion::Empty,
            info_renders: 0,
            pp: None,
            pp_regions_created: 0,
            deep_info: None,
        }
    }

    fn mapset_id(&self) -> Option<MapsetId> {
        self.seed
            .href
            .as_deref()
            .and_then(html::mapset_id_from_href)
            .or_else(|| self.attributes.get(MAPSET_ATTR).map(String::as_str))
            .and_then(|raw| raw.parse().ok())
    }

    fn pp_region(&mut self) -> &mut PpRegion {
        if self.pp.is_none() {
            self.pp_regions_created += 1;
        }
        self.pp.get_or_insert(PpRegion::Empty)
    }
}

struct PopupNode {
    items: Vec<String>,
    on_switch: Option<SwitchHandler>,
}

struct Tooltip {
    anchor: BlockHandle,
    text: String,
}

#[derive(Default)]
struct Document {
    listing_present: bool,
    rows: Vec<Vec<BlockHandle>>,
    /// Indexed by handle; removed blocks leave a hole.
    blocks: Vec<Option<BlockNode>>,
    popups: Vec<PopupNode>,
    tooltips: BTreeMap<BeatmapId, Tooltip>,
}

impl Document {
    fn push_row(&mut self, seeds: Vec<BlockSeed>) -> RowHandle {
        let mut row = Vec::with_capacity(seeds.len());
        for seed in seeds {
            row.push(BlockHandle(self.blocks.len()));
            self.blocks.push(Some(BlockNode::new(seed)));
        }
        self.rows.push(row);
        RowHandle(self.rows.len() - 1)
    }

    fn live_blocks(&self) -> impl Iterator<Item = (BlockHandle, &BlockNode)> {
        self.rows
            .iter()
            .flatten()
            .filter_map(|&handle| Some((handle, self.blocks.get(handle.0)?.as_ref()?)))
    }

    fn block(&self, block: BlockHandle) -> Option<&BlockNode> {
        self.blocks.get(block.0)?.as_ref()
    }

    fn block_mut(&mut self, block: BlockHandle) -> Result<&mut BlockNode, ViewError> {
        self.blocks
            .get_mut(block.0)
            .and_then(Option::as_mut)
            .ok_or(ViewError::Detached(block))
    }
}

pub struct Page {
    doc: RefCell<Document>,
    bus: PageBus,
}

impl Page {
    pub fn new(listing: Listing) -> Self {
        let mut doc = Document {
            listing_present: listing.present,
            ..Document::default()
        };
        for row in listing.rows {
            doc.push_row(row);
        }
        Self {
            doc: RefCell::new(doc),
            bus: PageBus::new(),
        }
    }

    pub fn from_html(content: &str) -> Self {
        Self::new(html::parse_listing(&Html::parse_document(content)))
    }

    pub fn bus(&self) -> &PageBus {
        &self.bus
    }

    pub fn rows(&self) -> Vec<RowHandle> {
        (0..self.doc.borrow().rows.len()).map(RowHandle).collect()
    }

    pub fn blocks(&self) -> Vec<BlockHandle> {
        self.doc.borrow().live_blocks().map(|(handle, _)| handle).collect()
    }

    /// Appends the rows of another saved listing page, as infinite scroll does.
    pub fn append_html(&self, content: &str) -> LocalTask {
        let listing = html::parse_listing(&Html::parse_document(content));
        self.append_rows(listing.rows)
    }

    /// Appends rows to the listing and notifies addition subscribers.
    pub fn append_rows(&self, rows: Vec<Vec<BlockSeed>>) -> LocalTask {
        let added = {
            let mut doc = self.doc.borrow_mut();
            doc.listing_present = true;
            rows.into_iter().map(|row| doc.push_row(row)).collect()
        };
        self.bus.notify_additions(LISTING, added)
    }

    /// Mounts a difficulty popup listing `beatmap_ids`.
    pub fn open_popup(&self, beatmap_ids: Vec<String>) -> (PopupHandle, LocalTask) {
        let popup = {
            let mut doc = self.doc.borrow_mut();
            doc.popups.push(PopupNode {
                items: beatmap_ids,
                on_switch: None,
            });
            PopupHandle(doc.popups.len() - 1)
        };
        (popup, self.bus.notify_element(POPUP_GROUP, popup))
    }

    pub fn click_retry(&self, block: BlockHandle) -> Option<LocalTask> {
        let action = match &self.doc.borrow().block(block)?.info {
            InfoRegion::Failed(retry) => retry.clone(),
            _ => return None,
        };
        Some(action())
    }

    pub fn click_pp_button(&self, block: BlockHandle) -> Option<LocalTask> {
        let action = match self.doc.borrow().block(block)?.pp.as_ref()? {
            PpRegion::Button(action) => action.clone(),
            _ => return None,
        };
        Some(action())
    }

    pub fn click_deep_info(&self, block: BlockHandle) -> Option<LocalTask> {
        let action = self.doc.borrow().block(block)?.deep_info.clone()?;
        Some(action())
    }

    /// Activates the `index`-th difficulty selector of a popup.
    pub fn click_switch(&self, popup: PopupHandle, index: usize) -> Option<LocalTask> {
        let (handler, raw_id) = {
            let doc = self.doc.borrow();
            let node = doc.popups.get(popup.0)?;
            (node.on_switch.clone()?, node.items.get(index)?.clone())
        };
        Some(handler(raw_id))
    }

    pub fn attribute(&self, block: BlockHandle, name: &str) -> Option<String> {
        self.doc.borrow().block(block)?.attributes.get(name).cloned()
    }

    /// Plain-text dump of every block on the page.
    pub fn render_report(&self) -> String {
        let doc = self.doc.borrow();
        let mut out = String::new();
        for (handle, node) in doc.live_blocks() {
            let mapset = node
                .mapset_id()
                .map_or_else(|| "?".to_string(), |id| id.to_string());
            let _ = write!(out, "[mapset {mapset}] {}", node.seed.title);
            if let Some(beatmap) = node.attributes.get(BEATMAP_ATTR) {
                let _ = write!(out, " (beatmap {beatmap})");
            }
            out.push('\n');

            match &node.info {
                InfoRegion::Empty => {}
                InfoRegion::Summary(text) => {
                    let _ = writeln!(out, "  {text}");
                }
                InfoRegion::Failed(_) => out.push_str("  Failed to get beatmap data [retry]\n"),
            }
            match &node.pp {
                Some(PpRegion::Value(pp)) => {
                    let _ = writeln!(out, "  pp: {pp:.2}");
                }
                Some(PpRegion::Button(_)) => out.push_str("  pp: [compute]\n"),
                Some(PpRegion::Empty) | None => {}
            }
            for tooltip in doc.tooltips.values().filter(|t| t.anchor == handle) {
                let _ = writeln!(out, "  tooltip: {}", tooltip.text);
            }
        }
        out
    }
}

/// Test drivers and inspectors.
#[cfg(test)]
impl Page {
    /// A page whose listing container holds `rows`.
    pub fn with_rows(rows: Vec<Vec<BlockSeed>>) -> Self {
        Self::new(Listing {
            present: true,
            rows,
        })
    }

    pub fn remove_block(&self, block: BlockHandle) {
        let mut doc = self.doc.borrow_mut();
        if let Some(slot) = doc.blocks.get_mut(block.0) {
            *slot = None;
        }
        doc.tooltips.retain(|_, tooltip| tooltip.anchor != block);
    }

    /// Rendered summary, if the info region holds one.
    pub fn info_text(&self, block: BlockHandle) -> Option<String> {
        match &self.doc.borrow().block(block)?.info {
            InfoRegion::Summary(text) => Some(text.clone()),
            _ => None,
        }
    }

    pub fn info_renders(&self, block: BlockHandle) -> usize {
        self.doc
            .borrow()
            .block(block)
            .map_or(0, |node| node.info_renders)
    }

    pub fn has_failure(&self, block: BlockHandle) -> bool {
        self.doc
            .borrow()
            .block(block)
            .is_some_and(|node| matches!(node.info, InfoRegion::Failed(_)))
    }

    pub fn pp_view(&self, block: BlockHandle) -> Option<PpView> {
        Some(match self.doc.borrow().block(block)?.pp.as_ref()? {
            PpRegion::Empty => PpView::Empty,
            PpRegion::Value(pp) => PpView::Value(*pp),
            PpRegion::Button(_) => PpView::Button,
        })
    }

    pub fn pp_regions_created(&self, block: BlockHandle) -> usize {
        self.doc
            .borrow()
            .block(block)
            .map_or(0, |node| node.pp_regions_created)
    }

    pub fn has_deep_info(&self, block: BlockHandle) -> bool {
        self.doc
            .borrow()
            .block(block)
            .is_some_and(|node| node.deep_info.is_some())
    }

    pub fn tooltip_text(&self, beatmap_id: BeatmapId) -> Option<String> {
        self.doc
            .borrow()
            .tooltips
            .get(&beatmap_id)
            .map(|tooltip| tooltip.text.clone())
    }

    pub fn tooltip_count(&self) -> usize {
        self.doc.borrow().tooltips.len()
    }
}

impl ViewAdapter for Page {
    async fn fetch_rows(&self) -> Result<Vec<RowHandle>, ViewError> {
        if !self.doc.borrow().listing_present {
            return Err(ViewError::ListingNotFound);
        }
        Ok(self.rows())
    }

    fn on_rows_added(&self, container: &str, handler: RowsHandler) {
        self.bus.subscribe_additions(container, handler);
    }

    fn on_element(&self, kind: &str, handler: PopupHandler) {
        self.bus.subscribe_element(kind, handler);
    }

    fn blocks_in_rows(&self, rows: &[RowHandle]) -> Vec<BlockHandle> {
        let doc = self.doc.borrow();
        rows.iter()
            .filter_map(|row| doc.rows.get(row.0))
            .flatten()
            .copied()
            .filter(|&block| doc.block(block).is_some())
            .collect()
    }

    fn mapset_id(&self, block: BlockHandle) -> Result<MapsetId, ViewError> {
        let doc = self.doc.borrow();
        let node = doc.block(block).ok_or(ViewError::Detached(block))?;
        if let Some(id) = node.mapset_id() {
            return Ok(id);
        }
        match node.seed.href.as_deref().and_then(html::mapset_id_from_href) {
            Some(raw) => Err(ViewError::InvalidMapsetId {
                block,
                raw: raw.to_string(),
            }),
            None => Err(ViewError::MissingMapsetId(block)),
        }
    }

    fn beatmap_id(&self, block: BlockHandle) -> Option<String> {
        self.attribute(block, BEATMAP_ATTR)
    }

    fn stamp_ids(
        &self,
        block: BlockHandle,
        mapset_id: MapsetId,
        beatmap_id: Option<BeatmapId>,
    ) -> Result<(), ViewError> {
        let mut doc = self.doc.borrow_mut();
        let node = doc.block_mut(block)?;
        node.attributes
            .insert(MAPSET_ATTR.to_string(), mapset_id.to_string());
        if let Some(beatmap_id) = beatmap_id {
            node.attributes
                .insert(BEATMAP_ATTR.to_string(), beatmap_id.to_string());
        }
        Ok(())
    }

    fn block_by_mapset(&self, mapset_id: MapsetId) -> Option<BlockHandle> {
        self.doc
            .borrow()
            .live_blocks()
            .find(|(_, node)| node.mapset_id() == Some(mapset_id))
            .map(|(handle, _)| handle)
    }

    fn block_displaying(&self, beatmap_id: &str) -> Option<BlockHandle> {
        self.doc
            .borrow()
            .live_blocks()
            .find(|(_, node)| {
                node.attributes.get(BEATMAP_ATTR).map(String::as_str) == Some(beatmap_id)
            })
            .map(|(handle, _)| handle)
    }

    fn has_tooltip(&self, beatmap_id: BeatmapId) -> bool {
        self.doc.borrow().tooltips.contains_key(&beatmap_id)
    }

    fn remove_tooltip(&self, beatmap_id: BeatmapId) {
        self.doc.borrow_mut().tooltips.remove(&beatmap_id);
    }

    fn show_tooltip(
        &self,
        block: BlockHandle,
        beatmap_id: BeatmapId,
        text: &str,
    ) -> Result<(), ViewError> {
        let mut doc = self.doc.borrow_mut();
        doc.block_mut(block)?;
        doc.tooltips.insert(
            beatmap_id,
            Tooltip {
                anchor: block,
                text: text.to_string(),
            },
        );
        Ok(())
    }

    fn mount_info(&self, block: BlockHandle, text: &str) -> Result<(), ViewError> {
        let mut doc = self.doc.borrow_mut();
        let node = doc.block_mut(block)?;
        node.info = InfoRegion::Summary(text.to_string());
        node.info_renders += 1;
        Ok(())
    }

    fn mount_failure(&self, block: BlockHandle, retry: Action) -> Result<(), ViewError> {
        self.doc.borrow_mut().block_mut(block)?.info = InfoRegion::Failed(retry);
        Ok(())
    }

    fn remove_failure(&self, block: BlockHandle) {
        if let Ok(node) = self.doc.borrow_mut().block_mut(block) {
            if matches!(node.info, InfoRegion::Failed(_)) {
                node.info = InfoRegion::Empty;
            }
        }
    }

    fn ensure_pp_region(&self, block: BlockHandle) -> Result<(), ViewError> {
        self.doc.borrow_mut().block_mut(block)?.pp_region();
        Ok(())
    }

    fn mount_pp(&self, block: BlockHandle, pp: f64) -> Result<(), ViewError> {
        *self.doc.borrow_mut().block_mut(block)?.pp_region() = PpRegion::Value(pp);
        Ok(())
    }

    fn mount_pp_button(&self, block: BlockHandle, on_click: Action) -> Result<(), ViewError> {
        *self.doc.borrow_mut().block_mut(block)?.pp_region() = PpRegion::Button(on_click);
        Ok(())
    }

    fn mount_deep_info_button(
        &self,
        block: BlockHandle,
        on_click: Action,
    ) -> Result<(), ViewError> {
        self.doc.borrow_mut().block_mut(block)?.deep_info = Some(on_click);
        Ok(())
    }

    fn remove_deep_info_button(&self, block: BlockHandle) {
        if let Ok(node) = self.doc.borrow_mut().block_mut(block) {
            node.deep_info = None;
        }
    }

    fn update_difficulty_indicator(
        &self,
        mapset_id: MapsetId,
        beatmap_id: BeatmapId,
    ) -> Result<(), ViewError> {
        let block = self
            .block_by_mapset(mapset_id)
            .ok_or(ViewError::NoBlockForMapset(mapset_id))?;
        self.doc
            .borrow_mut()
            .block_mut(block)?
            .attributes
            .insert(BEATMAP_ATTR.to_string(), beatmap_id.to_string());
        Ok(())
    }

    fn wire_difficulty_switches(&self, popup: PopupHandle, handler: SwitchHandler) {
        if let Some(node) = self.doc.borrow_mut().popups.get_mut(popup.0) {
            node.on_switch = Some(handler);
        }
    }

    fn dispatch(&self, signal: PageSignal) {
        self.bus.dispatch(signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::task;
    use std::cell::Cell;
    use std::rc::Rc;

    fn noop() -> Action {
        Rc::new(|| task(async {}))
    }

    #[test]
    fn test_mapset_id_from_link_or_attribute() {
        let page = Page::with_rows(vec![vec![
            BlockSeed::for_mapset(100),
            BlockSeed::default(),
            BlockSeed {
                title: "huge".to_string(),
                href: Some("/beatmapsets/99999999999".to_string()),
            },
        ]]);
        let blocks = page.blocks();

        assert_eq!(page.mapset_id(blocks[0]), Ok(MapsetId(100)));
        assert_eq!(page.mapset_id(blocks[1]), Err(ViewError::MissingMapsetId(blocks[1])));
        assert!(matches!(
            page.mapset_id(blocks[2]),
            Err(ViewError::InvalidMapsetId { .. })
        ));

        page.stamp_ids(blocks[1], MapsetId(7), None).unwrap();
        assert_eq!(page.mapset_id(blocks[1]), Ok(MapsetId(7)));
        assert_eq!(page.block_by_mapset(MapsetId(7)), Some(blocks[1]));
    }

    #[test]
    fn test_pp_region_is_created_once() {
        let page = Page::with_rows(vec![vec![BlockSeed::for_mapset(1)]]);
        let block = page.blocks()[0];

        page.ensure_pp_region(block).unwrap();
        page.ensure_pp_region(block).unwrap();
        page.mount_pp_button(block, noop()).unwrap();
        page.mount_pp(block, 321.5).unwrap();

        assert_eq!(page.pp_regions_created(block), 1);
        assert_eq!(page.pp_view(block), Some(PpView::Value(321.5)));
    }

    #[test]
    fn test_summary_replaces_failure_placeholder() {
        let page = Page::with_rows(vec![vec![BlockSeed::for_mapset(1)]]);
        let block = page.blocks()[0];

        page.mount_failure(block, noop()).unwrap();
        page.mount_failure(block, noop()).unwrap();
        assert!(page.has_failure(block));

        page.mount_info(block, "5★").unwrap();
        assert!(!page.has_failure(block));
        assert_eq!(page.info_text(block).as_deref(), Some("5★"));
        assert!(page.click_retry(block).is_none());
    }

    #[test]
    fn test_removed_block_is_detached() {
        let page = Page::with_rows(vec![vec![BlockSeed::for_mapset(1), BlockSeed::for_mapset(2)]]);
        let blocks = page.blocks();
        page.show_tooltip(blocks[0], BeatmapId(10), "tip").unwrap();

        page.remove_block(blocks[0]);
        assert_eq!(page.blocks(), vec![blocks[1]]);
        assert_eq!(page.mount_info(blocks[0], "x"), Err(ViewError::Detached(blocks[0])));
        assert_eq!(page.tooltip_count(), 0);
        assert_eq!(page.blocks_in_rows(&page.rows()), vec![blocks[1]]);
    }

    #[test]
    fn test_indicator_follows_beatmap_attribute() {
        let page = Page::with_rows(vec![vec![BlockSeed::for_mapset(100)]]);
        let block = page.blocks()[0];

        page.stamp_ids(block, MapsetId(100), Some(BeatmapId(2))).unwrap();
        assert_eq!(page.block_displaying("2"), Some(block));

        page.update_difficulty_indicator(MapsetId(100), BeatmapId(1)).unwrap();
        assert_eq!(page.block_displaying("2"), None);
        assert_eq!(page.beatmap_id(block).as_deref(), Some("1"));
        assert_eq!(
            page.update_difficulty_indicator(MapsetId(5), BeatmapId(1)),
            Err(ViewError::NoBlockForMapset(MapsetId(5)))
        );
    }

    #[tokio::test]
    async fn test_append_rows_notifies_listing_subscribers() {
        let page = Page::with_rows(vec![]);
        let seen = Rc::new(Cell::new(0));
        let sink = Rc::clone(&seen);
        page.on_rows_added(
            LISTING,
            Rc::new(move |rows| {
                let sink = Rc::clone(&sink);
                task(async move { sink.set(sink.get() + rows.len()) })
            }),
        );

        page.append_rows(vec![vec![BlockSeed::for_mapset(1)], vec![BlockSeed::for_mapset(2)]])
            .await;
        assert_eq!(seen.get(), 2);
        assert_eq!(page.blocks().len(), 2);
    }

    #[tokio::test]
    async fn test_listing_absent_fails_fetch() {
        let page = Page::from_html("<html><body></body></html>");
        assert_eq!(page.fetch_rows().await, Err(ViewError::ListingNotFound));
    }

    #[test]
    fn test_report_lists_blocks() {
        let page = Page::with_rows(vec![vec![BlockSeed::for_mapset(100)]]);
        let block = page.blocks()[0];
        page.stamp_ids(block, MapsetId(100), Some(BeatmapId(2))).unwrap();
        page.mount_info(block, "5.8★ bpm 180").unwrap();
        page.mount_pp(block, 250.0).unwrap();

        let report = page.render_report();
        assert!(report.contains("[mapset 100] Mapset 100 (beatmap 2)"));
        assert!(report.contains("5.8★ bpm 180"));
        assert!(report.contains("pp: 250.00"));
    }
}
