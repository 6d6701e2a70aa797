//! Reads a saved beatmap listing page into block seeds.

use super::BlockSeed;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

macro_rules! selector {
    ($e: expr) => {{
        static SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse($e).unwrap());
        &*SELECTOR
    }};
}

pub const LISTING: &str = ".beatmapsets__items";
pub const ROW: &str = ".beatmapsets__items-row";
pub const ITEM: &str = ".beatmapsets__item";
pub const POPUP_GROUP: &str = ".beatmaps-popup__group";

const MAPSET_PATH: &str = "/beatmapsets/";

/// Rows of a listing page, in document order.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Whether the listing container exists at all.
    pub present: bool,
    pub rows: Vec<Vec<BlockSeed>>,
}

pub fn parse_listing(html: &Html) -> Listing {
    let Some(container) = html.select(selector!(LISTING)).next() else {
        return Listing::default();
    };

    let rows = container
        .select(selector!(ROW))
        .map(|row| row.select(selector!(ITEM)).map(parse_item).collect())
        .collect();

    Listing {
        present: true,
        rows,
    }
}

fn parse_item(item: ElementRef) -> BlockSeed {
    let title = item
        .select(selector!(".beatmapset-panel__info-row--title"))
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    let href = item
        .select(selector!(r#"a[href*="/beatmapsets/"]"#))
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    BlockSeed { title, href }
}

/// Digits following `/beatmapsets/` in a link, e.g. `1234` in
/// `https://osu.ppy.sh/beatmapsets/1234#osu/5678`.
pub fn mapset_id_from_href(href: &str) -> Option<&str> {
    let start = href.find(MAPSET_PATH)? + MAPSET_PATH.len();
    let rest = &href[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}
