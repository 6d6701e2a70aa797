//! Pure helpers: representative variant choice, display strings, id parsing.

use crate::difficulty::DifficultyBreakdown;
use crate::models::{BeatmapId, BeatmapVariant, MapsetData};
use std::fmt;

/// Highest `difficulty_rating` of the set; the first one wins ties.
pub fn representative_variant(data: Option<&MapsetData>) -> Option<&BeatmapVariant> {
    data?.beatmaps.iter().fold(None, |best, map| match best {
        Some(best) if map.difficulty_rating <= best.difficulty_rating => Some(best),
        _ => Some(map),
    })
}

/// One-line summary shown in a listing block.
pub fn beatmap_summary(map: &BeatmapVariant) -> String {
    format!(
        "{}★ bpm {} combo {} ar {} cs {} od {} hp {}",
        map.difficulty_rating, map.bpm, map.max_combo, map.ar, map.cs, map.accuracy, map.drain
    )
}

/// Tooltip text for the deep-info popup.
pub fn difficulty_breakdown(breakdown: &DifficultyBreakdown) -> String {
    [
        format!("Aim diff: {:.1}", breakdown.aim),
        format!("Speed diff: {:.1}", breakdown.speed),
        format!("Circles: {}", breakdown.n_circles),
        format!("Sliders: {}", breakdown.n_sliders),
        format!("Speed note count: {:.1}", breakdown.speed_note_count),
        format!("FL Diff: {:.2}", breakdown.flashlight),
    ]
    .join(", ")
}

/// Beatmap id carried by a difficulty selector, as text or as a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchTarget {
    Text(String),
    Numeric(u32),
}

impl SwitchTarget {
    /// Numeric form of the id. Invalid text is logged and yields `None`,
    /// which never matches any cached entry.
    pub fn numeric(&self) -> Option<BeatmapId> {
        match self {
            SwitchTarget::Numeric(id) => Some(BeatmapId(*id)),
            SwitchTarget::Text(raw) => match raw.parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    log::warn!("SWITCH: invalid beatmapId {raw:?}");
                    None
                }
            },
        }
    }
}

impl fmt::Display for SwitchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchTarget::Text(raw) => f.write_str(raw),
            SwitchTarget::Numeric(id) => write!(f, "{id}"),
        }
    }
}

impl From<String> for SwitchTarget {
    fn from(raw: String) -> Self {
        SwitchTarget::Text(raw)
    }
}

impl From<&str> for SwitchTarget {
    fn from(raw: &str) -> Self {
        SwitchTarget::Text(raw.to_string())
    }
}

impl From<u32> for SwitchTarget {
    fn from(id: u32) -> Self {
        SwitchTarget::Numeric(id)
    }
}

impl From<BeatmapId> for SwitchTarget {
    fn from(id: BeatmapId) -> Self {
        SwitchTarget::Numeric(id.0)
    }
}
