//! Beatmap set records as returned by the osu! API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a beatmap set (mapset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapsetId(pub u32);

/// Identifier of a single difficulty inside a beatmap set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeatmapId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a numeric identifier: {0:?}")]
pub struct ParseIdError(pub String);

macro_rules! numeric_id {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u32>()
                    .map(Self)
                    .map_err(|_| ParseIdError(s.to_string()))
            }
        }
    };
}

numeric_id!(MapsetId);
numeric_id!(BeatmapId);

/// Ruleset a beatmap is played in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Osu,
    Taiko,
    Fruits,
    Mania,
}

impl GameMode {
    /// The standard ruleset, the only one with an aim/speed breakdown.
    pub fn is_standard(self) -> bool {
        self == GameMode::Osu
    }
}

/// One playable difficulty of a beatmap set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatmapVariant {
    pub id: BeatmapId,
    #[serde(default)]
    pub beatmapset_id: Option<MapsetId>,
    /// Difficulty name.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub mode: GameMode,
    pub difficulty_rating: f64,
    #[serde(default)]
    pub bpm: f64,
    #[serde(default)]
    pub max_combo: u32,
    #[serde(default)]
    pub ar: f64,
    #[serde(default)]
    pub cs: f64,
    /// Overall difficulty.
    #[serde(default)]
    pub accuracy: f64,
    /// HP drain.
    #[serde(default)]
    pub drain: f64,
}

/// A beatmap set with all of its difficulties, in API order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapsetData {
    pub id: MapsetId,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub beatmaps: Vec<BeatmapVariant>,
}

/// Difficulty lookup record: which set a beatmap belongs to, plus its data.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedDiffEntry {
    pub mapset_id: MapsetId,
    pub map: BeatmapVariant,
}
