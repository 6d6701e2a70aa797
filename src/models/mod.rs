pub mod beatmap;
pub mod settings;

pub use beatmap::{BeatmapId, BeatmapVariant, CachedDiffEntry, MapsetData, MapsetId};
pub use settings::Settings;
