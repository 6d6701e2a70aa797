//! Difficulty attributes computed from a beatmap file.
//!
//! The listing only shows API metadata (stars, bpm, AR...). Everything in
//! this module is the "deep" data: a per-skill breakdown and the SS
//! performance value, calculated on demand with rosu-pp.

pub mod calculator;

pub use calculator::{CalcError, OsuCalculator};

/// Per-skill breakdown of a standard-mode beatmap.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DifficultyBreakdown {
    pub aim: f64,
    pub speed: f64,
    pub n_circles: u32,
    pub n_sliders: u32,
    pub speed_note_count: f64,
    pub flashlight: f64,
}

/// Calculated difficulty of one beatmap.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeepDifficultyData {
    /// Performance points for an SS with no mods.
    pub pp: f64,
    pub stars: f64,
    /// Only present for standard-mode beatmaps.
    pub difficulty: Option<DifficultyBreakdown>,
}
