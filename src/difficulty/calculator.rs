//! osu! difficulty calculation using rosu-pp.

use super::{DeepDifficultyData, DifficultyBreakdown};
use rosu_pp::any::DifficultyAttributes;

/// Error type for difficulty calculation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    /// The file could not be decoded as a beatmap.
    #[error("invalid beatmap: {0}")]
    InvalidBeatmap(String),
    #[error("no hit objects found")]
    NoHitObjects,
}

/// Stateless calculator turning raw `.osu` content into [`DeepDifficultyData`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OsuCalculator;

impl OsuCalculator {
    /// Calculates stars, breakdown and SS pp for a nomod play of the map.
    pub fn calculate_from_bytes(bytes: &[u8]) -> Result<DeepDifficultyData, CalcError> {
        let map = rosu_pp::Beatmap::from_bytes(bytes)
            .map_err(|e| CalcError::InvalidBeatmap(e.to_string()))?;

        if map.hit_objects.is_empty() {
            return Err(CalcError::NoHitObjects);
        }

        let attrs = rosu_pp::Difficulty::new().calculate(&map);
        let stars = attrs.stars();
        let difficulty = match &attrs {
            DifficultyAttributes::Osu(osu) => Some(DifficultyBreakdown {
                aim: osu.aim,
                speed: osu.speed,
                n_circles: osu.n_circles,
                n_sliders: osu.n_sliders,
                speed_note_count: osu.speed_note_count,
                flashlight: osu.flashlight,
            }),
            _ => None,
        };

        let pp = rosu_pp::Performance::new(attrs).calculate().pp();

        Ok(DeepDifficultyData {
            pp,
            stars,
            difficulty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn osu_file(mode: u8, hit_objects: &str) -> String {
        format!(
            "osu file format v14\n\n\
             [General]\nAudioFilename: audio.mp3\nMode: {mode}\n\n\
             [Difficulty]\nHPDrainRate:5\nCircleSize:4\nOverallDifficulty:8\nApproachRate:9\n\
             SliderMultiplier:1.4\nSliderTickRate:1\n\n\
             [TimingPoints]\n0,500,4,2,0,50,1,0\n\n\
             [HitObjects]\n{hit_objects}"
        )
    }

    #[test]
    fn test_standard_map_has_breakdown() {
        let content = osu_file(
            0,
            "64,192,1000,1,0,0:0:0:0:\n\
             256,192,1250,1,0,0:0:0:0:\n\
             448,192,1500,1,0,0:0:0:0:\n\
             256,64,1750,1,0,0:0:0:0:\n",
        );

        let data = OsuCalculator::calculate_from_bytes(content.as_bytes()).unwrap();
        let breakdown = data.difficulty.expect("standard maps carry a breakdown");
        assert_eq!(breakdown.n_circles, 4);
        assert_eq!(breakdown.n_sliders, 0);
        assert!(data.stars > 0.0);
        assert!(data.pp > 0.0);
    }

    #[test]
    fn test_mania_map_has_no_breakdown() {
        let content = osu_file(
            3,
            "64,192,1000,1,0,0:0:0:0:\n\
             192,192,1250,1,0,0:0:0:0:\n\
             320,192,1500,1,0,0:0:0:0:\n",
        );

        let data = OsuCalculator::calculate_from_bytes(content.as_bytes()).unwrap();
        assert!(data.difficulty.is_none());
    }

    #[test]
    fn test_map_without_objects_is_rejected() {
        let content = osu_file(0, "");
        assert!(OsuCalculator::calculate_from_bytes(content.as_bytes()).is_err());
        assert!(OsuCalculator::calculate_from_bytes(b"").is_err());
    }
}
