use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::config::Gains;

// ---------------------------------------------------------------------------
// Gain presets
// ---------------------------------------------------------------------------

/// Ready-made gain sets for exploring the loop's behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GainPreset {
    /// Well-damped recovery with a little integral action.
    Balanced,
    /// Fast, stiff response; rides close to the slew limit.
    Aggressive,
    /// Weak but still stabilizing.
    Sluggish,
    /// Proportional only: rings around upright.
    Oscillating,
    /// Too little stiffness to hold gravity; falls over.
    Unstable,
}

impl GainPreset {
    pub const ALL: [GainPreset; 5] = [
        GainPreset::Balanced,
        GainPreset::Aggressive,
        GainPreset::Sluggish,
        GainPreset::Oscillating,
        GainPreset::Unstable,
    ];

    pub fn gains(self) -> Gains {
        match self {
            GainPreset::Balanced => Gains::new(2.0, 0.1, 0.5),
            GainPreset::Aggressive => Gains::new(5.0, 0.5, 1.0),
            GainPreset::Sluggish => Gains::new(0.5, 0.0, 0.1),
            GainPreset::Oscillating => Gains::new(3.0, 0.0, 0.0),
            GainPreset::Unstable => Gains::new(0.1, 0.0, 0.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GainPreset::Balanced => "Balanced",
            GainPreset::Aggressive => "Aggressive",
            GainPreset::Sluggish => "Sluggish",
            GainPreset::Oscillating => "Oscillating",
            GainPreset::Unstable => "Unstable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_matches_default_controller() {
        let cfg = crate::control::PidConfig::default();
        assert_eq!(GainPreset::Balanced.gains(), cfg.gains());
    }

    #[test]
    fn every_preset_is_finite() {
        for preset in GainPreset::ALL {
            assert!(preset.gains().is_finite(), "{} has non-finite gains", preset.label());
        }
    }
}
