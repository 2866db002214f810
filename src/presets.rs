use crate::config::GateConfig;
use serde::{Deserialize, Serialize};

// =============================================================================
// GATE FACTORY PRESETS
// =============================================================================

/// Factory gate settings for common recording situations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GatePreset {
    #[serde(rename = "Reference")]
    #[default]
    Reference,
    #[serde(rename = "Gentle")]
    Gentle,
    #[serde(rename = "Aggressive")]
    Aggressive,
}

impl GatePreset {
    pub const ALL: [GatePreset; 3] = [
        GatePreset::Reference,
        GatePreset::Gentle,
        GatePreset::Aggressive,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GatePreset::Reference => "Reference",
            GatePreset::Gentle => "Gentle",
            GatePreset::Aggressive => "Aggressive",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GatePreset::Reference => "Full-depth gate with light frequency smoothing",
            GatePreset::Gentle => "Partial attenuation for speech over mild room noise",
            GatePreset::Aggressive => "Low threshold and wide smoothing for loud, steady noise",
        }
    }

    /// Gate parameters (std_thresh, freq_smoothing, time_smoothing, decrease_ratio)
    pub fn config(&self) -> GateConfig {
        match self {
            GatePreset::Reference => GateConfig::default(),
            GatePreset::Gentle => GateConfig {
                std_thresh: 2.0,
                freq_smoothing: 2,
                time_smoothing: 1,
                decrease_ratio: 0.6,
            },
            GatePreset::Aggressive => GateConfig {
                // Lower threshold lets more of the noise distribution through the mask
                std_thresh: 1.0,
                freq_smoothing: 4,
                time_smoothing: 2,
                decrease_ratio: 1.0,
            },
        }
    }

    /// Case-insensitive lookup by preset name.
    pub fn from_name(name: &str) -> Option<GatePreset> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for GatePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
