//! Engine configuration
//!
//! `EngineConfig` is the single source for every tunable the engine reads at
//! start: canonical audio format, device selection, chain parameters, and
//! soundboard settings. Persisted as YAML under `~/.deepvox`.

pub mod io;
pub mod paths;

pub use io::{load_config, save_config};
pub use paths::{default_base_dir, default_config_path, default_soundboard_path};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{BLOCK_SIZE, MAX_VOICES, SAMPLE_RATE};

/// Noise gate parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub enabled: bool,
    /// Open threshold as a linear amplitude
    pub threshold: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.01,
            attack_ms: 5.0,
            release_ms: 50.0,
        }
    }
}

/// Compressor parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorConfig {
    pub enabled: bool,
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_db: -12.0,
            ratio: 4.0,
            attack_ms: 10.0,
            release_ms: 80.0,
        }
    }
}

/// Full engine configuration.
///
/// Unknown fields in the YAML are ignored and missing fields take their
/// defaults, so configs survive version changes in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Canonical sample rate for the whole chain
    pub sample_rate: u32,
    /// Preferred frames per block (the device may negotiate another size)
    pub block_size: usize,

    /// Capture device name; `None` picks the system default
    pub input_device: Option<String>,
    /// Playback device name; `None` picks the system default
    pub output_device: Option<String>,

    /// Voice pitch shift in semitones, clamped to [-12, 0] on apply
    pub pitch_semitones: f32,
    pub highpass_enabled: bool,
    pub highpass_cutoff_hz: f32,
    pub gate: GateConfig,
    pub compressor: CompressorConfig,

    /// Soundboard directory; `None` means `~/.deepvox/soundboard`
    pub soundboard_dir: Option<PathBuf>,
    /// Master gain applied to all soundboard voices
    pub soundboard_gain: f32,
    /// Maximum concurrently playing voices
    pub max_voices: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            block_size: BLOCK_SIZE,
            input_device: None,
            output_device: None,
            pitch_semitones: -7.0,
            highpass_enabled: true,
            highpass_cutoff_hz: 80.0,
            gate: GateConfig::default(),
            compressor: CompressorConfig::default(),
            soundboard_dir: None,
            soundboard_gain: 1.0,
            max_voices: MAX_VOICES,
        }
    }
}

impl EngineConfig {
    /// Resolve the soundboard directory, falling back to the default.
    pub fn soundboard_path(&self) -> PathBuf {
        self.soundboard_dir
            .clone()
            .unwrap_or_else(default_soundboard_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_canon() {
        let config = EngineConfig::default();
        assert_eq!(config.sample_rate, 48_000);
        assert_eq!(config.block_size, 1024);
        assert_eq!(config.pitch_semitones, -7.0);
        assert_eq!(config.max_voices, 8);
        assert!(config.gate.enabled);
        assert_eq!(config.gate.threshold, 0.01);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: EngineConfig = serde_yaml::from_str("pitch_semitones: -5.0").unwrap();
        assert_eq!(config.pitch_semitones, -5.0);
        assert_eq!(config.sample_rate, 48_000);
        assert_eq!(config.compressor, CompressorConfig::default());
    }

    #[test]
    fn test_soundboard_path_override() {
        let mut config = EngineConfig::default();
        assert!(config.soundboard_path().ends_with("soundboard"));

        config.soundboard_dir = Some(PathBuf::from("/tmp/effects"));
        assert_eq!(config.soundboard_path(), PathBuf::from("/tmp/effects"));
    }
}
