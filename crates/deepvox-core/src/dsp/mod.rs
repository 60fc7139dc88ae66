//! Real-time DSP blocks for the voice chain
//!
//! Mic blocks run through high-pass → pitch shift → gate → compressor before
//! the soundboard mix. Every processor here is mono, allocation-free after
//! construction, and keeps its own state across blocks.

pub mod compressor;
pub mod gate;
pub mod highpass;
pub mod pitch;

pub use compressor::Compressor;
pub use gate::NoiseGate;
pub use highpass::HighPassFilter;
pub use pitch::PitchShifter;

use std::f32::consts::TAU;

/// Convert decibels to a linear amplitude level.
#[inline]
pub fn db_to_level(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert a linear amplitude level to decibels.
///
/// Levels at or below `1e-10` are floored to `-200.0` dB to avoid `-inf`.
#[inline]
pub fn level_to_db(level: f32) -> f32 {
    if level <= 1e-10 {
        -200.0
    } else {
        20.0 * level.log10()
    }
}

/// Level calculation used by [`EnvelopeFollower`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelType {
    Peak,
    Rms,
}

/// One-pole attack/release envelope follower.
///
/// Uses the "constant time envelope" coefficient form from the JUCE
/// ballistics filter: `cte = exp((-TAU * 1000 / sample_rate) / time_ms)`.
/// Shared by the gate (peak) and the compressor (RMS).
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    y_old: f32,
    cte_attack: f32,
    cte_release: f32,
    level_type: LevelType,
    sample_rate: f32,
}

impl EnvelopeFollower {
    pub fn new(sample_rate: f32, attack_ms: f32, release_ms: f32) -> Self {
        let mut follower = Self {
            y_old: 0.0,
            cte_attack: 0.0,
            cte_release: 0.0,
            level_type: LevelType::Peak,
            sample_rate,
        };
        follower.set_attack_time_ms(attack_ms);
        follower.set_release_time_ms(release_ms);
        follower
    }

    pub fn set_attack_time_ms(&mut self, time_ms: f32) {
        self.cte_attack = self.calculate_cte(time_ms);
    }

    pub fn set_release_time_ms(&mut self, time_ms: f32) {
        self.cte_release = self.calculate_cte(time_ms);
    }

    pub fn set_level_type(&mut self, level_type: LevelType) {
        self.level_type = level_type;
    }

    /// Times under 1µs snap to an instantaneous response.
    fn calculate_cte(&self, time_ms: f32) -> f32 {
        if time_ms < 0.001 {
            0.0
        } else {
            ((-TAU * 1000.0 / self.sample_rate) / time_ms).exp()
        }
    }

    /// Advance the follower by one sample and return the current envelope
    /// as a linear amplitude.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let level = match self.level_type {
            LevelType::Peak => input.abs(),
            LevelType::Rms => input * input,
        };
        let cte = if level > self.y_old {
            self.cte_attack
        } else {
            self.cte_release
        };
        let out = level + cte * (self.y_old - level);
        self.y_old = out;
        match self.level_type {
            LevelType::Peak => out,
            LevelType::Rms => out.sqrt(),
        }
    }

    pub fn reset(&mut self) {
        self.y_old = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_conversions() {
        assert!((db_to_level(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_level(-6.0) - 0.5012).abs() < 1e-3);
        assert!((level_to_db(1.0)).abs() < 1e-6);
        assert_eq!(level_to_db(0.0), -200.0);
    }

    #[test]
    fn test_envelope_tracks_constant_input() {
        let mut env = EnvelopeFollower::new(48_000.0, 5.0, 50.0);
        let mut last = 0.0;
        for _ in 0..48_000 {
            last = env.process(0.8);
        }
        assert!((last - 0.8).abs() < 1e-4);
    }

    #[test]
    fn test_rms_envelope_of_constant_matches_peak() {
        let mut env = EnvelopeFollower::new(48_000.0, 5.0, 50.0);
        env.set_level_type(LevelType::Rms);
        let mut last = 0.0;
        for _ in 0..48_000 {
            last = env.process(0.8);
        }
        assert!((last - 0.8).abs() < 1e-4);
    }

    #[test]
    fn test_envelope_decays_on_silence() {
        let mut env = EnvelopeFollower::new(48_000.0, 1.0, 20.0);
        for _ in 0..4800 {
            env.process(1.0);
        }
        let mut last = 1.0;
        for _ in 0..48_000 {
            last = env.process(0.0);
        }
        assert!(last < 1e-3);
    }
}
