//! Hard-knee dynamics compressor
//!
//! RMS-envelope compressor applied after the gate to tame level swings
//! before the soundboard mix. The gain computer is the standard linear
//! profile above threshold: `(1/ratio - 1) * (level_db - threshold_db)` dB.

use super::{db_to_level, level_to_db, EnvelopeFollower, LevelType};

#[derive(Debug, Clone)]
pub struct Compressor {
    threshold_db: f32,
    ratio: f32,
    envelope: EnvelopeFollower,
    enabled: bool,
}

impl Compressor {
    pub fn new(
        sample_rate: f32,
        threshold_db: f32,
        ratio: f32,
        attack_ms: f32,
        release_ms: f32,
    ) -> Self {
        let mut envelope = EnvelopeFollower::new(sample_rate, attack_ms, release_ms);
        envelope.set_level_type(LevelType::Rms);
        Self {
            threshold_db: threshold_db.min(0.0),
            ratio: ratio.clamp(1.0, 100.0),
            envelope,
            enabled: true,
        }
    }

    pub fn set_threshold_db(&mut self, threshold_db: f32) {
        self.threshold_db = threshold_db.min(0.0);
    }

    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = ratio.clamp(1.0, 100.0);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn reset(&mut self) {
        self.envelope.reset();
    }

    /// Gain to apply (in dB) for a given envelope level (in dB).
    fn gain_db(&self, level_db: f32) -> f32 {
        if level_db <= self.threshold_db {
            0.0
        } else {
            (self.ratio.recip() - 1.0) * (level_db - self.threshold_db)
        }
    }

    /// Compress one block in place.
    pub fn process(&mut self, block: &mut [f32]) {
        if !self.enabled {
            return;
        }
        for sample in block.iter_mut() {
            let env = self.envelope.process(*sample);
            let gain = db_to_level(self.gain_db(level_to_db(env)));
            *sample *= gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_threshold_is_unchanged() {
        let mut comp = Compressor::new(48_000.0, -12.0, 4.0, 10.0, 80.0);
        // -20 dB is well under a -12 dB threshold
        let mut block = vec![0.1_f32; 4096];
        comp.process(&mut block);
        assert!(block.iter().all(|&s| (s - 0.1).abs() < 1e-6));
    }

    #[test]
    fn test_steady_state_gain_reduction() {
        let mut comp = Compressor::new(48_000.0, -12.0, 4.0, 10.0, 80.0);
        let mut block = vec![1.0_f32; 48_000];
        comp.process(&mut block);

        // 0 dBFS input, 12 dB over threshold at 4:1 -> 9 dB of reduction
        let expected = db_to_level((0.25 - 1.0) * 12.0);
        let last = block[47_999];
        assert!(
            (last - expected).abs() < 1e-3,
            "expected {expected}, got {last}"
        );
    }

    #[test]
    fn test_higher_ratio_reduces_more() {
        let mut gentle = Compressor::new(48_000.0, -12.0, 2.0, 1.0, 80.0);
        let mut hard = Compressor::new(48_000.0, -12.0, 10.0, 1.0, 80.0);
        let mut a = vec![1.0_f32; 48_000];
        let mut b = vec![1.0_f32; 48_000];
        gentle.process(&mut a);
        hard.process(&mut b);
        assert!(b[47_999] < a[47_999]);
    }

    #[test]
    fn test_disabled_compressor_is_transparent() {
        let mut comp = Compressor::new(48_000.0, -40.0, 20.0, 1.0, 1.0);
        comp.set_enabled(false);
        let mut block = vec![1.0_f32; 256];
        comp.process(&mut block);
        assert!(block.iter().all(|&s| s == 1.0));
    }
}
