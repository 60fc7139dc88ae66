//! Envelope-followed noise gate
//!
//! Mutes the mic path whenever the followed level drops below a linear
//! threshold. The gate gain itself slews between closed and open with the
//! same attack/release constants, so opening and closing never click and
//! short dips between syllables do not chatter.

use super::EnvelopeFollower;
use std::f32::consts::TAU;

/// Noise gate with a linear amplitude threshold.
#[derive(Debug, Clone)]
pub struct NoiseGate {
    threshold: f32,
    envelope: EnvelopeFollower,
    gain: f32,
    cte_open: f32,
    cte_close: f32,
    enabled: bool,
}

impl NoiseGate {
    pub fn new(sample_rate: f32, threshold: f32, attack_ms: f32, release_ms: f32) -> Self {
        let cte = |time_ms: f32| ((-TAU * 1000.0 / sample_rate) / time_ms.max(0.001)).exp();
        Self {
            threshold,
            envelope: EnvelopeFollower::new(sample_rate, attack_ms, release_ms),
            gain: 0.0,
            cte_open: cte(attack_ms),
            cte_close: cte(release_ms),
            enabled: true,
        }
    }

    /// Set the open threshold as a linear amplitude (not dB).
    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.max(0.0);
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn reset(&mut self) {
        self.envelope.reset();
        self.gain = 0.0;
    }

    /// Gate one block in place. The applied gain never exceeds 1.
    pub fn process(&mut self, block: &mut [f32]) {
        if !self.enabled {
            return;
        }
        for sample in block.iter_mut() {
            let level = self.envelope.process(*sample);
            let (target, cte) = if level >= self.threshold {
                (1.0, self.cte_open)
            } else {
                (0.0, self.cte_close)
            };
            self.gain = target + cte * (self.gain - target);
            *sample *= self.gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_below_threshold_is_muted() {
        let mut gate = NoiseGate::new(48_000.0, 0.01, 5.0, 50.0);
        let mut block = vec![0.001_f32; 4096];
        gate.process(&mut block);
        assert!(block.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_signal_above_threshold_passes() {
        let mut gate = NoiseGate::new(48_000.0, 0.01, 5.0, 50.0);
        let mut block = vec![0.5_f32; 4096];
        gate.process(&mut block);
        // after the attack slew settles the gate is fully open
        assert_eq!(block[4095], 0.5);
        let passed = block.iter().filter(|&&s| s == 0.5).count();
        assert!(passed > 3000);
    }

    #[test]
    fn test_gain_never_exceeds_unity() {
        let mut gate = NoiseGate::new(48_000.0, 0.01, 0.5, 5.0);
        let mut block = vec![0.25_f32; 8192];
        gate.process(&mut block);
        assert!(block.iter().all(|&s| s.abs() <= 0.25));
    }

    #[test]
    fn test_release_holds_gate_open_briefly() {
        let mut gate = NoiseGate::new(48_000.0, 0.01, 1.0, 50.0);
        let mut loud = vec![0.5_f32; 4800];
        gate.process(&mut loud);

        // 10ms of near-silence is well inside the 50ms release: still open
        let mut quiet = vec![0.005_f32; 480];
        gate.process(&mut quiet);
        assert!(quiet.iter().any(|&s| s != 0.0));

        // a second of near-silence closes the gate again
        let mut long_quiet = vec![0.005_f32; 48_000];
        gate.process(&mut long_quiet);
        assert!(long_quiet[47_999].abs() < 1e-6);
    }

    #[test]
    fn test_disabled_gate_is_transparent() {
        let mut gate = NoiseGate::new(48_000.0, 0.9, 5.0, 50.0);
        gate.set_enabled(false);
        let mut block = vec![0.001_f32; 64];
        gate.process(&mut block);
        assert!(block.iter().all(|&s| s == 0.001));
    }
}
