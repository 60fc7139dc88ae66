//! Rumble filter for the mic path
//!
//! Fourth-order Butterworth high-pass built from two cascaded RBJ biquad
//! sections. Runs first in the chain so desk thumps and handling noise never
//! reach the phase vocoder.

use std::f32::consts::PI;

/// Default rumble cutoff in Hz.
pub const DEFAULT_CUTOFF_HZ: f32 = 80.0;

// Section Qs for a 4th-order Butterworth response.
const BUTTERWORTH_Q: [f32; 2] = [0.541_196_1, 1.306_563_0];

/// Biquad filter state (direct form 1, mono)
#[derive(Debug, Clone, Default)]
struct BiquadState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl BiquadState {
    #[inline]
    fn process(&mut self, input: f32, coeffs: &BiquadCoeffs) -> f32 {
        let out = coeffs.b0 * input + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = out;
        out
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Biquad filter coefficients
#[derive(Debug, Clone)]
struct BiquadCoeffs {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl BiquadCoeffs {
    /// RBJ high-pass coefficients for the given cutoff and section Q.
    fn high_pass(freq: f32, q: f32, sample_rate: f32) -> Self {
        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * q);

        let a0 = 1.0 + alpha;
        Self {
            b0: ((1.0 + cos_w0) / 2.0) / a0,
            b1: (-(1.0 + cos_w0)) / a0,
            b2: ((1.0 + cos_w0) / 2.0) / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
        }
    }
}

/// Fourth-order high-pass filter (two cascaded biquad sections).
#[derive(Debug, Clone)]
pub struct HighPassFilter {
    coeffs: [BiquadCoeffs; 2],
    state: [BiquadState; 2],
    enabled: bool,
}

impl HighPassFilter {
    pub fn new(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self {
            coeffs: [
                BiquadCoeffs::high_pass(cutoff_hz, BUTTERWORTH_Q[0], sample_rate),
                BiquadCoeffs::high_pass(cutoff_hz, BUTTERWORTH_Q[1], sample_rate),
            ],
            state: [BiquadState::default(), BiquadState::default()],
            enabled: true,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn reset(&mut self) {
        self.state[0].reset();
        self.state[1].reset();
    }

    /// Filter one block in place.
    pub fn process(&mut self, block: &mut [f32]) {
        if !self.enabled {
            return;
        }
        for sample in block.iter_mut() {
            let stage1 = self.state[0].process(*sample, &self.coeffs[0]);
            *sample = self.state[1].process(stage1, &self.coeffs[1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn test_dc_is_blocked() {
        let mut filter = HighPassFilter::new(80.0, 48_000.0);
        let mut block = vec![1.0_f32; 48_000];
        filter.process(&mut block);
        // after the transient settles, DC should be essentially gone
        assert!(rms(&block[40_000..]) < 1e-3);
    }

    #[test]
    fn test_speech_band_passes() {
        let mut filter = HighPassFilter::new(80.0, 48_000.0);
        let mut block: Vec<f32> = (0..48_000)
            .map(|i| (TAU * 1000.0 * i as f32 / 48_000.0).sin() * 0.5)
            .collect();
        let input_rms = rms(&block);
        filter.process(&mut block);
        let output_rms = rms(&block[4800..]);
        assert!((output_rms - input_rms).abs() / input_rms < 0.02);
    }

    #[test]
    fn test_low_rumble_is_attenuated() {
        let mut filter = HighPassFilter::new(80.0, 48_000.0);
        let mut block: Vec<f32> = (0..48_000)
            .map(|i| (TAU * 20.0 * i as f32 / 48_000.0).sin() * 0.5)
            .collect();
        let input_rms = rms(&block);
        filter.process(&mut block);
        // 20 Hz sits two octaves under the cutoff: >40 dB down for order 4
        assert!(rms(&block[24_000..]) < input_rms * 0.02);
    }
}
