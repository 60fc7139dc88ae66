//! Final mix stage
//!
//! Sums the soundboard voices into the processed mic block and applies the
//! output clipping policy: a hard per-sample clamp to [-1.0, 1.0]. The clamp
//! is deliberate — at speech levels plus a handful of effects the audible
//! difference from a limiter is negligible, and the clamp is stateless and
//! exactly bounded.

use crate::types::Sample;

use super::voice::VoicePool;

/// Hard-clamp every sample to [-1.0, 1.0].
#[inline]
pub fn hard_clamp(block: &mut [Sample]) {
    for sample in block.iter_mut() {
        *sample = sample.clamp(-1.0, 1.0);
    }
}

/// Output mixer: soundboard summation + hard clamp.
pub struct Mixer {
    soundboard_gain: f32,
}

impl Mixer {
    pub fn new(soundboard_gain: f32) -> Self {
        Self { soundboard_gain }
    }

    pub fn set_soundboard_gain(&mut self, gain: f32) {
        self.soundboard_gain = gain.max(0.0);
    }

    pub fn soundboard_gain(&self) -> f32 {
        self.soundboard_gain
    }

    /// Mix the voice pool into `block` (already holding the processed mic
    /// signal) and clamp the result.
    pub fn mix(&self, pool: &mut VoicePool, block: &mut [Sample]) {
        pool.mix_into(block, self.soundboard_gain);
        hard_clamp(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::gc::gc_handle;
    use crate::soundboard::SoundEffect;
    use basedrop::Shared;

    fn effect(samples: Vec<f32>) -> Shared<SoundEffect> {
        Shared::new(
            &gc_handle(),
            SoundEffect {
                name: "test".to_string(),
                path: "test.wav".into(),
                samples,
                sample_rate: 48_000,
            },
        )
    }

    #[test]
    fn test_hard_clamp_bounds_output() {
        let mut block = vec![1.7, -2.3, 0.4, f32::INFINITY, f32::NEG_INFINITY];
        hard_clamp(&mut block);
        assert_eq!(block, vec![1.0, -1.0, 0.4, 1.0, -1.0]);
    }

    #[test]
    fn test_hot_mix_is_clamped() {
        let mixer = Mixer::new(1.0);
        let mut pool = VoicePool::new(8);
        // two full-scale voices over a 0.8 mic block would hit 2.8
        pool.try_trigger(effect(vec![1.0; 8]), 1.0);
        pool.try_trigger(effect(vec![1.0; 8]), 1.0);

        let mut block = vec![0.8_f32; 8];
        mixer.mix(&mut pool, &mut block);
        assert!(block.iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_silence_stays_silent() {
        let mixer = Mixer::new(1.0);
        let mut pool = VoicePool::new(8);
        let mut block = vec![0.0_f32; 64];
        mixer.mix(&mut pool, &mut block);
        assert!(block.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_soundboard_gain_scales_voices_only() {
        let mixer = Mixer::new(0.5);
        let mut pool = VoicePool::new(8);
        pool.try_trigger(effect(vec![0.5; 4]), 1.0);

        let mut block = vec![0.25_f32; 4];
        mixer.mix(&mut pool, &mut block);
        // mic content untouched, voice scaled by the master gain
        assert!(block.iter().all(|&s| (s - 0.5).abs() < 1e-7));
    }
}
