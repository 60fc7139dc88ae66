//! Soundboard voices
//!
//! A voice is one playback of one effect: a `Shared` waveform reference, a
//! cursor, and a gain. Every trigger makes a new voice, so overlapping plays
//! of the same effect are independent. The pool is a fixed-capacity vec that
//! never reallocates on the RT thread; dropping a finished voice only drops
//! a `Shared` reference, which basedrop defers off the audio thread.

use basedrop::Shared;

use crate::soundboard::SoundEffect;
use crate::types::Sample;

/// Lifecycle of a single voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    /// Triggered, not yet mixed into a block
    Pending,
    /// Contributing samples
    Playing,
    /// Waveform exhausted; removed after the current mix pass
    Finished,
}

pub struct Voice {
    effect: Shared<SoundEffect>,
    cursor: usize,
    gain: f32,
    state: VoiceState,
}

impl Voice {
    pub fn new(effect: Shared<SoundEffect>, gain: f32) -> Self {
        Self {
            effect,
            cursor: 0,
            gain,
            state: VoiceState::Pending,
        }
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == VoiceState::Finished
    }

    /// Add this voice's next slice into `out` and advance the cursor.
    ///
    /// Past the end of the waveform the contribution is zero (no padding is
    /// written; the slice is simply shorter than the block).
    pub fn mix_into(&mut self, out: &mut [Sample], master_gain: f32) {
        self.state = VoiceState::Playing;

        let samples = &self.effect.samples;
        let remaining = samples.len().saturating_sub(self.cursor);
        let count = remaining.min(out.len());
        let gain = self.gain * master_gain;

        for (dst, src) in out[..count]
            .iter_mut()
            .zip(&samples[self.cursor..self.cursor + count])
        {
            *dst += src * gain;
        }
        self.cursor += count;

        if self.cursor >= samples.len() {
            self.state = VoiceState::Finished;
        }
    }
}

/// Fixed-capacity pool of active voices.
pub struct VoicePool {
    voices: Vec<Voice>,
    max_voices: usize,
}

impl VoicePool {
    pub fn new(max_voices: usize) -> Self {
        Self {
            voices: Vec::with_capacity(max_voices),
            max_voices,
        }
    }

    /// Start a new voice. Returns `false` if every slot is busy; the caller
    /// reports the drop, and the rejected `Shared` reference is simply
    /// released (deferred deallocation makes that RT-safe).
    pub fn try_trigger(&mut self, effect: Shared<SoundEffect>, gain: f32) -> bool {
        if self.voices.len() >= self.max_voices {
            return false;
        }
        self.voices.push(Voice::new(effect, gain));
        true
    }

    /// Mix every voice's next slice into `out`, then remove finished voices.
    pub fn mix_into(&mut self, out: &mut [Sample], master_gain: f32) {
        for voice in &mut self.voices {
            voice.mix_into(out, master_gain);
        }
        self.voices.retain(|v| !v.is_finished());
    }

    /// Cut all voices immediately.
    pub fn clear(&mut self) {
        self.voices.clear();
    }

    pub fn active(&self) -> usize {
        self.voices.len()
    }

    pub fn capacity(&self) -> usize {
        self.max_voices
    }
}
