//! Common types for the deepvox engine
//!
//! The engine processes audio as fixed-length mono blocks of `f32` samples.
//! Everything on the real-time path works on pre-allocated [`MonoBuffer`]s
//! whose working length is adjusted without touching the allocator.

/// Default sample rate for the engine (48kHz). The actual rate is taken from
/// [`crate::config::EngineConfig`] when the streams open.
pub const SAMPLE_RATE: u32 = 48_000;

/// Default block size in frames. One block per real-time cycle;
/// 1024 frames at 48kHz is ~21ms of audio.
pub const BLOCK_SIZE: usize = 1024;

/// Maximum block size to pre-allocate for real-time safety.
/// Covers every buffer size a device is likely to negotiate.
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Default number of concurrently playing soundboard voices.
pub const MAX_VOICES: usize = 8;

/// Audio sample type (32-bit float throughout the chain).
pub type Sample = f32;

/// A mono audio buffer, the unit of work for the real-time chain.
///
/// Buffers on the real-time path are allocated once at [`MAX_BLOCK_SIZE`]
/// capacity; per-cycle length changes go through [`set_len_from_capacity`]
/// which never allocates.
///
/// [`set_len_from_capacity`]: MonoBuffer::set_len_from_capacity
#[derive(Debug, Clone)]
pub struct MonoBuffer {
    samples: Vec<Sample>,
}

impl MonoBuffer {
    /// Create an empty buffer with the given capacity in frames.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Create a buffer filled with silence.
    pub fn silence(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
        }
    }

    /// Create a buffer from a sample slice.
    pub fn from_slice(samples: &[Sample]) -> Self {
        Self {
            samples: samples.to_vec(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Set the working length of a pre-allocated buffer (real-time safe).
    ///
    /// Newly exposed frames are silenced. Panics in debug builds if the
    /// requested length exceeds the existing capacity.
    #[inline]
    pub fn set_len_from_capacity(&mut self, new_len: usize) {
        if new_len > self.samples.len() {
            debug_assert!(
                new_len <= self.samples.capacity(),
                "set_len_from_capacity called with len > capacity"
            );
            self.samples.resize(new_len, 0.0);
        } else {
            self.samples.truncate(new_len);
        }
    }

    /// Fill the buffer with silence.
    #[inline]
    pub fn fill_silence(&mut self) {
        self.samples.fill(0.0);
    }

    #[inline]
    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Sample] {
        &mut self.samples
    }

    /// Copy from a sample slice (real-time safe if capacity suffices).
    pub fn copy_from_slice(&mut self, source: &[Sample]) {
        self.set_len_from_capacity(source.len());
        self.samples.copy_from_slice(source);
    }

    /// Scale every sample by a factor.
    pub fn scale(&mut self, factor: Sample) {
        for s in &mut self.samples {
            *s *= factor;
        }
    }

    /// Peak amplitude in the buffer.
    pub fn peak(&self) -> Sample {
        self.samples.iter().fold(0.0, |acc, s| acc.max(s.abs()))
    }

    /// True if every sample is a finite number.
    pub fn is_finite(&self) -> bool {
        self.samples.iter().all(|s| s.is_finite())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Sample> {
        self.samples.iter_mut()
    }
}

impl Default for MonoBuffer {
    fn default() -> Self {
        Self { samples: Vec::new() }
    }
}

impl std::ops::Index<usize> for MonoBuffer {
    type Output = Sample;

    #[inline]
    fn index(&self, index: usize) -> &Sample {
        &self.samples[index]
    }
}

impl std::ops::IndexMut<usize> for MonoBuffer {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Sample {
        &mut self.samples[index]
    }
}
