//! Phase-vocoder pitch shifter
//!
//! Streaming short-time-FFT pitch shifter in the classic smbPitchShift
//! arrangement: a sliding input FIFO feeds windowed 2048-point FFT frames at
//! 4x overlap, analysis phases are unwrapped into true bin frequencies, bins
//! are remapped by the pitch ratio, and resynthesized frames are overlap-added
//! back into an output FIFO. Latency is a fixed [`LATENCY_FRAMES`] samples.
//!
//! At exactly 0 semitones the shifter is a bit-exact passthrough with zero
//! latency; internal state is reset when the shift re-engages so stale
//! spectral frames never leak into the output.

use std::f32::consts::{PI, TAU};
use std::sync::Arc;

use realfft::num_complex::Complex32;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

/// Analysis/synthesis frame length in samples.
pub const FFT_SIZE: usize = 2048;

/// Overlap factor (frames advance by `FFT_SIZE / OVERSAMPLE`).
pub const OVERSAMPLE: usize = 4;

/// Hop size between successive frames.
pub const HOP_SIZE: usize = FFT_SIZE / OVERSAMPLE;

/// Fixed processing latency when the shift is engaged.
pub const LATENCY_FRAMES: usize = FFT_SIZE - HOP_SIZE;

/// Lowest supported shift (one octave down).
pub const MIN_SEMITONES: f32 = -12.0;

/// Highest supported shift (no shift).
pub const MAX_SEMITONES: f32 = 0.0;

/// Mono phase-vocoder pitch shifter.
///
/// All buffers and FFT plans are allocated in [`new`](PitchShifter::new);
/// [`process`](PitchShifter::process) is allocation-free and safe to call
/// from the audio callback.
pub struct PitchShifter {
    semitones: f32,
    ratio: f32,
    sample_rate: f32,

    rover: usize,
    in_fifo: Vec<f32>,
    out_fifo: Vec<f32>,
    output_accum: Vec<f32>,

    window: Vec<f32>,
    // gain that makes 4x-overlapped windowed synthesis sum back to unity
    ola_norm: f32,

    last_phase: Vec<f32>,
    sum_phase: Vec<f32>,
    ana_magn: Vec<f32>,
    ana_freq: Vec<f32>,
    syn_magn: Vec<f32>,
    syn_freq: Vec<f32>,
    syn_weight: Vec<f32>,

    fft_in: Vec<f32>,
    spectrum: Vec<Complex32>,
    fft_out: Vec<f32>,
    fwd_scratch: Vec<Complex32>,
    inv_scratch: Vec<Complex32>,
    fft_forward: Arc<dyn RealToComplex<f32>>,
    fft_inverse: Arc<dyn ComplexToReal<f32>>,
}

impl PitchShifter {
    pub fn new(sample_rate: f32) -> Self {
        let half = FFT_SIZE / 2;

        let window: Vec<f32> = (0..FFT_SIZE)
            .map(|i| {
                let phase = TAU * i as f32 / FFT_SIZE as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect();
        let window_energy: f32 = window.iter().map(|w| w * w).sum();
        let ola_norm = HOP_SIZE as f32 / window_energy;

        let mut planner = RealFftPlanner::<f32>::new();
        let fft_forward = planner.plan_fft_forward(FFT_SIZE);
        let fft_inverse = planner.plan_fft_inverse(FFT_SIZE);
        let fwd_scratch = fft_forward.make_scratch_vec();
        let inv_scratch = fft_inverse.make_scratch_vec();

        Self {
            semitones: 0.0,
            ratio: 1.0,
            sample_rate,

            rover: 0,
            in_fifo: vec![0.0; FFT_SIZE],
            out_fifo: vec![0.0; FFT_SIZE],
            output_accum: vec![0.0; FFT_SIZE],

            window,
            ola_norm,

            last_phase: vec![0.0; half + 1],
            sum_phase: vec![0.0; half + 1],
            ana_magn: vec![0.0; half + 1],
            ana_freq: vec![0.0; half + 1],
            syn_magn: vec![0.0; half + 1],
            syn_freq: vec![0.0; half + 1],
            syn_weight: vec![0.0; half + 1],

            fft_in: vec![0.0; FFT_SIZE],
            spectrum: vec![Complex32::new(0.0, 0.0); half + 1],
            fft_out: vec![0.0; FFT_SIZE],
            fwd_scratch,
            inv_scratch,
            fft_forward,
            fft_inverse,
        }
    }

    /// Set the shift amount in semitones, clamped to
    /// [[`MIN_SEMITONES`], [`MAX_SEMITONES`]].
    ///
    /// Re-engaging from the 0-semitone passthrough resets the vocoder state.
    pub fn set_semitones(&mut self, semitones: f32) {
        let semitones = semitones.clamp(MIN_SEMITONES, MAX_SEMITONES);
        let was_bypassed = self.is_bypassed();
        self.semitones = semitones;
        self.ratio = 2.0_f32.powf(semitones / 12.0);
        if was_bypassed && !self.is_bypassed() {
            self.reset();
        }
    }

    pub fn semitones(&self) -> f32 {
        self.semitones
    }

    /// Latency introduced by the shifter, in samples. Zero while bypassed.
    pub fn latency(&self) -> usize {
        if self.is_bypassed() {
            0
        } else {
            LATENCY_FRAMES
        }
    }

    #[inline]
    fn is_bypassed(&self) -> bool {
        self.semitones == 0.0
    }

    /// Clear all FIFOs and phase state.
    pub fn reset(&mut self) {
        self.rover = 0;
        self.in_fifo.fill(0.0);
        self.out_fifo.fill(0.0);
        self.output_accum.fill(0.0);
        self.last_phase.fill(0.0);
        self.sum_phase.fill(0.0);
    }

    /// Shift one block in place. Identity when the shift is 0 semitones.
    pub fn process(&mut self, block: &mut [f32]) {
        if self.is_bypassed() {
            return;
        }

        if self.rover == 0 {
            self.rover = LATENCY_FRAMES;
        }

        for i in 0..block.len() {
            self.in_fifo[self.rover] = block[i];
            let out_idx = self.rover - LATENCY_FRAMES;
            block[i] = self.out_fifo[out_idx];
            self.out_fifo[out_idx] = 0.0;
            self.rover += 1;

            if self.rover >= FFT_SIZE {
                self.process_frame();
                self.rover = LATENCY_FRAMES;
            }
        }
    }

    /// Analyze, remap, and resynthesize one full frame from the input FIFO.
    fn process_frame(&mut self) {
        let half = FFT_SIZE / 2;
        let freq_per_bin = self.sample_rate / FFT_SIZE as f32;
        // expected phase advance per hop for each bin's center frequency
        let expct = TAU * HOP_SIZE as f32 / FFT_SIZE as f32;
        let oversample = OVERSAMPLE as f32;

        for k in 0..FFT_SIZE {
            self.fft_in[k] = self.in_fifo[k] * self.window[k];
        }
        // lengths are fixed at construction, the transform cannot fail
        let _ = self.fft_forward.process_with_scratch(
            &mut self.fft_in,
            &mut self.spectrum,
            &mut self.fwd_scratch,
        );

        // analysis: unwrap each bin's phase delta into a true frequency
        for k in 0..=half {
            let bin = self.spectrum[k];
            let magn = bin.norm();
            let phase = bin.im.atan2(bin.re);

            let mut delta_phase = phase - self.last_phase[k];
            self.last_phase[k] = phase;

            delta_phase -= k as f32 * expct;
            let mut qpd = (delta_phase / PI).round() as i32;
            if qpd >= 0 {
                qpd += qpd & 1;
            } else {
                qpd -= qpd & 1;
            }
            delta_phase -= PI * qpd as f32;
            delta_phase = oversample * delta_phase / TAU;
            delta_phase += k as f32;

            self.ana_magn[k] = magn;
            self.ana_freq[k] = delta_phase * freq_per_bin;
        }

        // remap bins by the pitch ratio, averaging collisions
        self.syn_magn.fill(0.0);
        self.syn_freq.fill(0.0);
        self.syn_weight.fill(0.0);
        for k in 0..=half {
            let index = (k as f32 * self.ratio).round() as usize;
            if index <= half {
                self.syn_magn[index] += self.ana_magn[k];
                self.syn_freq[index] += self.ana_freq[k] * self.ratio;
                self.syn_weight[index] += 1.0;
            }
        }
        for k in 0..=half {
            if self.syn_weight[k] > 0.0 {
                self.syn_freq[k] /= self.syn_weight[k];
            } else {
                self.syn_freq[k] = k as f32 * freq_per_bin;
            }
        }

        // synthesis: accumulate phase and rebuild the half spectrum
        for k in 0..=half {
            let magn = self.syn_magn[k];
            let mut delta = self.syn_freq[k] - k as f32 * freq_per_bin;
            delta /= freq_per_bin;
            delta = TAU * delta / oversample;
            delta += k as f32 * expct;
            self.sum_phase[k] += delta;
            let phase = self.sum_phase[k];

            if k == 0 || k == half {
                // DC and Nyquist bins must stay purely real
                self.spectrum[k] = Complex32::new(magn * phase.cos(), 0.0);
            } else {
                self.spectrum[k] =
                    Complex32::new(magn * phase.cos(), magn * phase.sin());
            }
        }

        let _ = self.fft_inverse.process_with_scratch(
            &mut self.spectrum,
            &mut self.fft_out,
            &mut self.inv_scratch,
        );

        // overlap-add; the inverse transform is unnormalized (scaled by N)
        let scale = self.ola_norm / FFT_SIZE as f32;
        for k in 0..FFT_SIZE {
            self.output_accum[k] += self.fft_out[k] * self.window[k] * scale;
        }

        self.out_fifo[..HOP_SIZE].copy_from_slice(&self.output_accum[..HOP_SIZE]);

        self.output_accum.copy_within(HOP_SIZE.., 0);
        self.output_accum[FFT_SIZE - HOP_SIZE..].fill(0.0);
        self.in_fifo.copy_within(HOP_SIZE.., 0);
        self.in_fifo[FFT_SIZE - HOP_SIZE..].fill(0.0);
    }
}
