//! Lock-free engine status shared between the RT and control threads
//!
//! The audio callback publishes its state through plain atomic stores; the
//! control surface polls without ever touching a lock. `Relaxed` ordering is
//! enough — every field is an independent monitoring value, not a
//! synchronization point.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Engine lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl RunState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => RunState::Starting,
            2 => RunState::Running,
            3 => RunState::Stopping,
            _ => RunState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            RunState::Stopped => 0,
            RunState::Starting => 1,
            RunState::Running => 2,
            RunState::Stopping => 3,
        }
    }
}

/// Shared atomic status block.
///
/// One instance lives in an `Arc`, written by whichever thread owns the
/// corresponding fact: run state by the control side during start/stop and by
/// the RT side when a `Stop` command lands, everything else by the RT side.
#[derive(Debug)]
pub struct EngineAtomics {
    /// Run state: 0=Stopped, 1=Starting, 2=Running, 3=Stopping
    state: AtomicU8,
    /// Number of currently playing soundboard voices
    active_voices: AtomicU32,
    /// Current pitch shift in semitones (f32 bits)
    pitch_bits: AtomicU32,
    /// Capture ring underruns since start (blocks padded with silence)
    underruns: AtomicU32,
    /// Set when a stream error callback fired; cleared on restart
    fault: AtomicBool,
}

impl EngineAtomics {
    pub fn new(pitch_semitones: f32) -> Self {
        Self {
            state: AtomicU8::new(RunState::Stopped.as_u8()),
            active_voices: AtomicU32::new(0),
            pitch_bits: AtomicU32::new(pitch_semitones.to_bits()),
            underruns: AtomicU32::new(0),
            fault: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn run_state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set_run_state(&self, state: RunState) {
        self.state.store(state.as_u8(), Ordering::Relaxed);
    }

    #[inline]
    pub fn active_voices(&self) -> u32 {
        self.active_voices.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_active_voices(&self, count: u32) {
        self.active_voices.store(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn pitch_semitones(&self) -> f32 {
        f32::from_bits(self.pitch_bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set_pitch_semitones(&self, semitones: f32) {
        self.pitch_bits.store(semitones.to_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub fn underruns(&self) -> u32 {
        self.underruns.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn count_underrun(&self) {
        self.underruns.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn fault(&self) -> bool {
        self.fault.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_fault(&self) {
        self.fault.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn clear_fault(&self) {
        self.fault.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_round_trip() {
        let atomics = EngineAtomics::new(-7.0);
        assert_eq!(atomics.run_state(), RunState::Stopped);

        for state in [
            RunState::Starting,
            RunState::Running,
            RunState::Stopping,
            RunState::Stopped,
        ] {
            atomics.set_run_state(state);
            assert_eq!(atomics.run_state(), state);
        }
    }

    #[test]
    fn test_pitch_bits_round_trip() {
        let atomics = EngineAtomics::new(-7.0);
        assert_eq!(atomics.pitch_semitones(), -7.0);
        atomics.set_pitch_semitones(-3.5);
        assert_eq!(atomics.pitch_semitones(), -3.5);
    }

    #[test]
    fn test_underrun_counter() {
        let atomics = EngineAtomics::new(0.0);
        atomics.count_underrun();
        atomics.count_underrun();
        assert_eq!(atomics.underruns(), 2);
    }
}
