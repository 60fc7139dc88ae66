//! Per-block engine state
//!
//! `EngineState` owns the whole voice chain and is moved into the output
//! stream callback when the engine starts. Each cycle it drains the command
//! ring, runs high-pass → pitch shift → gate → compressor on the mic block,
//! mixes the soundboard voices on top, and hard-clamps the result. Nothing
//! in here allocates, locks, or blocks.

use std::sync::Arc;

use rtrb::{Consumer, Producer};

use crate::config::EngineConfig;
use crate::dsp::{Compressor, HighPassFilter, NoiseGate, PitchShifter};
use crate::types::Sample;

use super::command::{ControlCommand, EngineEvent};
use super::mixer::Mixer;
use super::status::{EngineAtomics, RunState};
use super::voice::VoicePool;

pub struct EngineState {
    atomics: Arc<EngineAtomics>,
    commands: Consumer<ControlCommand>,
    events: Producer<EngineEvent>,

    highpass: HighPassFilter,
    pitch: PitchShifter,
    gate: NoiseGate,
    compressor: Compressor,
    pool: VoicePool,
    mixer: Mixer,

    stopped: bool,
}

impl EngineState {
    pub fn new(
        config: &EngineConfig,
        atomics: Arc<EngineAtomics>,
        commands: Consumer<ControlCommand>,
        events: Producer<EngineEvent>,
    ) -> Self {
        let sample_rate = config.sample_rate as f32;

        let mut highpass = HighPassFilter::new(config.highpass_cutoff_hz, sample_rate);
        highpass.set_enabled(config.highpass_enabled);

        let mut pitch = PitchShifter::new(sample_rate);
        pitch.set_semitones(config.pitch_semitones);
        atomics.set_pitch_semitones(pitch.semitones());

        let mut gate = NoiseGate::new(
            sample_rate,
            config.gate.threshold,
            config.gate.attack_ms,
            config.gate.release_ms,
        );
        gate.set_enabled(config.gate.enabled);

        let mut compressor = Compressor::new(
            sample_rate,
            config.compressor.threshold_db,
            config.compressor.ratio,
            config.compressor.attack_ms,
            config.compressor.release_ms,
        );
        compressor.set_enabled(config.compressor.enabled);

        Self {
            atomics,
            commands,
            events,
            highpass,
            pitch,
            gate,
            compressor,
            pool: VoicePool::new(config.max_voices),
            mixer: Mixer::new(config.soundboard_gain),
            stopped: false,
        }
    }

    /// Run one block through the chain, in place.
    ///
    /// Commands are applied first, so state never changes mid-block. After a
    /// `Stop` command the output is silence until the streams are torn down.
    pub fn process_block(&mut self, block: &mut [Sample]) {
        self.drain_commands();

        if self.stopped {
            block.fill(0.0);
            return;
        }

        // a NaN/inf capture block would poison every filter state downstream
        if !block.iter().all(|s| s.is_finite()) {
            block.fill(0.0);
        }

        self.highpass.process(block);
        self.pitch.process(block);
        self.gate.process(block);
        self.compressor.process(block);
        self.mixer.mix(&mut self.pool, block);

        self.atomics.set_active_voices(self.pool.active() as u32);
    }

    /// Drain the command ring completely (bounded by its capacity).
    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            match command {
                ControlCommand::SetPitch { semitones } => {
                    self.pitch.set_semitones(semitones);
                    self.atomics.set_pitch_semitones(self.pitch.semitones());
                }
                ControlCommand::Trigger { effect, gain } => {
                    if !self.pool.try_trigger(effect, gain) {
                        // event ring full means the control side is not
                        // draining; nothing useful to do but move on
                        let _ = self.events.push(EngineEvent::VoicePoolFull);
                    }
                }
                ControlCommand::StopAllVoices => {
                    self.pool.clear();
                    self.atomics.set_active_voices(0);
                }
                ControlCommand::Stop => {
                    self.pool.clear();
                    self.atomics.set_active_voices(0);
                    self.atomics.set_run_state(RunState::Stopped);
                    self.stopped = true;
                }
            }
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Current processing latency of the chain in samples (the pitch
    /// shifter's FIFO; the dynamics stages are zero-latency).
    pub fn latency_samples(&self) -> usize {
        self.pitch.latency()
    }

    pub fn atomics(&self) -> &Arc<EngineAtomics> {
        &self.atomics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::command::{command_channel, event_channel, ControlSender, EventReceiver};
    use crate::engine::gc::gc_handle;
    use crate::soundboard::SoundEffect;
    use basedrop::Shared;

    fn engine(config: EngineConfig) -> (EngineState, ControlSender, EventReceiver) {
        let (cmd_tx, cmd_rx) = command_channel(256);
        let (event_tx, event_rx) = event_channel(64);
        let atomics = Arc::new(EngineAtomics::new(config.pitch_semitones));
        let state = EngineState::new(&config, atomics, cmd_rx, event_tx);
        (state, cmd_tx, event_rx)
    }

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
    fn test_block_length_preserved_for_all_pitches() {
        for semitones in [0.0, -3.0, -7.0, -12.0] {
            let config = EngineConfig {
                pitch_semitones: semitones,
                ..EngineConfig::default()
            };
            let (mut state, _tx, _rx) = engine(config);

            let mut block = vec![0.1_f32; 1024];
            state.process_block(&mut block);
            assert_eq!(block.len(), 1024);
            assert!(block.iter().all(|s| s.is_finite()));
        }
    }

    #[test]
    fn test_silence_in_silence_out() {
        let (mut state, _tx, _rx) = engine(EngineConfig::default());
        for _ in 0..8 {
            let mut block = vec![0.0_f32; 1024];
            state.process_block(&mut block);
            assert!(block.iter().all(|&s| s == 0.0));
        }
    }

    #[test]
    fn test_non_finite_input_becomes_silence() {
        let (mut state, _tx, _rx) = engine(EngineConfig::default());
        let mut block = vec![f32::NAN; 1024];
        state.process_block(&mut block);
        assert!(block.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_pitch_command_is_clamped() {
        let (mut state, mut tx, _rx) = engine(EngineConfig::default());
        tx.send(ControlCommand::SetPitch { semitones: -20.0 })
            .ok()
            .unwrap();

        let mut block = vec![0.0_f32; 64];
        state.process_block(&mut block);
        assert_eq!(state.atomics().pitch_semitones(), -12.0);

        tx.send(ControlCommand::SetPitch { semitones: 5.0 })
            .ok()
            .unwrap();
        state.process_block(&mut block);
        assert_eq!(state.atomics().pitch_semitones(), 0.0);
    }

    #[test]
    fn test_pool_full_reports_events() {
        let (mut state, mut tx, mut rx) = engine(EngineConfig::default());
        for _ in 0..10 {
            tx.send(ControlCommand::Trigger {
                effect: effect(vec![0.1; 48_000]),
                gain: 1.0,
            })
            .ok()
            .unwrap();
        }

        let mut block = vec![0.0_f32; 64];
        state.process_block(&mut block);
        assert_eq!(state.atomics().active_voices(), 8);

        let mut events = 0;
        while rx.try_recv().is_some() {
            events += 1;
        }
        assert_eq!(events, 2);
    }

    #[test]
    fn test_effect_over_silent_mic() {
        // a 3-block 0.5-amplitude effect over a silent mic yields 3 blocks
        // of ~0.5 and then silence
        let config = EngineConfig {
            pitch_semitones: 0.0,
            ..EngineConfig::default()
        };
        let (mut state, mut tx, _rx) = engine(config);
        tx.send(ControlCommand::Trigger {
            effect: effect(vec![0.5; 3 * 1024]),
            gain: 1.0,
        })
        .ok()
        .unwrap();

        for _ in 0..3 {
            let mut block = vec![0.0_f32; 1024];
            state.process_block(&mut block);
            assert!(block.iter().all(|&s| (s - 0.5).abs() < 1e-6));
        }
        let mut block = vec![0.0_f32; 1024];
        state.process_block(&mut block);
        assert!(block.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_stop_takes_effect_within_one_block() {
        let (mut state, mut tx, _rx) = engine(EngineConfig::default());
        state.atomics().set_run_state(RunState::Running);

        tx.send(ControlCommand::Trigger {
            effect: effect(vec![0.5; 48_000]),
            gain: 1.0,
        })
        .ok()
        .unwrap();
        let mut block = vec![0.0_f32; 1024];
        state.process_block(&mut block);
        assert_eq!(state.atomics().active_voices(), 1);

        tx.send(ControlCommand::Stop).ok().unwrap();
        let mut block = vec![0.3_f32; 1024];
        state.process_block(&mut block);

        assert!(state.is_stopped());
        assert_eq!(state.atomics().run_state(), RunState::Stopped);
        assert_eq!(state.atomics().active_voices(), 0);
        assert!(block.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_stop_all_voices_cuts_playback() {
        let config = EngineConfig {
            pitch_semitones: 0.0,
            ..EngineConfig::default()
        };
        let (mut state, mut tx, _rx) = engine(config);
        tx.send(ControlCommand::Trigger {
            effect: effect(vec![0.5; 10 * 1024]),
            gain: 1.0,
        })
        .ok()
        .unwrap();

        let mut block = vec![0.0_f32; 1024];
        state.process_block(&mut block);
        assert!(block.iter().any(|&s| s != 0.0));

        tx.send(ControlCommand::StopAllVoices).ok().unwrap();
        let mut block = vec![0.0_f32; 1024];
        state.process_block(&mut block);
        assert!(block.iter().all(|&s| s == 0.0));
        assert_eq!(state.atomics().active_voices(), 0);
    }
}
