//! deepvox-core: real-time voice changer and soundboard engine
//!
//! Captures the microphone, pitch-shifts the voice down through a phase
//! vocoder, gates and compresses it, mixes in user-triggered sound effects,
//! and plays the result — one mono f32 block at a time, with a lock-free
//! control channel between the UI and the audio callback.
//!
//! The chain per block:
//!
//! ```text
//! mic ─► high-pass ─► pitch shift ─► gate ─► compressor ─► + voices ─► clamp ─► speaker
//! ```
//!
//! Layering:
//! - [`types`] — the `MonoBuffer` block type and canonical constants
//! - [`dsp`] — the chain stages, all mono and allocation-free
//! - [`engine`] — per-block state, voices, command/event rings, atomics
//! - [`soundboard`] — decoding effect files into playable waveforms
//! - [`audio`] — cpal duplex streams and [`audio::start_engine`]
//! - [`config`] — YAML configuration and default paths

pub mod audio;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod soundboard;
pub mod types;

pub use audio::{start_engine, AudioError, EngineSystem};
pub use config::EngineConfig;
pub use engine::{ControlCommand, EngineEvent, RunState};
pub use soundboard::{DecodeError, SoundEffect, SoundLibrary};
pub use types::{MonoBuffer, Sample};
