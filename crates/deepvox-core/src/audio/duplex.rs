//! Duplex stream pair: mic capture → engine → playback
//!
//! Two independent cpal streams joined by a lock-free sample ring:
//!
//! ```text
//!  ┌───────────────┐   push()   ┌──────────────────┐
//!  │ Capture stream│───────────►│  Capture ring    │  (SPSC, f32 mono)
//!  │ (downmix mono)│            └────────┬─────────┘
//!  └───────────────┘                     │ pop()
//!                                        ▼
//!  ┌────────────────────────────────────────────────┐
//!  │ Playback stream (owns EngineState)             │
//!  │ drain commands → run chain → write all channels│
//!  └────────────────────────────────────────────────┘
//! ```
//!
//! The playback callback owns the whole engine; the capture callback owns
//! nothing but the ring producer. Neither side ever blocks on the other: a
//! full ring drops capture samples, an empty ring plays silence and counts
//! an underrun.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, Stream, StreamConfig};

use crate::config::EngineConfig;
use crate::engine::{
    command_channel, event_channel, ControlCommand, ControlSender, EngineAtomics, EngineState,
    EventReceiver, RunState, COMMAND_CAPACITY, EVENT_CAPACITY,
};
use crate::types::{MonoBuffer, MAX_BLOCK_SIZE};

use super::device::{find_device, Direction};
use super::error::{AudioError, AudioResult};

/// Keeps the duplex streams alive. Drop to close both without blocking.
pub struct EngineHandle {
    _input_stream: Stream,
    _output_stream: Stream,
    sample_rate: u32,
    buffer_size: u32,
}

impl EngineHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    /// One-way device latency per block in milliseconds.
    pub fn block_latency_ms(&self) -> f32 {
        (self.buffer_size as f32 / self.sample_rate as f32) * 1000.0
    }
}

/// Everything the control surface holds while the engine runs.
pub struct EngineSystem {
    pub handle: EngineHandle,
    pub commands: ControlSender,
    pub events: EventReceiver,
    pub atomics: Arc<EngineAtomics>,
    pub sample_rate: u32,
    pub buffer_size: u32,
}

impl EngineSystem {
    /// Request a stop and tear the streams down.
    ///
    /// The stop command lands at the next block boundary (voices cleared,
    /// run state flips to `Stopped`); dropping the handle then closes both
    /// streams.
    pub fn stop(mut self) {
        let _ = self.commands.send(ControlCommand::Stop);
        self.atomics.set_run_state(RunState::Stopping);
        drop(self.handle);
        self.atomics.set_run_state(RunState::Stopped);
    }
}

/// Open the duplex streams and start the engine.
///
/// `Stopped → Starting → Running`; any failure on the way rolls the state
/// back to `Stopped` and returns the error with no streams left open.
pub fn start_engine(config: &EngineConfig) -> AudioResult<EngineSystem> {
    let atomics = Arc::new(EngineAtomics::new(config.pitch_semitones));
    start_engine_with_status(config, atomics)
}

/// Like [`start_engine`], but publishing through a caller-supplied status
/// block, so the control surface can watch the transitions themselves.
pub fn start_engine_with_status(
    config: &EngineConfig,
    atomics: Arc<EngineAtomics>,
) -> AudioResult<EngineSystem> {
    atomics.set_run_state(RunState::Starting);

    match open_streams(config, Arc::clone(&atomics)) {
        Ok(system) => {
            atomics.set_run_state(RunState::Running);
            log::info!(
                "Engine running: {}Hz, {} frame blocks (~{:.1}ms/block)",
                system.sample_rate,
                system.buffer_size,
                system.handle.block_latency_ms()
            );
            Ok(system)
        }
        Err(e) => {
            atomics.set_run_state(RunState::Stopped);
            Err(e)
        }
    }
}

fn open_streams(config: &EngineConfig, atomics: Arc<EngineAtomics>) -> AudioResult<EngineSystem> {
    let input_device = find_device(Direction::Input, config.input_device.as_deref())?;
    let output_device = find_device(Direction::Output, config.output_device.as_deref())?;

    let input_name = input_device.name().unwrap_or_else(|_| "Unknown".to_string());
    let output_name = output_device.name().unwrap_or_else(|_| "Unknown".to_string());
    log::info!("Capture device: {}", input_name);
    log::info!("Playback device: {}", output_name);

    let buffer_size = (config.block_size as u32).clamp(64, MAX_BLOCK_SIZE as u32);
    let (input_config, input_rate) =
        pick_stream_config(&input_device, Direction::Input, config.sample_rate, buffer_size)?;
    let (output_config, output_rate) =
        pick_stream_config(&output_device, Direction::Output, config.sample_rate, buffer_size)?;

    if input_rate != output_rate {
        return Err(AudioError::SampleRateMismatch {
            input: input_rate,
            output: output_rate,
        });
    }
    let sample_rate = output_rate;

    log::info!(
        "Duplex config: {}Hz, {} frames, {} in / {} out channels",
        sample_rate,
        buffer_size,
        input_config.channels,
        output_config.channels
    );

    // Capture ring holds a few blocks of headroom for timing jitter
    // between the two streams.
    let ring_capacity = (buffer_size as usize).max(1024) * 4;
    let (capture_tx, capture_rx) = rtrb::RingBuffer::<f32>::new(ring_capacity);

    let (command_tx, command_rx) = command_channel(COMMAND_CAPACITY);
    let (event_tx, event_rx) = event_channel(EVENT_CAPACITY);

    // The engine always runs at the negotiated rate, whatever was asked for.
    let mut engine_config = config.clone();
    engine_config.sample_rate = sample_rate;
    let state = EngineState::new(&engine_config, Arc::clone(&atomics), command_rx, event_tx);

    let input_stream =
        build_capture_stream(&input_device, &input_config, capture_tx, Arc::clone(&atomics))?;
    let output_stream = build_playback_stream(
        &output_device,
        &output_config,
        capture_rx,
        state,
        Arc::clone(&atomics),
    )?;

    input_stream
        .play()
        .map_err(|e| AudioError::StreamPlay(format!("capture: {}", e)))?;
    output_stream
        .play()
        .map_err(|e| AudioError::StreamPlay(format!("playback: {}", e)))?;

    Ok(EngineSystem {
        handle: EngineHandle {
            _input_stream: input_stream,
            _output_stream: output_stream,
            sample_rate,
            buffer_size,
        },
        commands: command_tx,
        events: event_rx,
        atomics,
        sample_rate,
        buffer_size,
    })
}

/// Pick an f32 stream config for a device, preferring the target rate.
fn pick_stream_config(
    device: &cpal::Device,
    direction: Direction,
    target_rate: u32,
    buffer_size: u32,
) -> AudioResult<(StreamConfig, u32)> {
    let supported: Vec<_> = match direction {
        Direction::Input => device
            .supported_input_configs()
            .map_err(|e| AudioError::ConfigError(e.to_string()))?
            .collect(),
        Direction::Output => device
            .supported_output_configs()
            .map_err(|e| AudioError::ConfigError(e.to_string()))?
            .collect(),
    };

    if supported.is_empty() {
        return Err(AudioError::ConfigError(
            "no supported stream configurations".to_string(),
        ));
    }

    let best = supported
        .iter()
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .find(|c| target_rate >= c.min_sample_rate().0 && target_rate <= c.max_sample_rate().0)
        .or_else(|| {
            supported
                .iter()
                .find(|c| c.sample_format() == SampleFormat::F32)
        })
        .ok_or_else(|| AudioError::UnsupportedFormat {
            device: device.name().unwrap_or_else(|_| "Unknown".to_string()),
        })?;

    let sample_rate =
        if target_rate >= best.min_sample_rate().0 && target_rate <= best.max_sample_rate().0 {
            cpal::SampleRate(target_rate)
        } else {
            let fallback = best.max_sample_rate();
            log::warn!(
                "Device doesn't support {}Hz, falling back to {}Hz",
                target_rate,
                fallback.0
            );
            fallback
        };

    let config = StreamConfig {
        channels: best.channels(),
        sample_rate,
        buffer_size: BufferSize::Fixed(buffer_size),
    };
    Ok((config, sample_rate.0))
}

/// Shared handler for both stream error callbacks.
///
/// Transient faults (underruns, backend hiccups) raise the fault flag and
/// the cycle carries on with silence. Losing the device is fatal: nothing
/// will ever deliver another block, so the run state is forced to
/// `Stopping` for the control surface to observe and tear down.
fn handle_stream_error(context: &'static str, err: &cpal::StreamError, atomics: &EngineAtomics) {
    log::error!("{} stream error: {}", context, err);
    atomics.set_fault();
    if matches!(err, cpal::StreamError::DeviceNotAvailable) {
        atomics.set_run_state(RunState::Stopping);
    }
}

/// Build the capture stream: downmix each frame to mono and push it into
/// the ring. A full ring drops samples; the playback side self-corrects.
fn build_capture_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    mut producer: rtrb::Producer<f32>,
    atomics: Arc<EngineAtomics>,
) -> AudioResult<Stream> {
    let channels = config.channels as usize;

    let stream = device
        .build_input_stream(
            config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                for frame in data.chunks(channels) {
                    let mono = frame.iter().sum::<f32>() / channels as f32;
                    if producer.push(mono).is_err() {
                        // ring full: playback is behind, drop the sample
                        break;
                    }
                }
            },
            move |err| handle_stream_error("Capture", &err, &atomics),
            None,
        )
        .map_err(|e| AudioError::StreamBuild(format!("capture: {}", e)))?;

    Ok(stream)
}

/// Build the playback stream. The callback owns the `EngineState` outright:
/// pop a block from the capture ring (silence-filling shortfalls), run the
/// chain, and write the result to every output channel.
fn build_playback_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    mut consumer: rtrb::Consumer<f32>,
    mut state: EngineState,
    atomics: Arc<EngineAtomics>,
) -> AudioResult<Stream> {
    let channels = config.channels as usize;
    let mut block = MonoBuffer::silence(MAX_BLOCK_SIZE);
    // don't count underruns until the capture ring has filled once
    let mut primed = false;

    let error_atomics = Arc::clone(&atomics);

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                // Some backends ignore BufferSize::Fixed; never grow the
                // block past its pre-allocated capacity on the RT thread.
                let n_frames = (data.len() / channels).min(MAX_BLOCK_SIZE);
                block.set_len_from_capacity(n_frames);

                let samples = block.as_mut_slice();
                let available = consumer.slots().min(n_frames);
                for sample in samples.iter_mut().take(available) {
                    *sample = consumer.pop().unwrap_or(0.0);
                }
                if available < n_frames {
                    samples[available..].fill(0.0);
                    if primed {
                        atomics.count_underrun();
                    }
                } else {
                    primed = true;
                }

                state.process_block(samples);

                write_frames(data, channels, samples);
            },
            move |err| handle_stream_error("Playback", &err, &error_atomics),
            None,
        )
        .map_err(|e| AudioError::StreamBuild(format!("playback: {}", e)))?;

    Ok(stream)
}

/// Duplicate the mono block across every output channel. Frames past the
/// end of the block (a device delivering more than the engine processed)
/// come out silent rather than carrying stale data.
fn write_frames(data: &mut [f32], channels: usize, samples: &[f32]) {
    for (i, frame) in data.chunks_mut(channels).enumerate() {
        let sample = samples.get(i).copied().unwrap_or(0.0);
        for ch in frame.iter_mut() {
            *ch = sample;
        }
    }
}
