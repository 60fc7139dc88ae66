//! Lock-free control and event channels
//!
//! The control surface talks to the audio thread through a single-producer
//! single-consumer `rtrb` ring of [`ControlCommand`]s, drained in full at
//! each block boundary. The audio thread reports back through a second ring
//! of [`EngineEvent`]s. Both directions are wait-free and allocation-free:
//! a push or pop is O(1) and never blocks, so the callback can never stall
//! on the control surface and vice versa.

use basedrop::Shared;
use rtrb::{Consumer, Producer, PushError, RingBuffer};

use crate::soundboard::SoundEffect;

/// Capacity of the control → RT command ring.
pub const COMMAND_CAPACITY: usize = 256;

/// Capacity of the RT → control event ring.
pub const EVENT_CAPACITY: usize = 64;

/// Commands sent from the control surface to the audio thread.
///
/// Each variant is an atomic operation on the engine, applied at the start
/// of the next block so no state ever changes mid-block.
pub enum ControlCommand {
    /// Set the voice pitch shift in semitones (clamped to [-12, 0] on apply)
    SetPitch { semitones: f32 },
    /// Start a new soundboard voice playing `effect` at `gain`
    ///
    /// The waveform rides along as a `Shared` pointer, so the RT thread
    /// takes ownership without allocating and drops without deallocating.
    Trigger {
        effect: Shared<SoundEffect>,
        gain: f32,
    },
    /// Cut all playing soundboard voices immediately
    StopAllVoices,
    /// Stop the engine at the next block boundary
    Stop,
}

/// Events sent from the audio thread back to the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// A trigger arrived while all voice slots were busy; the request was
    /// dropped and nothing reached the output.
    VoicePoolFull,
}

/// Control-surface end of the command ring.
pub struct ControlSender {
    producer: Producer<ControlCommand>,
}

impl ControlSender {
    /// Push a command, non-blocking.
    ///
    /// If the ring is full the command is handed back so the caller can
    /// report the failure; play requests are user-visible and must not be
    /// silently discarded.
    pub fn send(&mut self, command: ControlCommand) -> Result<(), ControlCommand> {
        self.producer
            .push(command)
            .map_err(|PushError::Full(command)| command)
    }
}

/// Control-surface end of the event ring.
pub struct EventReceiver {
    consumer: Consumer<EngineEvent>,
}

impl EventReceiver {
    /// Pop the next pending event, non-blocking.
    pub fn try_recv(&mut self) -> Option<EngineEvent> {
        self.consumer.pop().ok()
    }
}

/// Create the control → RT command channel.
pub fn command_channel(capacity: usize) -> (ControlSender, Consumer<ControlCommand>) {
    let (producer, consumer) = RingBuffer::new(capacity);
    (ControlSender { producer }, consumer)
}

/// Create the RT → control event channel.
pub fn event_channel(capacity: usize) -> (Producer<EngineEvent>, EventReceiver) {
    let (producer, consumer) = RingBuffer::new(capacity);
    (producer, EventReceiver { consumer })
}
