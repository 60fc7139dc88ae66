//! Real-time engine: state, voices, channels, status
//!
//! The engine is block-synchronous: commands drain at block boundaries, the
//! chain runs in place on the mic block, and status is published through
//! lock-free atomics. The control surface never shares a lock with the
//! audio callback.

pub mod command;
pub mod gc;
pub mod mixer;
pub mod state;
pub mod status;
pub mod voice;

pub use command::{
    command_channel, event_channel, ControlCommand, ControlSender, EngineEvent, EventReceiver,
    COMMAND_CAPACITY, EVENT_CAPACITY,
};
pub use mixer::Mixer;
pub use state::EngineState;
pub use status::{EngineAtomics, RunState};
pub use voice::{Voice, VoicePool, VoiceState};
