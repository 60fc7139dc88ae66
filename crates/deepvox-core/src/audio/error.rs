//! Audio backend error types

use thiserror::Error;

/// Errors that can occur while opening or running the duplex streams.
///
/// Everything here belongs to the start path or the stream lifecycle; a
/// failed start leaves the engine `Stopped` with no streams open.
#[derive(Error, Debug)]
pub enum AudioError {
    /// No audio devices available at all
    #[error("No audio devices found")]
    NoDevices,

    /// Failed to get a default device
    #[error("Failed to get default {direction} device")]
    NoDefaultDevice { direction: &'static str },

    /// A configured device name matched nothing
    #[error("Audio device not found: {0}")]
    DeviceNotFound(String),

    /// Failed to query device configurations
    #[error("Failed to get device config: {0}")]
    ConfigError(String),

    /// Failed to build a stream
    #[error("Failed to build audio stream: {0}")]
    StreamBuild(String),

    /// Failed to start a stream
    #[error("Failed to start audio stream: {0}")]
    StreamPlay(String),

    /// Device offers no f32 configuration
    #[error("Unsupported sample format on {device}")]
    UnsupportedFormat { device: String },

    /// Capture and playback devices could not agree on a rate
    #[error("Sample rate mismatch: input={input}Hz, output={output}Hz")]
    SampleRateMismatch { input: u32, output: u32 },
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
