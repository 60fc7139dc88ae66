//! Audio I/O: device enumeration and the duplex stream pair

pub mod device;
pub mod duplex;
pub mod error;

pub use device::{find_device, list_devices, AudioDeviceInfo, Direction};
pub use duplex::{start_engine, start_engine_with_status, EngineHandle, EngineSystem};
pub use error::{AudioError, AudioResult};
