//! Audio device enumeration
//!
//! Lists capture and playback devices from every available host so the user
//! can pin the engine to specific hardware. On Linux this typically means
//! seeing both the PipeWire/PulseAudio bridge and raw ALSA devices.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, HostId};

use super::error::{AudioError, AudioResult};

/// Which way a device moves audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    fn label(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

/// Information about one enumerable device.
#[derive(Debug, Clone)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub host: String,
    pub is_default: bool,
    pub max_channels: u16,
}

/// Human-readable name for a host ID.
fn host_name(host_id: HostId) -> String {
    let name = format!("{:?}", host_id);
    match name.as_str() {
        "Alsa" => "ALSA".to_string(),
        "Jack" => "JACK".to_string(),
        "Wasapi" => "WASAPI".to_string(),
        _ => name,
    }
}

/// List all devices in one direction across all hosts.
pub fn list_devices(direction: Direction) -> AudioResult<Vec<AudioDeviceInfo>> {
    let mut all_devices = Vec::new();

    for host_id in cpal::available_hosts() {
        let host = match cpal::host_from_id(host_id) {
            Ok(h) => h,
            Err(e) => {
                log::debug!("Could not initialize host {:?}: {}", host_id, e);
                continue;
            }
        };

        let default_name = match direction {
            Direction::Input => host.default_input_device(),
            Direction::Output => host.default_output_device(),
        }
        .and_then(|d| d.name().ok());

        let devices: Vec<Device> = match direction {
            Direction::Input => host.input_devices().map(|d| d.collect()),
            Direction::Output => host.output_devices().map(|d| d.collect()),
        }
        .unwrap_or_else(|e| {
            log::debug!("Could not enumerate {:?} devices: {}", host_id, e);
            Vec::new()
        });

        for device in devices {
            let name = match device.name() {
                Ok(n) => n,
                Err(_) => continue,
            };

            let max_channels = match direction {
                Direction::Input => device
                    .supported_input_configs()
                    .map(|c| c.map(|cfg| cfg.channels()).max().unwrap_or(0)),
                Direction::Output => device
                    .supported_output_configs()
                    .map(|c| c.map(|cfg| cfg.channels()).max().unwrap_or(0)),
            }
            .unwrap_or(0);

            if max_channels == 0 {
                continue;
            }

            all_devices.push(AudioDeviceInfo {
                is_default: default_name.as_ref() == Some(&name),
                name,
                host: host_name(host_id),
                max_channels,
            });
        }
    }

    if all_devices.is_empty() {
        return Err(AudioError::NoDevices);
    }
    Ok(all_devices)
}

/// Resolve a device: by name if one is configured, system default otherwise.
pub fn find_device(direction: Direction, name: Option<&str>) -> AudioResult<Device> {
    match name {
        Some(wanted) => {
            for host_id in cpal::available_hosts() {
                let host = match cpal::host_from_id(host_id) {
                    Ok(h) => h,
                    Err(_) => continue,
                };
                let devices = match direction {
                    Direction::Input => host.input_devices(),
                    Direction::Output => host.output_devices(),
                };
                let Ok(devices) = devices else { continue };
                for device in devices {
                    if device.name().map(|n| n == wanted).unwrap_or(false) {
                        return Ok(device);
                    }
                }
            }
            Err(AudioError::DeviceNotFound(wanted.to_string()))
        }
        None => {
            let host = cpal::default_host();
            match direction {
                Direction::Input => host.default_input_device(),
                Direction::Output => host.default_output_device(),
            }
            .ok_or(AudioError::NoDefaultDevice {
                direction: direction.label(),
            })
        }
    }
}
