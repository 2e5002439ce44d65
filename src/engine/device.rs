// Output-device enumeration. Control-plane only; never touched by the
// real-time callback path.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

#[derive(Clone, Debug)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub is_default: bool,
}

/// List the available output devices on the default host.
pub fn list_output_devices() -> Vec<AudioDeviceInfo> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    let default_name = host
        .default_output_device()
        .and_then(|d| d.name().ok())
        .unwrap_or_default();

    if let Ok(outputs) = host.output_devices() {
        for device in outputs {
            if let Ok(name) = device.name() {
                let is_default = name == default_name;
                devices.push(AudioDeviceInfo { name, is_default });
            }
        }
    }

    devices
}

pub fn default_output_device() -> Option<Device> {
    cpal::default_host().default_output_device()
}

pub fn output_device_by_name(host: &Host, device_name: &str) -> Option<Device> {
    if let Ok(devices) = host.output_devices() {
        for device in devices {
            if let Ok(name) = device.name()
                && name == device_name
            {
                return Some(device);
            }
        }
    }
    None
}
