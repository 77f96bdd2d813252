//! Output device enumeration and selection. The playback sink is the
//! pipeline's only audio I/O (§4.1/§4.2): there is no audio input, since
//! the signal arrives as decoded PCM frames from the connector, not from
//! a local capture device.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host, SupportedStreamConfigRange};
use parking_lot::RwLock;

use crate::{AudioError, AudioResult};

/// Output device information.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub is_default: bool,
    pub output_channels: u16,
    pub sample_rates: Vec<u32>,
}

/// Returns the platform's preferred host backend: JACK on Linux, ASIO on
/// Windows, CoreAudio on macOS, falling back to cpal's default when the
/// preferred backend isn't available.
pub fn get_host() -> Host {
    #[cfg(target_os = "macos")]
    {
        cpal::default_host()
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(host) = cpal::available_hosts()
            .into_iter()
            .find(|h| *h == cpal::HostId::Asio)
            && let Ok(host) = cpal::host_from_id(host)
        {
            return host;
        }
        cpal::default_host()
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(host) = cpal::available_hosts()
            .into_iter()
            .find(|h| *h == cpal::HostId::Jack)
            && let Ok(host) = cpal::host_from_id(host)
        {
            return host;
        }
        cpal::default_host()
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        cpal::default_host()
    }
}

pub fn list_output_devices() -> AudioResult<Vec<DeviceInfo>> {
    let host = get_host();
    let default_device = host.default_output_device();
    let default_name = default_device.as_ref().and_then(|d| d.name().ok());

    let mut devices = Vec::new();
    for device in host
        .output_devices()
        .map_err(|e| AudioError::BackendError(e.to_string()))?
    {
        if let Ok(name) = device.name() {
            let is_default = default_name.as_ref().map(|d| d == &name).unwrap_or(false);
            let (output_channels, sample_rates) = get_device_info(&device);
            devices.push(DeviceInfo {
                name,
                is_default,
                output_channels,
                sample_rates,
            });
        }
    }
    Ok(devices)
}

pub fn get_default_output_device() -> AudioResult<Device> {
    let host = get_host();
    host.default_output_device().ok_or(AudioError::NoDevice)
}

pub fn get_output_device_by_name(name: &str) -> AudioResult<Device> {
    let host = get_host();
    for device in host
        .output_devices()
        .map_err(|e| AudioError::BackendError(e.to_string()))?
    {
        if let Ok(device_name) = device.name()
            && device_name == name
        {
            return Ok(device);
        }
    }
    Err(AudioError::DeviceNotFound(name.to_string()))
}

fn get_device_info(device: &Device) -> (u16, Vec<u32>) {
    let configs: Vec<SupportedStreamConfigRange> = device
        .supported_output_configs()
        .map(|c| c.collect())
        .unwrap_or_default();

    let max_channels = configs.iter().map(|c| c.channels()).max().unwrap_or(0);

    let mut sample_rates: Vec<u32> = configs
        .iter()
        .flat_map(|c| {
            let min = c.min_sample_rate().0;
            let max = c.max_sample_rate().0;
            [8000, 11025, 12000, 16000, 22050, 24000, 44100, 48000]
                .into_iter()
                .filter(move |&rate| rate >= min && rate <= max)
        })
        .collect();

    sample_rates.sort_unstable();
    sample_rates.dedup();

    (max_channels, sample_rates)
}

/// Current output-device selection, including sample rate (one of §4.1's
/// trigger for a sink teardown/reopen).
#[derive(Debug, Clone)]
pub struct DeviceSelection {
    pub output_device: Option<String>,
    pub sample_rate: u32,
}

impl Default for DeviceSelection {
    fn default() -> Self {
        Self {
            output_device: None,
            sample_rate: 12_000,
        }
    }
}

/// Caches the output device list and tracks the active selection; the
/// session queries this when (re)opening the playback sink.
pub struct DeviceManager {
    selection: RwLock<DeviceSelection>,
    output_devices: RwLock<Vec<DeviceInfo>>,
}

impl DeviceManager {
    pub fn new() -> Self {
        let manager = Self {
            selection: RwLock::new(DeviceSelection::default()),
            output_devices: RwLock::new(Vec::new()),
        };
        manager.refresh_devices();
        manager
    }

    pub fn refresh_devices(&self) {
        if let Ok(outputs) = list_output_devices() {
            *self.output_devices.write() = outputs;
        }
    }

    pub fn output_devices(&self) -> Vec<DeviceInfo> {
        self.output_devices.read().clone()
    }

    pub fn selection(&self) -> DeviceSelection {
        self.selection.read().clone()
    }

    pub fn set_output_device(&self, name: Option<String>) {
        self.selection.write().output_device = name;
    }

    pub fn set_sample_rate(&self, rate: u32) {
        self.selection.write().sample_rate = rate;
    }

    pub fn default_output_name(&self) -> Option<String> {
        self.output_devices
            .read()
            .iter()
            .find(|d| d.is_default)
            .map(|d| d.name.clone())
    }

    pub fn is_device_available(&self, name: &str) -> bool {
        self.output_devices.read().iter().any(|d| d.name == name)
    }
}

impl Default for DeviceManager {
    fn default() -> Self {
        Self::new()
    }
}
