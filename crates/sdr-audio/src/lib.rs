//! sdr-audio: the output-only playback sink (§4.1/§4.2). Wraps `cpal` for
//! device I/O, ring buffers for the real-time boundary between the audio
//! callback and the engine thread, and platform real-time thread
//! priority elevation.

mod device;
mod engine;
mod error;
mod ringbuf;
mod stream;
mod thread_priority;

pub use device::{get_default_output_device, get_host, get_output_device_by_name,
    list_output_devices, DeviceInfo, DeviceManager, DeviceSelection};
pub use engine::PlaybackSink;
pub use error::{AudioError, AudioResult};
pub use ringbuf::{AudioRingBuffer, MeterRingBuffer, MeterSnapshot, StereoRingBuffer};
pub use stream::{AudioCallback, AudioConfig, AudioStream};
pub use thread_priority::{set_realtime_priority, PriorityResult};
