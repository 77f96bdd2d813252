//! Playback sink: the boundary between the processed audio chain and the
//! operating system's audio device. Owns the open `cpal` stream and the
//! ring buffers that decouple the real-time audio callback from the
//! engine thread that runs the clock and effect chain.
//!
//! §4.1: "if an incoming frame declares a sample rate different from the
//! active playback graph, the playback sink is torn down and re-opened at
//! the new rate". [`PlaybackSink::reopen_if_needed`] is that teardown/
//! reopen boundary; DSP state re-initialisation happens on the engine
//! side, not here.

use std::sync::Arc;

use sdr_core::Sample;

use crate::device::{get_default_output_device, get_output_device_by_name, DeviceManager};
use crate::ringbuf::{AudioRingBuffer, MeterRingBuffer, MeterSnapshot, StereoRingBuffer};
use crate::stream::{AudioCallback, AudioConfig, AudioStream};
use crate::thread_priority::set_realtime_priority;
use crate::{AudioError, AudioResult};

const RING_CAPACITY_FRAMES: usize = 1 << 16;
const METER_RING_CAPACITY: usize = 64;

enum SinkBuffer {
    Mono(Arc<AudioRingBuffer>),
    Stereo(Arc<StereoRingBuffer>),
}

/// The open playback sink: one cpal stream plus the ring buffer the
/// engine thread feeds it through.
pub struct PlaybackSink {
    devices: DeviceManager,
    stream: Option<AudioStream>,
    buffer: Option<SinkBuffer>,
    meters: Arc<MeterRingBuffer>,
    sample_rate: u32,
    stereo: bool,
}

impl PlaybackSink {
    pub fn new() -> Self {
        Self {
            devices: DeviceManager::new(),
            stream: None,
            buffer: None,
            meters: Arc::new(MeterRingBuffer::new(METER_RING_CAPACITY)),
            sample_rate: 0,
            stereo: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Opens (or reopens, if sample rate/channel count changed) the
    /// output stream. A no-op when already open at the requested
    /// configuration.
    pub fn reopen_if_needed(&mut self, sample_rate: u32, stereo: bool) -> AudioResult<()> {
        if self.is_open() && self.sample_rate == sample_rate && self.stereo == stereo {
            return Ok(());
        }
        self.open(sample_rate, stereo)
    }

    fn open(&mut self, sample_rate: u32, stereo: bool) -> AudioResult<()> {
        if let Some(stream) = self.stream.take() {
            let _ = stream.stop();
        }

        let device = match self.devices.selection().output_device {
            Some(name) => get_output_device_by_name(&name)?,
            None => get_default_output_device()?,
        };

        let channels = if stereo { 2 } else { 1 };
        let config = AudioConfig::new(sample_rate, channels);

        let callback: AudioCallback = if stereo {
            let ring = Arc::new(StereoRingBuffer::new(RING_CAPACITY_FRAMES));
            self.buffer = Some(SinkBuffer::Stereo(Arc::clone(&ring)));
            Box::new(move |out: &mut [Sample]| {
                set_realtime_priority();
                ring.pop_interleaved(out);
            })
        } else {
            let ring = Arc::new(AudioRingBuffer::new(RING_CAPACITY_FRAMES * 2));
            self.buffer = Some(SinkBuffer::Mono(Arc::clone(&ring)));
            Box::new(move |out: &mut [Sample]| {
                set_realtime_priority();
                let frames = out.len() / 2;
                let mut mono = vec![0.0; frames];
                let read = ring.pop(&mut mono);
                for i in 0..read {
                    out[i * 2] = mono[i];
                    out[i * 2 + 1] = mono[i];
                }
            })
        };

        let stream = AudioStream::new(&device, config, callback)?;
        stream.start()?;

        self.sample_rate = sample_rate;
        self.stereo = stereo;
        self.stream = Some(stream);
        Ok(())
    }

    /// Writes processed mono samples to the output ring buffer. Drops the
    /// tail silently if the ring is full (the engine should never produce
    /// faster than the device drains; a full ring indicates the device
    /// stopped, not a condition this call should block on).
    pub fn push_mono(&self, samples: &[Sample]) -> AudioResult<usize> {
        match &self.buffer {
            Some(SinkBuffer::Mono(ring)) => Ok(ring.push(samples)),
            Some(SinkBuffer::Stereo(_)) => Err(AudioError::StreamError(
                "sink is open in stereo mode".into(),
            )),
            None => Err(AudioError::StreamError("sink is not open".into())),
        }
    }

    pub fn push_stereo(&self, left: &[Sample], right: &[Sample]) -> AudioResult<usize> {
        match &self.buffer {
            Some(SinkBuffer::Stereo(ring)) => Ok(ring.push_stereo(left, right)),
            Some(SinkBuffer::Mono(_)) => Err(AudioError::StreamError(
                "sink is open in mono mode".into(),
            )),
            None => Err(AudioError::StreamError("sink is not open".into())),
        }
    }

    pub fn publish_meter(&self, snapshot: MeterSnapshot) {
        self.meters.push(snapshot);
    }

    pub fn latest_meter(&self) -> Option<MeterSnapshot> {
        self.meters.latest()
    }

    pub fn devices(&self) -> &DeviceManager {
        &self.devices
    }

    pub fn stop(&mut self) -> AudioResult<()> {
        if let Some(stream) = &self.stream {
            stream.stop()?;
        }
        Ok(())
    }
}

impl Default for PlaybackSink {
    fn default() -> Self {
        Self::new()
    }
}
