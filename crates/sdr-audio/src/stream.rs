//! Output-only playback stream. The callback pulls already-processed
//! samples (mono, or stereo when the virtualiser is engaged) from the
//! engine side and hands them to cpal; it never touches the DSP chain
//! itself, keeping the cpal callback as thin as possible.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{
    BufferSize as CpalBufferSize, Device, SampleFormat, Stream, StreamConfig,
    SupportedStreamConfig,
};
use parking_lot::Mutex;
use sdr_core::{BufferSize, Sample};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::{AudioError, AudioResult};

/// Playback configuration for the output-only sink.
#[derive(Debug, Clone, Copy)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub buffer_size: BufferSize,
    pub output_channels: u16,
}

impl AudioConfig {
    pub fn new(sample_rate: u32, output_channels: u16) -> Self {
        Self {
            sample_rate,
            buffer_size: BufferSize::default(),
            output_channels,
        }
    }
}

/// Fills an interleaved output buffer of `frames` frames across
/// `channels` channels. Implementors must not block or allocate.
pub type AudioCallback = Box<dyn FnMut(&mut [Sample]) + Send + 'static>;

struct StreamState {
    callback: Mutex<AudioCallback>,
    running: AtomicBool,
}

/// One open output stream. Dropped and rebuilt whenever the sample rate
/// or device selection changes (§4.1).
pub struct AudioStream {
    stream: Stream,
    state: Arc<StreamState>,
    config: AudioConfig,
}

impl AudioStream {
    pub fn new(device: &Device, config: AudioConfig, callback: AudioCallback) -> AudioResult<Self> {
        let state = Arc::new(StreamState {
            callback: Mutex::new(callback),
            running: AtomicBool::new(false),
        });

        let supported = get_output_stream_config(device, &config)?;
        let stream = build_output_stream(device, &supported, config.buffer_size, Arc::clone(&state))?;

        Ok(Self {
            stream,
            state,
            config,
        })
    }

    pub fn start(&self) -> AudioResult<()> {
        self.stream
            .play()
            .map_err(|e| AudioError::StreamError(e.to_string()))?;
        self.state.running.store(true, Ordering::Release);
        Ok(())
    }

    pub fn stop(&self) -> AudioResult<()> {
        self.stream
            .pause()
            .map_err(|e| AudioError::StreamError(e.to_string()))?;
        self.state.running.store(false, Ordering::Release);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }
}

fn get_output_stream_config(
    device: &Device,
    config: &AudioConfig,
) -> AudioResult<SupportedStreamConfig> {
    let sample_rate = cpal::SampleRate(config.sample_rate);
    let channels = config.output_channels;

    let configs = device
        .supported_output_configs()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?;

    for supported in configs {
        if supported.channels() >= channels
            && supported.min_sample_rate() <= sample_rate
            && supported.max_sample_rate() >= sample_rate
            && supported.sample_format() == SampleFormat::F32
        {
            return Ok(supported.with_sample_rate(sample_rate));
        }
    }

    Err(AudioError::UnsupportedSampleRate(config.sample_rate))
}

fn build_output_stream(
    device: &Device,
    supported_config: &SupportedStreamConfig,
    buffer_size: BufferSize,
    state: Arc<StreamState>,
) -> AudioResult<Stream> {
    let device_channels = supported_config.channels() as usize;
    let sample_rate = supported_config.sample_rate();

    let config = StreamConfig {
        channels: supported_config.channels(),
        sample_rate,
        buffer_size: CpalBufferSize::Fixed(buffer_size.as_usize() as u32),
    };

    let mut scratch = vec![0.0f64; buffer_size.as_usize() * 2];

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / device_channels;
                let needed = frames * 2;
                if scratch.len() < needed {
                    scratch.resize(needed, 0.0);
                }
                scratch[..needed].fill(0.0);

                {
                    let mut callback = state.callback.lock();
                    callback(&mut scratch[..needed]);
                }

                match device_channels {
                    1 => {
                        for (i, sample) in data.iter_mut().enumerate() {
                            let mono = (scratch[i * 2] + scratch[i * 2 + 1]) * 0.5;
                            *sample = mono as f32;
                        }
                    }
                    2 => {
                        for (i, sample) in data.iter_mut().enumerate() {
                            *sample = scratch[i] as f32;
                        }
                    }
                    _ => {
                        for (i, chunk) in data.chunks_mut(device_channels).enumerate() {
                            chunk[0] = scratch[i * 2] as f32;
                            chunk[1] = scratch[i * 2 + 1] as f32;
                            for sample in chunk.iter_mut().skip(2) {
                                *sample = 0.0;
                            }
                        }
                    }
                }
            },
            move |err| {
                log::error!("audio output stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

    Ok(stream)
}
