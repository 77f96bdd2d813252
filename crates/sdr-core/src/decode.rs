//! PCM decoder (C2): turns the bytes of an inbound `{type:"audio"}` message
//! into an [`AudioFrame`] ready for the clock to schedule.
//!
//! The wire format is fixed: big-endian signed 16-bit mono samples, as
//! declared by the accompanying `sampleRate` field. Decoding never resamples
//! or reinterprets channel layout — that is the daemon's job upstream.

use crate::{CoreError, CoreResult};

/// A decoded, not-yet-scheduled block of mono PCM audio.
///
/// Created by the decoder, consumed exactly once by the graph assembler,
/// and released once its scheduled playback window has elapsed.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub sample_rate: u32,
    samples: Vec<f32>,
    /// Monotonically increasing arrival order, assigned by the decoder.
    pub sequence: u64,
}

impl AudioFrame {
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of this frame in seconds at its declared sample rate.
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Big-endian signed-16-bit PCM decoder. One decoder per session; the
/// `sequence` counter it hands out is what the clock/scheduler's ordering
/// invariant (§8.1) is checked against.
#[derive(Debug, Default)]
pub struct PcmDecoder {
    next_sequence: u64,
}

impl PcmDecoder {
    pub fn new() -> Self {
        Self { next_sequence: 0 }
    }

    /// Decode one `{type:"audio"}` payload's raw bytes.
    ///
    /// Fails with `InvalidParam` when `bytes.len()` is odd or zero — the
    /// caller (§4.1 failure semantics) drops such frames silently and lets
    /// the underrun path cover the gap; it does not propagate the error to
    /// the user.
    pub fn decode(&mut self, bytes: &[u8], declared_sample_rate: u32) -> CoreResult<AudioFrame> {
        if bytes.is_empty() || bytes.len() % 2 != 0 {
            return Err(CoreError::InvalidParam(format!(
                "audio frame has odd or zero byte length: {}",
                bytes.len()
            )));
        }

        let samples = bytes
            .chunks_exact(2)
            .map(|chunk| {
                let raw = i16::from_be_bytes([chunk[0], chunk[1]]);
                (raw as f32 / 32767.0).clamp(-1.0, 1.0)
            })
            .collect();

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        Ok(AudioFrame {
            sample_rate: declared_sample_rate,
            samples,
            sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be16(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_be_bytes()).collect()
    }

    #[test]
    fn decodes_full_scale_samples_into_unit_range() {
        let mut dec = PcmDecoder::new();
        let bytes = be16(&[i16::MAX, i16::MIN, 0]);
        let frame = dec.decode(&bytes, 12000).unwrap();
        assert_eq!(frame.len(), 3);
        assert!((frame.samples()[0] - 1.0).abs() < 1e-4);
        assert!(frame.samples()[1] <= -1.0);
        assert_eq!(frame.samples()[2], 0.0);
    }

    #[test]
    fn rejects_odd_byte_length() {
        let mut dec = PcmDecoder::new();
        let err = dec.decode(&[0, 1, 2], 12000);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_empty_frame() {
        let mut dec = PcmDecoder::new();
        assert!(dec.decode(&[], 12000).is_err());
    }

    #[test]
    fn sequence_increments_monotonically() {
        let mut dec = PcmDecoder::new();
        let bytes = be16(&[0, 0]);
        let f0 = dec.decode(&bytes, 12000).unwrap();
        let f1 = dec.decode(&bytes, 12000).unwrap();
        assert_eq!(f0.sequence, 0);
        assert_eq!(f1.sequence, 1);
    }

    #[test]
    fn duration_matches_sample_rate() {
        let mut dec = PcmDecoder::new();
        let bytes = be16(&[0; 1200]);
        let frame = dec.decode(&bytes, 12000).unwrap();
        assert!((frame.duration_secs() - 0.1).abs() < 1e-9);
    }
}
