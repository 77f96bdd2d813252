//! Stereo Virtualiser (§4.3): splits the mono chain output into a delayed
//! left channel and an un-delayed right channel, blended by a width
//! scalar, with a final makeup gain and clip tap.

use crate::clip::ClipTap;
use crate::delay::Delay;
use sdr_core::{Sample, StereoSample};

pub const MAX_DELAY_MS: f64 = 100.0;

pub struct StereoVirtualiser {
    sample_rate: f64,
    delay: Delay,
    delay_ms: f64,
    width: f64,
    makeup_db: f64,
    clip: ClipTap,
}

impl StereoVirtualiser {
    pub fn new(sample_rate: f64) -> Self {
        let max_delay_samples = (MAX_DELAY_MS / 1000.0 * sample_rate).ceil() as usize + 1;
        Self {
            sample_rate,
            delay: Delay::new(max_delay_samples),
            delay_ms: 15.0,
            width: 0.5,
            makeup_db: 0.0,
            clip: ClipTap::new(),
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        let max_delay_samples = (MAX_DELAY_MS / 1000.0 * sample_rate).ceil() as usize + 1;
        self.delay = Delay::new(max_delay_samples);
        self.set_delay_ms(self.delay_ms);
    }

    pub fn set_delay_ms(&mut self, ms: f64) {
        self.delay_ms = ms.clamp(0.0, MAX_DELAY_MS);
        let samples = (self.delay_ms / 1000.0 * self.sample_rate).round() as usize;
        self.delay.set_delay_samples(samples);
    }

    pub fn delay_ms(&self) -> f64 {
        self.delay_ms
    }

    pub fn set_width(&mut self, width: f64) {
        self.width = width.clamp(0.0, 1.0);
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn set_makeup_gain_db(&mut self, db: f64) {
        self.makeup_db = db.clamp(-12.0, 12.0);
    }

    pub fn makeup_gain_db(&self) -> f64 {
        self.makeup_db
    }

    pub fn is_clipping(&self) -> bool {
        self.clip.is_clipping()
    }

    /// §4.8: the configured delay itself, in milliseconds.
    pub fn latency_ms(&self) -> f64 {
        self.delay_ms
    }

    #[inline]
    pub fn process(&mut self, input: Sample) -> StereoSample {
        let delayed = self.delay.process(input);
        let makeup = 10f64.powf(self.makeup_db / 20.0);

        // width=0 collapses to mono (both channels un-delayed); width=1 is
        // the full delayed/un-delayed split.
        let left = (input * (1.0 - self.width) + delayed * self.width) * makeup;
        let right = input * makeup;

        self.clip.observe(left.max(right.abs()));
        StereoSample::new(left, right)
    }

    pub fn reset(&mut self) {
        self.delay.reset();
        self.clip.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_width_collapses_to_mono() {
        let mut sv = StereoVirtualiser::new(12000.0);
        sv.set_width(0.0);
        sv.set_delay_ms(20.0);
        let mut last = StereoSample::default();
        for i in 0..64 {
            last = sv.process((i as f64 * 0.1).sin());
        }
        assert!((last.left - last.right).abs() < 1e-9);
    }

    #[test]
    fn delay_clamped_to_100ms() {
        let mut sv = StereoVirtualiser::new(12000.0);
        sv.set_delay_ms(500.0);
        assert_eq!(sv.delay_ms, MAX_DELAY_MS);
    }
}
