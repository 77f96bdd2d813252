//! Tuned Analyser (C5, §4.5): two independent FFT taps on the same signal
//! point, plus the oscilloscope's raw time-domain buffer.
//!
//! The spectrum analyser samples pre-effects (between Source and the
//! effect chain); the VU analyser is fed from the post-effects gain output
//! so its reading matches what the user actually hears.

use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;
use sdr_core::Sample;
use std::sync::Arc;

pub const SPECTRUM_FFT_SIZE: usize = 16_384;
pub const VU_FFT_SIZE: usize = 2_048;
pub const OSCILLOSCOPE_BUFFER_SIZE: usize = 2_048;

/// A zero-smoothing magnitude FFT: each call to [`Self::analyze`] replaces
/// the magnitude array outright rather than decaying it across frames
/// (§4.5: "zero smoothing" for both the spectrum and VU analysers).
pub struct FftTap {
    fft: Arc<dyn RealToComplex<f64>>,
    fft_size: usize,
    ring: Vec<Sample>,
    write_pos: usize,
    window: Vec<f64>,
    scratch_windowed: Vec<f64>,
    spectrum: Vec<Complex<f64>>,
    magnitudes: Vec<f64>,
}

impl FftTap {
    pub fn new(fft_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(fft_size);
        let window: Vec<f64> = (0..fft_size)
            .map(|n| {
                0.5 - 0.5 * (2.0 * std::f64::consts::PI * n as f64 / (fft_size - 1) as f64).cos()
            })
            .collect();
        Self {
            fft,
            fft_size,
            ring: vec![0.0; fft_size],
            write_pos: 0,
            window,
            scratch_windowed: vec![0.0; fft_size],
            spectrum: vec![Complex::new(0.0, 0.0); fft_size / 2 + 1],
            magnitudes: vec![0.0; fft_size / 2 + 1],
        }
    }

    pub fn push(&mut self, sample: Sample) {
        self.ring[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.fft_size;
    }

    pub fn push_block(&mut self, samples: &[Sample]) {
        for &s in samples {
            self.push(s);
        }
    }

    /// Runs the FFT over the current ring contents and replaces the stored
    /// magnitude spectrum (linear magnitude, not dB — callers map to
    /// byte-quantised display values per §4.5).
    pub fn analyze(&mut self) {
        for i in 0..self.fft_size {
            let idx = (self.write_pos + i) % self.fft_size;
            self.scratch_windowed[i] = self.ring[idx] * self.window[i];
        }

        if self
            .fft
            .process(&mut self.scratch_windowed, &mut self.spectrum)
            .is_err()
        {
            self.magnitudes.fill(0.0);
            return;
        }

        let scale = 2.0 / self.fft_size as f64;
        for (m, c) in self.magnitudes.iter_mut().zip(self.spectrum.iter()) {
            *m = c.norm() * scale;
        }
    }

    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.magnitudes.len()
    }

    /// Byte-quantised display magnitude (0..=255), the unit §4.5's tuned
    /// spectrum rendering math operates in.
    pub fn magnitude_byte(&self, bin: usize, full_scale_db: f64, floor_db: f64) -> u8 {
        let mag = self.magnitudes.get(bin).copied().unwrap_or(0.0);
        let db = 20.0 * mag.max(1e-12).log10();
        let normalized = ((db - floor_db) / (full_scale_db - floor_db)).clamp(0.0, 1.0);
        (normalized * 255.0).round() as u8
    }

    pub fn reset(&mut self) {
        self.ring.fill(0.0);
        self.write_pos = 0;
        self.magnitudes.fill(0.0);
    }
}

/// Raw time-domain ring for the oscilloscope (§4.5): the 2,048-sample
/// buffer the spectrum analyser's input ring supplies, displayed via the
/// zoom-slider windowing described in §4.5.
pub struct Oscilloscope {
    buffer: Vec<Sample>,
    write_pos: usize,
}

impl Oscilloscope {
    pub fn new() -> Self {
        Self {
            buffer: vec![0.0; OSCILLOSCOPE_BUFFER_SIZE],
            write_pos: 0,
        }
    }

    pub fn push(&mut self, sample: Sample) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Zoom slider in `[1, 100]`: `displayedSamples = fftSize / (101 - slider)`,
    /// centred in the buffer (§4.5).
    pub fn displayed_window(&self, zoom_slider: u32) -> Vec<Sample> {
        let slider = zoom_slider.clamp(1, 100);
        let displayed = (self.buffer.len() as f64 / (101 - slider) as f64).round() as usize;
        let displayed = displayed.clamp(1, self.buffer.len());

        let mut ordered = Vec::with_capacity(self.buffer.len());
        for i in 0..self.buffer.len() {
            let idx = (self.write_pos + i) % self.buffer.len();
            ordered.push(self.buffer[idx]);
        }

        let start = (ordered.len() - displayed) / 2;
        ordered[start..start + displayed].to_vec()
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

impl Default for Oscilloscope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn detects_peak_bin_for_tone() {
        let mut tap = FftTap::new(VU_FFT_SIZE);
        let sample_rate = 12000.0;
        let freq = 1000.0;
        for i in 0..VU_FFT_SIZE {
            let t = i as f64 / sample_rate;
            tap.push((2.0 * PI * freq * t).sin());
        }
        tap.analyze();
        let peak_bin = (freq * VU_FFT_SIZE as f64 / sample_rate).round() as usize;
        let peak_mag = tap.magnitudes()[peak_bin];
        let far_mag = tap.magnitudes()[peak_bin + 200];
        assert!(peak_mag > far_mag * 5.0);
    }

    #[test]
    fn zero_smoothing_replaces_rather_than_decays() {
        let mut tap = FftTap::new(512);
        tap.push_block(&vec![1.0; 512]);
        tap.analyze();
        let first_dc = tap.magnitudes()[0];
        tap.reset();
        tap.push_block(&vec![0.0; 512]);
        tap.analyze();
        assert!(tap.magnitudes()[0] < first_dc);
    }

    #[test]
    fn oscilloscope_zoom_centers_window() {
        let mut scope = Oscilloscope::new();
        for i in 0..OSCILLOSCOPE_BUFFER_SIZE {
            scope.push(i as f64);
        }
        let window = scope.displayed_window(100);
        let expected_len = (OSCILLOSCOPE_BUFFER_SIZE as f64 / 1.0).round() as usize;
        assert_eq!(window.len(), expected_len);

        let zoomed = scope.displayed_window(1);
        assert_eq!(zoomed.len(), (OSCILLOSCOPE_BUFFER_SIZE as f64 / 100.0).round() as usize);
    }
}
