//! Noise Reduction (NR, §4.3): frequency-domain spectral subtraction via
//! overlap-add.
//!
//! FFT size 2048, hop 512 (4× overlap), Hann window on both analysis and
//! synthesis. The noise-floor estimate per bin tracks the input magnitude
//! spectrum whenever adaptation is enabled; the output gain per bin floors
//! at a configurable dB value so the effect never fully mutes a bin.

use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;
use sdr_core::Sample;
use std::f64::consts::PI;
use std::sync::Arc;

pub const FFT_SIZE: usize = 2048;
pub const HOP_SIZE: usize = 512;
const OVERLAP_FACTOR: usize = FFT_SIZE / HOP_SIZE; // 4
const BASE_ADAPT_RATE: f64 = 0.01;

fn hann_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / (size - 1) as f64).cos())
        .collect()
}

pub struct NoiseReduction {
    sample_rate: f64,
    strength: f64,
    floor_db: f64,
    adapt_rate_user: f64,
    adapting: bool,

    fft: Arc<dyn RealToComplex<f64>>,
    ifft: Arc<dyn ComplexToReal<f64>>,
    window: Vec<f64>,
    window_norm: f64,

    input_ring: Vec<Sample>,
    input_pos: usize,
    /// Circular overlap-add accumulator, exactly one FFT window long: each
    /// block write touches every slot exactly once (mod `FFT_SIZE`), and
    /// each drained sample is zeroed so the next lap starts fresh.
    output_ring: Vec<Sample>,
    write_pos: usize,
    read_pos: usize,

    noise_estimate: Vec<f64>,
    spectrum_scratch: Vec<Complex<f64>>,
    real_scratch: Vec<f64>,
}

impl NoiseReduction {
    pub fn new(sample_rate: f64) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let ifft = planner.plan_fft_inverse(FFT_SIZE);
        let window = hann_window(FFT_SIZE);

        // Overlap-add normalization for 4x overlap Hann windows applied
        // symmetrically on analysis and synthesis.
        let window_norm: f64 = window.iter().map(|w| w * w).sum::<f64>() / OVERLAP_FACTOR as f64;

        Self {
            sample_rate,
            strength: 0.5,
            floor_db: -20.0,
            adapt_rate_user: 1.0,
            adapting: true,
            fft,
            ifft,
            window,
            window_norm,
            input_ring: vec![0.0; FFT_SIZE],
            input_pos: 0,
            output_ring: vec![0.0; FFT_SIZE],
            write_pos: 0,
            read_pos: 0,
            noise_estimate: vec![0.0; FFT_SIZE / 2 + 1],
            spectrum_scratch: vec![Complex::new(0.0, 0.0); FFT_SIZE / 2 + 1],
            real_scratch: vec![0.0; FFT_SIZE],
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    pub fn set_strength(&mut self, strength: f64) {
        self.strength = strength.clamp(0.0, 1.0);
    }

    pub fn set_floor_db(&mut self, floor_db: f64) {
        self.floor_db = floor_db.clamp(-40.0, 0.0);
    }

    pub fn set_adapt_rate(&mut self, rate: f64) {
        self.adapt_rate_user = rate.max(0.0);
    }

    /// Whether the noise estimate updates this frame. Driven externally
    /// (e.g. a "learn noise" toggle, or tied to squelch-closed periods).
    pub fn set_adapting(&mut self, adapting: bool) {
        self.adapting = adapting;
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn floor_db(&self) -> f64 {
        self.floor_db
    }

    pub fn adapt_rate(&self) -> f64 {
        self.adapt_rate_user
    }

    pub fn adapting(&self) -> bool {
        self.adapting
    }

    /// §4.8: `(fftSize + ringSize) / sampleRate × 1000`, fftSize = ringSize
    /// = 2048.
    pub fn latency_ms(sample_rate: f64) -> f64 {
        (FFT_SIZE + FFT_SIZE) as f64 / sample_rate * 1000.0
    }

    /// Feed one input sample; returns one (delayed) output sample. Internal
    /// buffering means the true output latency is `2 * FFT_SIZE` samples.
    pub fn process(&mut self, input: Sample) -> Sample {
        self.input_ring[self.input_pos] = input;
        self.input_pos += 1;

        if self.input_pos == FFT_SIZE {
            self.process_block();
            // Slide the analysis window by one hop.
            self.input_ring.copy_within(HOP_SIZE.., 0);
            self.input_pos = FFT_SIZE - HOP_SIZE;
            self.write_pos = (self.write_pos + HOP_SIZE) % FFT_SIZE;
        }

        let out = self.output_ring[self.read_pos];
        self.output_ring[self.read_pos] = 0.0;
        self.read_pos = (self.read_pos + 1) % FFT_SIZE;
        out
    }

    fn process_block(&mut self) {
        for i in 0..FFT_SIZE {
            self.real_scratch[i] = self.input_ring[i] * self.window[i];
        }

        self.fft
            .process(&mut self.real_scratch, &mut self.spectrum_scratch)
            .expect("NR forward FFT size mismatch");

        let alpha = (self.adapt_rate_user * BASE_ADAPT_RATE).clamp(0.0, 1.0);
        for (k, bin) in self.spectrum_scratch.iter_mut().enumerate() {
            let mag = bin.norm();
            if self.adapting {
                self.noise_estimate[k] =
                    (1.0 - alpha) * self.noise_estimate[k] + alpha * mag;
            }
            let floor_linear = 10f64.powf(self.floor_db / 20.0);
            let gain = (1.0 - self.strength * self.noise_estimate[k] / (mag + 1e-9))
                .max(floor_linear);
            *bin *= gain;
        }

        self.ifft
            .process(&mut self.spectrum_scratch, &mut self.real_scratch)
            .expect("NR inverse FFT size mismatch");

        for i in 0..FFT_SIZE {
            let synthesized = self.real_scratch[i] * self.window[i] / self.window_norm
                / FFT_SIZE as f64;
            let idx = (self.write_pos + i) % FFT_SIZE;
            self.output_ring[idx] += synthesized;
        }
    }

    pub fn reset(&mut self) {
        self.input_ring.fill(0.0);
        self.input_pos = 0;
        self.output_ring.fill(0.0);
        self.write_pos = 0;
        self.read_pos = 0;
        self.noise_estimate.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_matches_spec_formula() {
        assert!((NoiseReduction::latency_ms(12000.0) - (4096.0 / 12000.0 * 1000.0)).abs() < 1e-9);
    }

    #[test]
    fn gain_never_drops_below_floor() {
        let mut nr = NoiseReduction::new(12000.0);
        nr.set_strength(1.0);
        nr.set_floor_db(-20.0);
        nr.set_adapting(true);
        let mut max_abs = 0.0f64;
        for i in 0..(FFT_SIZE * 4) {
            let t = i as f64 / 12000.0;
            let x = 0.5 * (2.0 * PI * 440.0 * t).sin();
            let y = nr.process(x);
            max_abs = max_abs.max(y.abs());
        }
        assert!(max_abs.is_finite());
    }

    #[test]
    fn silence_in_silence_out_once_settled() {
        let mut nr = NoiseReduction::new(12000.0);
        let mut last = 1.0;
        for _ in 0..(FFT_SIZE * 3) {
            last = nr.process(0.0);
        }
        assert!(last.abs() < 1e-6);
    }
}
