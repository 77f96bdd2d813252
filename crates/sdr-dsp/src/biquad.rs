//! Biquad filter implementation using Transposed Direct Form II.
//!
//! TDF-II keeps internal state to two delay elements per section and is
//! numerically well-behaved for the cascades used by the effect chain: the
//! 12-band peaking EQ, the bandpass cascade, and the notch cascade.

use sdr_core::Sample;
use std::f64::consts::PI;

/// Filter response shapes used by the effect chain (§4.3). Each design
/// function below derives the standard RBJ cookbook coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    Peaking,
    Bandpass,
    Notch,
}

/// Normalized biquad coefficients (`a0` already divided out).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    pub fn identity() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }

    /// RBJ peaking EQ design: `center_hz` at `q`, boost/cut by `gain_db`.
    pub fn peaking(sample_rate: f64, center_hz: f64, q: f64, gain_db: f64) -> Self {
        let a = 10f64.powf(gain_db / 40.0);
        let w0 = 2.0 * PI * center_hz / sample_rate;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();

        let b0 = 1.0 + alpha * a;
        let b1 = -2.0 * cos_w0;
        let b2 = 1.0 - alpha * a;
        let a0 = 1.0 + alpha / a;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha / a;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// RBJ constant-skirt-gain bandpass design.
    pub fn bandpass(sample_rate: f64, center_hz: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * center_hz / sample_rate;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();

        let b0 = alpha;
        let b1 = 0.0;
        let b2 = -alpha;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// RBJ notch design.
    pub fn notch(sample_rate: f64, center_hz: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * center_hz / sample_rate;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();

        let b0 = 1.0;
        let b1 = -2.0 * cos_w0;
        let b2 = 1.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    pub fn design(filter: FilterType, sample_rate: f64, center_hz: f64, q: f64, gain_db: f64) -> Self {
        match filter {
            FilterType::Peaking => Self::peaking(sample_rate, center_hz, q, gain_db),
            FilterType::Bandpass => Self::bandpass(sample_rate, center_hz, q),
            FilterType::Notch => Self::notch(sample_rate, center_hz, q),
        }
    }
}

/// One Transposed Direct Form II biquad section.
#[derive(Debug, Clone, Copy, Default)]
pub struct BiquadTdf2 {
    z1: f64,
    z2: f64,
}

impl BiquadTdf2 {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn process(&mut self, coeffs: &BiquadCoeffs, input: Sample) -> Sample {
        let output = coeffs.b0 * input + self.z1;
        self.z1 = coeffs.b1 * input - coeffs.a1 * output + self.z2;
        self.z2 = coeffs.b2 * input - coeffs.a2 * output;
        output
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// A cascade of identical biquad sections at the same center/Q, used by the
/// bandpass (§4.3, `stages in 1..8`) and notch (fixed 6 stages) effects.
#[derive(Debug, Clone)]
pub struct BiquadCascade {
    sections: Vec<BiquadTdf2>,
    coeffs: BiquadCoeffs,
}

impl BiquadCascade {
    pub fn new(stage_count: usize) -> Self {
        Self {
            sections: vec![BiquadTdf2::new(); stage_count.max(1)],
            coeffs: BiquadCoeffs::identity(),
        }
    }

    pub fn set_stage_count(&mut self, stage_count: usize) {
        self.sections.resize_with(stage_count.max(1), BiquadTdf2::new);
    }

    pub fn stage_count(&self) -> usize {
        self.sections.len()
    }

    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    #[inline]
    pub fn process(&mut self, input: Sample) -> Sample {
        let mut x = input;
        for section in &mut self.sections {
            x = section.process(&self.coeffs, x);
        }
        x
    }

    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peaking_at_unity_gain_is_near_transparent() {
        let coeffs = BiquadCoeffs::peaking(48000.0, 1000.0, 1.0, 0.0);
        let mut section = BiquadTdf2::new();
        let mut max_dev = 0.0f64;
        for i in 0..64 {
            let input = ((i as f64) * 0.37).sin();
            let output = section.process(&coeffs, input);
            max_dev = max_dev.max((output - input).abs());
        }
        assert!(max_dev < 1e-9);
    }

    #[test]
    fn bandpass_cascade_attenuates_far_from_center() {
        let mut cascade = BiquadCascade::new(4);
        cascade.set_coeffs(BiquadCoeffs::bandpass(12000.0, 1000.0, 4.0));

        let energy = |freq: f64, cascade: &mut BiquadCascade| -> f64 {
            cascade.reset();
            let mut sum = 0.0;
            for i in 0..4096 {
                let t = i as f64 / 12000.0;
                let x = (2.0 * PI * freq * t).sin();
                let y = cascade.process(x);
                if i > 512 {
                    sum += y * y;
                }
            }
            sum
        };

        let at_center = energy(1000.0, &mut cascade);
        let far = energy(100.0, &mut cascade);
        assert!(far < at_center * 0.05);
    }

    #[test]
    fn notch_cascade_attenuates_at_center() {
        let mut cascade = BiquadCascade::new(6);
        cascade.set_coeffs(BiquadCoeffs::notch(12000.0, 1000.0, 10.0));

        let mut sum = 0.0;
        for i in 0..4096 {
            let t = i as f64 / 12000.0;
            let x = (2.0 * PI * 1000.0 * t).sin();
            let y = cascade.process(x);
            if i > 512 {
                sum += y * y;
            }
        }
        assert!(sum < 1.0);
    }
}
