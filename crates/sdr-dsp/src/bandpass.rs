//! Bandpass (§4.3): a cascade of 1..8 identical biquad bandpass sections at
//! the same center and Q, giving roughly 12 dB/octave rolloff per stage.

use crate::biquad::{BiquadCascade, BiquadCoeffs};
use crate::clip::ClipTap;
use sdr_core::Sample;

pub const MIN_STAGES: usize = 1;
pub const MAX_STAGES: usize = 8;
pub const DEFAULT_STAGES: usize = 4;
pub const MIN_Q: f64 = 0.7;

/// Bandpass now derives Q from `center / width × stages / 2` (the modular
/// variant of the two formulas the source carried; it scales with stage
/// count, which the spec calls "probably intended" — §9 Open Questions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QMode {
    Automatic,
    Manual,
}

pub struct Bandpass {
    sample_rate: f64,
    cascade: BiquadCascade,
    center_hz: f64,
    width_hz: f64,
    q_mode: QMode,
    manual_q_multiplier: f64,
    clip: ClipTap,
}

impl Bandpass {
    pub fn new(sample_rate: f64) -> Self {
        let mut bp = Self {
            sample_rate,
            cascade: BiquadCascade::new(DEFAULT_STAGES),
            center_hz: 1000.0,
            width_hz: 500.0,
            q_mode: QMode::Automatic,
            manual_q_multiplier: 1.0,
            clip: ClipTap::new(),
        };
        bp.rebuild();
        bp
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.rebuild();
        self.cascade.reset();
    }

    pub fn set_stage_count(&mut self, stages: usize) {
        let stages = stages.clamp(MIN_STAGES, MAX_STAGES);
        self.cascade.set_stage_count(stages);
        self.rebuild();
    }

    pub fn stage_count(&self) -> usize {
        self.cascade.stage_count()
    }

    pub fn set_center_hz(&mut self, center_hz: f64) {
        self.center_hz = center_hz.max(1.0);
        self.rebuild();
    }

    pub fn center_hz(&self) -> f64 {
        self.center_hz
    }

    pub fn set_width_hz(&mut self, width_hz: f64) {
        self.width_hz = width_hz.max(1.0);
        self.rebuild();
    }

    pub fn width_hz(&self) -> f64 {
        self.width_hz
    }

    pub fn set_q_mode(&mut self, mode: QMode) {
        self.q_mode = mode;
        self.rebuild();
    }

    pub fn set_manual_q_multiplier(&mut self, multiplier: f64) {
        self.manual_q_multiplier = multiplier.max(0.01);
        self.rebuild();
    }

    fn q(&self) -> f64 {
        let stages = self.cascade.stage_count() as f64;
        let base = self.center_hz / self.width_hz * stages / 2.0;
        match self.q_mode {
            QMode::Automatic => base.max(MIN_Q),
            QMode::Manual => (base * self.manual_q_multiplier).max(MIN_Q),
        }
    }

    fn rebuild(&mut self) {
        let coeffs = BiquadCoeffs::bandpass(self.sample_rate, self.center_hz, self.q());
        self.cascade.set_coeffs(coeffs);
    }

    pub fn is_clipping(&self) -> bool {
        self.clip.is_clipping()
    }

    /// §4.8: `stages / sampleRate × 1000`.
    pub fn latency_ms(sample_rate: f64, stages: usize) -> f64 {
        stages as f64 / sample_rate * 1000.0
    }

    #[inline]
    pub fn process(&mut self, input: Sample) -> Sample {
        let out = self.cascade.process(input);
        self.clip.observe(out);
        out
    }

    pub fn reset(&mut self) {
        self.cascade.reset();
        self.clip.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn q_scales_with_stage_count() {
        let mut bp = Bandpass::new(12000.0);
        bp.set_center_hz(1000.0);
        bp.set_width_hz(500.0);
        bp.set_stage_count(2);
        let q_two = bp.q();
        bp.set_stage_count(4);
        let q_four = bp.q();
        assert!((q_four - q_two * 2.0).abs() < 1e-9);
    }

    #[test]
    fn q_floors_at_minimum() {
        let mut bp = Bandpass::new(12000.0);
        bp.set_center_hz(100.0);
        bp.set_width_hz(100000.0);
        bp.set_stage_count(1);
        assert!(bp.q() >= MIN_Q);
    }

    #[test]
    fn stage_count_clamped_to_spec_range() {
        let mut bp = Bandpass::new(12000.0);
        bp.set_stage_count(20);
        assert_eq!(bp.stage_count(), MAX_STAGES);
        bp.set_stage_count(0);
        assert_eq!(bp.stage_count(), MIN_STAGES);
    }

    #[test]
    fn latency_matches_spec_formula() {
        assert!((Bandpass::latency_ms(12000.0, 4) - (4.0 / 12000.0 * 1000.0)).abs() < 1e-12);
    }
}
