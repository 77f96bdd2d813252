//! Dynamics compressor with soft knee and makeup gain (§4.3).
//!
//! A single unit: threshold/ratio/attack/release govern the gain reduction
//! envelope, a fixed 30 dB knee softens the transition around threshold,
//! and a post-makeup clip tap feeds the clip indicator.

use crate::clip::ClipTap;
use sdr_core::Sample;

pub const DEFAULT_THRESHOLD_DB: f64 = -24.0;
pub const DEFAULT_RATIO: f64 = 12.0;
pub const DEFAULT_ATTACK_SECS: f64 = 0.003;
pub const DEFAULT_RELEASE_SECS: f64 = 0.25;
pub const KNEE_DB: f64 = 30.0;

#[inline]
fn linear_to_db(x: Sample) -> f64 {
    20.0 * x.abs().max(1e-12).log10()
}

#[inline]
fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Soft-knee gain-reduction curve: below the knee, unity; above it, the
/// configured ratio; inside the knee, a quadratic blend (the standard
/// "soft knee" construction).
fn knee_gain_reduction_db(input_db: f64, threshold_db: f64, ratio: f64, knee_db: f64) -> f64 {
    let half_knee = knee_db / 2.0;
    let below = threshold_db - half_knee;
    let above = threshold_db + half_knee;

    if input_db <= below {
        0.0
    } else if input_db >= above {
        (threshold_db + (input_db - threshold_db) / ratio) - input_db
    } else {
        let delta = input_db - below;
        let slope = (1.0 / ratio - 1.0) / (2.0 * knee_db);
        slope * delta * delta
    }
}

/// Single-channel dynamics compressor (§4.3).
pub struct Compressor {
    sample_rate: f64,
    threshold_db: f64,
    ratio: f64,
    attack_secs: f64,
    release_secs: f64,
    makeup_db: f64,
    envelope_db: f64,
    clip: ClipTap,
}

impl Compressor {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            threshold_db: DEFAULT_THRESHOLD_DB,
            ratio: DEFAULT_RATIO,
            attack_secs: DEFAULT_ATTACK_SECS,
            release_secs: DEFAULT_RELEASE_SECS,
            makeup_db: 0.0,
            envelope_db: -144.0,
            clip: ClipTap::new(),
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    pub fn set_threshold_db(&mut self, db: f64) {
        self.threshold_db = db.clamp(-60.0, 0.0);
    }

    pub fn set_ratio(&mut self, ratio: f64) {
        self.ratio = ratio.clamp(1.0, 20.0);
    }

    pub fn set_attack_secs(&mut self, secs: f64) {
        self.attack_secs = secs.clamp(0.0001, 1.0);
    }

    pub fn set_release_secs(&mut self, secs: f64) {
        self.release_secs = secs.clamp(0.001, 2.0);
    }

    pub fn set_makeup_gain_db(&mut self, db: f64) {
        self.makeup_db = db.clamp(-12.0, 24.0);
    }

    pub fn attack_secs(&self) -> f64 {
        self.attack_secs
    }

    pub fn threshold_db(&self) -> f64 {
        self.threshold_db
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn release_secs(&self) -> f64 {
        self.release_secs
    }

    pub fn makeup_gain_db(&self) -> f64 {
        self.makeup_db
    }

    pub fn is_clipping(&self) -> bool {
        self.clip.is_clipping()
    }

    /// §4.8: `attackSeconds × 1000 + 5` ms.
    pub fn latency_ms(&self) -> f64 {
        self.attack_secs * 1000.0 + 5.0
    }

    #[inline]
    pub fn process(&mut self, input: Sample) -> Sample {
        let input_db = linear_to_db(input);
        let delta_db = knee_gain_reduction_db(input_db, self.threshold_db, self.ratio, KNEE_DB);
        // delta_db <= 0 (the knee curve only ever attenuates); invert to a
        // positive "amount of reduction wanted" for the envelope follower.
        let target_reduction_db = (-delta_db).max(0.0);

        let coeff = if target_reduction_db > self.envelope_db {
            1.0 - (-1.0 / (self.attack_secs * self.sample_rate)).exp()
        } else {
            1.0 - (-1.0 / (self.release_secs * self.sample_rate)).exp()
        };
        self.envelope_db += (target_reduction_db - self.envelope_db) * coeff;

        let gain = db_to_linear(-self.envelope_db) * db_to_linear(self.makeup_db);
        let out = input * gain;
        self.clip.observe(out);
        out
    }

    pub fn reset(&mut self) {
        self.envelope_db = -144.0;
        self.clip.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_signal_passes_through_near_unity() {
        let mut comp = Compressor::new(12000.0);
        comp.set_threshold_db(-24.0);
        comp.set_ratio(12.0);
        let mut last = 0.0;
        for _ in 0..4000 {
            last = comp.process(0.001);
        }
        assert!((last - 0.001).abs() < 0.0005);
    }

    #[test]
    fn loud_signal_is_attenuated() {
        let mut comp = Compressor::new(12000.0);
        comp.set_threshold_db(-24.0);
        comp.set_ratio(12.0);
        comp.set_attack_secs(0.001);
        let mut last = 0.0;
        for _ in 0..4000 {
            last = comp.process(0.9);
        }
        assert!(last.abs() < 0.9);
    }

    #[test]
    fn latency_matches_spec_formula() {
        let mut comp = Compressor::new(12000.0);
        comp.set_attack_secs(0.003);
        assert!((comp.latency_ms() - (0.003 * 1000.0 + 5.0)).abs() < 1e-9);
    }
}
