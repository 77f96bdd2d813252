//! 12-band peaking parametric EQ (§4.3).
//!
//! Fixed centers, fixed Q=1.0, gain bounded to ±12 dB per band. A post-EQ
//! wideband makeup gain follows the last band, with a tap for clip
//! detection (§7's Clip error kind) placed immediately after it.

use crate::biquad::{BiquadCoeffs, BiquadTdf2};
use crate::clip::ClipTap;
use sdr_core::Sample;

/// Fixed band centers (Hz), in order.
pub const BAND_CENTERS_HZ: [f64; 12] = [
    60.0, 170.0, 310.0, 600.0, 1000.0, 1500.0, 2000.0, 2500.0, 3000.0, 4000.0, 6000.0, 8000.0,
];

pub const BAND_Q: f64 = 1.0;
pub const MAX_GAIN_DB: f64 = 12.0;

/// A named curve over the 12 bands plus a makeup-gain compensation, used by
/// the "voice" and "cw" presets.
#[derive(Debug, Clone, Copy)]
pub struct EqPreset {
    pub band_gains_db: [f64; 12],
}

impl EqPreset {
    /// §4.3: makeup = −0.7 × mean(positive band gains), clamped ±12 dB.
    pub fn makeup_gain_db(&self) -> f64 {
        let positive: Vec<f64> = self.band_gains_db.iter().copied().filter(|&g| g > 0.0).collect();
        if positive.is_empty() {
            return 0.0;
        }
        let mean = positive.iter().sum::<f64>() / positive.len() as f64;
        (-0.7 * mean).clamp(-MAX_GAIN_DB, MAX_GAIN_DB)
    }

    pub const VOICE: Self = Self {
        band_gains_db: [-6.0, -3.0, 0.0, 2.0, 4.0, 5.0, 4.0, 2.0, 1.0, 0.0, -3.0, -6.0],
    };

    pub const CW: Self = Self {
        band_gains_db: [
            -12.0, -12.0, -9.0, -6.0, -2.0, 6.0, 8.0, 4.0, -4.0, -9.0, -12.0, -12.0,
        ],
    };
}

/// The 12-band peaking EQ effect node.
pub struct PeakingEq {
    sample_rate: f64,
    band_gains_db: [f64; 12],
    makeup_db: f64,
    sections: [BiquadTdf2; 12],
    coeffs: [BiquadCoeffs; 12],
    clip: ClipTap,
}

impl PeakingEq {
    pub fn new(sample_rate: f64) -> Self {
        let mut eq = Self {
            sample_rate,
            band_gains_db: [0.0; 12],
            makeup_db: 0.0,
            sections: [BiquadTdf2::new(); 12],
            coeffs: [BiquadCoeffs::identity(); 12],
            clip: ClipTap::new(),
        };
        eq.rebuild_all();
        eq
    }

    fn rebuild_all(&mut self) {
        for i in 0..12 {
            self.coeffs[i] = BiquadCoeffs::peaking(
                self.sample_rate,
                BAND_CENTERS_HZ[i],
                BAND_Q,
                self.band_gains_db[i],
            );
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.rebuild_all();
        for section in &mut self.sections {
            section.reset();
        }
    }

    /// Set one band's gain in dB, clamped to ±12 dB.
    pub fn set_band_gain_db(&mut self, band: usize, gain_db: f64) {
        if band >= 12 {
            return;
        }
        self.band_gains_db[band] = gain_db.clamp(-MAX_GAIN_DB, MAX_GAIN_DB);
        self.coeffs[band] = BiquadCoeffs::peaking(
            self.sample_rate,
            BAND_CENTERS_HZ[band],
            BAND_Q,
            self.band_gains_db[band],
        );
    }

    pub fn set_makeup_gain_db(&mut self, db: f64) {
        self.makeup_db = db.clamp(-MAX_GAIN_DB, MAX_GAIN_DB);
    }

    pub fn makeup_gain_db(&self) -> f64 {
        self.makeup_db
    }

    pub fn band_gain_db(&self, band: usize) -> f64 {
        self.band_gains_db.get(band).copied().unwrap_or(0.0)
    }

    pub fn apply_preset(&mut self, preset: &EqPreset) {
        self.band_gains_db = preset.band_gains_db;
        self.makeup_db = preset.makeup_gain_db();
        self.rebuild_all();
    }

    pub fn is_clipping(&self) -> bool {
        self.clip.is_clipping()
    }

    /// §4.8: `12 / sampleRate × 1000` ms — one sample of group delay
    /// attributed per band.
    pub fn latency_ms(sample_rate: f64) -> f64 {
        12.0 / sample_rate * 1000.0
    }

    #[inline]
    pub fn process(&mut self, input: Sample) -> Sample {
        let mut x = input;
        for i in 0..12 {
            x = self.sections[i].process(&self.coeffs[i], x);
        }
        let makeup_gain = 10f64.powf(self.makeup_db / 20.0);
        let out = x * makeup_gain;
        self.clip.observe(out);
        out
    }

    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
        self.clip.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_eq_is_near_transparent() {
        let mut eq = PeakingEq::new(12000.0);
        let mut max_dev = 0.0f64;
        for i in 0..256 {
            let x = ((i as f64) * 0.1).sin();
            let y = eq.process(x);
            max_dev = max_dev.max((y - x).abs());
        }
        assert!(max_dev < 1e-6);
    }

    #[test]
    fn band_gain_clamps_to_12_db() {
        let mut eq = PeakingEq::new(12000.0);
        eq.set_band_gain_db(0, 100.0);
        assert_eq!(eq.band_gains_db[0], 12.0);
        eq.set_band_gain_db(0, -100.0);
        assert_eq!(eq.band_gains_db[0], -12.0);
    }

    #[test]
    fn preset_makeup_gain_matches_formula() {
        let makeup = EqPreset::VOICE.makeup_gain_db();
        let positive: Vec<f64> = EqPreset::VOICE
            .band_gains_db
            .iter()
            .copied()
            .filter(|&g| g > 0.0)
            .collect();
        let mean = positive.iter().sum::<f64>() / positive.len() as f64;
        assert!((makeup - (-0.7 * mean).clamp(-12.0, 12.0)).abs() < 1e-9);
    }

    #[test]
    fn latency_matches_spec_table() {
        assert!((PeakingEq::latency_ms(12000.0) - (12.0 / 12000.0 * 1000.0)).abs() < 1e-12);
    }
}
