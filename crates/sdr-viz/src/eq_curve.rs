//! EQ curve rendering: the combined frequency response of the 12-band
//! peaking EQ (§4.3), sampled at log-spaced frequencies for a host to
//! draw as a polyline, plus the curve canvas's dB/frequency grid lines.

use sdr_dsp::biquad::BiquadCoeffs;
use sdr_dsp::eq::{BAND_CENTERS_HZ, BAND_Q};
use std::f64::consts::PI;

/// The dB grid lines drawn behind the curve, spanning the ±12 dB band
/// range each section of `PeakingEq` is clamped to.
pub const DB_GRID_LINES: [f64; 7] = [-12.0, -8.0, -4.0, 0.0, 4.0, 8.0, 12.0];

/// Reference frequency grid lines for the log-frequency axis.
pub const FREQ_GRID_LINES: [f64; 8] = [50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0];

/// Magnitude response in dB of one biquad section at `freq_hz` (standard
/// evaluation of `H(z)` at `z = e^{jw}`).
fn section_response_db(coeffs: &BiquadCoeffs, freq_hz: f64, sample_rate: f64) -> f64 {
    let omega = 2.0 * PI * freq_hz / sample_rate;
    let (sin_w, cos_w) = omega.sin_cos();
    let z1_re = cos_w;
    let z1_im = -sin_w;
    let z2_re = cos_w * cos_w - sin_w * sin_w;
    let z2_im = -2.0 * sin_w * cos_w;

    let num_re = coeffs.b0 + coeffs.b1 * z1_re + coeffs.b2 * z2_re;
    let num_im = coeffs.b1 * z1_im + coeffs.b2 * z2_im;
    let den_re = 1.0 + coeffs.a1 * z1_re + coeffs.a2 * z2_re;
    let den_im = coeffs.a1 * z1_im + coeffs.a2 * z2_im;

    let num_mag = (num_re * num_re + num_im * num_im).sqrt();
    let den_mag = (den_re * den_re + den_im * den_im).sqrt().max(1e-12);
    20.0 * (num_mag / den_mag).max(1e-12).log10()
}

/// The combined response of all 12 bands plus the wideband makeup gain,
/// at `num_points` log-spaced frequencies from 20 Hz to 20 kHz.
pub fn combined_response_db(
    band_gains_db: &[f64; 12],
    makeup_db: f64,
    sample_rate: f64,
    num_points: usize,
) -> Vec<(f64, f64)> {
    let log_min = 20.0_f64.ln();
    let log_max = 20_000.0_f64.ln();
    let n = num_points.max(2);

    (0..n)
        .map(|i| {
            let t = i as f64 / (n - 1) as f64;
            let freq = (log_min + t * (log_max - log_min)).exp();
            let total_db: f64 = BAND_CENTERS_HZ
                .iter()
                .zip(band_gains_db.iter())
                .map(|(&center, &gain_db)| {
                    let coeffs = BiquadCoeffs::peaking(sample_rate, center, BAND_Q, gain_db);
                    section_response_db(&coeffs, freq, sample_rate)
                })
                .sum::<f64>()
                + makeup_db;
            (freq, total_db)
        })
        .collect()
}

/// Maps a curve point to a canvas pixel: log-frequency x axis, linear dB
/// y axis clamped to `[min_db, max_db]`.
pub fn point_to_pixel(freq_hz: f64, db: f64, min_db: f64, max_db: f64, canvas_width: f64, canvas_height: f64) -> (f64, f64) {
    let log_min = 20.0_f64.ln();
    let log_max = 20_000.0_f64.ln();
    let x = ((freq_hz.max(20.0).ln() - log_min) / (log_max - log_min)) * canvas_width;
    let normalized = ((db.clamp(min_db, max_db) - min_db) / (max_db - min_db)).clamp(0.0, 1.0);
    let y = (1.0 - normalized) * canvas_height;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdr_dsp::eq::EqPreset;

    #[test]
    fn flat_bands_yield_near_zero_response() {
        let curve = combined_response_db(&[0.0; 12], 0.0, 12000.0, 64);
        for (_, db) in curve {
            assert!(db.abs() < 1e-6);
        }
    }

    #[test]
    fn voice_preset_boosts_near_its_peak_band() {
        let curve = combined_response_db(&EqPreset::VOICE.band_gains_db, EqPreset::VOICE.makeup_gain_db(), 12000.0, 256);
        let (_, db_near_1500) = curve
            .iter()
            .min_by(|a, b| (a.0 - 1500.0).abs().partial_cmp(&(b.0 - 1500.0).abs()).unwrap())
            .copied()
            .unwrap();
        assert!(db_near_1500 > 0.0);
    }

    #[test]
    fn point_to_pixel_keeps_extremes_within_canvas() {
        let (x, y) = point_to_pixel(20.0, -12.0, -12.0, 12.0, 800.0, 400.0);
        assert!((x - 0.0).abs() < 1.0);
        assert!((y - 400.0).abs() < 1.0);
    }
}
