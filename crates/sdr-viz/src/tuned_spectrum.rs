//! Tuned spectrum rendering (§4.5): per-pixel bar levels averaged from the
//! analyser's byte-quantised magnitudes, a decaying peak-hold overlay, and
//! the fixed dB grid lines drawn behind the bars.

use sdr_core::FftBinMapping;
use sdr_dsp::analysis::FftTap;

/// §4.5: "Maintain a per-pixel peak with decay 0.3 units/frame."
pub const PEAK_DECAY_PER_FRAME: f64 = 0.3;

/// The fixed dB grid lines drawn behind the tuned-spectrum bars (§4.5).
pub const DB_GRID_LINES: [f64; 7] = [0.0, -10.0, -20.0, -30.0, -40.0, -50.0, -60.0];

/// One rendered column: the current byte-quantised level (0..=255) and the
/// decaying peak level above it, both already averaged across the bins
/// that fall under this pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarColumn {
    pub level: f64,
    pub peak: f64,
    pub hue_degrees: f64,
}

/// For pixel `x`, average `tap`'s byte-quantised magnitude over the bin
/// range `[floor(startBinFloat), ceil(startBinFloat + binsPerPixel))`
/// (§4.5). `full_scale_db`/`floor_db` are the dB range `FftTap::
/// magnitude_byte` normalises against.
fn bin_average_level(
    mapping: &FftBinMapping,
    tap: &FftTap,
    pixel: f64,
    canvas_width: f64,
    full_scale_db: f64,
    floor_db: f64,
) -> f64 {
    let start_bin_float = mapping.pixel_to_bin_float(pixel, canvas_width);
    let bins_per_pixel = mapping.bins_per_pixel(canvas_width);
    let lo = start_bin_float.floor().max(0.0) as usize;
    let hi = (start_bin_float + bins_per_pixel).ceil().max(lo as f64 + 1.0) as usize;
    let hi = hi.min(tap.bin_count());
    if lo >= hi {
        return 0.0;
    }
    let sum: f64 = (lo..hi)
        .map(|bin| tap.magnitude_byte(bin, full_scale_db, floor_db) as f64)
        .sum();
    sum / (hi - lo) as f64
}

/// Stateful per-pixel peak-hold overlay for the tuned spectrum bars.
pub struct SpectrumBars {
    peaks: Vec<f64>,
}

impl SpectrumBars {
    pub fn new(canvas_width: usize) -> Self {
        Self {
            peaks: vec![0.0; canvas_width],
        }
    }

    pub fn resize(&mut self, canvas_width: usize) {
        self.peaks.resize(canvas_width, 0.0);
    }

    /// Advance one frame: recompute every column's level from `tap`/
    /// `mapping`, decay the peak-hold, and raise it where the new level
    /// exceeds it.
    pub fn update(
        &mut self,
        mapping: &FftBinMapping,
        tap: &FftTap,
        full_scale_db: f64,
        floor_db: f64,
    ) -> Vec<BarColumn> {
        let canvas_width = self.peaks.len();
        let mut columns = Vec::with_capacity(canvas_width);
        for (x, peak) in self.peaks.iter_mut().enumerate() {
            let level = bin_average_level(
                mapping,
                tap,
                x as f64,
                canvas_width as f64,
                full_scale_db,
                floor_db,
            );
            *peak = (*peak - PEAK_DECAY_PER_FRAME).max(0.0).max(level);
            columns.push(BarColumn {
                level,
                peak: *peak,
                hue_degrees: crate::palette::level_hue_degrees(level.round().clamp(0.0, 255.0) as u8),
            });
        }
        columns
    }

    /// Bar height in pixels for a given level, over a canvas of
    /// `canvas_height` pixels (§4.5: "map [0,255] to [0, canvasHeight]").
    pub fn height_px(level: f64, canvas_height: f64) -> f64 {
        (level / 255.0).clamp(0.0, 1.0) * canvas_height
    }
}

/// Y pixel coordinates for the fixed dB grid lines (§4.5), given the
/// analyser's `full_scale_db`/`floor_db` range and the canvas height.
pub fn db_grid_y_positions(full_scale_db: f64, floor_db: f64, canvas_height: f64) -> Vec<(f64, f64)> {
    DB_GRID_LINES
        .iter()
        .filter(|&&db| db <= full_scale_db && db >= floor_db)
        .map(|&db| {
            let normalized = (db - floor_db) / (full_scale_db - floor_db);
            (db, canvas_height - normalized * canvas_height)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdr_core::BandSpec;
    use sdr_dsp::analysis::VU_FFT_SIZE;

    #[test]
    fn peak_hold_decays_then_tracks_rising_level() {
        let mut bars = SpectrumBars::new(4);
        let band = BandSpec::new(50.0, 2700.0);
        let mapping = band.fft_bin_mapping(12000.0, VU_FFT_SIZE);
        let mut tap = FftTap::new(VU_FFT_SIZE);
        tap.push_block(&vec![1.0; VU_FFT_SIZE]);
        tap.analyze();

        let first = bars.update(&mapping, &tap, 0.0, -80.0);
        tap.reset();
        tap.push_block(&vec![0.0; VU_FFT_SIZE]);
        tap.analyze();
        let second = bars.update(&mapping, &tap, 0.0, -80.0);

        for (f, s) in first.iter().zip(second.iter()) {
            assert!(s.peak <= f.peak + 1e-9);
            assert!(s.level <= s.peak + 1e-9);
        }
    }

    #[test]
    fn db_grid_positions_are_within_canvas() {
        let positions = db_grid_y_positions(0.0, -80.0, 400.0);
        assert_eq!(positions.len(), 7);
        for (_, y) in positions {
            assert!((0.0..=400.0).contains(&y));
        }
    }
}
