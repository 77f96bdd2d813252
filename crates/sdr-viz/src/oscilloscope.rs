//! Oscilloscope rendering (§4.5): the 8x4 grid, zero line, and the 2-px
//! green waveform polyline built from the zoomed/centred sample window.

use sdr_core::Sample;

use crate::palette::Rgb;

pub const GRID_COLUMNS: usize = 8;
pub const GRID_ROWS: usize = 4;
pub const WAVEFORM_COLOR: Rgb = Rgb(0, 255, 0);
pub const WAVEFORM_WIDTH_PX: f64 = 2.0;

/// Vertical grid line x positions, `GRID_COLUMNS + 1` lines spanning the
/// canvas evenly.
pub fn grid_columns_px(canvas_width: f64) -> Vec<f64> {
    (0..=GRID_COLUMNS)
        .map(|i| i as f64 * canvas_width / GRID_COLUMNS as f64)
        .collect()
}

/// Horizontal grid line y positions, `GRID_ROWS + 1` lines spanning the
/// canvas evenly.
pub fn grid_rows_px(canvas_height: f64) -> Vec<f64> {
    (0..=GRID_ROWS)
        .map(|i| i as f64 * canvas_height / GRID_ROWS as f64)
        .collect()
}

/// The zero-amplitude line, at vertical center.
pub fn zero_line_px(canvas_height: f64) -> f64 {
    canvas_height / 2.0
}

/// Builds the waveform polyline for one window of samples (already zoomed
/// and centred via `Oscilloscope::displayed_window`), mapping sample index
/// to x and amplitude in `[-1, 1]` to y.
pub fn waveform_polyline(samples: &[Sample], canvas_width: f64, canvas_height: f64) -> Vec<(f64, f64)> {
    if samples.is_empty() {
        return Vec::new();
    }
    let half_height = canvas_height / 2.0;
    samples
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let x = i as f64 * canvas_width / (samples.len().max(1) - 1).max(1) as f64;
            let y = half_height - s.clamp(-1.0, 1.0) * half_height;
            (x, y)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_expected_line_counts() {
        assert_eq!(grid_columns_px(800.0).len(), GRID_COLUMNS + 1);
        assert_eq!(grid_rows_px(400.0).len(), GRID_ROWS + 1);
    }

    #[test]
    fn zero_line_sits_at_vertical_center() {
        assert_eq!(zero_line_px(400.0), 200.0);
    }

    #[test]
    fn waveform_maps_first_and_last_sample_to_canvas_edges() {
        let samples = vec![1.0, 0.0, -1.0];
        let points = waveform_polyline(&samples, 200.0, 100.0);
        assert_eq!(points[0].0, 0.0);
        assert_eq!(points.last().unwrap().0, 200.0);
        assert_eq!(points[0].1, 0.0);
        assert_eq!(points.last().unwrap().1, 100.0);
    }
}
