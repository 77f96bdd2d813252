//! Tuned waterfall rendering (§4.5): the contrast/intensity transform
//! applied to each pixel's averaged magnitude before it goes through the
//! heat palette, plus the scrolling-image row buffer that transform feeds.

use crate::palette::{heat_palette, Rgb};

/// §4.5: contrast thresholding then intensity rescaling, applied to a
/// 0..=255 averaged magnitude before the heat palette.
pub fn apply_contrast_intensity(magnitude: f64, contrast: f64, intensity: f64) -> f64 {
    let m = if magnitude < contrast {
        0.0
    } else {
        ((magnitude - contrast) / (255.0 - contrast).max(f64::EPSILON)) * 255.0
    };
    if intensity < 0.0 {
        m * (1.0 + intensity)
    } else {
        (m * (1.0 + 2.0 * intensity)).min(255.0)
    }
    .clamp(0.0, 255.0)
}

/// One row of the waterfall, already through contrast/intensity/palette.
pub fn render_row(magnitudes: &[f64], contrast: f64, intensity: f64) -> Vec<Rgb> {
    magnitudes
        .iter()
        .map(|&m| heat_palette(apply_contrast_intensity(m, contrast, intensity)))
        .collect()
}

/// A scrolling image buffer: each [`Self::push_row`] shifts every existing
/// row down by one and inserts the new row at the top (§4.5: "Scroll
/// existing image by 1 row downward").
pub struct WaterfallImage {
    width: usize,
    rows: Vec<Vec<Rgb>>,
}

impl WaterfallImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            rows: vec![vec![Rgb(0, 0, 0); width]; height],
        }
    }

    pub fn push_row(&mut self, magnitudes: &[f64], contrast: f64, intensity: f64) {
        let row = render_row(magnitudes, contrast, intensity);
        self.rows.pop();
        self.rows.insert(0, row);
    }

    pub fn rows(&self) -> &[Vec<Rgb>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_contrast_threshold_goes_to_zero() {
        assert_eq!(apply_contrast_intensity(10.0, 50.0, 0.0), 0.0);
    }

    #[test]
    fn negative_intensity_dims_and_positive_brightens() {
        let base = apply_contrast_intensity(200.0, 0.0, 0.0);
        let dimmer = apply_contrast_intensity(200.0, 0.0, -0.5);
        let brighter = apply_contrast_intensity(200.0, 0.0, 0.5);
        assert!(dimmer < base);
        assert!(brighter > base);
    }

    #[test]
    fn scrolls_new_row_to_top() {
        let mut image = WaterfallImage::new(2, 3);
        image.push_row(&[255.0, 255.0], 0.0, 0.0);
        assert_eq!(image.rows()[0][0], Rgb(255, 255, 255));
        assert_eq!(image.height(), 3);
    }
}
