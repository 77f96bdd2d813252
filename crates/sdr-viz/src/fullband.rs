//! Full-band spectrum/waterfall rendering (§4.7): the zoom/pan view over
//! the cached `config` coordinate system, click-to-tune, the tuning
//! cursor, and the shaded passband. Deliberately independent of
//! `sdr-connector`'s wire client (it owns message consumption and the
//! noise-floor estimate) so this math is testable without a socket.

/// The coordinate system cached from the last `config` message (§4.7),
/// plus the view's current zoom/pan state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FullbandView {
    pub center_freq_hz: f64,
    pub bin_bandwidth_hz: f64,
    pub bin_count: usize,
    /// Zoom factor, `>= 1.0`; `1.0` shows the whole band.
    pub zoom: f64,
    /// Requested pan offset from `center_freq_hz`, Hz. Clamped at read
    /// time so the visible window never leaves `[center ± total/2]`.
    pub pan_offset_hz: f64,
}

impl FullbandView {
    pub fn new(center_freq_hz: f64, bin_bandwidth_hz: f64, bin_count: usize) -> Self {
        Self {
            center_freq_hz,
            bin_bandwidth_hz,
            bin_count,
            zoom: 1.0,
            pan_offset_hz: 0.0,
        }
    }

    pub fn total_bandwidth_hz(&self) -> f64 {
        self.bin_bandwidth_hz * self.bin_count as f64
    }

    pub fn visible_bandwidth_hz(&self) -> f64 {
        self.total_bandwidth_hz() / self.zoom.max(1.0)
    }

    /// The visible window's centre, pan clamped so the window stays
    /// within `[centerFreq ± totalBandwidth/2]` (§4.7).
    fn visible_center_hz(&self) -> f64 {
        let total = self.total_bandwidth_hz();
        let visible = self.visible_bandwidth_hz();
        let half_visible = visible / 2.0;
        let min_center = self.center_freq_hz - total / 2.0 + half_visible;
        let max_center = self.center_freq_hz + total / 2.0 - half_visible;
        (self.center_freq_hz + self.pan_offset_hz).clamp(min_center.min(max_center), max_center.max(min_center))
    }

    pub fn visible_range_hz(&self) -> (f64, f64) {
        let center = self.visible_center_hz();
        let half = self.visible_bandwidth_hz() / 2.0;
        (center - half, center + half)
    }

    /// §4.7 click-to-tune, generalised to the current zoom/pan window:
    /// `tunedFreq := visibleLow + p * visibleBandwidth / canvasWidth`. At
    /// zoom 1.0 / pan 0.0 this reduces exactly to the spec's unscaled
    /// formula (`centerFreq - binBandwidth*binCount/2 + ...`).
    pub fn pixel_to_freq(&self, pixel: f64, canvas_width: f64) -> f64 {
        let (low, _high) = self.visible_range_hz();
        low + pixel * self.visible_bandwidth_hz() / canvas_width
    }

    pub fn freq_to_pixel(&self, freq: f64, canvas_width: f64) -> f64 {
        let (low, _high) = self.visible_range_hz();
        (freq - low) / self.visible_bandwidth_hz() * canvas_width
    }

    /// Maps a bin index (into the cached `config`'s `binCount`) to its
    /// pixel column under the current zoom/pan.
    pub fn bin_to_pixel(&self, bin: usize, canvas_width: f64) -> f64 {
        let freq = self.center_freq_hz - self.total_bandwidth_hz() / 2.0
            + bin as f64 * self.bin_bandwidth_hz;
        self.freq_to_pixel(freq, canvas_width)
    }
}

/// The tuning cursor and shaded passband overlay for the full-band view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningOverlay {
    pub cursor_px: f64,
    pub passband_low_px: f64,
    pub passband_high_px: f64,
}

/// §4.7: "a tuning cursor at tunedFreq, a shaded passband from
/// `[tunedFreq + bwLow, tunedFreq + bwHigh]`."
pub fn tuning_overlay(view: &FullbandView, tuned_freq_hz: f64, bw_low_hz: f64, bw_high_hz: f64, canvas_width: f64) -> TuningOverlay {
    TuningOverlay {
        cursor_px: view.freq_to_pixel(tuned_freq_hz, canvas_width),
        passband_low_px: view.freq_to_pixel(tuned_freq_hz + bw_low_hz, canvas_width),
        passband_high_px: view.freq_to_pixel(tuned_freq_hz + bw_high_hz, canvas_width),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unzoomed_click_to_tune_matches_unscaled_formula() {
        let view = FullbandView::new(14_200_000.0, 50.0, 4096);
        let expected = view.center_freq_hz - view.bin_bandwidth_hz * view.bin_count as f64 / 2.0
            + 400.0 * view.bin_bandwidth_hz * view.bin_count as f64 / 800.0;
        assert!((view.pixel_to_freq(400.0, 800.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn zoom_narrows_the_visible_window() {
        let mut view = FullbandView::new(14_200_000.0, 50.0, 4096);
        let wide = view.visible_bandwidth_hz();
        view.zoom = 4.0;
        let narrow = view.visible_bandwidth_hz();
        assert!((wide / narrow - 4.0).abs() < 1e-9);
    }

    #[test]
    fn pan_is_clamped_to_total_bandwidth() {
        let mut view = FullbandView::new(14_200_000.0, 50.0, 4096);
        view.zoom = 4.0;
        view.pan_offset_hz = 1_000_000_000.0;
        let (low, high) = view.visible_range_hz();
        let total = view.total_bandwidth_hz();
        assert!(low >= view.center_freq_hz - total / 2.0 - 1e-6);
        assert!(high <= view.center_freq_hz + total / 2.0 + 1e-6);
    }

    #[test]
    fn tuning_overlay_orders_passband_edges() {
        let view = FullbandView::new(14_200_000.0, 50.0, 4096);
        let overlay = tuning_overlay(&view, 14_200_000.0, -2700.0, -50.0, 800.0);
        assert!(overlay.passband_low_px < overlay.passband_high_px);
        assert!(overlay.passband_high_px <= overlay.cursor_px + 1e-6);
    }
}
