//! Filter overlays drawn on top of the tuned spectrum/waterfall (§4.5):
//! bandpass center/edges/shading in yellow, notches in red, both mapped
//! through the same [`sdr_core::DisplayAxis`] the bars and grid use.

use sdr_core::DisplayAxis;

use crate::palette::Rgb;

pub const BANDPASS_OVERLAY_COLOR: Rgb = Rgb(255, 255, 0);
pub const NOTCH_OVERLAY_COLOR: Rgb = Rgb(255, 0, 0);

/// A bandpass overlay: a shaded band between the edges, with the center
/// drawn as a solid line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandpassOverlay {
    pub low_px: f64,
    pub high_px: f64,
    pub center_px: f64,
}

/// Maps a bandpass's center/width (display-range Hz) to pixel positions
/// via `axis` (§4.6).
pub fn bandpass_overlay(axis: &DisplayAxis, center_hz: f64, width_hz: f64) -> BandpassOverlay {
    let half = width_hz / 2.0;
    BandpassOverlay {
        low_px: axis.freq_to_pixel(center_hz - half),
        high_px: axis.freq_to_pixel(center_hz + half),
        center_px: axis.freq_to_pixel(center_hz),
    }
}

/// A single notch overlay: a marker line at the notch center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotchOverlay {
    pub center_px: f64,
}

pub fn notch_overlay(axis: &DisplayAxis, center_hz: f64) -> NotchOverlay {
    NotchOverlay {
        center_px: axis.freq_to_pixel(center_hz),
    }
}

/// Maps every configured notch center (up to `sdr_dsp::notch::MAX_NOTCHES`)
/// to its overlay position, preserving input order.
pub fn notch_overlays(axis: &DisplayAxis, centers_hz: &[f64]) -> Vec<NotchOverlay> {
    centers_hz.iter().map(|&c| notch_overlay(axis, c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdr_core::BandSpec;

    #[test]
    fn bandpass_overlay_centers_between_edges() {
        let band = BandSpec::new(50.0, 2700.0);
        let axis = DisplayAxis::for_band(band, 1024.0);
        let overlay = bandpass_overlay(&axis, 1500.0, 600.0);
        assert!(overlay.low_px < overlay.center_px);
        assert!(overlay.center_px < overlay.high_px);
    }

    #[test]
    fn notch_overlays_preserve_order() {
        let band = BandSpec::new(50.0, 2700.0);
        let axis = DisplayAxis::for_band(band, 1024.0);
        let overlays = notch_overlays(&axis, &[800.0, 1600.0]);
        assert_eq!(overlays.len(), 2);
        assert!(overlays[0].center_px < overlays[1].center_px);
    }
}
