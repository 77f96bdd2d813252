//! sdr-viz: pixel-space rendering math for the tuned and full-band
//! spectrum/waterfall displays (C5/C6/C7's rendering half, §4.5-§4.7).
//!
//! This crate computes byte-quantised magnitudes, hue/palette colours and
//! pixel coordinates for a host UI to blit; it does not drive a GPU
//! pipeline itself, so every module here is testable without a canvas.
//!
//! - `tuned_spectrum` - tuned-analyser bar levels, peak hold, dB grid
//! - `waterfall` - contrast/intensity transform, heat palette, scrolling
//!   image buffer (shared by the tuned and full-band waterfalls)
//! - `fullband` - full-band zoom/pan view, click-to-tune, tuning cursor
//!   and passband shading
//! - `filter_overlay` - bandpass/notch overlay pixel positions
//! - `oscilloscope` - grid, zero line and waveform polyline
//! - `eq_curve` - combined 12-band EQ response curve
//! - `palette` - the fixed heat palette and the spectrum-bar hue mapping

pub mod error;
pub mod eq_curve;
pub mod filter_overlay;
pub mod fullband;
pub mod oscilloscope;
pub mod palette;
pub mod tuned_spectrum;
pub mod waterfall;

pub use error::{VizError, VizResult};
pub use filter_overlay::{bandpass_overlay, notch_overlay, notch_overlays, BandpassOverlay, NotchOverlay};
pub use fullband::{tuning_overlay, FullbandView, TuningOverlay};
pub use oscilloscope::waveform_polyline;
pub use palette::{heat_palette, level_hue_degrees, Rgb};
pub use tuned_spectrum::{db_grid_y_positions, BarColumn, SpectrumBars};
pub use waterfall::{apply_contrast_intensity, WaterfallImage};
