//! Colour mappings shared by the tuned and full-band waterfalls (§4.5,
//! §4.7): a fixed heat palette, independent of any GPU colour-ramp
//! texture, since this crate produces byte/RGB buffers for a host to
//! blit rather than driving a render pipeline itself.

/// One RGB triple, 0..=255 per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// The fixed heat palette (§4.5): black -> blue -> cyan -> green -> yellow
/// -> red -> white, segmented at these normalised breakpoints.
const STOPS: [(f64, Rgb); 7] = [
    (0.0, Rgb(0, 0, 0)),
    (0.2, Rgb(0, 0, 255)),
    (0.4, Rgb(0, 255, 255)),
    (0.6, Rgb(0, 255, 0)),
    (0.8, Rgb(255, 255, 0)),
    (0.95, Rgb(255, 0, 0)),
    (1.0, Rgb(255, 255, 255)),
];

/// Maps a normalised magnitude `m` in `[0, 255]` through the heat palette.
pub fn heat_palette(m: f64) -> Rgb {
    let t = (m / 255.0).clamp(0.0, 1.0);
    for pair in STOPS.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let span = (t1 - t0).max(f64::EPSILON);
            let frac = ((t - t0) / span).clamp(0.0, 1.0);
            return lerp(c0, c1, frac);
        }
    }
    STOPS.last().unwrap().1
}

fn lerp(a: Rgb, b: Rgb, t: f64) -> Rgb {
    Rgb(
        lerp_channel(a.0, b.0, t),
        lerp_channel(a.1, b.1, t),
        lerp_channel(a.2, b.2, t),
    )
}

fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}

/// §4.5 tuned-spectrum bar colour: `hue = 120 * (1 - level/255)`
/// (green at full scale, red at the floor). Returned in degrees, the unit
/// a host's HSL-to-RGB conversion expects.
pub fn level_hue_degrees(level: u8) -> f64 {
    120.0 * (1.0 - level as f64 / 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_is_black_and_ceiling_is_white() {
        assert_eq!(heat_palette(0.0), Rgb(0, 0, 0));
        assert_eq!(heat_palette(255.0), Rgb(255, 255, 255));
    }

    #[test]
    fn mid_breakpoint_lands_on_cyan() {
        assert_eq!(heat_palette(0.4 * 255.0), Rgb(0, 255, 255));
    }

    #[test]
    fn hue_is_green_at_full_scale_and_red_at_floor() {
        assert!((level_hue_degrees(255) - 0.0).abs() < 1e-9);
        assert!((level_hue_degrees(0) - 120.0).abs() < 1e-9);
    }
}
