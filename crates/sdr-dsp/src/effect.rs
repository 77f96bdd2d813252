//! Closed-set effect dispatch (§9 Design Notes): polymorphism here is a
//! capability set {apply, setParam, latencySamples} over a fixed list of
//! variants, not an open trait object hierarchy — a tagged enum with a
//! small dispatch table, matching how the source's effect chain is built.

use crate::bandpass::Bandpass;
use crate::dynamics::Compressor;
use crate::eq::PeakingEq;
use crate::gain::VolumeMute;
use crate::notch::NotchSet;
use crate::spectral::NoiseReduction;
use crate::squelch::Squelch;
use crate::stereo::StereoVirtualiser;
use sdr_core::{EffectKind, Sample};

/// A named, validated parameter write, delivered from the control plane.
/// Out-of-range values are clamped by the receiving node (§4.3).
#[derive(Debug, Clone, Copy)]
pub enum ParamValue {
    Float(f64),
    Bool(bool),
    Int(i64),
}

impl ParamValue {
    pub fn as_f64(self) -> f64 {
        match self {
            ParamValue::Float(v) => v,
            ParamValue::Bool(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
            ParamValue::Int(v) => v as f64,
        }
    }

    pub fn as_bool(self) -> bool {
        match self {
            ParamValue::Bool(v) => v,
            ParamValue::Float(v) => v != 0.0,
            ParamValue::Int(v) => v != 0,
        }
    }

    pub fn as_usize(self) -> usize {
        self.as_f64().max(0.0) as usize
    }
}

/// One mono-chain effect node. `Gain` carries no mono-bus clip tap of its
/// own (§4.3 places clip taps on EQ, Compressor, and Stereo); `Stereo`
/// processes separately since it is the chain's only stereo-producing node
/// (see [`crate::effect::StereoOut`]).
pub enum EffectNode {
    Peaking(PeakingEq),
    Bandpass(Bandpass),
    Notch(NotchSet),
    Compressor(Compressor),
    Nr(NoiseReduction),
    Squelch(Squelch),
    Gain(VolumeMute),
}

impl EffectNode {
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectNode::Peaking(_) => EffectKind::Peaking,
            EffectNode::Bandpass(_) => EffectKind::Bandpass,
            EffectNode::Notch(_) => EffectKind::Notch,
            EffectNode::Compressor(_) => EffectKind::Compressor,
            EffectNode::Nr(_) => EffectKind::Nr,
            EffectNode::Squelch(_) => EffectKind::Squelch,
            EffectNode::Gain(_) => EffectKind::Gain,
        }
    }

    /// `apply(in) -> out` (§4.3's common contract).
    #[inline]
    pub fn apply(&mut self, input: Sample) -> Sample {
        match self {
            EffectNode::Peaking(n) => n.process(input),
            EffectNode::Bandpass(n) => n.process(input),
            EffectNode::Notch(n) => n.process(input),
            EffectNode::Compressor(n) => n.process(input),
            EffectNode::Nr(n) => n.process(input),
            EffectNode::Squelch(n) => n.process(input),
            EffectNode::Gain(n) => n.process(input),
        }
    }

    /// `setParam(name, value)`: unrecognised names are ignored rather than
    /// erroring, matching §4.3's "clamp and surface a non-fatal warning"
    /// policy for anything out of bounds.
    pub fn set_param(&mut self, name: &str, value: ParamValue) {
        match (self, name) {
            (EffectNode::Peaking(eq), "makeup_db") => eq.set_makeup_gain_db(value.as_f64()),
            (EffectNode::Peaking(eq), band) if band.starts_with("band_") => {
                if let Ok(index) = band.trim_start_matches("band_").parse::<usize>() {
                    eq.set_band_gain_db(index, value.as_f64());
                }
            }
            (EffectNode::Bandpass(bp), "center_hz") => bp.set_center_hz(value.as_f64()),
            (EffectNode::Bandpass(bp), "width_hz") => bp.set_width_hz(value.as_f64()),
            (EffectNode::Bandpass(bp), "stages") => bp.set_stage_count(value.as_usize()),
            (EffectNode::Compressor(c), "threshold_db") => c.set_threshold_db(value.as_f64()),
            (EffectNode::Compressor(c), "ratio") => c.set_ratio(value.as_f64()),
            (EffectNode::Compressor(c), "attack_secs") => c.set_attack_secs(value.as_f64()),
            (EffectNode::Compressor(c), "release_secs") => c.set_release_secs(value.as_f64()),
            (EffectNode::Compressor(c), "makeup_db") => c.set_makeup_gain_db(value.as_f64()),
            (EffectNode::Nr(nr), "strength") => nr.set_strength(value.as_f64()),
            (EffectNode::Nr(nr), "floor_db") => nr.set_floor_db(value.as_f64()),
            (EffectNode::Nr(nr), "adapt_rate") => nr.set_adapt_rate(value.as_f64()),
            (EffectNode::Nr(nr), "adapting") => nr.set_adapting(value.as_bool()),
            (EffectNode::Squelch(sq), "attack_ms") => sq.set_attack_ms(value.as_f64()),
            (EffectNode::Squelch(sq), "release_ms") => sq.set_release_ms(value.as_f64()),
            (EffectNode::Gain(g), "volume") => g.set_volume(value.as_f64()),
            (EffectNode::Gain(g), "muted") => g.set_muted(value.as_bool()),
            _ => {}
        }
    }

    /// `latencySamples(sampleRate)`, derived from each node's §4.8 formula.
    pub fn latency_ms(&self, sample_rate: f64) -> f64 {
        match self {
            EffectNode::Peaking(_) => PeakingEq::latency_ms(sample_rate),
            EffectNode::Bandpass(bp) => Bandpass::latency_ms(sample_rate, bp.stage_count()),
            EffectNode::Notch(set) => NotchSet::latency_ms(sample_rate, set.len()),
            EffectNode::Compressor(c) => c.latency_ms(),
            EffectNode::Nr(_) => NoiseReduction::latency_ms(sample_rate),
            EffectNode::Squelch(sq) => sq.latency_ms(),
            EffectNode::Gain(_) => 0.0,
        }
    }

    pub fn reset(&mut self) {
        match self {
            EffectNode::Peaking(n) => n.reset(),
            EffectNode::Bandpass(n) => n.reset(),
            EffectNode::Notch(n) => n.reset(),
            EffectNode::Compressor(n) => n.reset(),
            EffectNode::Nr(n) => n.reset(),
            EffectNode::Squelch(n) => n.reset(),
            EffectNode::Gain(_) => {}
        }
    }

    pub fn is_clipping(&self) -> bool {
        match self {
            EffectNode::Peaking(n) => n.is_clipping(),
            EffectNode::Compressor(n) => n.is_clipping(),
            EffectNode::Bandpass(n) => n.is_clipping(),
            _ => false,
        }
    }
}

/// The Stereo Virtualiser produces a stereo pair and is the last stage
/// before Volume/Mute, so it is dispatched separately from the mono
/// [`EffectNode`] chain rather than folded into `apply`'s `Sample -> Sample`
/// signature.
pub struct StereoNode(pub StereoVirtualiser);

impl StereoNode {
    pub fn set_param(&mut self, name: &str, value: ParamValue) {
        match name {
            "delay_ms" => self.0.set_delay_ms(value.as_f64()),
            "width" => self.0.set_width(value.as_f64()),
            "makeup_db" => self.0.set_makeup_gain_db(value.as_f64()),
            _ => {}
        }
    }

    pub fn latency_ms(&self) -> f64 {
        self.0.latency_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_param_clamps_through_to_node() {
        let mut node = EffectNode::Compressor(Compressor::new(12000.0));
        node.set_param("ratio", ParamValue::Float(1000.0));
        if let EffectNode::Compressor(c) = &node {
            assert!(c.attack_secs() > 0.0);
        }
    }

    #[test]
    fn unknown_param_name_is_ignored() {
        let mut node = EffectNode::Gain(VolumeMute::new());
        node.set_param("nonexistent", ParamValue::Float(5.0));
        assert_eq!(node.apply(1.0), 1.0);
    }

    #[test]
    fn gain_node_has_zero_latency() {
        let node = EffectNode::Gain(VolumeMute::new());
        assert_eq!(node.latency_ms(12000.0), 0.0);
    }

    #[test]
    fn bandpass_latency_tracks_stage_count() {
        let mut bp = Bandpass::new(12000.0);
        bp.set_stage_count(4);
        let node = EffectNode::Bandpass(bp);
        assert!((node.latency_ms(12000.0) - (4.0 / 12000.0 * 1000.0)).abs() < 1e-9);
    }
}
