//! The effect registry: the Session's concrete, owned instance of every
//! node in the fixed topology (§4.3/§4.4/§9). `sdr_engine::GraphAssembler`
//! and `GraphInstance` describe *which* stages are wired for a given
//! frame; this is the thing they describe wiring *into* — the actual
//! `EffectNode`s live here for the lifetime of the session, and a
//! `GraphInstance` is just a cheap, disposable plan for how to walk them.

use sdr_core::{EffectKind, Sample, StereoSample};
use sdr_dsp::{
    Bandpass, Compressor, EffectNode, NoiseReduction, NotchSet, ParamValue, PeakingEq, Squelch,
    StereoNode, StereoVirtualiser, VolumeMute,
};
use sdr_engine::GraphPlan;
use sdr_state::{EffectSettings, SessionConfig};

/// Owns one instance of every effect node plus the stereo virtualiser, and
/// the [`GraphPlan`] recording which are currently wired in. `set_param`
/// and `set_enabled` are the two control-plane entry points; `process`
/// walks the fixed chain in §4.4's order for one input sample.
pub struct EffectRegistry {
    sample_rate: f64,
    plan: GraphPlan,
    peaking: EffectNode,
    bandpass: EffectNode,
    notch: EffectNode,
    compressor: EffectNode,
    nr: EffectNode,
    squelch: EffectNode,
    gain: EffectNode,
    stereo: StereoNode,
}

impl EffectRegistry {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            plan: GraphPlan::new(),
            peaking: EffectNode::Peaking(PeakingEq::new(sample_rate)),
            bandpass: EffectNode::Bandpass(Bandpass::new(sample_rate)),
            notch: EffectNode::Notch(NotchSet::new()),
            compressor: EffectNode::Compressor(Compressor::new(sample_rate)),
            nr: EffectNode::Nr(NoiseReduction::new(sample_rate)),
            squelch: EffectNode::Squelch(Squelch::new(sample_rate)),
            gain: EffectNode::Gain(VolumeMute::new()),
            stereo: StereoNode(StereoVirtualiser::new(sample_rate)),
        }
    }

    pub fn plan(&self) -> GraphPlan {
        self.plan
    }

    pub fn set_enabled(&mut self, kind: EffectKind, enabled: bool) {
        match kind {
            EffectKind::Compressor => self.plan.compressor = enabled,
            EffectKind::Bandpass => self.plan.bandpass = enabled,
            EffectKind::Notch => self.plan.notch = enabled,
            EffectKind::Nr => self.plan.nr = enabled,
            EffectKind::Peaking => self.plan.peaking = enabled,
            EffectKind::Squelch => self.plan.squelch = enabled,
            EffectKind::Stereo => self.plan.stereo = enabled,
            // Gain has no enable flag of its own: it is the always-present
            // tail of the chain (§4.4).
            EffectKind::Gain => {}
        }
    }

    pub fn is_enabled(&self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::Compressor => self.plan.compressor,
            EffectKind::Bandpass => self.plan.bandpass,
            EffectKind::Notch => self.plan.notch,
            EffectKind::Nr => self.plan.nr,
            EffectKind::Peaking => self.plan.peaking,
            EffectKind::Squelch => self.plan.squelch,
            EffectKind::Stereo => self.plan.stereo,
            EffectKind::Gain => true,
        }
    }

    /// Dispatches a named parameter write to the node it targets. Notch
    /// add/remove is its own pair of methods below, since a `NotchSet`
    /// entry is a unit, not a single named parameter (§3).
    pub fn set_param(&mut self, target: EffectKind, name: &str, value: ParamValue) {
        match target {
            EffectKind::Peaking => self.peaking.set_param(name, value),
            EffectKind::Bandpass => self.bandpass.set_param(name, value),
            EffectKind::Notch => {}
            EffectKind::Compressor => self.compressor.set_param(name, value),
            EffectKind::Nr => self.nr.set_param(name, value),
            EffectKind::Squelch => self.squelch.set_param(name, value),
            EffectKind::Gain => self.gain.set_param(name, value),
            EffectKind::Stereo => self.stereo.set_param(name, value),
        }
    }

    /// Adds a notch at the registry's current sample rate; returns
    /// whether it was added (false once [`sdr_dsp::NotchSet`]'s five-notch
    /// ceiling is reached).
    pub fn add_notch(&mut self, center_hz: f64, width_hz: f64) -> bool {
        match &mut self.notch {
            EffectNode::Notch(set) => set.add(self.sample_rate, center_hz, width_hz),
            _ => unreachable!("notch field always holds EffectNode::Notch"),
        }
    }

    pub fn remove_notch(&mut self, index: usize) {
        if let EffectNode::Notch(set) = &mut self.notch {
            set.remove(index);
        }
    }

    pub fn set_squelch_thresholds_db(&mut self, open_db: f64, close_db: f64) {
        if let EffectNode::Squelch(sq) = &mut self.squelch {
            sq.set_thresholds_db(open_db, close_db);
        }
    }

    pub fn squelch_is_open(&self) -> bool {
        match &self.squelch {
            EffectNode::Squelch(sq) => sq.is_open(),
            _ => unreachable!("squelch field always holds EffectNode::Squelch"),
        }
    }

    /// `(openDb, closeDb)` of the live squelch node, carried on outbound
    /// `tune` commands so the daemon's own squelch tracks the client's.
    pub fn squelch_thresholds_db(&self) -> (f64, f64) {
        match &self.squelch {
            EffectNode::Squelch(sq) => (sq.open_db(), sq.close_db()),
            _ => unreachable!("squelch field always holds EffectNode::Squelch"),
        }
    }

    pub fn apply_eq_preset(&mut self, preset: &sdr_dsp::EqPreset) {
        if let EffectNode::Peaking(eq) = &mut self.peaking {
            eq.apply_preset(preset);
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        if let EffectNode::Peaking(n) = &mut self.peaking {
            n.set_sample_rate(sample_rate);
        }
        if let EffectNode::Bandpass(n) = &mut self.bandpass {
            n.set_sample_rate(sample_rate);
        }
        if let EffectNode::Notch(n) = &mut self.notch {
            n.set_sample_rate(sample_rate);
        }
        if let EffectNode::Compressor(n) = &mut self.compressor {
            n.set_sample_rate(sample_rate);
        }
        if let EffectNode::Nr(n) = &mut self.nr {
            n.set_sample_rate(sample_rate);
        }
        if let EffectNode::Squelch(n) = &mut self.squelch {
            n.set_sample_rate(sample_rate);
        }
        self.stereo.0.set_sample_rate(sample_rate);
    }

    /// Walks the fixed §4.4 chain for one input sample, producing the
    /// stereo pair fed to the sink. The stereo virtualiser is the only
    /// stage that turns mono into stereo; Volume/Mute always runs last,
    /// on both channels independently (it is stateless, so calling it
    /// twice per sample carries no risk of double-counted envelope state).
    pub fn process(&mut self, input: Sample) -> StereoSample {
        let mut x = input;
        if self.plan.compressor {
            x = self.compressor.apply(x);
        }
        if self.plan.bandpass {
            x = self.bandpass.apply(x);
        }
        if self.plan.notch {
            x = self.notch.apply(x);
        }
        if self.plan.nr {
            x = self.nr.apply(x);
        }
        if self.plan.peaking {
            x = self.peaking.apply(x);
        }
        if self.plan.squelch {
            x = self.squelch.apply(x);
        }

        let stereo_out = if self.plan.stereo {
            self.stereo.0.process(x)
        } else {
            StereoSample::new(x, x)
        };

        let left = self.gain.apply(stereo_out.left);
        let right = self.gain.apply(stereo_out.right);
        StereoSample::new(left, right)
    }

    /// The currently-wired mono nodes in §4.4's fixed order, for the
    /// latency accountant. `Gain` is always included since it is always
    /// wired; the stereo node is reported separately (see
    /// [`Self::stereo_node`]).
    pub fn wired_nodes(&self) -> Vec<&EffectNode> {
        let mut nodes = Vec::with_capacity(7);
        if self.plan.compressor {
            nodes.push(&self.compressor);
        }
        if self.plan.bandpass {
            nodes.push(&self.bandpass);
        }
        if self.plan.notch {
            nodes.push(&self.notch);
        }
        if self.plan.nr {
            nodes.push(&self.nr);
        }
        if self.plan.peaking {
            nodes.push(&self.peaking);
        }
        if self.plan.squelch {
            nodes.push(&self.squelch);
        }
        nodes.push(&self.gain);
        nodes
    }

    pub fn stereo_node(&self) -> Option<&StereoNode> {
        self.plan.stereo.then_some(&self.stereo)
    }

    pub fn is_clipping(&self) -> bool {
        self.peaking.is_clipping()
            || self.bandpass.is_clipping()
            || self.compressor.is_clipping()
            || self.stereo.0.is_clipping()
    }

    pub fn reset_all(&mut self) {
        self.peaking.reset();
        self.bandpass.reset();
        self.notch.reset();
        self.compressor.reset();
        self.nr.reset();
        self.squelch.reset();
        self.stereo.0.reset();
    }

    /// Captures every node's enable flag and settable parameters into a
    /// [`SessionConfig`] (§4.9 invariant 6). Spectrum display settings are
    /// not this registry's concern; the caller merges those in separately.
    pub fn snapshot(&self) -> SessionConfig {
        let mut config = SessionConfig::new();

        if let EffectNode::Peaking(eq) = &self.peaking {
            let mut settings = EffectSettings::new(self.plan.peaking)
                .with_param("makeup_db", eq.makeup_gain_db());
            for band in 0..12 {
                settings = settings.with_param(format!("band_{band}"), eq.band_gain_db(band));
            }
            config.set_effect(EffectKind::Peaking, settings);
        }
        if let EffectNode::Bandpass(bp) = &self.bandpass {
            config.set_effect(
                EffectKind::Bandpass,
                EffectSettings::new(self.plan.bandpass)
                    .with_param("center_hz", bp.center_hz())
                    .with_param("width_hz", bp.width_hz())
                    .with_param("stages", bp.stage_count() as f64),
            );
        }
        if let EffectNode::Notch(set) = &self.notch {
            let mut settings = EffectSettings::new(self.plan.notch);
            for (i, (center_hz, width_hz)) in set.entries().into_iter().enumerate() {
                settings = settings
                    .with_param(format!("center_{i}"), center_hz)
                    .with_param(format!("width_{i}"), width_hz);
            }
            settings = settings.with_param("count", set.len() as f64);
            config.set_effect(EffectKind::Notch, settings);
        }
        if let EffectNode::Compressor(c) = &self.compressor {
            config.set_effect(
                EffectKind::Compressor,
                EffectSettings::new(self.plan.compressor)
                    .with_param("threshold_db", c.threshold_db())
                    .with_param("ratio", c.ratio())
                    .with_param("attack_secs", c.attack_secs())
                    .with_param("release_secs", c.release_secs())
                    .with_param("makeup_db", c.makeup_gain_db()),
            );
        }
        if let EffectNode::Nr(nr) = &self.nr {
            config.set_effect(
                EffectKind::Nr,
                EffectSettings::new(self.plan.nr)
                    .with_param("strength", nr.strength())
                    .with_param("floor_db", nr.floor_db())
                    .with_param("adapt_rate", nr.adapt_rate())
                    .with_param("adapting", if nr.adapting() { 1.0 } else { 0.0 }),
            );
        }
        if let EffectNode::Squelch(sq) = &self.squelch {
            config.set_effect(
                EffectKind::Squelch,
                EffectSettings::new(self.plan.squelch)
                    .with_param("open_db", sq.open_db())
                    .with_param("close_db", sq.close_db())
                    .with_param("attack_ms", sq.attack_ms())
                    .with_param("release_ms", sq.release_ms()),
            );
        }
        config.set_effect(
            EffectKind::Stereo,
            EffectSettings::new(self.plan.stereo)
                .with_param("delay_ms", self.stereo.0.delay_ms())
                .with_param("width", self.stereo.0.width())
                .with_param("makeup_db", self.stereo.0.makeup_gain_db()),
        );
        if let EffectNode::Gain(g) = &self.gain {
            config.set_effect(
                EffectKind::Gain,
                EffectSettings::new(true)
                    .with_param("volume", g.volume())
                    .with_param("muted", if g.is_muted() { 1.0 } else { 0.0 }),
            );
        }

        config
    }

    /// Restores every node's enable flag and parameters from a
    /// [`SessionConfig`] (the other half of invariant 6's round trip).
    /// Missing effects are left at their current state rather than reset
    /// to defaults, matching the store's "missing key is non-fatal" policy
    /// one layer up.
    pub fn restore(&mut self, config: &SessionConfig) {
        if let Some(settings) = config.effect(EffectKind::Peaking) {
            self.plan.peaking = settings.enabled;
            if let Some(&makeup) = settings.params.get("makeup_db") {
                self.set_param(EffectKind::Peaking, "makeup_db", ParamValue::Float(makeup));
            }
            for band in 0..12 {
                if let Some(&gain) = settings.params.get(&format!("band_{band}")) {
                    self.set_param(
                        EffectKind::Peaking,
                        &format!("band_{band}"),
                        ParamValue::Float(gain),
                    );
                }
            }
        }
        if let Some(settings) = config.effect(EffectKind::Bandpass) {
            self.plan.bandpass = settings.enabled;
            for (name, value) in &settings.params {
                self.set_param(EffectKind::Bandpass, name, ParamValue::Float(*value));
            }
        }
        if let Some(settings) = config.effect(EffectKind::Notch) {
            self.plan.notch = settings.enabled;
            if let EffectNode::Notch(set) = &mut self.notch {
                *set = NotchSet::new();
            }
            let count = settings.params.get("count").copied().unwrap_or(0.0) as usize;
            for i in 0..count {
                let center = settings.params.get(&format!("center_{i}")).copied();
                let width = settings.params.get(&format!("width_{i}")).copied();
                if let (Some(center_hz), Some(width_hz)) = (center, width) {
                    self.add_notch(center_hz, width_hz);
                }
            }
        }
        if let Some(settings) = config.effect(EffectKind::Compressor) {
            self.plan.compressor = settings.enabled;
            for (name, value) in &settings.params {
                self.set_param(EffectKind::Compressor, name, ParamValue::Float(*value));
            }
        }
        if let Some(settings) = config.effect(EffectKind::Nr) {
            self.plan.nr = settings.enabled;
            for (name, value) in &settings.params {
                let param = if name == "adapting" {
                    ParamValue::Bool(*value != 0.0)
                } else {
                    ParamValue::Float(*value)
                };
                self.set_param(EffectKind::Nr, name, param);
            }
        }
        if let Some(settings) = config.effect(EffectKind::Squelch) {
            self.plan.squelch = settings.enabled;
            let open = settings.params.get("open_db").copied();
            let close = settings.params.get("close_db").copied();
            if let (Some(open_db), Some(close_db)) = (open, close) {
                self.set_squelch_thresholds_db(open_db, close_db);
            }
            for name in ["attack_ms", "release_ms"] {
                if let Some(&value) = settings.params.get(name) {
                    self.set_param(EffectKind::Squelch, name, ParamValue::Float(value));
                }
            }
        }
        if let Some(settings) = config.effect(EffectKind::Stereo) {
            self.plan.stereo = settings.enabled;
            for (name, value) in &settings.params {
                self.set_param(EffectKind::Stereo, name, ParamValue::Float(*value));
            }
        }
        if let Some(settings) = config.effect(EffectKind::Gain) {
            if let Some(&volume) = settings.params.get("volume") {
                self.set_param(EffectKind::Gain, "volume", ParamValue::Float(volume));
            }
            if let Some(&muted) = settings.params.get("muted") {
                self.set_param(EffectKind::Gain, "muted", ParamValue::Bool(muted != 0.0));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_passes_through_with_everything_disabled_except_gain() {
        let mut registry = EffectRegistry::new(12_000.0);
        let out = registry.process(0.5);
        assert_eq!(out.left, 0.5);
        assert_eq!(out.right, 0.5);
    }

    #[test]
    fn muting_gain_silences_both_channels() {
        let mut registry = EffectRegistry::new(12_000.0);
        registry.set_param(EffectKind::Gain, "muted", ParamValue::Bool(true));
        let out = registry.process(0.5);
        assert_eq!(out.left, 0.0);
        assert_eq!(out.right, 0.0);
    }

    #[test]
    fn enabling_stereo_splits_channels() {
        let mut registry = EffectRegistry::new(12_000.0);
        registry.set_enabled(EffectKind::Stereo, true);
        registry.set_param(EffectKind::Stereo, "width", ParamValue::Float(1.0));
        registry.set_param(EffectKind::Stereo, "delay_ms", ParamValue::Float(10.0));
        let mut last = StereoSample::default();
        for i in 0..64 {
            last = registry.process((i as f64 * 0.3).sin());
        }
        assert_ne!(last.left, last.right);
    }

    #[test]
    fn wired_nodes_respects_enabled_flags_and_always_includes_gain() {
        let mut registry = EffectRegistry::new(12_000.0);
        registry.set_enabled(EffectKind::Compressor, true);
        registry.set_enabled(EffectKind::Notch, true);
        let kinds: Vec<EffectKind> = registry.wired_nodes().iter().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![EffectKind::Compressor, EffectKind::Notch, EffectKind::Gain]
        );
    }

    #[test]
    fn settings_round_trip_through_snapshot_and_restore() {
        let mut registry = EffectRegistry::new(12_000.0);
        registry.set_enabled(EffectKind::Bandpass, true);
        registry.set_param(EffectKind::Bandpass, "center_hz", ParamValue::Float(1500.0));
        registry.set_param(EffectKind::Bandpass, "width_hz", ParamValue::Float(2700.0));
        registry.add_notch(2000.0, 100.0);
        registry.set_enabled(EffectKind::Notch, true);
        registry.set_param(EffectKind::Gain, "volume", ParamValue::Float(0.6));

        let snapshot = registry.snapshot();

        let mut restored = EffectRegistry::new(12_000.0);
        restored.restore(&snapshot);

        assert_eq!(restored.is_enabled(EffectKind::Bandpass), true);
        assert_eq!(restored.snapshot(), snapshot);
    }

    #[test]
    fn notch_add_is_capped_at_five() {
        let mut registry = EffectRegistry::new(12_000.0);
        for i in 0..8 {
            registry.add_notch(500.0 + i as f64 * 100.0, 50.0);
        }
        if let EffectNode::Notch(set) = &registry.notch {
            assert_eq!(set.len(), 5);
        }
    }
}
