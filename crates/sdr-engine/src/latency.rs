//! Latency Accountant (C8, §4.8): sums each enabled effect node's own
//! latency formula into a single `sdr_core::LatencyReport`, recomputed on
//! any enable/disable or parameter update and broadcast via a change
//! event consumed by the full-band spectrum client and the UI.

use sdr_core::{EffectKind, LatencyReport};
use sdr_dsp::{EffectNode, StereoNode};

/// One enabled node's contribution, named so a caller can report the
/// per-effect breakdown without re-deriving it.
pub struct LatencyEntry {
    pub kind: EffectKind,
    pub ms: f64,
}

/// Accumulates the latency of the currently-wired chain and only emits a
/// new `LatencyReport` when the total actually changes, matching §4.8's
/// "recomputed on any enable/disable or parameter update" trigger without
/// spamming identical reports every frame.
pub struct LatencyAccountant {
    sample_rate: f64,
    last_total_ms: Option<f64>,
}

impl LatencyAccountant {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            last_total_ms: None,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.last_total_ms = None;
    }

    /// Recomputes the report from the wired mono effect chain plus an
    /// optional stereo node. `nodes` should be given in the chain's fixed
    /// §4.4 order so `per_effect` reads naturally in a UI breakdown.
    pub fn compute(&mut self, nodes: &[&EffectNode], stereo: Option<&StereoNode>) -> LatencyReport {
        let mut per_effect: Vec<(EffectKind, f64)> = nodes
            .iter()
            .map(|node| (node.kind(), node.latency_ms(self.sample_rate)))
            .collect();

        if let Some(stereo) = stereo {
            per_effect.push((EffectKind::Stereo, stereo.latency_ms()));
        }

        LatencyReport::new(per_effect)
    }

    /// Like [`Self::compute`], but returns `None` when the aggregate total
    /// hasn't changed since the last call, so callers only broadcast on
    /// genuine change.
    pub fn compute_if_changed(
        &mut self,
        nodes: &[&EffectNode],
        stereo: Option<&StereoNode>,
    ) -> Option<LatencyReport> {
        let report = self.compute(nodes, stereo);
        let changed = match self.last_total_ms {
            Some(previous) => (previous - report.total_ms).abs() > 1e-9,
            None => true,
        };
        self.last_total_ms = Some(report.total_ms);
        changed.then_some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdr_dsp::{Bandpass, Compressor, NotchSet, PeakingEq, StereoVirtualiser, VolumeMute};

    #[test]
    fn totals_match_sum_of_node_formulas() {
        let mut accountant = LatencyAccountant::new(12_000.0);
        let peaking = EffectNode::Peaking(PeakingEq::new(12_000.0));
        let gain = EffectNode::Gain(VolumeMute::new());
        let nodes: Vec<&EffectNode> = vec![&peaking, &gain];
        let report = accountant.compute(&nodes, None);

        let expected = PeakingEq::latency_ms(12_000.0);
        assert!((report.total_ms - expected).abs() < 1e-9);
    }

    #[test]
    fn stereo_contributes_when_present() {
        let mut accountant = LatencyAccountant::new(12_000.0);
        let gain = EffectNode::Gain(VolumeMute::new());
        let nodes: Vec<&EffectNode> = vec![&gain];
        let mut stereo_inner = StereoVirtualiser::new(12_000.0);
        stereo_inner.set_delay_ms(12.0);
        let stereo = StereoNode(stereo_inner);

        let report = accountant.compute(&nodes, Some(&stereo));
        assert!(report.per_effect.iter().any(|(k, _)| *k == EffectKind::Stereo));
        assert!((report.total_ms - 12.0).abs() < 1e-9);
    }

    #[test]
    fn compute_if_changed_is_quiet_on_repeat() {
        let mut accountant = LatencyAccountant::new(12_000.0);
        let compressor = EffectNode::Compressor(Compressor::new(12_000.0));
        let nodes: Vec<&EffectNode> = vec![&compressor];

        assert!(accountant.compute_if_changed(&nodes, None).is_some());
        assert!(accountant.compute_if_changed(&nodes, None).is_none());
    }

    #[test]
    fn sample_rate_change_forces_recompute() {
        let mut accountant = LatencyAccountant::new(12_000.0);
        let mut bp = Bandpass::new(12_000.0);
        bp.set_stage_count(4);
        let node = EffectNode::Bandpass(bp);
        let nodes: Vec<&EffectNode> = vec![&node];

        assert!(accountant.compute_if_changed(&nodes, None).is_some());
        assert!(accountant.compute_if_changed(&nodes, None).is_none());
        accountant.set_sample_rate(24_000.0);
        assert!(accountant.compute_if_changed(&nodes, None).is_some());
    }

    #[test]
    fn notch_count_affects_total() {
        let mut accountant = LatencyAccountant::new(12_000.0);
        let mut notches = NotchSet::new();
        notches.add(12_000.0, 1000.0, 100.0);
        notches.add(12_000.0, 2000.0, 100.0);
        let node = EffectNode::Notch(notches);
        let nodes: Vec<&EffectNode> = vec![&node];

        let report = accountant.compute(&nodes, None);
        let expected = NotchSet::latency_ms(12_000.0, 2);
        assert!((report.total_ms - expected).abs() < 1e-9);
    }
}
