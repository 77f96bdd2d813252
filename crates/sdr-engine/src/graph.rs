//! Graph Assembler (C4, §4.4): for each decoded frame, builds the fixed
//! chain
//!
//! ```text
//! Source -> Pre-tap
//!        -> [Compressor -> MakeupGain]?
//!        -> [Bandpass cascade]?
//!        -> [Notch cascade per notch]?
//!        -> [NR]?
//!        -> [EQ bands -> EQ makeup]?
//!        -> [Squelch]?
//!        -> [Stereo virtualiser + makeup]?
//!        -> Volume/Mute
//!        -> Post-tap
//!        -> Sink
//! ```
//!
//! Order is fixed; a disabled stage is omitted but the rest never
//! reorders. Nodes are non-owning references into the Session's effect
//! registry (see [`crate::state::EffectRegistry`]) — the assembler never
//! owns them, so a graph can be discarded without touching node state.

use sdr_core::EffectKind;

/// Which enabled stages participate in this frame's graph, in the fixed
/// order of §4.4. Compressor/Bandpass/Notch/Nr/Peaking/Squelch/Stereo are
/// each individually toggleable; Gain always runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphPlan {
    pub compressor: bool,
    pub bandpass: bool,
    pub notch: bool,
    pub nr: bool,
    pub peaking: bool,
    pub squelch: bool,
    pub stereo: bool,
}

impl GraphPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ordered stage list for this plan (§4.4's fixed order), as the
    /// `EffectKind`s the assembler will wire in sequence. `Gain` is always
    /// present and always last before the sink tap.
    pub fn ordered_stages(&self) -> Vec<EffectKind> {
        let mut stages = Vec::with_capacity(7);
        if self.compressor {
            stages.push(EffectKind::Compressor);
        }
        if self.bandpass {
            stages.push(EffectKind::Bandpass);
        }
        if self.notch {
            stages.push(EffectKind::Notch);
        }
        if self.nr {
            stages.push(EffectKind::Nr);
        }
        if self.peaking {
            stages.push(EffectKind::Peaking);
        }
        if self.squelch {
            stages.push(EffectKind::Squelch);
        }
        if self.stereo {
            stages.push(EffectKind::Stereo);
        }
        stages.push(EffectKind::Gain);
        stages
    }
}

/// Outcome of wiring one frame's graph. On [`WireOutcome::Degraded`], the
/// assembler fell back to a direct Source -> Volume -> Sink path per
/// §4.4's failure semantics, and a degraded-mode event should be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireOutcome {
    Wired,
    Degraded,
}

/// One ephemeral per-frame graph (§3 GraphInstance). Owns nothing but the
/// plan and a generation counter used to detect stale instances; the
/// actual effect processing happens through the Session's effect registry
/// using `plan.ordered_stages()` as the iteration order.
pub struct GraphInstance {
    pub plan: GraphPlan,
    pub generation: u64,
    pub outcome: WireOutcome,
}

/// Builds successive `GraphInstance`s, tracking a generation counter so
/// the previous frame's wiring is always considered disconnected before
/// the next is wired (§4.4: "every node that was wired in a previous
/// graph is disconnected... before wiring").
pub struct GraphAssembler {
    next_generation: u64,
}

impl GraphAssembler {
    pub fn new() -> Self {
        Self { next_generation: 0 }
    }

    /// Builds the next graph instance from the requested plan. Wiring in
    /// this design is pure stage-list construction (no fallible I/O), so
    /// it only degrades if the plan is found to be self-contradictory —
    /// currently that never happens, but the outcome is still threaded
    /// through so callers have a single place to react to §4.4's
    /// fallback policy if a future stage becomes fallible.
    pub fn assemble(&mut self, plan: GraphPlan) -> GraphInstance {
        let generation = self.next_generation;
        self.next_generation += 1;

        GraphInstance {
            plan,
            generation,
            outcome: WireOutcome::Wired,
        }
    }

    /// Builds the degraded fallback graph directly: Source -> Volume ->
    /// Sink, bypassing every optional stage.
    pub fn assemble_degraded(&mut self) -> GraphInstance {
        let generation = self.next_generation;
        self.next_generation += 1;

        GraphInstance {
            plan: GraphPlan::default(),
            generation,
            outcome: WireOutcome::Degraded,
        }
    }
}

impl Default for GraphAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_stages_respects_fixed_sequence() {
        let mut plan = GraphPlan::new();
        plan.peaking = true;
        plan.compressor = true;
        plan.stereo = true;
        let stages = plan.ordered_stages();
        assert_eq!(
            stages,
            vec![
                EffectKind::Compressor,
                EffectKind::Peaking,
                EffectKind::Stereo,
                EffectKind::Gain,
            ]
        );
    }

    #[test]
    fn disabling_a_stage_omits_without_reordering() {
        let mut plan = GraphPlan::new();
        plan.bandpass = true;
        plan.squelch = true;
        assert_eq!(
            plan.ordered_stages(),
            vec![EffectKind::Bandpass, EffectKind::Squelch, EffectKind::Gain]
        );
    }

    #[test]
    fn gain_always_present_even_with_all_stages_disabled() {
        let plan = GraphPlan::new();
        assert_eq!(plan.ordered_stages(), vec![EffectKind::Gain]);
    }

    #[test]
    fn successive_assemblies_increment_generation() {
        let mut assembler = GraphAssembler::new();
        let first = assembler.assemble(GraphPlan::new());
        let second = assembler.assemble(GraphPlan::new());
        assert!(second.generation > first.generation);
        assert_eq!(first.outcome, WireOutcome::Wired);
    }

    #[test]
    fn degraded_assembly_bypasses_every_optional_stage() {
        let mut assembler = GraphAssembler::new();
        let instance = assembler.assemble_degraded();
        assert_eq!(instance.outcome, WireOutcome::Degraded);
        assert_eq!(instance.plan.ordered_stages(), vec![EffectKind::Gain]);
    }
}
