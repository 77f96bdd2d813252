//! Small closed types shared by value across crate boundaries: session
//! identity, demodulation mode, effect-node kind, diagnostic events and the
//! latency report broadcast by the engine's latency accountant.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a negotiated session, as handed back by the
/// connection-negotiation HTTP call and echoed in the WebSocket handshake.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Demodulation mode, as selected by the client and echoed by the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeId {
    Usb,
    Lsb,
    Cwu,
    Cwl,
    Am,
    Sam,
    Fm,
    Nfm,
}

impl ModeId {
    /// True for the two CW variants, which use a fixed pitch-offset
    /// convention rather than literal baseband-zero tuning.
    pub fn is_cw(self) -> bool {
        matches!(self, ModeId::Cwu | ModeId::Cwl)
    }

    /// True for modes whose passband straddles the tuned frequency rather
    /// than sitting entirely above or below it.
    pub fn spans_zero(self) -> bool {
        matches!(self, ModeId::Am | ModeId::Sam | ModeId::Fm | ModeId::Nfm)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModeId::Usb => "usb",
            ModeId::Lsb => "lsb",
            ModeId::Cwu => "cwu",
            ModeId::Cwl => "cwl",
            ModeId::Am => "am",
            ModeId::Sam => "sam",
            ModeId::Fm => "fm",
            ModeId::Nfm => "nfm",
        }
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The closed set of effect nodes in the fixed-topology DSP chain (§4.3).
/// Used as a stable key for settings persistence and latency accounting,
/// independent of any one session's in-memory node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Peaking,
    Bandpass,
    Notch,
    Compressor,
    Nr,
    Squelch,
    Stereo,
    Gain,
}

impl EffectKind {
    pub const ALL: [EffectKind; 8] = [
        EffectKind::Peaking,
        EffectKind::Bandpass,
        EffectKind::Notch,
        EffectKind::Compressor,
        EffectKind::Nr,
        EffectKind::Squelch,
        EffectKind::Stereo,
        EffectKind::Gain,
    ];
}

/// Non-fatal and fatal events surfaced by the pipeline for logging and (if
/// a host wires one up) a diagnostics channel. Concrete payload behind the
/// error kinds named in the error-handling design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DiagnosticEvent {
    Underrun,
    WireFailure { detail: String },
    Clip,
    SessionConflict,
    Rejected { reason: String },
    InvalidConfig { detail: String },
    PersistenceError { detail: String },
}

/// Per-effect and aggregate latency, broadcast by the engine's latency
/// accountant whenever the effect chain's composition or parameters change
/// its total added delay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyReport {
    pub per_effect: Vec<(EffectKind, f64)>,
    pub total_ms: f64,
}

impl LatencyReport {
    pub fn new(per_effect: Vec<(EffectKind, f64)>) -> Self {
        let total_ms = per_effect.iter().map(|(_, ms)| ms).sum();
        Self {
            per_effect,
            total_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_id_serializes_lowercase() {
        let json = serde_json::to_string(&ModeId::Cwu).unwrap();
        assert_eq!(json, "\"cwu\"");
    }

    #[test]
    fn cw_modes_are_cw() {
        assert!(ModeId::Cwu.is_cw());
        assert!(ModeId::Cwl.is_cw());
        assert!(!ModeId::Usb.is_cw());
    }

    #[test]
    fn latency_report_sums_total() {
        let report = LatencyReport::new(vec![
            (EffectKind::Peaking, 0.25),
            (EffectKind::Compressor, 3.1),
        ]);
        assert!((report.total_ms - 3.35).abs() < 1e-9);
    }
}
