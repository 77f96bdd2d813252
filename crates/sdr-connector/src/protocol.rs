//! Wire protocol (§6): the JSON message shapes exchanged with the remote
//! radio daemon over the control-plane stream and the separate spectrum
//! stream, plus the HTTP session-negotiation shapes.
//!
//! Every inbound/outbound shape gets a `#[serde(tag = "type")]` enum —
//! the direct idiomatic match for the tagged-union JSON the daemon speaks.

use serde::{Deserialize, Serialize};
use sdr_core::ModeId;

/// One message received on the control-plane stream (§6 "Inbound
/// control-plane messages").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlIn {
    Status {
        frequency: f64,
        mode: ModeId,
    },
    Audio {
        data: String,
        #[serde(rename = "sampleRate")]
        sample_rate: u32,
    },
    Error {
        error: String,
    },
    Pong,
}

impl ControlIn {
    /// §6: "on session-conflict substrings, the session closes." The
    /// daemon doesn't send a distinct message type for this, just an
    /// `error` string that happens to mention the conflict; this is the
    /// substring match the session layer uses to distinguish a fatal
    /// `SessionConflict` from a recoverable `Error`.
    pub fn is_session_conflict(error: &str) -> bool {
        let lower = error.to_ascii_lowercase();
        lower.contains("already connected") || lower.contains("session conflict") || lower.contains("duplicate session")
    }
}

/// One message sent on the control-plane stream (§6 "Outbound
/// control-plane messages").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlOut {
    Tune {
        frequency: f64,
        mode: ModeId,
        #[serde(rename = "bandwidthLow")]
        bandwidth_low: f64,
        #[serde(rename = "bandwidthHigh")]
        bandwidth_high: f64,
        #[serde(skip_serializing_if = "Option::is_none", rename = "squelchOpen")]
        squelch_open: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none", rename = "squelchClose")]
        squelch_close: Option<f64>,
    },
    Ping,
}

/// §6: "ping every 30 s."
pub const PING_INTERVAL_SECS: u64 = 30;
/// No `pong` within this long after a `ping` is treated as a stalled
/// connection (§2 DESIGN NOTES supplement: the spec names the keepalive
/// messages but not a liveness contract).
pub const PONG_TIMEOUT_SECS: u64 = 10;

/// One message on the separate spectrum stream (§6 "Spectrum stream").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpectrumIn {
    Config {
        #[serde(rename = "centerFreq")]
        center_freq: f64,
        #[serde(rename = "binBandwidth")]
        bin_bandwidth: f64,
        #[serde(rename = "binCount")]
        bin_count: usize,
    },
    Frame {
        #[serde(rename = "dbValues")]
        db_values: Vec<f64>,
    },
}

/// `POST /connection` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub user_session_id: String,
}

/// Outcome of the `POST /connection` negotiation (§6 HTTP).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    Ok,
    Terminated,
    Rejected(u16),
}

impl ConnectionOutcome {
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => ConnectionOutcome::Ok,
            410 => ConnectionOutcome::Terminated,
            code => ConnectionOutcome::Rejected(code),
        }
    }

    /// §7: Rejected (HTTP 410/4xx) shows the terminal overlay and never
    /// opens the stream.
    pub fn is_fatal(self) -> bool {
        !matches!(self, ConnectionOutcome::Ok)
    }
}

/// `GET /api/description` response (§6 HTTP).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverDescription {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps: Option<(f64, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callsign: Option<String>,
    pub version: String,
}

/// URL query parameters for a session reopen (§6 "URL query parameters").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReopenParams {
    pub freq: Option<f64>,
    pub mode: Option<ModeId>,
    pub bwl: Option<f64>,
    pub bwh: Option<f64>,
    /// Skinned-radio extension parameters; out of scope for the core's own
    /// behaviour, carried only so a reopen URL round-trips losslessly.
    pub radio: Option<String>,
    pub vol: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_message_round_trips() {
        let json = r#"{"type":"status","frequency":14074000.0,"mode":"usb"}"#;
        let msg: ControlIn = serde_json::from_str(json).unwrap();
        match msg {
            ControlIn::Status { frequency, mode } => {
                assert_eq!(frequency, 14074000.0);
                assert_eq!(mode, ModeId::Usb);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn audio_message_parses_camel_case_sample_rate() {
        let json = r#"{"type":"audio","data":"AAE=","sampleRate":12000}"#;
        let msg: ControlIn = serde_json::from_str(json).unwrap();
        match msg {
            ControlIn::Audio { sample_rate, .. } => assert_eq!(sample_rate, 12000),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn tune_message_serializes_tagged_shape() {
        let out = ControlOut::Tune {
            frequency: 7040000.0,
            mode: ModeId::Lsb,
            bandwidth_low: -2700.0,
            bandwidth_high: -50.0,
            squelch_open: None,
            squelch_close: None,
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["type"], "tune");
        assert_eq!(json["mode"], "lsb");
        assert!(json.get("squelchOpen").is_none());
    }

    #[test]
    fn session_conflict_substring_detection() {
        assert!(ControlIn::is_session_conflict("Session conflict: already connected elsewhere"));
        assert!(ControlIn::is_session_conflict("duplicate session detected"));
        assert!(!ControlIn::is_session_conflict("decode failure"));
    }

    #[test]
    fn connection_outcome_maps_status_codes() {
        assert_eq!(ConnectionOutcome::from_status(200), ConnectionOutcome::Ok);
        assert_eq!(ConnectionOutcome::from_status(410), ConnectionOutcome::Terminated);
        assert!(ConnectionOutcome::from_status(403).is_fatal());
        assert!(!ConnectionOutcome::from_status(200).is_fatal());
    }

    #[test]
    fn spectrum_frame_parses() {
        let json = r#"{"type":"frame","dbValues":[-90.0,-85.5,-60.0]}"#;
        let msg: SpectrumIn = serde_json::from_str(json).unwrap();
        match msg {
            SpectrumIn::Frame { db_values } => assert_eq!(db_values.len(), 3),
            _ => panic!("wrong variant"),
        }
    }
}
