//! Outbound command construction and inbound audio-payload decoding: the
//! thin translation layer between §6's wire shapes and the types the rest
//! of the workspace (`sdr-core`, `sdr-engine`) operates on.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sdr_core::{BandSpec, ModeId};

use crate::protocol::ControlOut;
use crate::ConnectorError;

/// Decode a `{type:"audio", data:base64, ...}` payload's `data` field into
/// raw bytes ready for `sdr_core::PcmDecoder::decode`.
pub fn decode_audio_payload(data: &str) -> Result<Vec<u8>, ConnectorError> {
    BASE64
        .decode(data)
        .map_err(|e| ConnectorError::Protocol(format!("invalid base64 audio payload: {e}")))
}

/// Builds the outbound `{type:"tune", ...}` message for a mode/frequency/
/// bandwidth change, optionally carrying squelch thresholds (§6).
pub fn build_tune_command(
    frequency: f64,
    mode: ModeId,
    band: BandSpec,
    squelch_open_db: Option<f64>,
    squelch_close_db: Option<f64>,
) -> ControlOut {
    ControlOut::Tune {
        frequency,
        mode,
        bandwidth_low: band.low,
        bandwidth_high: band.high,
        squelch_open: squelch_open_db,
        squelch_close: squelch_close_db,
    }
}

/// Builds the §6 keepalive `{type:"ping"}` message.
pub fn build_ping_command() -> ControlOut {
    ControlOut::Ping
}

/// Parses a session-reopen URL's query string into a `BandSpec` + mode,
/// falling back to each mode's default bandwidth (§6 mode table) for any
/// parameter the URL omits.
pub fn band_spec_from_reopen(
    mode: ModeId,
    bwl: Option<f64>,
    bwh: Option<f64>,
) -> BandSpec {
    let defaults = sdr_core::mode_bandwidth_defaults(mode);
    let low = bwl
        .map(|v| v.clamp(defaults.low_range.0, defaults.low_range.1))
        .unwrap_or(defaults.low_default);
    let high = bwh
        .map(|v| v.clamp(defaults.high_range.0, defaults.high_range.1))
        .unwrap_or(defaults.high_default);
    BandSpec::new(low, high)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_valid_base64_payload() {
        let encoded = BASE64.encode([0u8, 1, 2, 3]);
        let decoded = decode_audio_payload(&encoded).unwrap();
        assert_eq!(decoded, vec![0, 1, 2, 3]);
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(decode_audio_payload("not valid base64!!").is_err());
    }

    #[test]
    fn tune_command_carries_band_and_mode() {
        let band = BandSpec::new(50.0, 2700.0);
        let cmd = build_tune_command(14074000.0, ModeId::Usb, band, Some(-50.0), Some(-55.0));
        match cmd {
            crate::protocol::ControlOut::Tune {
                frequency,
                mode,
                bandwidth_low,
                bandwidth_high,
                squelch_open,
                squelch_close,
            } => {
                assert_eq!(frequency, 14074000.0);
                assert_eq!(mode, ModeId::Usb);
                assert_eq!(bandwidth_low, 50.0);
                assert_eq!(bandwidth_high, 2700.0);
                assert_eq!(squelch_open, Some(-50.0));
                assert_eq!(squelch_close, Some(-55.0));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn reopen_falls_back_to_mode_defaults() {
        let band = band_spec_from_reopen(ModeId::Lsb, None, None);
        assert_eq!(band.low, -2700.0);
        assert_eq!(band.high, -50.0);
    }

    #[test]
    fn reopen_clamps_out_of_range_values() {
        let band = band_spec_from_reopen(ModeId::Usb, Some(-500.0), Some(50_000.0));
        assert_eq!(band.low, 0.0);
        assert_eq!(band.high, 3200.0);
    }
}
