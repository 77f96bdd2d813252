//! sdr-connector: the live connection to the remote radio daemon (§6).
//!
//! - `protocol` - wire message shapes for the control plane, spectrum
//!   stream, and HTTP session negotiation
//! - `commands` - outbound command construction and inbound audio-payload
//!   decoding
//! - `connector` - the control-plane WebSocket: connect/reconnect,
//!   keepalive, session-conflict/rejection handling (C1's upstream input)
//! - `spectrum` - the full-band spectrum stream client (C7): message
//!   consumption and the rolling noise-floor estimate

pub mod commands;
pub mod connector;
pub mod protocol;
pub mod spectrum;

pub use commands::{band_spec_from_reopen, build_ping_command, build_tune_command, decode_audio_payload};
pub use connector::{
    fetch_receiver_description, negotiate_connection, ConnectionState, ConnectorConfig,
    ConnectorError, ConnectorEvent, ConnectorResult, RadioConnector,
};
pub use protocol::{
    ConnectionOutcome, ConnectionRequest, ControlIn, ControlOut, ReceiverDescription,
    ReopenParams, SpectrumIn, PING_INTERVAL_SECS, PONG_TIMEOUT_SECS,
};
pub use spectrum::{run_spectrum_stream, SpectrumCoordinates, SpectrumState};
