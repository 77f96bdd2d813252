//! sdr-session: ties the whole client-side processing core together into
//! one object a host (native app or WASM binding) can drive per connected
//! receiver.
//!
//! - `registry` - the concrete, owned instance of every effect node plus
//!   the stereo virtualiser, and the control-plane entry points that write
//!   into them
//! - `session` - the `Session` object: media clock, PCM decoder, graph
//!   assembler, latency accountant, playback sink, settings store, and
//!   (once connected) the control-plane and spectrum stream clients
//! - `error` - `SessionError`, wrapping every crate this one ties together

mod error;
mod registry;
mod session;

pub use error::{SessionError, SessionResult};
pub use registry::EffectRegistry;
pub use session::Session;

pub use sdr_connector::{ConnectionState, ConnectorError, ConnectorEvent};
pub use sdr_core::{BandSpec, DiagnosticEvent, EffectKind, LatencyReport, ModeId};
pub use sdr_dsp::{MeterMode, ParamValue};
pub use sdr_engine::{ParamChange, ParamQueueProducer};
pub use sdr_state::{SessionConfig, SpectrumDisplaySettings};
