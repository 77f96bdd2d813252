//! sdr-engine: the audio pipeline core tying the media clock, graph
//! assembler, and latency accountant together.
//!
//! - `clock` - C1 media clock and playback scheduler (§4.1)
//! - `graph` - C4 graph assembler: fixed per-frame effect chain order (§4.4)
//! - `latency` - C8 latency accountant: aggregate chain latency (§4.8)
//! - `state` - control-plane to audio-thread parameter delivery (§5)

pub mod clock;
pub mod graph;
pub mod latency;
pub mod state;

pub use clock::{Clock, DiagnosticKind, FadeEnvelope, ScheduleDecision};
pub use graph::{GraphAssembler, GraphInstance, GraphPlan, WireOutcome};
pub use latency::{LatencyAccountant, LatencyEntry};
pub use state::{param_queue, ParamChange, ParamQueueConsumer, ParamQueueProducer};
