//! `Session`: the object that owns every live piece of one receiver
//! connection (§9 Design Notes) — the media clock, the PCM decoder, the
//! effect registry, the latency accountant, the playback sink, the
//! settings store, and (once connected) the control-plane and spectrum
//! stream clients. A `GraphInstance` handed out by the graph assembler is
//! an ephemeral, non-owning view into the registry for one frame; the
//! registry itself is what actually lives here across frames.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tokio::sync::{broadcast, watch};

use sdr_audio::{MeterSnapshot, PlaybackSink};
use sdr_connector::{
    build_tune_command, protocol::SpectrumIn, run_spectrum_stream, ConnectorConfig,
    ConnectorEvent, RadioConnector, SpectrumState,
};
use sdr_core::{
    BandSpec, Decibels, DiagnosticEvent, LatencyReport, MediaTime, ModeId, PcmDecoder, Sample,
};
use sdr_dsp::{FftTap, MeterMode, Oscilloscope, SignalMeter};
use sdr_engine::{
    param_queue, Clock, GraphAssembler, GraphInstance, LatencyAccountant, ParamQueueConsumer,
    ParamQueueProducer,
};
use sdr_state::{FileSettingsStore, SessionConfig};

use crate::error::{SessionError, SessionResult};
use crate::registry::EffectRegistry;

/// Capacity of the control-plane parameter queue (§5): comfortably absorbs
/// a burst of UI-driven writes between two processed frames.
const PARAM_QUEUE_CAPACITY: usize = 256;
/// Default analysis frame rate assumed before any audio has been decoded,
/// used to size the signal meter's smoothing/noise-floor windows.
const DEFAULT_FRAME_RATE_HZ: f64 = 20.0;

pub struct Session {
    sample_rate: u32,
    decoder: PcmDecoder,
    clock: Clock,
    graph: GraphAssembler,
    current_graph: GraphInstance,
    registry: EffectRegistry,
    param_consumer: ParamQueueConsumer,
    latency: LatencyAccountant,
    latency_tx: watch::Sender<LatencyReport>,
    diagnostics_tx: broadcast::Sender<DiagnosticEvent>,
    sink: PlaybackSink,
    settings: FileSettingsStore,
    connector: Option<RadioConnector>,
    spectrum_state: Arc<RwLock<SpectrumState>>,
    spectrum_shutdown: Arc<RwLock<bool>>,
    spectrum_task: Option<tokio::task::JoinHandle<()>>,
    spectrum_tap: FftTap,
    vu_tap: FftTap,
    oscilloscope: Oscilloscope,
    meter: SignalMeter,
    mode: ModeId,
    frequency_hz: f64,
    band: BandSpec,
    connected_at: Option<Instant>,
}

impl Session {
    /// Builds a new session and the [`ParamQueueProducer`] a UI host writes
    /// discrete parameter changes through (§5). The session itself owns the
    /// consumer half and drains it at the start of every [`Self::process_frame`].
    pub fn new(settings_path: impl Into<std::path::PathBuf>) -> (Self, ParamQueueProducer) {
        let (param_producer, param_consumer) = param_queue(PARAM_QUEUE_CAPACITY);
        let sample_rate = 12_000u32;

        let session = Self {
            sample_rate,
            decoder: PcmDecoder::new(),
            clock: Clock::new(sample_rate),
            graph: GraphAssembler::new(),
            current_graph: GraphAssembler::new().assemble_degraded(),
            registry: EffectRegistry::new(sample_rate as f64),
            param_consumer,
            latency: LatencyAccountant::new(sample_rate as f64),
            latency_tx: watch::channel(LatencyReport::default()).0,
            diagnostics_tx: broadcast::channel(64).0,
            sink: PlaybackSink::new(),
            settings: FileSettingsStore::open(settings_path.into()),
            connector: None,
            spectrum_state: Arc::new(RwLock::new(SpectrumState::new())),
            spectrum_shutdown: Arc::new(RwLock::new(false)),
            spectrum_task: None,
            spectrum_tap: FftTap::new(sdr_dsp::analysis::SPECTRUM_FFT_SIZE),
            vu_tap: FftTap::new(sdr_dsp::analysis::VU_FFT_SIZE),
            oscilloscope: Oscilloscope::new(),
            meter: SignalMeter::new(DEFAULT_FRAME_RATE_HZ),
            mode: ModeId::Usb,
            frequency_hz: 0.0,
            band: BandSpec::new(0.0, 0.0),
            connected_at: None,
        };
        (session, param_producer)
    }

    /// Builds a session backed by the platform-default settings file
    /// location (§4.9/§6).
    pub fn with_default_settings_path() -> (Self, ParamQueueProducer) {
        Self::new(FileSettingsStore::default_path())
    }

    fn media_now(&mut self) -> MediaTime {
        let instant = *self.connected_at.get_or_insert_with(Instant::now);
        MediaTime(instant.elapsed().as_secs_f64())
    }

    /// Decode one inbound `{type:"audio"}` payload, schedule it on the
    /// media clock, run it through the effect chain, and push the result
    /// to the playback sink. A malformed payload is dropped silently
    /// (§4.1/§4.2's failure semantics) rather than surfaced as an error;
    /// an unavailable playback device is logged and otherwise non-fatal so
    /// the rest of the pipeline (analysis, latency, settings) keeps running.
    pub fn process_frame(&mut self, payload: &[u8], declared_sample_rate: u32) {
        self.param_consumer.drain_into(|change| {
            self.registry.set_param(change.target, change.name, change.value);
        });

        if declared_sample_rate != self.sample_rate {
            self.sample_rate = declared_sample_rate;
            self.clock.reset_for_sample_rate(declared_sample_rate);
            self.registry.set_sample_rate(declared_sample_rate as f64);
            self.latency.set_sample_rate(declared_sample_rate as f64);
        }

        let frame = match self.decoder.decode(payload, declared_sample_rate) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("session: dropping malformed audio frame: {e}");
                return;
            }
        };

        self.current_graph = self.graph.assemble(self.registry.plan());

        let media_now = self.media_now();
        let decision = self.clock.schedule(&frame, media_now);
        if let Some(diagnostic) = decision.diagnostic {
            let _ = self.diagnostics_tx.send(diagnostic.into_event());
        }

        let mut left = Vec::with_capacity(frame.len());
        let mut right = Vec::with_capacity(frame.len());
        let mut peak: f64 = 0.0;

        for &raw in frame.samples() {
            let input = raw as Sample;
            self.spectrum_tap.push(input);

            let out = self.registry.process(input);
            let vu_sample = (out.left + out.right) * 0.5;
            self.vu_tap.push(vu_sample);
            self.oscilloscope.push(vu_sample);

            peak = peak.max(out.left.abs()).max(out.right.abs());
            left.push(out.left);
            right.push(out.right);
        }

        self.spectrum_tap.analyze();
        self.vu_tap.analyze();

        if let Some(fade) = decision.fade {
            apply_fade(&mut left, &mut right, fade, self.sample_rate as f64);
        }

        match self.sink.reopen_if_needed(self.sample_rate, true) {
            Ok(()) => {
                if let Err(e) = self.sink.push_stereo(&left, &right) {
                    log::warn!("session: failed to push audio to sink: {e}");
                }
            }
            Err(e) => {
                log::warn!("session: playback sink unavailable, continuing without audio output: {e}");
            }
        }

        let peak_db = Decibels::from_gain(peak).0;
        let elapsed_ms = frame.duration_secs() * 1000.0;
        if self.meter.update(peak_db, elapsed_ms) {
            self.sink.publish_meter(MeterSnapshot {
                dbfs: self.meter.dbfs(),
                snr_db: self.meter.snr_db(),
                noise_floor_db: self.meter.noise_floor_db(),
                timestamp: frame.sequence,
            });
        }

        let nodes = self.registry.wired_nodes();
        if let Some(report) = self.latency.compute_if_changed(&nodes, self.registry.stereo_node()) {
            let _ = self.latency_tx.send(report);
        }
    }

    /// Changes frequency/mode/bandwidth and, if connected, forwards the
    /// change to the daemon as a `tune` command carrying the live squelch
    /// thresholds (§6).
    pub fn tune(&mut self, frequency_hz: f64, mode: ModeId, band: BandSpec) {
        self.mode = mode;
        self.frequency_hz = frequency_hz;
        self.band = band;

        if let Some(connector) = &self.connector {
            let (open_db, close_db) = self.registry.squelch_thresholds_db();
            let open = self.registry.is_enabled(sdr_core::EffectKind::Squelch).then_some(open_db);
            let close = self.registry.is_enabled(sdr_core::EffectKind::Squelch).then_some(close_db);
            let command = build_tune_command(frequency_hz, mode, band, open, close);
            connector.send(command);
        }
    }

    pub fn mode(&self) -> ModeId {
        self.mode
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    pub fn band(&self) -> BandSpec {
        self.band
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EffectRegistry {
        &mut self.registry
    }

    pub fn current_graph(&self) -> &GraphInstance {
        &self.current_graph
    }

    pub fn subscribe_latency(&self) -> watch::Receiver<LatencyReport> {
        self.latency_tx.subscribe()
    }

    pub fn subscribe_diagnostics(&self) -> broadcast::Receiver<DiagnosticEvent> {
        self.diagnostics_tx.subscribe()
    }

    pub fn meter_snapshot(&self) -> Option<MeterSnapshot> {
        self.sink.latest_meter()
    }

    pub fn set_meter_mode(&mut self, mode: MeterMode) {
        self.meter.set_mode(mode);
    }

    pub fn oscilloscope_window(&self, zoom_slider: u32) -> Vec<Sample> {
        self.oscilloscope.displayed_window(zoom_slider)
    }

    pub fn spectrum_magnitudes(&self) -> &[f64] {
        self.spectrum_tap.magnitudes()
    }

    pub fn vu_magnitudes(&self) -> &[f64] {
        self.vu_tap.magnitudes()
    }

    /// Persist the live effect settings and spectrum display settings
    /// (§4.9 invariant 6). No-op while restoring or while the user's save
    /// switch is off.
    pub fn save_settings(&self, spectrum: sdr_state::SpectrumDisplaySettings) -> SessionResult<()> {
        let mut config = self.registry.snapshot();
        config.spectrum = spectrum;
        self.settings.save_session(&config)?;
        Ok(())
    }

    /// Restore effect settings and spectrum display settings from disk and
    /// apply them onto the live registry.
    pub fn restore_settings(&mut self) -> SessionConfig {
        let config = self.settings.restore_session();
        self.registry.restore(&config);
        config
    }

    pub fn set_save_enabled(&self, enabled: bool) {
        self.settings.set_save_enabled(enabled);
    }

    /// Opens the control-plane WebSocket connection. The caller is expected
    /// to have already negotiated a session id via
    /// [`sdr_connector::negotiate_connection`]; this only wires the
    /// long-lived connector, it does not perform HTTP negotiation itself.
    /// Must be called from within a running Tokio runtime, since the
    /// connector spawns its read/ping task immediately.
    pub fn connect(&mut self, ws_url: impl Into<String>, session_id: impl Into<String>) -> SessionResult<()> {
        if self.connector.is_some() {
            return Err(SessionError::AlreadyConnected);
        }
        let mut connector = RadioConnector::new(ConnectorConfig {
            ws_url: ws_url.into(),
            user_session_id: session_id.into(),
        });
        connector.connect();
        self.connector = Some(connector);
        self.connected_at = Some(Instant::now());
        self.clock.reset_for_sample_rate(self.sample_rate);
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if let Some(mut connector) = self.connector.take() {
            connector.disconnect();
        }
        self.disconnect_spectrum();
    }

    pub fn subscribe_connector_events(&self) -> Option<broadcast::Receiver<ConnectorEvent>> {
        self.connector.as_ref().map(|c| c.subscribe())
    }

    /// Starts the independent full-band spectrum stream (C7, §4.7),
    /// feeding the cached [`SpectrumState`] from a background task. Also
    /// requires a running Tokio runtime.
    pub fn connect_spectrum(&mut self, ws_url: impl Into<String>) {
        self.disconnect_spectrum();

        let ws_url = ws_url.into();
        let shutdown = Arc::clone(&self.spectrum_shutdown);
        *shutdown.write() = false;
        let state = Arc::clone(&self.spectrum_state);
        let (tx, mut rx) = broadcast::channel::<SpectrumIn>(256);

        let consumer_state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Ok(message) = rx.recv().await {
                consumer_state.write().apply(message);
            }
        });

        let task = tokio::spawn(async move {
            if let Err(e) = run_spectrum_stream(&ws_url, tx, shutdown).await {
                log::warn!("spectrum stream ended: {e}");
            }
        });
        self.spectrum_task = Some(task);
    }

    pub fn disconnect_spectrum(&mut self) {
        *self.spectrum_shutdown.write() = true;
        if let Some(task) = self.spectrum_task.take() {
            task.abort();
        }
    }

    pub fn spectrum_state(&self) -> Arc<RwLock<SpectrumState>> {
        Arc::clone(&self.spectrum_state)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Applies a linear gain ramp over the first `fade.duration_secs` worth of
/// samples in this frame (clamped to the frame's length), holding
/// `fade.to_gain` for the remainder — the audible half of
/// [`sdr_engine::ScheduleDecision::fade`]'s contract.
fn apply_fade(left: &mut [Sample], right: &mut [Sample], fade: sdr_engine::FadeEnvelope, sample_rate: f64) {
    let ramp_samples = (fade.duration_secs * sample_rate).round() as usize;
    let ramp_samples = ramp_samples.min(left.len()).max(1);

    for i in 0..left.len() {
        let gain = if i < ramp_samples {
            let t = i as f64 / ramp_samples as f64;
            fade.from_gain + (fade.to_gain - fade.from_gain) * t
        } else {
            fade.to_gain
        };
        left[i] *= gain;
        right[i] *= gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdr_core::EffectKind;
    use sdr_dsp::ParamValue;

    fn be16(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_be_bytes()).collect()
    }

    fn temp_settings_path() -> std::path::PathBuf {
        static COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        std::env::temp_dir().join(format!("sdr-session-test-{}-{}.json", std::process::id(), n))
    }

    #[test]
    fn process_frame_runs_end_to_end_without_a_real_audio_device() {
        let (mut session, _producer) = Session::new(temp_settings_path());
        let bytes = be16(&[0; 1200]);
        // No real cpal device exists in a CI/test environment; the sink
        // failure path must not panic or otherwise interrupt processing.
        session.process_frame(&bytes, 12_000);
        assert_eq!(session.spectrum_magnitudes().len(), sdr_dsp::analysis::SPECTRUM_FFT_SIZE / 2 + 1);
    }

    #[test]
    fn param_queue_changes_apply_before_the_frame_is_processed() {
        let (mut session, mut producer) = Session::new(temp_settings_path());
        producer.push(sdr_engine::ParamChange {
            target: EffectKind::Gain,
            name: "muted",
            value: ParamValue::Bool(true),
        });
        let bytes = be16(&[i16::MAX; 64]);
        session.process_frame(&bytes, 12_000);
        assert!(session.registry().snapshot().effect(EffectKind::Gain).unwrap().params["muted"] != 0.0);
    }

    #[test]
    fn settings_round_trip_through_session() {
        let path = temp_settings_path();
        let (mut session, _producer) = Session::new(&path);
        session.registry_mut().set_enabled(EffectKind::Bandpass, true);
        session
            .registry_mut()
            .set_param(EffectKind::Bandpass, "center_hz", ParamValue::Float(1800.0));

        session
            .save_settings(sdr_state::SpectrumDisplaySettings::default())
            .unwrap();

        let (mut other, _producer2) = Session::new(&path);
        other.restore_settings();
        assert!(other.registry().is_enabled(EffectKind::Bandpass));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn latency_broadcast_fires_on_enabling_an_effect() {
        let (mut session, _producer) = Session::new(temp_settings_path());
        let mut rx = session.subscribe_latency();
        session.registry_mut().set_enabled(EffectKind::Compressor, true);
        let bytes = be16(&[0; 64]);
        session.process_frame(&bytes, 12_000);
        assert!(rx.has_changed().unwrap());
    }
}
