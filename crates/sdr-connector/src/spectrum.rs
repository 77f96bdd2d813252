//! Full-band spectrum stream client (C7, §4.7): a second, independent
//! WebSocket carrying `config` (one per tuning change) and repeating
//! `frame` messages. This module owns message consumption and the
//! rolling-minimum noise-floor estimate; `sdr-viz` owns the pixel/colour
//! rendering derived from the cached frame.

use std::time::Duration;

use futures_util::StreamExt;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::connector::ConnectorError;
use crate::protocol::SpectrumIn;

/// The current coordinate system, cached from the last `config` message
/// (§4.7: "cache as the current coordinate system; invalidate the
/// display's cached grid and marker cache").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumCoordinates {
    pub center_freq_hz: f64,
    pub bin_bandwidth_hz: f64,
    pub bin_count: usize,
}

impl SpectrumCoordinates {
    pub fn total_bandwidth_hz(&self) -> f64 {
        self.bin_bandwidth_hz * self.bin_count as f64
    }

    /// §4.7 click-to-tune: `centerFreq - binBandwidth*binCount/2 +
    /// p*binBandwidth*binCount/canvasWidth`.
    pub fn pixel_to_freq(&self, pixel: f64, canvas_width: f64) -> f64 {
        let total_bw = self.total_bandwidth_hz();
        self.center_freq_hz - total_bw / 2.0 + pixel * total_bw / canvas_width
    }
}

/// Per-bin rolling minimum over a 2-second window, used by the SNR meter's
/// noise-floor estimate (§4.7, §4.10).
struct RollingMinimum {
    history: Vec<Vec<f64>>,
    pos: usize,
}

impl RollingMinimum {
    fn new(window_frames: usize, bin_count: usize) -> Self {
        Self {
            history: vec![vec![f64::INFINITY; bin_count]; window_frames.max(1)],
            pos: 0,
        }
    }

    fn push(&mut self, db_values: &[f64]) {
        if self.history[self.pos].len() != db_values.len() {
            self.history[self.pos] = db_values.to_vec();
        } else {
            self.history[self.pos].copy_from_slice(db_values);
        }
        self.pos = (self.pos + 1) % self.history.len();
    }

    fn minimum_per_bin(&self) -> Vec<f64> {
        let bin_count = self.history.first().map(|v| v.len()).unwrap_or(0);
        let mut mins = vec![f64::INFINITY; bin_count];
        for frame in &self.history {
            for (m, &v) in mins.iter_mut().zip(frame.iter()) {
                if v.is_finite() {
                    *m = m.min(v);
                }
            }
        }
        mins
    }
}

/// 2-second rolling window at an assumed ~20 Hz server frame rate; the
/// window is sized in frames received, not wall-clock ticks, so a slower
/// or faster feed still converges, just over more/fewer messages.
const NOISE_FLOOR_WINDOW_FRAMES: usize = 40;

/// Consumes the spectrum stream and maintains the cached coordinate
/// system, the latest frame, and the rolling noise floor.
pub struct SpectrumState {
    coords: Option<SpectrumCoordinates>,
    latest_db: Vec<f64>,
    noise_floor: Option<RollingMinimum>,
}

impl SpectrumState {
    pub fn new() -> Self {
        Self {
            coords: None,
            latest_db: Vec::new(),
            noise_floor: None,
        }
    }

    pub fn coordinates(&self) -> Option<SpectrumCoordinates> {
        self.coords
    }

    pub fn latest_db_values(&self) -> &[f64] {
        &self.latest_db
    }

    /// Apply one parsed message, updating cached state. Returns `true` if
    /// a `config` invalidated the cached grid/marker state.
    pub fn apply(&mut self, message: SpectrumIn) -> bool {
        match message {
            SpectrumIn::Config {
                center_freq,
                bin_bandwidth,
                bin_count,
            } => {
                self.coords = Some(SpectrumCoordinates {
                    center_freq_hz: center_freq,
                    bin_bandwidth_hz: bin_bandwidth,
                    bin_count,
                });
                self.noise_floor = Some(RollingMinimum::new(NOISE_FLOOR_WINDOW_FRAMES, bin_count));
                self.latest_db = vec![f64::NEG_INFINITY; bin_count];
                true
            }
            SpectrumIn::Frame { db_values } => {
                if let Some(floor) = &mut self.noise_floor {
                    floor.push(&db_values);
                }
                self.latest_db = db_values;
                false
            }
        }
    }

    /// §4.10: 2-second average of per-frame minima, per bin.
    pub fn noise_floor_db(&self) -> Vec<f64> {
        self.noise_floor
            .as_ref()
            .map(|f| f.minimum_per_bin())
            .unwrap_or_default()
    }
}

impl Default for SpectrumState {
    fn default() -> Self {
        Self::new()
    }
}

/// Connects to the spectrum endpoint and forwards parsed messages on a
/// broadcast channel; the caller (session layer) owns a [`SpectrumState`]
/// and feeds it from the received messages.
pub async fn run_spectrum_stream(
    ws_url: &str,
    tx: broadcast::Sender<SpectrumIn>,
    shutdown: Arc<RwLock<bool>>,
) -> Result<(), ConnectorError> {
    let url = Url::parse(ws_url).map_err(|e| ConnectorError::ConnectionFailed(e.to_string()))?;
    let (ws_stream, _) = tokio::time::timeout(Duration::from_secs(10), connect_async(url))
        .await
        .map_err(|_| ConnectorError::Timeout)?
        .map_err(|e| ConnectorError::ConnectionFailed(e.to_string()))?;

    let (_write, mut read) = ws_stream.split();

    while !*shutdown.read() {
        match read.next().await {
            Some(Ok(Message::Text(text))) => {
                if let Ok(msg) = serde_json::from_str::<SpectrumIn>(&text) {
                    let _ = tx.send(msg);
                } else {
                    log::warn!("unparseable spectrum stream message, dropping");
                }
            }
            Some(Ok(Message::Close(_))) | None => {
                return Err(ConnectorError::ConnectionFailed("spectrum socket closed".into()));
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(ConnectorError::ConnectionFailed(e.to_string())),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_message_caches_coordinates_and_resets_frame() {
        let mut state = SpectrumState::new();
        let invalidated = state.apply(SpectrumIn::Config {
            center_freq: 14_200_000.0,
            bin_bandwidth: 50.0,
            bin_count: 4096,
        });
        assert!(invalidated);
        let coords = state.coordinates().unwrap();
        assert_eq!(coords.bin_count, 4096);
        assert_eq!(coords.total_bandwidth_hz(), 50.0 * 4096.0);
    }

    #[test]
    fn frame_message_updates_latest_without_invalidating() {
        let mut state = SpectrumState::new();
        state.apply(SpectrumIn::Config {
            center_freq: 0.0,
            bin_bandwidth: 1.0,
            bin_count: 3,
        });
        let invalidated = state.apply(SpectrumIn::Frame {
            db_values: vec![-90.0, -80.0, -70.0],
        });
        assert!(!invalidated);
        assert_eq!(state.latest_db_values(), &[-90.0, -80.0, -70.0]);
    }

    #[test]
    fn noise_floor_tracks_minimum_across_frames() {
        let mut state = SpectrumState::new();
        state.apply(SpectrumIn::Config {
            center_freq: 0.0,
            bin_bandwidth: 1.0,
            bin_count: 2,
        });
        state.apply(SpectrumIn::Frame { db_values: vec![-90.0, -60.0] });
        state.apply(SpectrumIn::Frame { db_values: vec![-70.0, -95.0] });
        let floor = state.noise_floor_db();
        assert_eq!(floor, vec![-90.0, -95.0]);
    }

    #[test]
    fn click_to_tune_pixel_mapping_matches_formula() {
        let coords = SpectrumCoordinates {
            center_freq_hz: 14_200_000.0,
            bin_bandwidth_hz: 50.0,
            bin_count: 4096,
        };
        let freq_at_center = coords.pixel_to_freq(400.0, 800.0);
        assert!((freq_at_center - 14_200_000.0).abs() < 1e-6);
    }
}
