//! The persisted schema (§4.9): a snapshot of every effect's enable flag
//! and parameters, plus the spectrum display settings, independent of any
//! one session's live DSP node instances.

use std::collections::{BTreeMap, HashMap};

use sdr_core::EffectKind;
use serde::{Deserialize, Serialize};

/// One effect's persisted state: whether it is enabled, and its named
/// parameters. Parameters are stored as `f64` — the canonical wire type
/// every `AtomicParam` round-trips through (`sdr_core::params`), so a
/// restore writes back the exact value a save captured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectSettings {
    pub enabled: bool,
    pub params: BTreeMap<String, f64>,
}

impl EffectSettings {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }
}

/// Spectrum/waterfall display settings (C5/C6/C7): zoom, pan and the
/// waterfall refresh rate, plus the tuned-analyser oscilloscope zoom
/// slider (§4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumDisplaySettings {
    /// Waterfall refresh rate, Hz. §5: "throttled to a user-configured
    /// rate (default 30 Hz)".
    pub waterfall_rate_hz: f64,
    /// Full-band spectrum zoom factor, 1.0 = whole band.
    pub zoom: f64,
    /// Full-band spectrum pan center, Hz; `None` tracks the tuned
    /// frequency.
    pub pan_center_hz: Option<f64>,
    /// Waterfall colour contrast, 0.0-1.0.
    pub contrast: f64,
    /// Waterfall colour intensity, 0.0-1.0.
    pub intensity: f64,
    /// Oscilloscope zoom slider, 0.0 (zoomed out) to 1.0 (zoomed in),
    /// consumed by `sdr_dsp::analysis::Oscilloscope::displayed_window`.
    pub oscilloscope_zoom: f64,
}

impl Default for SpectrumDisplaySettings {
    fn default() -> Self {
        Self {
            waterfall_rate_hz: 30.0,
            zoom: 1.0,
            pan_center_hz: None,
            contrast: 0.5,
            intensity: 0.5,
            oscilloscope_zoom: 0.5,
        }
    }
}

/// The full persisted snapshot: every effect's settings keyed by
/// [`EffectKind`], plus the spectrum display settings. This is what
/// invariant 6 (§8) means by "a full SessionConfig" — saving then
/// restoring one must yield identical effect parameters and enable flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub effects: HashMap<EffectKind, EffectSettings>,
    pub spectrum: SpectrumDisplaySettings,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effect(&self, kind: EffectKind) -> Option<&EffectSettings> {
        self.effects.get(&kind)
    }

    pub fn set_effect(&mut self, kind: EffectKind, settings: EffectSettings) {
        self.effects.insert(kind, settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spectrum_settings_match_spec_defaults() {
        let settings = SpectrumDisplaySettings::default();
        assert_eq!(settings.waterfall_rate_hz, 30.0);
        assert_eq!(settings.zoom, 1.0);
        assert!(settings.pan_center_hz.is_none());
    }

    #[test]
    fn session_config_round_trips_through_json() {
        let mut config = SessionConfig::new();
        config.set_effect(
            EffectKind::Bandpass,
            EffectSettings::new(true)
                .with_param("center_hz", 1500.0)
                .with_param("width_hz", 2700.0),
        );
        let json = serde_json::to_string(&config).unwrap();
        let restored: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
        assert_eq!(
            restored.effect(EffectKind::Bandpass).unwrap().params["center_hz"],
            1500.0
        );
    }
}
