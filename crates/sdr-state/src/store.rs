//! The durable key/value store (§6: "key/value store under prefix
//! `ka9q_filter_`") and the save/restore logic built on top of it (§4.9).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use sdr_core::EffectKind;

use crate::config::SessionConfig;
use crate::error::{StateError, StateResult};

/// The namespace every persisted key lives under (§6).
pub const KEY_PREFIX: &str = "ka9q_filter_";

fn effect_key(kind: EffectKind) -> String {
    format!("{KEY_PREFIX}{}", effect_name(kind))
}

fn effect_name(kind: EffectKind) -> &'static str {
    match kind {
        EffectKind::Peaking => "peaking",
        EffectKind::Bandpass => "bandpass",
        EffectKind::Notch => "notch",
        EffectKind::Compressor => "compressor",
        EffectKind::Nr => "nr",
        EffectKind::Squelch => "squelch",
        EffectKind::Stereo => "stereo",
        EffectKind::Gain => "gain",
    }
}

const SPECTRUM_KEY: &str = "ka9q_filter_spectrum";

/// A durable key/value store: the storage abstraction underneath the
/// save/restore logic. A browser host backs this with `localStorage`; this
/// crate ships a JSON-file-backed implementation for a native client.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> StateResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StateResult<()>;
    fn remove(&self, key: &str) -> StateResult<()>;
}

/// JSON-file-backed [`SettingsStore`]: the whole key/value map lives in one
/// file, read into memory on construction and rewritten atomically (write
/// to a temp file, then rename) on every `set`/`remove` so a crash mid-write
/// never corrupts the prior snapshot.
pub struct FileSettingsStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
    /// Re-entry guard (§4.9): suppresses saves triggered by a restore
    /// mutating sliders back to their persisted values.
    restoring: AtomicBool,
    /// User-controlled "save" switch (§4.9): when off, `save_session`
    /// becomes a no-op.
    save_enabled: AtomicBool,
}

impl FileSettingsStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = Self::read_entries(&path).unwrap_or_default();
        Self {
            path,
            entries: RwLock::new(entries),
            restoring: AtomicBool::new(false),
            save_enabled: AtomicBool::new(true),
        }
    }

    /// The default settings file location, following the teacher crate's
    /// per-platform `dirs` convention.
    pub fn default_path() -> PathBuf {
        let base = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .map(|h| h.join("Library/Application Support/sdr-client"))
                .unwrap_or_else(|| PathBuf::from("."))
        } else if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("sdr-client"))
                .unwrap_or_else(|| PathBuf::from("."))
        } else {
            dirs::config_dir()
                .map(|d| d.join("sdr-client"))
                .unwrap_or_else(|| PathBuf::from("."))
        };
        base.join("settings.json")
    }

    fn read_entries(path: &Path) -> StateResult<HashMap<String, String>> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn flush(&self) -> StateResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&*self.entries.read())?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    pub fn set_save_enabled(&self, enabled: bool) {
        self.save_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn save_enabled(&self) -> bool {
        self.save_enabled.load(Ordering::SeqCst)
    }

    fn is_restoring(&self) -> bool {
        self.restoring.load(Ordering::SeqCst)
    }

    /// Persist every enabled effect's settings and the spectrum display
    /// settings, one key per effect group (§6). No-op while restoring (the
    /// re-entry guard) or while the user's save switch is off.
    pub fn save_session(&self, config: &SessionConfig) -> StateResult<()> {
        if self.is_restoring() || !self.save_enabled() {
            return Ok(());
        }
        for (kind, settings) in &config.effects {
            self.set(&effect_key(*kind), &serde_json::to_string(settings)?)?;
        }
        self.set(SPECTRUM_KEY, &serde_json::to_string(&config.spectrum)?)?;
        Ok(())
    }

    /// Restore a [`SessionConfig`] from the store. Atomic with respect to
    /// saves: the re-entry guard is held for the whole restore so that
    /// nothing written back to sliders during restoration bounces back
    /// into a save. A missing or unparseable key is non-fatal (§4.9,
    /// §7 PersistenceError): the caller gets `EffectKind::ALL`'s defaults
    /// for that key and a log line, never an error.
    pub fn restore_session(&self) -> SessionConfig {
        self.restoring.store(true, Ordering::SeqCst);
        let mut config = SessionConfig::new();
        for kind in EffectKind::ALL {
            match self.get(&effect_key(kind)) {
                Ok(Some(raw)) => match serde_json::from_str(&raw) {
                    Ok(settings) => {
                        config.set_effect(kind, settings);
                    }
                    Err(e) => {
                        log::warn!("settings: discarding corrupt entry for {kind:?}: {e}");
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    log::warn!("settings: failed to read entry for {kind:?}: {e}");
                }
            }
        }
        match self.get(SPECTRUM_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(spectrum) => config.spectrum = spectrum,
                Err(e) => log::warn!("settings: discarding corrupt spectrum entry: {e}"),
            },
            Ok(None) => {}
            Err(e) => log::warn!("settings: failed to read spectrum entry: {e}"),
        }
        self.restoring.store(false, Ordering::SeqCst);
        config
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, key: &str) -> StateResult<Option<String>> {
        if !key.starts_with(KEY_PREFIX) {
            return Err(StateError::UnknownKey(key.to_string()));
        }
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StateResult<()> {
        if !key.starts_with(KEY_PREFIX) {
            return Err(StateError::UnknownKey(key.to_string()));
        }
        self.entries.write().insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&self, key: &str) -> StateResult<()> {
        if !key.starts_with(KEY_PREFIX) {
            return Err(StateError::UnknownKey(key.to_string()));
        }
        self.entries.write().remove(key);
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EffectSettings;
    use tempfile_path::temp_json_path;

    mod tempfile_path {
        use std::path::PathBuf;
        use std::sync::atomic::{AtomicU64, Ordering};

        static COUNTER: AtomicU64 = AtomicU64::new(0);

        pub fn temp_json_path() -> PathBuf {
            let n = COUNTER.fetch_add(1, Ordering::SeqCst);
            std::env::temp_dir().join(format!("sdr-state-test-{}-{}.json", std::process::id(), n))
        }
    }

    #[test]
    fn save_then_restore_round_trips_effect_parameters() {
        let path = temp_json_path();
        let store = FileSettingsStore::open(&path);

        let mut config = SessionConfig::new();
        config.set_effect(
            EffectKind::Bandpass,
            EffectSettings::new(true)
                .with_param("center_hz", 1500.0)
                .with_param("width_hz", 2700.0),
        );
        config.set_effect(EffectKind::Squelch, EffectSettings::new(false));
        store.save_session(&config).unwrap();

        let restored = store.restore_session();
        assert_eq!(restored.effect(EffectKind::Bandpass), config.effect(EffectKind::Bandpass));
        assert_eq!(restored.effect(EffectKind::Squelch), config.effect(EffectKind::Squelch));
        assert_eq!(restored.spectrum, config.spectrum);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn save_is_suppressed_while_save_switch_is_off() {
        let path = temp_json_path();
        let store = FileSettingsStore::open(&path);
        store.set_save_enabled(false);

        let mut config = SessionConfig::new();
        config.set_effect(EffectKind::Gain, EffectSettings::new(true).with_param("volume", 0.8));
        store.save_session(&config).unwrap();

        assert!(store.get(&effect_key(EffectKind::Gain)).unwrap().is_none());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn restore_falls_back_to_defaults_on_corrupt_entry() {
        let path = temp_json_path();
        let store = FileSettingsStore::open(&path);
        store.set(&effect_key(EffectKind::Notch), "not valid json").unwrap();

        let restored = store.restore_session();
        assert!(restored.effect(EffectKind::Notch).is_none());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn keys_outside_the_namespace_prefix_are_rejected() {
        let path = temp_json_path();
        let store = FileSettingsStore::open(&path);
        assert!(store.set("other_app_setting", "x").is_err());
        let _ = fs::remove_file(&path);
    }
}
