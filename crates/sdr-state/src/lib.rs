//! sdr-state: durable persistence of effect configurations and display
//! settings (C9, §4.9).
//!
//! - `config` - the persisted schema: per-effect enable flags and
//!   parameters, plus spectrum display settings
//! - `store` - the `SettingsStore` trait and its JSON-file-backed
//!   implementation, keyed under the `ka9q_filter_` prefix (§6)
//! - `error` - `StateError`, the concrete payload behind `PersistenceError`

mod config;
mod error;
mod store;

pub use config::{EffectSettings, SessionConfig, SpectrumDisplaySettings};
pub use error::{StateError, StateResult};
pub use store::{FileSettingsStore, SettingsStore};
