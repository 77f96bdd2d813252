//! `StateError`: the concrete payload behind §7's `PersistenceError` kind.
//! Every variant is non-fatal by policy (§7: "warn; continue with
//! defaults") — callers log and fall back rather than propagate further.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("settings file io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown settings key: {0}")]
    UnknownKey(String),
}

pub type StateResult<T> = Result<T, StateError>;
