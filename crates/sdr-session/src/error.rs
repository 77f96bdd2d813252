//! `SessionError`: the top-level error type wrapping every crate this one
//! ties together. Most of the workspace treats its own failures as
//! non-fatal (log and fall back); this type exists for the handful of
//! spots the session layer itself cannot recover from on its own and must
//! hand back to its host.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] sdr_core::CoreError),

    #[error(transparent)]
    Audio(#[from] sdr_audio::AudioError),

    #[error(transparent)]
    State(#[from] sdr_state::StateError),

    #[error(transparent)]
    Connector(#[from] sdr_connector::ConnectorError),

    #[error("no active connection")]
    NotConnected,

    #[error("session already connected")]
    AlreadyConnected,
}

pub type SessionResult<T> = Result<T, SessionError>;
