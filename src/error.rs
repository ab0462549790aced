use thiserror::Error;

/// Fatal error surface for the engine.
///
/// Only the two kinds from the spec that must abort the call are modeled as
/// variants here. The third kind — `NoData` — is not a variant at all: per
/// the error handling design, an unknown origin or a departure-free window
/// is a warning (logged via `tracing::warn!`) that still returns `Ok` with
/// an empty, schema-correct result. See [`crate::result::RaptorResult::empty`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
