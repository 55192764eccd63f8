//! Error types for overlay editing and persistence

use thiserror::Error;

/// Failures reported by a persistence endpoint.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EndpointError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("not authorized for document: {0}")]
    Unauthorized(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("rejected annotation set: {0}")]
    Invalid(String),
}

/// Reasons an editor state transition was refused. The controller stays in
/// its previous state when one of these is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("no signature available to place")]
    SignatureUnavailable,

    #[error("document is finalized and can no longer be edited")]
    DocumentFinalized,

    #[error("a finalize request is already in flight")]
    FinalizeInFlight,
}
