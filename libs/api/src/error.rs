//! Error types for the instance group model.

use thiserror::Error;

/// Errors that can occur when interpreting instance group fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The reconcile state string is not one of the canonical states.
    #[error("unknown reconcile state: {0}")]
    UnknownState(String),

    /// The namespaced name is not of the form `namespace/name`.
    #[error("invalid namespaced name: {0}")]
    InvalidNamespacedName(String),
}
