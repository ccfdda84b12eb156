//! Error types for the EKS provisioner.

use thiserror::Error;

use instancemgr_api::NamespacedName;

/// Errors surfaced to the caller of a reconcile pass.
///
/// Absent or invalid input never produces one of these; it is defaulted
/// instead. Only write-side collaborator failures and lock violations do.
#[derive(Debug, Error)]
pub enum ProvisionerError {
    /// The metrics sink rejected a state update.
    #[error(transparent)]
    Metrics(#[from] MetricsError),

    /// A mutating action was requested for a locked group.
    #[error("instance group {group} is locked")]
    Locked { group: NamespacedName },

    /// The cloud worker failed.
    #[error(transparent)]
    Worker(#[from] WorkerError),

    /// The Kubernetes client failed.
    #[error(transparent)]
    Kubernetes(#[from] KubeError),

    /// The provisioner configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ProvisionerError {
    /// Returns true if the group was locked.
    pub fn is_locked(&self) -> bool {
        matches!(self, ProvisionerError::Locked { .. })
    }

    /// Returns true if a write-side collaborator was unreachable.
    pub fn is_sink_unavailable(&self) -> bool {
        matches!(self, ProvisionerError::Metrics(_))
    }
}

/// Metrics sink failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetricsError {
    /// The sink could not be reached.
    #[error("metrics sink unavailable: {0}")]
    Unavailable(String),

    /// The sink refused the sample.
    #[error("metrics sink rejected {group}={state}: {reason}")]
    Rejected {
        group: String,
        state: String,
        reason: String,
    },
}

/// Cloud worker failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error("cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("aws request failed: {0}")]
    Request(String),
}

/// Kubernetes client failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KubeError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("kubernetes request failed: {0}")]
    Request(String),
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}
