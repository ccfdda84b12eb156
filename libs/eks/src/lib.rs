//! EKS provisioner reconcile context.
//!
//! This library holds the per-pass context the instance group controller
//! uses to provision EC2 worker capacity for an EKS cluster. It resolves:
//!
//! - **OS family**: which bootstrap contract the node user data follows.
//! - **Bootstrap parameters**: what the user-data renderer must inject.
//! - **Instance pools**: weighted, mutually substitutable instance types.
//! - **Reconcile state**: the transition recorded on status and metrics.
//!
//! # Invariants
//!
//! - One context per reconcile pass; all access goes through its lock
//! - The resource prefix is fixed at construction and names every derived resource
//! - Absent input defaults, invalid input degrades with a warning
//! - Failures of write-side collaborators are returned to the caller
//!
//! No cloud or cluster API calls happen here; those belong to the
//! [`AwsWorker`] and [`KubernetesClient`] collaborators.

pub mod annotations;
pub mod config;
pub mod context;
pub mod discovered;
pub mod error;
pub mod metrics;
pub mod naming;
pub mod os_family;
pub mod pool;
pub mod provider;
pub mod tags;
pub mod userdata;

#[cfg(test)]
mod test_support;

pub use config::ProvisionerConfig;
pub use context::{ContextGuard, EksInstanceGroupContext, ProvisionerInput};
pub use discovered::{ClusterInfo, DiscoveredState, LaunchConfigurationSummary, ScalingGroupSummary};
pub use error::{ConfigError, KubeError, MetricsError, ProvisionerError, WorkerError};
pub use metrics::{MetricsCollector, MetricsSink};
pub use os_family::{BootstrapContract, OsFamily};
pub use pool::{
    InstancePool, InstancePoolType, InstanceSpec, InstanceTypeInfo, UnknownInstancePoolType,
};
pub use provider::{AwsWorker, KubernetesClient};
pub use userdata::{EksUserData, EniLimits, MountOpts, UserDataPayload};

/// Result type alias for provisioner operations.
pub type Result<T> = std::result::Result<T, ProvisionerError>;

/// Name recorded in `status.provisioner`.
pub const PROVISIONER_NAME: &str = "eks";

/// Launch configurations retained besides the active one.
pub const DEFAULT_CONFIG_RETENTION: usize = 2;

// =============================================================================
// Node labels
// =============================================================================

pub const ROLE_NEW_LABEL: &str = "node.kubernetes.io/role";
/// Legacy role label prefix; the group name is appended.
pub const ROLE_OLD_LABEL_PREFIX: &str = "node-role.kubernetes.io/";
pub const INSTANCE_MGR_LIFECYCLE_LABEL: &str = "instancemgr.keikoproj.io/lifecycle";
pub const INSTANCE_MGR_IMAGE_LABEL: &str = "instancemgr.keikoproj.io/image";

pub const LIFECYCLE_NORMAL: &str = "normal";
pub const LIFECYCLE_SPOT: &str = "spot";

// =============================================================================
// IAM
// =============================================================================

/// Managed policies attached to every node role.
pub const DEFAULT_MANAGED_POLICIES: [&str; 2] = [
    "AmazonEKSWorkerNodePolicy",
    "AmazonEC2ContainerRegistryReadOnly",
];

/// Attached to the node role unless IRSA provides CNI credentials.
pub const CNI_MANAGED_POLICY: &str = "AmazonEKS_CNI_Policy";

/// Managed policies for a node role.
pub fn managed_policies(irsa_enabled: bool) -> Vec<&'static str> {
    let mut policies = DEFAULT_MANAGED_POLICIES.to_vec();
    if !irsa_enabled {
        policies.push(CNI_MANAGED_POLICY);
    }
    policies
}

// =============================================================================
// Architectures
// =============================================================================

pub const SUPPORTED_ARCHITECTURES: [&str; 2] = ["x86_64", "arm64"];

pub fn is_supported_architecture(arch: &str) -> bool {
    SUPPORTED_ARCHITECTURES.contains(&arch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_managed_policies() {
        assert_eq!(
            managed_policies(false),
            vec![
                "AmazonEKSWorkerNodePolicy",
                "AmazonEC2ContainerRegistryReadOnly",
                "AmazonEKS_CNI_Policy"
            ]
        );
        assert!(!managed_policies(true).contains(&CNI_MANAGED_POLICY));
    }

    #[test]
    fn test_supported_architectures() {
        assert!(is_supported_architecture("arm64"));
        assert!(!is_supported_architecture("i386"));
    }
}
