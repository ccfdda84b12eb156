//! Cloud-observed state correlated to an instance group.
//!
//! A [`DiscoveredState`] is produced by the caller from cloud worker
//! responses and handed to the context. The context replaces it wholesale
//! and records the resolved instance pool on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use instancemgr_api::ReconcileState;

use crate::pool::{InstancePool, InstanceTypeInfo};

/// Scaling group status reported while a delete is in flight.
pub const SCALING_GROUP_DELETE_IN_PROGRESS: &str = "Delete in progress";

/// EKS cluster details needed to bootstrap nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub name: String,
    pub endpoint: String,
    /// Base64 encoded certificate authority bundle.
    pub certificate_authority: String,
    pub version: String,
    /// Cluster IP of the cluster DNS service.
    pub dns_cluster_ip: Option<String>,
}

/// Observed scaling group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingGroupSummary {
    pub name: String,
    pub min_size: i64,
    pub max_size: i64,
    pub desired_capacity: i64,
    /// Set by the provider while the group is being deleted.
    pub status: Option<String>,
    pub instance_ids: Vec<String>,
}

impl ScalingGroupSummary {
    pub fn is_deleting(&self) -> bool {
        self.status.as_deref() == Some(SCALING_GROUP_DELETE_IN_PROGRESS)
    }
}

/// A launch configuration owned by the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfigurationSummary {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Snapshot of cloud resources belonging to one instance group.
///
/// The default value is the empty snapshot: nothing provisioned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredState {
    pub provisioned: bool,
    pub scaling_group: Option<ScalingGroupSummary>,
    pub launch_configurations: Vec<LaunchConfigurationSummary>,
    pub active_launch_configuration: Option<String>,
    pub launch_template: Option<String>,
    pub cluster: Option<ClusterInfo>,
    pub instance_types: Vec<InstanceTypeInfo>,
    pub instance_pool: Option<InstancePool>,
    pub node_count: usize,
}

impl DiscoveredState {
    pub fn is_provisioned(&self) -> bool {
        self.provisioned
    }

    pub fn is_scaling_group_deleting(&self) -> bool {
        self.scaling_group
            .as_ref()
            .is_some_and(ScalingGroupSummary::is_deleting)
    }

    pub fn instance_type_info(&self, instance_type: &str) -> Option<&InstanceTypeInfo> {
        self.instance_types
            .iter()
            .find(|info| info.instance_type == instance_type)
    }

    /// State a pass starts from, given whether the group is being deleted.
    pub fn init_transition(&self, deleting: bool) -> ReconcileState {
        match (deleting, self.provisioned) {
            (true, false) => ReconcileState::Deleted,
            (true, true) if self.is_scaling_group_deleting() => ReconcileState::Deleting,
            (true, true) => ReconcileState::InitDelete,
            (false, false) => ReconcileState::InitCreate,
            (false, true) => ReconcileState::InitUpdate,
        }
    }
}
