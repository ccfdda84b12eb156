//! InstanceGroup resource model.
//!
//! Field names follow the `instancemgr.keikoproj.io/v1alpha1` schema so that
//! manifests deserialize directly from YAML or JSON.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Taint;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use crate::names::DEFAULT_NAMESPACE;
use crate::{AwsUpgradeStrategy, NamespacedName, ReconcileState};

/// API group/version of the resource.
pub const API_VERSION: &str = "instancemgr.keikoproj.io/v1alpha1";

/// Kind of the resource.
pub const KIND: &str = "InstanceGroup";

// =============================================================================
// User-data stages
// =============================================================================

/// Bootstrap stage names accepted in `spec.eks.configuration.userData[].stage`.
pub mod stages {
    /// Runs before the node bootstrap script.
    pub const PRE_BOOTSTRAP: &str = "PreBootstrap";
    /// Runs after the node bootstrap script.
    pub const POST_BOOTSTRAP: &str = "PostBootstrap";
    /// A complete node configuration document; selects a config-file driven OS.
    pub const NODE_CONFIG_YAML: &str = "NodeConfigYaml";
}

/// A named piece of user data attached to a bootstrap stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataStage {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub stage: String,

    /// Raw or base64 encoded content.
    #[serde(default)]
    pub data: String,
}

impl UserDataStage {
    pub fn new(name: &str, stage: &str, data: &str) -> Self {
        Self {
            name: name.to_string(),
            stage: stage.to_string(),
            data: data.to_string(),
        }
    }

    /// Case-insensitive stage comparison.
    pub fn is_stage(&self, stage: &str) -> bool {
        self.stage.eq_ignore_ascii_case(stage)
    }
}

// =============================================================================
// EKS configuration
// =============================================================================

/// Mount options for a node volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeVolumeMountOptions {
    #[serde(default)]
    pub file_system: String,

    #[serde(default)]
    pub mount: String,

    /// Whether the mount is written to fstab.
    #[serde(default)]
    pub persistance: bool,
}

/// A block device attached to every node of the group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeVolume {
    /// Device name, e.g. `/dev/xvdb`.
    pub name: String,

    #[serde(rename = "type", default)]
    pub type_: String,

    #[serde(default)]
    pub size: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_options: Option<NodeVolumeMountOptions>,
}

/// An explicitly weighted instance type in a mixed instances policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceTypeSpec {
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default = "default_weight")]
    pub weight: String,
}

fn default_weight() -> String {
    "1".to_string()
}

/// Mixed instances policy of the scaling group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixedInstancesPolicy {
    /// Allocation strategy, e.g. `CapacityOptimized`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    /// Pool type used to derive instance types, e.g. `SubFamilyFlexible`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_pool: Option<String>,

    #[serde(default)]
    pub instance_types: Vec<InstanceTypeSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spot_ratio: Option<String>,
}

/// Node configuration of an EKS instance group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EksConfiguration {
    #[serde(default)]
    pub cluster_name: String,

    #[serde(default)]
    pub image: String,

    #[serde(default)]
    pub instance_type: String,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub taints: Vec<Taint>,

    /// Extra arguments passed verbatim to the bootstrap script.
    #[serde(default)]
    pub bootstrap_arguments: String,

    #[serde(default)]
    pub user_data: Vec<UserDataStage>,

    #[serde(default)]
    pub volumes: Vec<NodeVolume>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spot_price: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixed_instances_policy: Option<MixedInstancesPolicy>,
}

impl EksConfiguration {
    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    pub fn user_data(&self) -> &[UserDataStage] {
        &self.user_data
    }

    /// Returns true if the group runs on spot capacity.
    pub fn is_spot(&self) -> bool {
        self.spot_price.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// EKS provisioner section of the spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EksSpec {
    #[serde(default)]
    pub min_size: i64,

    #[serde(default)]
    pub max_size: i64,

    #[serde(default)]
    pub configuration: EksConfiguration,
}

// =============================================================================
// Spec / Status
// =============================================================================

/// Desired state of an instance group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceGroupSpec {
    #[serde(default)]
    pub provisioner: String,

    /// Suspends all mutating actions for the group while true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,

    /// `None` when the manifest does not configure a strategy.
    #[serde(rename = "strategy", default, skip_serializing_if = "Option::is_none")]
    pub aws_upgrade_strategy: Option<AwsUpgradeStrategy>,

    #[serde(default)]
    pub eks: EksSpec,
}

/// Observed state of an instance group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceGroupStatus {
    #[serde(default)]
    pub provisioner: String,

    #[serde(default)]
    pub strategy: String,

    #[serde(default)]
    pub current_state: ReconcileState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_scaling_group_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_launch_configuration_name: Option<String>,
}

impl InstanceGroupStatus {
    pub fn set_provisioner(&mut self, provisioner: &str) {
        self.provisioner = provisioner.to_string();
    }

    pub fn set_strategy(&mut self, strategy: &str) {
        self.strategy = strategy.to_string();
    }

    pub fn current_state(&self) -> ReconcileState {
        self.current_state
    }
}

// =============================================================================
// InstanceGroup
// =============================================================================

/// The `InstanceGroup` custom resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceGroup {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: InstanceGroupSpec,

    #[serde(default)]
    pub status: InstanceGroupStatus,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_kind() -> String {
    KIND.to_string()
}

impl Default for InstanceGroup {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ObjectMeta::default(),
            spec: InstanceGroupSpec::default(),
            status: InstanceGroupStatus::default(),
        }
    }
}

impl InstanceGroup {
    /// Creates a group with the given identity and an empty spec.
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    /// The namespace, or `default` when none is set.
    pub fn namespace(&self) -> &str {
        match self.metadata.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => ns,
            _ => DEFAULT_NAMESPACE,
        }
    }

    pub fn namespaced_name(&self) -> NamespacedName {
        NamespacedName::new(self.namespace(), self.name())
    }

    /// Annotations; an empty map when the resource has none.
    pub fn annotations(&self) -> &BTreeMap<String, String> {
        static EMPTY: BTreeMap<String, String> = BTreeMap::new();
        self.metadata.annotations.as_ref().unwrap_or(&EMPTY)
    }

    pub fn annotations_mut(&mut self) -> &mut BTreeMap<String, String> {
        self.metadata.annotations.get_or_insert_with(BTreeMap::new)
    }

    /// Returns true once the resource has been marked for deletion.
    pub fn is_deleting(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// Returns true if mutating actions are suspended for this group.
    pub fn locked(&self) -> bool {
        self.spec.locked.unwrap_or(false)
    }

    pub fn eks_configuration(&self) -> &EksConfiguration {
        &self.spec.eks.configuration
    }

    pub fn eks_configuration_mut(&mut self) -> &mut EksConfiguration {
        &mut self.spec.eks.configuration
    }

    /// The configured upgrade strategy, if any.
    pub fn upgrade_strategy(&self) -> Option<&AwsUpgradeStrategy> {
        self.spec.aws_upgrade_strategy.as_ref()
    }

    pub fn status(&self) -> &InstanceGroupStatus {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut InstanceGroupStatus {
        &mut self.status
    }

    pub fn state(&self) -> ReconcileState {
        self.status.current_state
    }

    pub fn set_state(&mut self, state: ReconcileState) {
        self.status.current_state = state;
    }
}
