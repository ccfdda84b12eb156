//! Upgrade strategies: how nodes are replaced when the launch configuration changes.

use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde::{Deserialize, Serialize};

/// Strategy type names accepted in `spec.strategy.type`.
pub mod strategy_types {
    pub const ROLLING_UPDATE: &str = "rollingUpdate";
    pub const CRD: &str = "crd";
    pub const MANAGED: &str = "managed";
}

/// Upgrade strategy of an instance group.
///
/// The all-empty value is what an unconfigured group reads as: `type_` is
/// the empty string and no sub-strategy is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsUpgradeStrategy {
    #[serde(rename = "type", default)]
    pub type_: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolling_update: Option<RollingUpdateStrategy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crd: Option<CrdUpdateStrategy>,
}

impl AwsUpgradeStrategy {
    /// Returns true if this is the all-empty strategy.
    pub fn is_zero(&self) -> bool {
        self == &Self::default()
    }
}

/// Rolling replacement of nodes, a bounded number at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingUpdateStrategy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unavailable: Option<IntOrString>,
}

/// Delegation of the upgrade to a custom resource submitted by the provisioner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdUpdateStrategy {
    #[serde(default)]
    pub crd_name: String,

    /// Manifest template of the custom resource to submit.
    #[serde(default)]
    pub spec: String,

    #[serde(default)]
    pub status_json_path: String,

    #[serde(default)]
    pub status_success_string: String,

    #[serde(default)]
    pub status_failure_string: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency_policy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<i32>,
}
