//! Annotations recognised on an instance group.
//!
//! Keys are matched exactly; boolean values are matched case-insensitively.

use std::collections::BTreeMap;

use tracing::warn;

pub const OVERRIDE_DEFAULT_LABELS_ANNOTATION: &str = "instancemgr.keikoproj.io/default-labels";
pub const IRSA_ENABLED_ANNOTATION: &str = "instancemgr.keikoproj.io/irsa-enabled";
pub const OS_FAMILY_ANNOTATION: &str = "instancemgr.keikoproj.io/os-family";
pub const CLUSTER_AUTOSCALER_ENABLED_ANNOTATION: &str =
    "instancemgr.keikoproj.io/cluster-autoscaler-enabled";
pub const CUSTOM_NETWORKING_ENABLED_ANNOTATION: &str =
    "instancemgr.keikoproj.io/custom-networking-enabled";
pub const CUSTOM_NETWORKING_HOST_PODS_ANNOTATION: &str =
    "instancemgr.keikoproj.io/custom-networking-host-pods";
pub const CUSTOM_NETWORKING_PREFIX_ASSIGNMENT_ENABLED_ANNOTATION: &str =
    "instancemgr.keikoproj.io/custom-networking-prefix-assignment-enabled";

/// Host-network pods reserved under custom networking when not annotated.
pub const DEFAULT_CUSTOM_NETWORKING_HOST_PODS: u32 = 2;

/// Typed view over an instance group's annotations.
#[derive(Debug, Clone, Copy)]
pub struct GroupAnnotations<'a> {
    annotations: &'a BTreeMap<String, String>,
}

impl<'a> GroupAnnotations<'a> {
    pub fn new(annotations: &'a BTreeMap<String, String>) -> Self {
        Self { annotations }
    }

    fn get(&self, key: &str) -> Option<&'a str> {
        self.annotations.get(key).map(String::as_str)
    }

    fn is_true(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// Raw value of the OS family override, if present.
    pub fn os_family(&self) -> Option<&'a str> {
        self.get(OS_FAMILY_ANNOTATION)
    }

    /// Default node labels are applied unless explicitly set to `false`.
    pub fn default_labels_enabled(&self) -> bool {
        !self
            .get(OVERRIDE_DEFAULT_LABELS_ANNOTATION)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("false"))
    }

    pub fn irsa_enabled(&self) -> bool {
        self.is_true(IRSA_ENABLED_ANNOTATION)
    }

    pub fn cluster_autoscaler_enabled(&self) -> bool {
        self.is_true(CLUSTER_AUTOSCALER_ENABLED_ANNOTATION)
    }

    pub fn custom_networking_enabled(&self) -> bool {
        self.is_true(CUSTOM_NETWORKING_ENABLED_ANNOTATION)
    }

    pub fn prefix_assignment_enabled(&self) -> bool {
        self.is_true(CUSTOM_NETWORKING_PREFIX_ASSIGNMENT_ENABLED_ANNOTATION)
    }

    /// Reserved host-network pods under custom networking.
    ///
    /// Falls back to [`DEFAULT_CUSTOM_NETWORKING_HOST_PODS`] when absent or
    /// not a non-negative integer.
    pub fn custom_networking_host_pods(&self) -> u32 {
        let Some(value) = self.get(CUSTOM_NETWORKING_HOST_PODS_ANNOTATION) else {
            return DEFAULT_CUSTOM_NETWORKING_HOST_PODS;
        };
        match value.trim().parse() {
            Ok(pods) => pods,
            Err(_) => {
                warn!(
                    annotation = CUSTOM_NETWORKING_HOST_PODS_ANNOTATION,
                    value,
                    default = DEFAULT_CUSTOM_NETWORKING_HOST_PODS,
                    "invalid host pods annotation, using default"
                );
                DEFAULT_CUSTOM_NETWORKING_HOST_PODS
            }
        }
    }
}
