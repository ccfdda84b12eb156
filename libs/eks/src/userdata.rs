//! Bootstrap parameters rendered into node user data.
//!
//! These types describe what the renderer must inject; they do not render
//! anything. Which fields are authoritative depends on the OS family's
//! [`BootstrapContract`]:
//!
//! - `Script`: pre/post bootstrap commands, bootstrap arguments and kubelet
//!   arguments; `node_config_yaml` is always `None`.
//! - `NodeConfig`: only `node_config_yaml`; the script fields stay empty.
//!   A group without a `NodeConfigYaml` stage is resolved as `Script`.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use k8s_openapi::api::core::v1::Taint;
use serde::{Deserialize, Serialize};
use tracing::warn;

use instancemgr_api::{stages, InstanceGroup, UserDataStage};

use crate::annotations::GroupAnnotations;
use crate::discovered::ClusterInfo;
use crate::os_family::{BootstrapContract, OsFamily};
use crate::pool::InstanceTypeInfo;
use crate::{
    INSTANCE_MGR_IMAGE_LABEL, INSTANCE_MGR_LIFECYCLE_LABEL, LIFECYCLE_NORMAL, LIFECYCLE_SPOT,
    ROLE_NEW_LABEL, ROLE_OLD_LABEL_PREFIX,
};

/// Separator between multiple node configuration documents.
const YAML_DOCUMENT_SEPARATOR: &str = "---\n";

/// Max pods ceiling under prefix delegation for instances below 30 vCPUs.
const PREFIX_DELEGATION_SMALL_MAX_PODS: i64 = 110;
/// Max pods ceiling under prefix delegation for larger instances.
const PREFIX_DELEGATION_LARGE_MAX_PODS: i64 = 250;
/// IPv4 addresses per delegated prefix.
const ADDRESSES_PER_PREFIX: i64 = 16;

/// User data content grouped by bootstrap stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDataPayload {
    pub pre_bootstrap: Vec<String>,
    pub post_bootstrap: Vec<String>,
    pub node_config_yaml: String,
}

impl UserDataPayload {
    /// Group stage data in declaration order.
    ///
    /// Stage names match case-insensitively; unknown stages are ignored.
    /// Multiple `NodeConfigYaml` stages are joined as a multi-document YAML.
    pub fn from_stages(user_data: &[UserDataStage]) -> Self {
        let mut payload = Self::default();

        for stage in user_data {
            let data = decode_stage_data(&stage.data);
            if stage.is_stage(stages::PRE_BOOTSTRAP) {
                payload.pre_bootstrap.push(data);
            } else if stage.is_stage(stages::POST_BOOTSTRAP) {
                payload.post_bootstrap.push(data);
            } else if stage.is_stage(stages::NODE_CONFIG_YAML) {
                if !payload.node_config_yaml.is_empty() {
                    if !payload.node_config_yaml.ends_with('\n') {
                        payload.node_config_yaml.push('\n');
                    }
                    payload.node_config_yaml.push_str(YAML_DOCUMENT_SEPARATOR);
                }
                payload.node_config_yaml.push_str(&data);
            }
        }

        payload
    }
}

/// Base64 stage data is decoded; anything else is used verbatim.
fn decode_stage_data(data: &str) -> String {
    STANDARD
        .decode(data.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| data.to_string())
}

/// A filesystem to create and mount on a node volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountOpts {
    pub file_system: String,
    pub device: String,
    pub mount: String,
    pub persistance: bool,
}

/// Parameters injected into generated node user data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EksUserData {
    pub api_endpoint: String,
    pub cluster_ca: String,
    pub cluster_name: String,
    pub node_labels: BTreeMap<String, String>,
    pub node_taints: Vec<Taint>,
    pub kubelet_extra_args: String,
    pub arguments: String,
    pub pre_bootstrap: Vec<String>,
    pub post_bootstrap: Vec<String>,
    pub mount_options: Vec<MountOpts>,
    pub max_pods: Option<i64>,
    /// Cluster DNS IP, injected for Windows nodes only.
    pub cluster_ip: Option<String>,
    pub node_config_yaml: Option<String>,
}

/// ENI capacity of an instance type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EniLimits {
    pub max_enis: u32,
    pub ipv4_per_eni: u32,
    pub vcpus: u32,
}

impl From<&InstanceTypeInfo> for EniLimits {
    fn from(info: &InstanceTypeInfo) -> Self {
        Self {
            max_enis: info.max_enis,
            ipv4_per_eni: info.ipv4_per_eni,
            vcpus: info.vcpus,
        }
    }
}

/// Max pods under custom networking.
///
/// The primary ENI is not used for pods. With prefix delegation each
/// secondary address slot carries a /28 prefix and the result is capped.
pub fn max_pods(limits: EniLimits, host_pods: u32, prefix_assignment: bool) -> i64 {
    let enis = i64::from(limits.max_enis.saturating_sub(1));
    let slots = i64::from(limits.ipv4_per_eni.saturating_sub(1));
    let host_pods = i64::from(host_pods);

    if prefix_assignment {
        let ceiling = if limits.vcpus < 30 {
            PREFIX_DELEGATION_SMALL_MAX_PODS
        } else {
            PREFIX_DELEGATION_LARGE_MAX_PODS
        };
        (enis * slots * ADDRESSES_PER_PREFIX + host_pods).min(ceiling)
    } else {
        enis * slots + host_pods
    }
}

/// Labels every node of the group carries unless default labels are off.
pub fn default_labels(instance_group: &InstanceGroup) -> BTreeMap<String, String> {
    let configuration = instance_group.eks_configuration();
    let name = instance_group.name();

    let lifecycle = if configuration.is_spot() {
        LIFECYCLE_SPOT
    } else {
        LIFECYCLE_NORMAL
    };

    let mut labels = BTreeMap::from([
        (ROLE_NEW_LABEL.to_string(), name.to_string()),
        (format!("{ROLE_OLD_LABEL_PREFIX}{name}"), String::new()),
        (INSTANCE_MGR_LIFECYCLE_LABEL.to_string(), lifecycle.to_string()),
    ]);
    if !configuration.image.is_empty() {
        labels.insert(
            INSTANCE_MGR_IMAGE_LABEL.to_string(),
            configuration.image.clone(),
        );
    }
    labels
}

/// Default labels (if enabled) overlaid with the group's own labels.
pub fn node_labels(instance_group: &InstanceGroup) -> BTreeMap<String, String> {
    let annotations = GroupAnnotations::new(instance_group.annotations());
    let mut labels = if annotations.default_labels_enabled() {
        default_labels(instance_group)
    } else {
        BTreeMap::new()
    };
    labels.extend(
        instance_group
            .eks_configuration()
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    labels
}

/// `--node-labels=... --register-with-taints=...`, omitting empty flags.
pub fn kubelet_extra_args(labels: &BTreeMap<String, String>, taints: &[Taint]) -> String {
    let mut args = Vec::new();

    if !labels.is_empty() {
        let rendered: Vec<String> = labels.iter().map(|(k, v)| format!("{k}={v}")).collect();
        args.push(format!("--node-labels={}", rendered.join(",")));
    }

    if !taints.is_empty() {
        let rendered: Vec<String> = taints.iter().map(render_taint).collect();
        args.push(format!("--register-with-taints={}", rendered.join(",")));
    }

    args.join(" ")
}

fn render_taint(taint: &Taint) -> String {
    match taint.value.as_deref() {
        Some(value) if !value.is_empty() => format!("{}={}:{}", taint.key, value, taint.effect),
        _ => format!("{}:{}", taint.key, taint.effect),
    }
}

/// Cluster-side inputs to bootstrap resolution.
#[derive(Debug, Clone, Copy)]
pub struct BootstrapInputs<'a> {
    pub cluster: &'a ClusterInfo,
    /// Offering of the group's instance type, when known.
    pub instance_type: Option<&'a InstanceTypeInfo>,
    pub disable_win_cluster_injection: bool,
}

/// Resolve the bootstrap parameters for `instance_group` under `os_family`.
pub fn resolve_user_data(
    instance_group: &InstanceGroup,
    os_family: OsFamily,
    inputs: BootstrapInputs<'_>,
) -> EksUserData {
    let configuration = instance_group.eks_configuration();
    let annotations = GroupAnnotations::new(instance_group.annotations());
    let payload = UserDataPayload::from_stages(configuration.user_data());

    let node_labels = node_labels(instance_group);
    let node_taints = configuration.taints.clone();

    let mount_options = configuration
        .volumes
        .iter()
        .filter_map(|volume| {
            volume.mount_options.as_ref().map(|opts| MountOpts {
                file_system: opts.file_system.clone(),
                device: volume.name.clone(),
                mount: opts.mount.clone(),
                persistance: opts.persistance,
            })
        })
        .collect();

    let max_pods = match inputs.instance_type {
        Some(info) if annotations.custom_networking_enabled() => Some(max_pods(
            EniLimits::from(info),
            annotations.custom_networking_host_pods(),
            annotations.prefix_assignment_enabled(),
        )),
        _ => None,
    };

    let cluster_ip = if os_family.is_windows() && !inputs.disable_win_cluster_injection {
        inputs.cluster.dns_cluster_ip.clone()
    } else {
        None
    };

    let mut user_data = EksUserData {
        api_endpoint: inputs.cluster.endpoint.clone(),
        cluster_ca: inputs.cluster.certificate_authority.clone(),
        cluster_name: configuration.cluster_name().to_string(),
        node_labels,
        node_taints,
        mount_options,
        max_pods,
        cluster_ip,
        ..Default::default()
    };

    // A node config document is authoritative only when the group carries one
    let contract = match os_family.bootstrap_contract() {
        BootstrapContract::NodeConfig if payload.node_config_yaml.is_empty() => {
            warn!(
                os_family = %os_family,
                "no NodeConfigYaml user data stage, using script bootstrap parameters"
            );
            BootstrapContract::Script
        }
        contract => contract,
    };

    match contract {
        BootstrapContract::Script => {
            user_data.kubelet_extra_args =
                kubelet_extra_args(&user_data.node_labels, &user_data.node_taints);
            user_data.arguments = configuration.bootstrap_arguments.clone();
            user_data.pre_bootstrap = payload.pre_bootstrap;
            user_data.post_bootstrap = payload.post_bootstrap;
        }
        BootstrapContract::NodeConfig => {
            user_data.node_config_yaml = Some(payload.node_config_yaml);
        }
    }

    user_data
}
