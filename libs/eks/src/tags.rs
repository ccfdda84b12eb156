//! Tags applied to the group's scaling group.

use k8s_openapi::api::core::v1::Taint;
use serde::{Deserialize, Serialize};

use instancemgr_api::InstanceGroup;

pub const TAG_NAME: &str = "Name";
pub const TAG_CLUSTER_NAME: &str = "instancegroups.keikoproj.io/ClusterName";
pub const TAG_INSTANCE_GROUP_NAME: &str = "instancegroups.keikoproj.io/InstanceGroup";
pub const TAG_INSTANCE_GROUP_NAMESPACE: &str = "instancegroups.keikoproj.io/Namespace";
pub const TAG_KUBERNETES_CLUSTER_PREFIX: &str = "kubernetes.io/cluster/";

pub const TAG_AUTOSCALER_ENABLED: &str = "k8s.io/cluster-autoscaler/enabled";
pub const TAG_AUTOSCALER_CLUSTER_PREFIX: &str = "k8s.io/cluster-autoscaler/";
pub const TAG_AUTOSCALER_LABEL_PREFIX: &str = "k8s.io/cluster-autoscaler/node-template/label/";
pub const TAG_AUTOSCALER_TAINT_PREFIX: &str = "k8s.io/cluster-autoscaler/node-template/taint/";

/// A key/value tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Tags for the scaling group of `instance_group`.
///
/// `prefix` is the context's resource prefix. Autoscaler discovery tags,
/// including node-template tags for `labels` and taints, are added only
/// when `autoscaler_enabled`.
pub fn scaling_group_tags<'a>(
    instance_group: &InstanceGroup,
    prefix: &str,
    autoscaler_enabled: bool,
    labels: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> Vec<Tag> {
    let configuration = instance_group.eks_configuration();
    let cluster_name = configuration.cluster_name();

    let mut tags = vec![
        Tag::new(TAG_NAME, prefix),
        Tag::new(TAG_CLUSTER_NAME, cluster_name),
        Tag::new(TAG_INSTANCE_GROUP_NAME, instance_group.name()),
        Tag::new(TAG_INSTANCE_GROUP_NAMESPACE, instance_group.namespace()),
        Tag::new(format!("{TAG_KUBERNETES_CLUSTER_PREFIX}{cluster_name}"), "owned"),
    ];

    if autoscaler_enabled {
        tags.push(Tag::new(TAG_AUTOSCALER_ENABLED, "true"));
        tags.push(Tag::new(
            format!("{TAG_AUTOSCALER_CLUSTER_PREFIX}{cluster_name}"),
            "owned",
        ));
        for (key, value) in labels {
            tags.push(Tag::new(format!("{TAG_AUTOSCALER_LABEL_PREFIX}{key}"), value.as_str()));
        }
        for taint in &configuration.taints {
            tags.push(Tag::new(
                format!("{TAG_AUTOSCALER_TAINT_PREFIX}{}", taint.key),
                autoscaler_taint_value(taint),
            ));
        }
    }

    tags
}

/// `value:Effect`, the node-template taint format.
fn autoscaler_taint_value(taint: &Taint) -> String {
    format!("{}:{}", taint.value.as_deref().unwrap_or_default(), taint.effect)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn group() -> InstanceGroup {
        let mut ig = InstanceGroup::new("kube-system", "workers-a");
        ig.eks_configuration_mut().cluster_name = "prod".to_string();
        ig.eks_configuration_mut().taints = vec![Taint {
            key: "dedicated".to_string(),
            value: Some("platform".to_string()),
            effect: "NoSchedule".to_string(),
            ..Default::default()
        }];
        ig
    }

    #[test]
    fn test_base_tags() {
        let labels = BTreeMap::new();
        let tags = scaling_group_tags(&group(), "prod-kube-system-workers-a", false, &labels);
        assert_eq!(
            tags,
            vec![
                Tag::new(TAG_NAME, "prod-kube-system-workers-a"),
                Tag::new(TAG_CLUSTER_NAME, "prod"),
                Tag::new(TAG_INSTANCE_GROUP_NAME, "workers-a"),
                Tag::new(TAG_INSTANCE_GROUP_NAMESPACE, "kube-system"),
                Tag::new("kubernetes.io/cluster/prod", "owned"),
            ]
        );
    }

    #[test]
    fn test_autoscaler_tags() {
        let labels = BTreeMap::from([("team".to_string(), "platform".to_string())]);
        let tags = scaling_group_tags(&group(), "prod-kube-system-workers-a", true, &labels);

        assert!(tags.contains(&Tag::new(TAG_AUTOSCALER_ENABLED, "true")));
        assert!(tags.contains(&Tag::new("k8s.io/cluster-autoscaler/prod", "owned")));
        assert!(tags.contains(&Tag::new(
            "k8s.io/cluster-autoscaler/node-template/label/team",
            "platform"
        )));
        assert!(tags.contains(&Tag::new(
            "k8s.io/cluster-autoscaler/node-template/taint/dedicated",
            "platform:NoSchedule"
        )));
    }
}
