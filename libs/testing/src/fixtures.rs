//! Instance group and cluster fixtures.

use chrono::Utc;
use k8s_openapi::api::core::v1::Taint;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

use instancemgr_api::{
    AwsUpgradeStrategy, InstanceGroup, InstanceTypeSpec, MixedInstancesPolicy, UserDataStage,
};
use instancemgr_eks::{ClusterInfo, InstanceTypeInfo};

/// Builder for [`InstanceGroup`] fixtures.
///
/// Starts from `prod/kube-system/workers-a` on `m5.large`.
#[derive(Debug, Clone)]
pub struct InstanceGroupBuilder {
    instance_group: InstanceGroup,
}

impl Default for InstanceGroupBuilder {
    fn default() -> Self {
        Self::new("kube-system", "workers-a")
    }
}

impl InstanceGroupBuilder {
    pub fn new(namespace: &str, name: &str) -> Self {
        let mut instance_group = InstanceGroup::new(namespace, name);
        let configuration = instance_group.eks_configuration_mut();
        configuration.cluster_name = "prod".to_string();
        configuration.instance_type = "m5.large".to_string();
        configuration.image = "ami-0123456789abcdef0".to_string();
        instance_group.spec.eks.min_size = 1;
        instance_group.spec.eks.max_size = 3;
        Self { instance_group }
    }

    pub fn cluster(mut self, cluster_name: &str) -> Self {
        self.instance_group.eks_configuration_mut().cluster_name = cluster_name.to_string();
        self
    }

    pub fn instance_type(mut self, instance_type: &str) -> Self {
        self.instance_group.eks_configuration_mut().instance_type = instance_type.to_string();
        self
    }

    pub fn annotation(mut self, key: &str, value: &str) -> Self {
        self.instance_group
            .annotations_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.instance_group
            .eks_configuration_mut()
            .labels
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn taint(mut self, key: &str, value: Option<&str>, effect: &str) -> Self {
        self.instance_group.eks_configuration_mut().taints.push(Taint {
            key: key.to_string(),
            value: value.map(str::to_string),
            effect: effect.to_string(),
            time_added: None,
        });
        self
    }

    pub fn user_data(mut self, name: &str, stage: &str, data: &str) -> Self {
        self.instance_group
            .eks_configuration_mut()
            .user_data
            .push(UserDataStage::new(name, stage, data));
        self
    }

    pub fn strategy(mut self, strategy: AwsUpgradeStrategy) -> Self {
        self.instance_group.spec.aws_upgrade_strategy = Some(strategy);
        self
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.instance_group.spec.locked = Some(locked);
        self
    }

    pub fn instance_pool(mut self, pool: &str) -> Self {
        self.instance_group
            .eks_configuration_mut()
            .mixed_instances_policy
            .get_or_insert_with(MixedInstancesPolicy::default)
            .instance_pool = Some(pool.to_string());
        self
    }

    pub fn mixed_instance_types(mut self, types: &[(&str, &str)]) -> Self {
        self.instance_group
            .eks_configuration_mut()
            .mixed_instances_policy
            .get_or_insert_with(MixedInstancesPolicy::default)
            .instance_types = types
            .iter()
            .map(|(type_, weight)| InstanceTypeSpec {
                type_: type_.to_string(),
                weight: weight.to_string(),
            })
            .collect();
        self
    }

    pub fn deleting(mut self) -> Self {
        self.instance_group.metadata.deletion_timestamp = Some(Time(Utc::now()));
        self
    }

    pub fn build(self) -> InstanceGroup {
        self.instance_group
    }
}

/// The `prod` cluster.
pub fn cluster_info() -> ClusterInfo {
    ClusterInfo {
        name: "prod".to_string(),
        endpoint: "https://prod.eks.amazonaws.com".to_string(),
        certificate_authority: "Y2EtYnVuZGxl".to_string(),
        version: "1.30".to_string(),
        dns_cluster_ip: Some("172.20.0.10".to_string()),
    }
}

/// An instance type offering.
pub fn offering(
    instance_type: &str,
    arch: &str,
    vcpus: u32,
    memory_mib: u64,
) -> InstanceTypeInfo {
    InstanceTypeInfo {
        instance_type: instance_type.to_string(),
        architectures: vec![arch.to_string()],
        vcpus,
        memory_mib,
        max_enis: 3,
        ipv4_per_eni: 10,
    }
}
