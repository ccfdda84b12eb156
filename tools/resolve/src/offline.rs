//! Collaborators answering from command line input instead of live APIs.

use async_trait::async_trait;
use tracing::debug;

use instancemgr_eks::{
    AwsWorker, ClusterInfo, InstanceTypeInfo, KubeError, KubernetesClient, WorkerError,
};

pub struct OfflineAwsWorker {
    cluster: ClusterInfo,
    offerings: Vec<InstanceTypeInfo>,
}

impl OfflineAwsWorker {
    pub fn new(cluster: ClusterInfo, offerings: Vec<InstanceTypeInfo>) -> Self {
        Self { cluster, offerings }
    }
}

#[async_trait]
impl AwsWorker for OfflineAwsWorker {
    async fn describe_cluster(&self, cluster_name: &str) -> Result<ClusterInfo, WorkerError> {
        if cluster_name != self.cluster.name {
            return Err(WorkerError::ClusterNotFound(cluster_name.to_string()));
        }
        debug!(cluster = cluster_name, "describe cluster");
        Ok(self.cluster.clone())
    }

    async fn describe_instance_type_offerings(&self) -> Result<Vec<InstanceTypeInfo>, WorkerError> {
        Ok(self.offerings.clone())
    }
}

pub struct OfflineKubernetes {
    dns_ip: Option<String>,
}

impl OfflineKubernetes {
    pub fn new(dns_ip: Option<String>) -> Self {
        Self { dns_ip }
    }
}

#[async_trait]
impl KubernetesClient for OfflineKubernetes {
    async fn cluster_dns_ip(&self) -> Result<Option<String>, KubeError> {
        Ok(self.dns_ip.clone())
    }
}
