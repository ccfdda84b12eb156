//! Collaborators the caller uses for cloud and cluster I/O.
//!
//! The context holds these handles for the duration of a pass but never
//! calls them itself.

use async_trait::async_trait;

use crate::discovered::ClusterInfo;
use crate::error::{KubeError, WorkerError};
use crate::pool::InstanceTypeInfo;

/// Access to the AWS APIs backing an instance group.
#[async_trait]
pub trait AwsWorker: Send + Sync {
    /// Endpoint, CA bundle and version of an EKS cluster.
    async fn describe_cluster(&self, cluster_name: &str) -> Result<ClusterInfo, WorkerError>;

    /// Instance types offered in the worker's region.
    async fn describe_instance_type_offerings(&self) -> Result<Vec<InstanceTypeInfo>, WorkerError>;
}

/// Access to the managed cluster's API server.
#[async_trait]
pub trait KubernetesClient: Send + Sync {
    /// Cluster IP of the cluster DNS service, if it exists.
    async fn cluster_dns_ip(&self) -> Result<Option<String>, KubeError>;
}
