//! Command line arguments.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;

use instancemgr_api::InstanceGroup;
use instancemgr_eks::ClusterInfo;

#[derive(Debug, Parser)]
#[command(name = "instancemgr-resolve", version, about)]
pub struct Args {
    /// Instance group manifest (YAML or JSON)
    pub manifest: PathBuf,

    /// EKS API server endpoint
    #[arg(long, env = "INSTANCEMGR_CLUSTER_ENDPOINT")]
    pub endpoint: String,

    /// Base64 cluster CA bundle
    #[arg(long = "ca", env = "INSTANCEMGR_CLUSTER_CA")]
    pub certificate_authority: String,

    /// Kubernetes version of the cluster
    #[arg(long = "cluster-version", default_value = "")]
    pub cluster_version: String,

    /// Cluster IP of the cluster DNS service
    #[arg(long)]
    pub dns_ip: Option<String>,

    /// JSON array of instance type offerings
    #[arg(long, value_name = "PATH")]
    pub offerings: Option<PathBuf>,

    /// Timestamp for the launch configuration name (RFC 3339); defaults to now
    #[arg(long, value_name = "RFC3339")]
    pub at: Option<DateTime<Utc>>,

    /// Pretty-print the report
    #[arg(long)]
    pub pretty: bool,

    /// Also print the state gauge in Prometheus text format
    #[arg(long)]
    pub metrics: bool,
}

impl Args {
    /// Cluster details for the group's cluster as given on the command line.
    pub fn cluster_info(&self, instance_group: &InstanceGroup) -> ClusterInfo {
        ClusterInfo {
            name: instance_group.eks_configuration().cluster_name.clone(),
            endpoint: self.endpoint.clone(),
            certificate_authority: self.certificate_authority.clone(),
            version: self.cluster_version.clone(),
            dns_cluster_ip: None,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.at.unwrap_or_else(Utc::now)
    }
}
