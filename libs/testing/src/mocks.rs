//! Mock collaborators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use instancemgr_api::{InstanceGroup, NamespacedName};
use instancemgr_eks::{
    error::{KubeError, MetricsError, WorkerError},
    AwsWorker, ClusterInfo, EksInstanceGroupContext, InstanceTypeInfo, KubernetesClient,
    MetricsSink, ProvisionerConfig, ProvisionerInput,
};

/// Metrics sink that records every state it receives.
#[derive(Debug, Default)]
pub struct MockMetrics {
    events: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

impl MockMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects every record.
    pub fn failing() -> Self {
        let metrics = Self::default();
        metrics.set_failing(true);
        metrics
    }

    /// Start or stop rejecting records.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Every `(group, state)` pair recorded, in order.
    pub fn events(&self) -> Vec<(String, String)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// States recorded for `group`, in order.
    pub fn states_for(&self, group: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|(name, _)| name == group)
            .map(|(_, state)| state)
            .collect()
    }
}

impl MetricsSink for MockMetrics {
    fn record_group_state(&self, group: &str, state: &str) -> Result<(), MetricsError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MetricsError::Unavailable("mock sink failing".to_string()));
        }
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((group.to_string(), state.to_string()));
        Ok(())
    }
}

/// AWS worker serving a fixed cluster and fixed offerings.
#[derive(Debug, Clone, Default)]
pub struct MockAwsWorker {
    pub cluster: Option<ClusterInfo>,
    pub offerings: Vec<InstanceTypeInfo>,
}

impl MockAwsWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster(mut self, cluster: ClusterInfo) -> Self {
        self.cluster = Some(cluster);
        self
    }

    pub fn with_offerings(mut self, offerings: Vec<InstanceTypeInfo>) -> Self {
        self.offerings = offerings;
        self
    }
}

#[async_trait]
impl AwsWorker for MockAwsWorker {
    async fn describe_cluster(&self, cluster_name: &str) -> Result<ClusterInfo, WorkerError> {
        match &self.cluster {
            Some(cluster) if cluster.name == cluster_name => Ok(cluster.clone()),
            _ => Err(WorkerError::ClusterNotFound(cluster_name.to_string())),
        }
    }

    async fn describe_instance_type_offerings(&self) -> Result<Vec<InstanceTypeInfo>, WorkerError> {
        Ok(self.offerings.clone())
    }
}

/// Kubernetes client with a fixed cluster DNS IP.
#[derive(Debug, Clone, Default)]
pub struct MockKubernetes {
    pub dns_ip: Option<String>,
}

impl MockKubernetes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dns_ip(dns_ip: &str) -> Self {
        Self {
            dns_ip: Some(dns_ip.to_string()),
        }
    }
}

#[async_trait]
impl KubernetesClient for MockKubernetes {
    async fn cluster_dns_ip(&self) -> Result<Option<String>, KubeError> {
        Ok(self.dns_ip.clone())
    }
}

/// Build a context over `instance_group` with default mocks and config.
pub fn context(
    instance_group: InstanceGroup,
    metrics: Arc<MockMetrics>,
) -> instancemgr_eks::Result<EksInstanceGroupContext> {
    EksInstanceGroupContext::new(ProvisionerInput {
        instance_group,
        kubernetes: Arc::new(MockKubernetes::new()),
        aws_worker: Arc::new(MockAwsWorker::new()),
        metrics,
        config: ProvisionerConfig::default(),
    })
}

/// `namespace/name` key the metrics sink sees for a group.
pub fn metrics_key(namespace: &str, name: &str) -> String {
    NamespacedName::new(namespace, name).to_string()
}
