//! Per-pass reconcile context for an EKS instance group.
//!
//! One [`EksInstanceGroupContext`] is built at the start of a reconcile pass
//! and dropped at its end. The instance group and the discovered state live
//! behind a single mutex; overlapping passes for the same group serialize on
//! it. Multi-step read-then-write sequences take a [`ContextGuard`] with
//! [`EksInstanceGroupContext::lock`] and hold it for the whole sequence.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, info_span, Span};

use instancemgr_api::{AwsUpgradeStrategy, InstanceGroup, NamespacedName, ReconcileState};

use crate::annotations::GroupAnnotations;
use crate::config::ProvisionerConfig;
use crate::discovered::{ClusterInfo, DiscoveredState};
use crate::error::ProvisionerError;
use crate::metrics::MetricsSink;
use crate::naming;
use crate::os_family::{self, OsFamily};
use crate::pool::{InstancePool, InstancePoolType, InstanceTypeInfo};
use crate::provider::{AwsWorker, KubernetesClient};
use crate::tags::{self, Tag};
use crate::userdata::{self, BootstrapInputs, EksUserData};
use crate::{managed_policies, Result, PROVISIONER_NAME};

/// Everything needed to build a context.
pub struct ProvisionerInput {
    pub instance_group: InstanceGroup,
    pub kubernetes: Arc<dyn KubernetesClient>,
    pub aws_worker: Arc<dyn AwsWorker>,
    pub metrics: Arc<dyn MetricsSink>,
    pub config: ProvisionerConfig,
}

/// Fields guarded by the context lock.
#[derive(Debug)]
struct ContextState {
    instance_group: InstanceGroup,
    discovered_state: Option<DiscoveredState>,
    /// Resolved once per pass; cleared whenever the group is mutated.
    os_family: Option<OsFamily>,
}

/// Reconcile context of one EKS instance group.
pub struct EksInstanceGroupContext {
    state: Mutex<ContextState>,
    kubernetes: Arc<dyn KubernetesClient>,
    aws_worker: Arc<dyn AwsWorker>,
    metrics: Arc<dyn MetricsSink>,
    resource_prefix: String,
    config_retention: usize,
    disable_win_cluster_injection: bool,
    span: Span,
}

impl EksInstanceGroupContext {
    /// Build the context for a pass.
    ///
    /// Computes the resource prefix, records `Init` as the reconcile state
    /// and stamps the provisioner name and strategy type onto the status.
    /// Fails only if the metrics sink rejects the `Init` state.
    pub fn new(input: ProvisionerInput) -> Result<Self> {
        let ProvisionerInput {
            instance_group,
            kubernetes,
            aws_worker,
            metrics,
            config,
        } = input;

        let resource_prefix = naming::resource_prefix(
            instance_group.eks_configuration().cluster_name(),
            instance_group.namespace(),
            instance_group.name(),
        );
        let span = info_span!("eks", instancegroup = %instance_group.namespaced_name());

        let ctx = Self {
            state: Mutex::new(ContextState {
                instance_group,
                discovered_state: None,
                os_family: None,
            }),
            kubernetes,
            aws_worker,
            metrics,
            resource_prefix,
            config_retention: config.config_retention,
            disable_win_cluster_injection: config.disable_win_cluster_injection,
            span,
        };

        {
            let mut guard = ctx.lock();
            guard.set_state(ReconcileState::Init)?;

            let strategy = guard.upgrade_strategy();
            let status = guard.instance_group_mut().status_mut();
            status.set_provisioner(PROVISIONER_NAME);
            status.set_strategy(&strategy.type_);
        }

        ctx.span.in_scope(|| {
            info!(
                resource_prefix = %ctx.resource_prefix,
                config_retention = ctx.config_retention,
                "created reconcile context"
            );
        });

        Ok(ctx)
    }

    /// Acquire the context lock.
    ///
    /// The lock is released when the guard drops, on every exit path.
    pub fn lock(&self) -> ContextGuard<'_> {
        ContextGuard {
            inner: self.state.lock().unwrap_or_else(PoisonError::into_inner),
            ctx: self,
        }
    }

    // =========================================================================
    // Fixed at construction
    // =========================================================================

    /// `<cluster>-<namespace>-<name>`, the root of every derived resource name.
    pub fn resource_prefix(&self) -> &str {
        &self.resource_prefix
    }

    pub fn config_retention(&self) -> usize {
        self.config_retention
    }

    pub fn disable_win_cluster_injection(&self) -> bool {
        self.disable_win_cluster_injection
    }

    pub fn kubernetes(&self) -> &Arc<dyn KubernetesClient> {
        &self.kubernetes
    }

    pub fn aws_worker(&self) -> &Arc<dyn AwsWorker> {
        &self.aws_worker
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn scaling_group_name(&self) -> &str {
        &self.resource_prefix
    }

    pub fn launch_template_name(&self) -> &str {
        &self.resource_prefix
    }

    pub fn role_name(&self) -> String {
        naming::role_name(&self.resource_prefix)
    }

    pub fn launch_configuration_name(&self, at: DateTime<Utc>) -> String {
        naming::launch_configuration_name(&self.resource_prefix, at)
    }

    // =========================================================================
    // Single-call accessors; each takes the lock for its duration
    // =========================================================================

    /// A copy of the instance group as it stands now.
    pub fn instance_group(&self) -> InstanceGroup {
        self.lock().instance_group().clone()
    }

    /// Hand the instance group back to the caller for persistence.
    pub fn into_instance_group(self) -> InstanceGroup {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .instance_group
    }

    pub fn state(&self) -> ReconcileState {
        self.lock().state()
    }

    /// Record `state` on the status, then report it to the metrics sink.
    pub fn set_state(&self, state: ReconcileState) -> Result<()> {
        self.lock().set_state(state)
    }

    /// A copy of the discovered state; the empty snapshot if none was set.
    pub fn discovered_state(&self) -> DiscoveredState {
        self.lock().discovered_state().clone()
    }

    /// Replace the discovered state wholesale.
    pub fn set_discovered_state(&self, discovered: DiscoveredState) {
        self.lock().set_discovered_state(discovered);
    }

    pub fn locked(&self) -> bool {
        self.lock().locked()
    }

    /// The configured upgrade strategy, or the all-empty one.
    pub fn upgrade_strategy(&self) -> AwsUpgradeStrategy {
        self.lock().upgrade_strategy()
    }

    /// Whether the manifest configures a strategy at all.
    pub fn upgrade_strategy_configured(&self) -> bool {
        self.lock().instance_group().upgrade_strategy().is_some()
    }

    pub fn os_family(&self) -> OsFamily {
        self.lock().os_family()
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Derive the pass's starting state from the discovered state and record it.
    ///
    /// Refuses with [`ProvisionerError::Locked`] when the group is locked.
    pub fn discover_transition(&self) -> Result<ReconcileState> {
        let mut guard = self.lock();
        guard.ensure_unlocked()?;

        let deleting = guard.instance_group().is_deleting();
        let next = guard.discovered_state().init_transition(deleting);
        guard.set_state(next)?;

        Ok(next)
    }

    /// Bootstrap parameters for the group's nodes.
    ///
    /// Cluster details and the group's instance type offering come from the
    /// discovered state; an undiscovered cluster yields empty connection
    /// parameters.
    pub fn user_data(&self) -> EksUserData {
        let mut guard = self.lock();
        let os_family = guard.os_family();
        let ContextState {
            instance_group,
            discovered_state,
            ..
        } = &*guard.inner;

        let discovered = discovered_state.as_ref();
        let fallback = ClusterInfo::default();
        let cluster = match discovered.and_then(|discovered| discovered.cluster.as_ref()) {
            Some(cluster) => cluster,
            None => {
                self.span.in_scope(|| debug!("cluster not discovered, bootstrapping without it"));
                &fallback
            }
        };
        let instance_type = discovered.and_then(|discovered| {
            discovered.instance_type_info(&instance_group.eks_configuration().instance_type)
        });

        userdata::resolve_user_data(
            instance_group,
            os_family,
            BootstrapInputs {
                cluster,
                instance_type,
                disable_win_cluster_injection: self.disable_win_cluster_injection,
            },
        )
    }

    /// Instance pool for the group's mixed instances policy.
    ///
    /// An explicit instance type list wins; otherwise a `SubFamilyFlexible`
    /// pool type derives the pool from the discovered instance type
    /// offerings. `None` when the group has no mixed instances policy or
    /// names an unknown pool type. The result is recorded on the discovered
    /// state.
    pub fn instance_pool(&self) -> Option<InstancePool> {
        let mut guard = self.lock();
        let pool = {
            let state = &*guard.inner;
            let offerings = state
                .discovered_state
                .as_ref()
                .map(|discovered| discovered.instance_types.as_slice())
                .unwrap_or_default();
            self.resolve_instance_pool(&state.instance_group, offerings)
        };

        guard.discovered_state().instance_pool = pool.clone();
        pool
    }

    fn resolve_instance_pool(
        &self,
        instance_group: &InstanceGroup,
        offerings: &[InstanceTypeInfo],
    ) -> Option<InstancePool> {
        let configuration = instance_group.eks_configuration();
        let policy = configuration.mixed_instances_policy.as_ref()?;

        let pool_type = match policy.instance_pool.as_deref() {
            Some(name) => match name.parse::<InstancePoolType>() {
                Ok(pool_type) => Some(pool_type),
                Err(err) => {
                    self.span.in_scope(|| debug!(error = %err, "ignoring instance pool"));
                    None
                }
            },
            None => None,
        };

        if !policy.instance_types.is_empty() {
            return Some(InstancePool::from_instance_types(
                pool_type.unwrap_or(InstancePoolType::SubFamilyFlexible),
                &configuration.instance_type,
                &policy.instance_types,
            ));
        }

        match pool_type? {
            InstancePoolType::SubFamilyFlexible => {
                Some(InstancePool::sub_family_flexible(offerings))
            }
        }
    }

    /// Tags for the group's scaling group.
    pub fn scaling_group_tags(&self) -> Vec<Tag> {
        let guard = self.lock();
        let instance_group = guard.instance_group();
        let annotations = GroupAnnotations::new(instance_group.annotations());
        let labels = userdata::node_labels(instance_group);

        tags::scaling_group_tags(
            instance_group,
            &self.resource_prefix,
            annotations.cluster_autoscaler_enabled(),
            &labels,
        )
    }

    /// Managed policies to attach to the node role.
    pub fn managed_policies(&self) -> Vec<&'static str> {
        let guard = self.lock();
        managed_policies(GroupAnnotations::new(guard.instance_group().annotations()).irsa_enabled())
    }

    /// Launch configurations beyond the retention limit.
    pub fn configurations_to_prune(&self) -> Vec<String> {
        let mut guard = self.lock();
        let discovered = guard.discovered_state();
        naming::configurations_to_prune(
            &discovered.launch_configurations,
            discovered.active_launch_configuration.as_deref(),
            self.config_retention,
        )
    }
}

impl fmt::Debug for EksInstanceGroupContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EksInstanceGroupContext")
            .field("resource_prefix", &self.resource_prefix)
            .field("config_retention", &self.config_retention)
            .field(
                "disable_win_cluster_injection",
                &self.disable_win_cluster_injection,
            )
            .finish_non_exhaustive()
    }
}

/// Exclusive access to a context for a critical section.
pub struct ContextGuard<'a> {
    inner: MutexGuard<'a, ContextState>,
    ctx: &'a EksInstanceGroupContext,
}

impl ContextGuard<'_> {
    pub fn instance_group(&self) -> &InstanceGroup {
        &self.inner.instance_group
    }

    pub fn instance_group_mut(&mut self) -> &mut InstanceGroup {
        self.inner.os_family = None;
        &mut self.inner.instance_group
    }

    pub fn namespaced_name(&self) -> NamespacedName {
        self.inner.instance_group.namespaced_name()
    }

    /// The discovered state, created empty on first access.
    pub fn discovered_state(&mut self) -> &mut DiscoveredState {
        self.inner.discovered_state.get_or_insert_with(DiscoveredState::default)
    }

    /// Replace the discovered state wholesale.
    pub fn set_discovered_state(&mut self, discovered: DiscoveredState) {
        self.inner.discovered_state = Some(discovered);
    }

    pub fn state(&self) -> ReconcileState {
        self.inner.instance_group.state()
    }

    /// Record `state` on the status, then report it to the metrics sink.
    ///
    /// Every call is reported, repeated states included. A sink failure is
    /// returned; the status keeps the new state.
    pub fn set_state(&mut self, state: ReconcileState) -> Result<()> {
        let name = self.namespaced_name().to_string();
        self.inner.instance_group.set_state(state);

        self.ctx.span.in_scope(|| debug!(state = %state, "set reconcile state"));
        self.ctx.metrics.record_group_state(&name, state.as_str())?;
        Ok(())
    }

    pub fn locked(&self) -> bool {
        self.inner.instance_group.locked()
    }

    /// Fail with [`ProvisionerError::Locked`] if mutations are suspended.
    pub fn ensure_unlocked(&self) -> Result<()> {
        if self.locked() {
            self.ctx
                .span
                .in_scope(|| info!("instance group is locked, skipping mutation"));
            return Err(ProvisionerError::Locked {
                group: self.namespaced_name(),
            });
        }
        Ok(())
    }

    /// The configured upgrade strategy, or the all-empty one.
    pub fn upgrade_strategy(&self) -> AwsUpgradeStrategy {
        self.inner
            .instance_group
            .upgrade_strategy()
            .cloned()
            .unwrap_or_default()
    }

    /// The group's OS family, resolved on first use in the pass.
    pub fn os_family(&mut self) -> OsFamily {
        if let Some(os_family) = self.inner.os_family {
            return os_family;
        }

        let instance_group = &self.inner.instance_group;
        let os_family = self.ctx.span.in_scope(|| {
            os_family::resolve_os_family(
                instance_group.annotations(),
                instance_group.eks_configuration().user_data(),
            )
        });
        self.inner.os_family = Some(os_family);
        os_family
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::result::Result;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use instancemgr_api::{strategy_types, InstanceTypeSpec, MixedInstancesPolicy, UserDataStage};
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;
    use crate::annotations::{
        CLUSTER_AUTOSCALER_ENABLED_ANNOTATION, IRSA_ENABLED_ANNOTATION, OS_FAMILY_ANNOTATION,
    };
    use crate::discovered::LaunchConfigurationSummary;
    use crate::error::{KubeError, MetricsError, WorkerError};
    use crate::test_support::WarnCounter;
    use crate::CNI_MANAGED_POLICY;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl MetricsSink for Recorder {
        fn record_group_state(&self, group: &str, state: &str) -> Result<(), MetricsError> {
            if self.fail {
                return Err(MetricsError::Unavailable("sink down".to_string()));
            }
            self.events
                .lock()
                .unwrap()
                .push((group.to_string(), state.to_string()));
            Ok(())
        }
    }

    struct NoWorker;

    #[async_trait]
    impl AwsWorker for NoWorker {
        async fn describe_cluster(&self, cluster_name: &str) -> Result<ClusterInfo, WorkerError> {
            Err(WorkerError::ClusterNotFound(cluster_name.to_string()))
        }

        async fn describe_instance_type_offerings(
            &self,
        ) -> Result<Vec<InstanceTypeInfo>, WorkerError> {
            Ok(Vec::new())
        }
    }

    struct NoKube;

    #[async_trait]
    impl KubernetesClient for NoKube {
        async fn cluster_dns_ip(&self) -> Result<Option<String>, KubeError> {
            Ok(None)
        }
    }

    fn group() -> InstanceGroup {
        let mut ig = InstanceGroup::new("kube-system", "workers-a");
        let configuration = ig.eks_configuration_mut();
        configuration.cluster_name = "prod".to_string();
        configuration.instance_type = "m5.large".to_string();
        ig
    }

    fn context_with(ig: InstanceGroup, metrics: Arc<Recorder>) -> EksInstanceGroupContext {
        EksInstanceGroupContext::new(ProvisionerInput {
            instance_group: ig,
            kubernetes: Arc::new(NoKube),
            aws_worker: Arc::new(NoWorker),
            metrics,
            config: ProvisionerConfig::default(),
        })
        .unwrap()
    }

    fn context(ig: InstanceGroup) -> EksInstanceGroupContext {
        context_with(ig, Arc::new(Recorder::default()))
    }

    #[test]
    fn test_new_initializes_status() {
        let metrics = Arc::new(Recorder::default());
        let ctx = context_with(group(), metrics.clone());

        assert_eq!(ctx.resource_prefix(), "prod-kube-system-workers-a");
        assert_eq!(ctx.config_retention(), 2);
        assert_eq!(ctx.state(), ReconcileState::Init);

        let ig = ctx.instance_group();
        assert_eq!(ig.status().provisioner, PROVISIONER_NAME);
        assert_eq!(ig.status().strategy, "");
        assert_eq!(
            *metrics.events.lock().unwrap(),
            vec![("kube-system/workers-a".to_string(), "Init".to_string())]
        );
    }

    #[test]
    fn test_new_records_strategy_type() {
        let mut ig = group();
        ig.spec.aws_upgrade_strategy = Some(AwsUpgradeStrategy {
            type_: strategy_types::ROLLING_UPDATE.to_string(),
            ..Default::default()
        });
        let ctx = context(ig);

        assert!(ctx.upgrade_strategy_configured());
        assert_eq!(ctx.instance_group().status().strategy, "rollingUpdate");
    }

    #[test]
    fn test_new_fails_when_sink_is_down() {
        let metrics = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let err = EksInstanceGroupContext::new(ProvisionerInput {
            instance_group: group(),
            kubernetes: Arc::new(NoKube),
            aws_worker: Arc::new(NoWorker),
            metrics,
            config: ProvisionerConfig::default(),
        })
        .unwrap_err();

        assert!(err.is_sink_unavailable());
    }

    #[test]
    fn test_unset_upgrade_strategy_is_empty() {
        let ctx = context(group());
        assert!(!ctx.upgrade_strategy_configured());
        let strategy = ctx.upgrade_strategy();
        assert_eq!(strategy.type_, "");
        assert!(strategy.is_zero());
    }

    #[test]
    fn test_set_state_reports_every_call() {
        let metrics = Arc::new(Recorder::default());
        let ctx = context_with(group(), metrics.clone());

        ctx.set_state(ReconcileState::Ready).unwrap();
        ctx.set_state(ReconcileState::Ready).unwrap();

        let states: Vec<String> = metrics
            .events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, state)| state.clone())
            .collect();
        assert_eq!(states, ["Init", "Ready", "Ready"]);
    }

    #[test]
    fn test_discovered_state_starts_empty() {
        let ctx = context(group());
        assert_eq!(ctx.discovered_state(), DiscoveredState::default());

        ctx.set_discovered_state(DiscoveredState {
            provisioned: true,
            node_count: 3,
            ..Default::default()
        });
        let discovered = ctx.discovered_state();
        assert!(discovered.provisioned);
        assert_eq!(discovered.node_count, 3);
    }

    #[test]
    fn test_guard_mutates_discovered_state_in_place() {
        let ctx = context(group());
        {
            let mut guard = ctx.lock();
            guard.discovered_state().node_count = 5;
        }
        assert_eq!(ctx.discovered_state().node_count, 5);
    }

    #[test]
    fn test_discover_transition_sets_state() {
        let ctx = context(group());
        assert_eq!(ctx.discover_transition().unwrap(), ReconcileState::InitCreate);

        ctx.set_discovered_state(DiscoveredState {
            provisioned: true,
            ..Default::default()
        });
        assert_eq!(ctx.discover_transition().unwrap(), ReconcileState::InitUpdate);
        assert_eq!(ctx.state(), ReconcileState::InitUpdate);
    }

    #[test]
    fn test_discover_transition_refuses_locked_group() {
        let mut ig = group();
        ig.spec.locked = Some(true);
        let ctx = context(ig);

        assert!(ctx.locked());
        let err = ctx.discover_transition().unwrap_err();
        assert!(err.is_locked());
        assert_eq!(ctx.state(), ReconcileState::Init);
    }

    #[test]
    fn test_derived_names_share_the_prefix() {
        let ctx = context(group());
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();

        assert_eq!(ctx.scaling_group_name(), "prod-kube-system-workers-a");
        assert_eq!(ctx.launch_template_name(), "prod-kube-system-workers-a");
        assert_eq!(
            ctx.launch_configuration_name(at),
            "prod-kube-system-workers-a-20240501123000"
        );
        assert!(ctx.role_name().starts_with("prod-kube-system-workers-a"));
    }

    #[test]
    fn test_prunes_beyond_retention() {
        let ctx = context(group());
        let configurations = (1..=4)
            .map(|i| LaunchConfigurationSummary {
                name: format!("lc-{i}"),
                created_at: Utc.with_ymd_and_hms(2024, 1, i, 0, 0, 0).unwrap(),
            })
            .collect();
        ctx.set_discovered_state(DiscoveredState {
            launch_configurations: configurations,
            active_launch_configuration: Some("lc-4".to_string()),
            ..Default::default()
        });

        assert_eq!(ctx.configurations_to_prune(), ["lc-1"]);
    }

    #[test]
    fn test_os_family_follows_node_config_stage() {
        let mut ig = group();
        ig.eks_configuration_mut().user_data = vec![UserDataStage::new(
            "cfg",
            "nodeconfigyaml",
            "apiVersion: node.eks.aws/v1alpha1",
        )];
        let ctx = context(ig);
        assert_eq!(ctx.os_family(), OsFamily::AmazonLinux2023);
    }

    #[test]
    fn test_os_family_resolved_once_per_pass() {
        let mut ig = group();
        ig.annotations_mut().insert(OS_FAMILY_ANNOTATION.to_string(), "solaris".to_string());
        let ctx = context(ig);
        let counter = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&counter)));

        tracing::subscriber::with_default(subscriber, || {
            assert_eq!(ctx.os_family(), OsFamily::AmazonLinux2);
            ctx.user_data();
        });
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_group_mutation_re_resolves_os_family() {
        let ctx = context(group());
        let mut guard = ctx.lock();
        assert_eq!(guard.os_family(), OsFamily::AmazonLinux2);

        guard
            .instance_group_mut()
            .annotations_mut()
            .insert(OS_FAMILY_ANNOTATION.to_string(), "windows".to_string());
        assert_eq!(guard.os_family(), OsFamily::Windows);
    }

    #[test]
    fn test_user_data_reads_discovered_cluster() {
        let ctx = context(group());
        ctx.set_discovered_state(DiscoveredState {
            cluster: Some(ClusterInfo {
                name: "prod".to_string(),
                endpoint: "https://prod.eks.example".to_string(),
                certificate_authority: "Y2E=".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        });

        let user_data = ctx.user_data();
        assert_eq!(user_data.cluster_name, "prod");
        assert_eq!(user_data.api_endpoint, "https://prod.eks.example");
        assert_eq!(user_data.cluster_ca, "Y2E=");
        assert!(user_data.node_config_yaml.is_none());
    }

    #[test]
    fn test_user_data_without_discovered_cluster() {
        let ctx = context(group());

        let user_data = ctx.user_data();
        assert_eq!(user_data.cluster_name, "prod");
        assert_eq!(user_data.api_endpoint, "");
        assert_eq!(user_data.cluster_ca, "");
        assert!(user_data.cluster_ip.is_none());
    }

    #[test]
    fn test_instance_pool_requires_policy() {
        let ctx = context(group());
        assert!(ctx.instance_pool().is_none());
        assert!(ctx.discovered_state().instance_pool.is_none());
    }

    #[test]
    fn test_instance_pool_prefers_explicit_types() {
        let mut ig = group();
        ig.eks_configuration_mut().mixed_instances_policy = Some(MixedInstancesPolicy {
            instance_types: vec![
                InstanceTypeSpec {
                    type_: "m5.large".to_string(),
                    weight: "1".to_string(),
                },
                InstanceTypeSpec {
                    type_: "m5a.large".to_string(),
                    weight: "2".to_string(),
                },
            ],
            ..Default::default()
        });
        let ctx = context(ig);

        let pool = ctx.instance_pool().unwrap();
        assert_eq!(ctx.discovered_state().instance_pool, Some(pool.clone()));
        let specs = pool.get_pool("m5.large").unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[1].type_, "m5a.large");
        assert_eq!(specs[1].weight, "2");
    }

    #[test]
    fn test_instance_pool_ignores_unknown_pool_type() {
        let mut ig = group();
        ig.eks_configuration_mut().mixed_instances_policy = Some(MixedInstancesPolicy {
            instance_pool: Some("Nope".to_string()),
            ..Default::default()
        });
        let ctx = context(ig);
        assert!(ctx.instance_pool().is_none());
    }

    #[test]
    fn test_annotations_drive_tags_and_policies() {
        let mut ig = group();
        let annotations: &mut BTreeMap<String, String> = ig.annotations_mut();
        annotations.insert(
            CLUSTER_AUTOSCALER_ENABLED_ANNOTATION.to_string(),
            "true".to_string(),
        );
        annotations.insert(IRSA_ENABLED_ANNOTATION.to_string(), "true".to_string());
        let ctx = context(ig);

        let tags = ctx.scaling_group_tags();
        assert!(tags
            .iter()
            .any(|tag| tag.key == "k8s.io/cluster-autoscaler/enabled" && tag.value == "true"));
        assert!(!ctx.managed_policies().contains(&CNI_MANAGED_POLICY));
    }

    #[test]
    fn test_into_instance_group_returns_final_state() {
        let ctx = context(group());
        ctx.set_state(ReconcileState::Ready).unwrap();
        let ig = ctx.into_instance_group();
        assert_eq!(ig.status().current_state(), ReconcileState::Ready);
    }
}
