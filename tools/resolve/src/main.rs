//! instancemgr-resolve
//!
//! Runs one offline reconcile pass over an instance group manifest and prints
//! what the EKS provisioner would derive from it: resource names, OS family,
//! bootstrap parameters, scaling group tags and the instance pool. Cluster
//! details come from the command line instead of the AWS and Kubernetes APIs.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use instancemgr_eks::config::LOG_LEVEL_ENV;
use instancemgr_eks::{
    DiscoveredState, EksInstanceGroupContext, MetricsCollector, ProvisionerConfig,
    ProvisionerInput,
};

mod args;
mod manifest;
mod offline;
mod report;

use args::Args;
use offline::{OfflineAwsWorker, OfflineKubernetes};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ProvisionerConfig::from_env().context("invalid provisioner configuration")?;

    // Logs go to stderr so stdout stays machine readable
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let instance_group = manifest::load(&args.manifest)?;
    let offerings = match &args.offerings {
        Some(path) => manifest::load_offerings(path)?,
        None => Vec::new(),
    };
    info!(
        instancegroup = %instance_group.namespaced_name(),
        offerings = offerings.len(),
        "Manifest loaded"
    );

    let metrics = Arc::new(MetricsCollector::new());
    let aws_worker = OfflineAwsWorker::new(args.cluster_info(&instance_group), offerings);
    let kubernetes = OfflineKubernetes::new(args.dns_ip.clone());

    let ctx = EksInstanceGroupContext::new(ProvisionerInput {
        instance_group,
        kubernetes: Arc::new(kubernetes),
        aws_worker: Arc::new(aws_worker),
        metrics: metrics.clone(),
        config,
    })?;

    let cluster_name = ctx.instance_group().eks_configuration().cluster_name.clone();
    let mut cluster = ctx.aws_worker().describe_cluster(&cluster_name).await?;
    cluster.dns_cluster_ip = ctx.kubernetes().cluster_dns_ip().await?;
    let instance_types = ctx.aws_worker().describe_instance_type_offerings().await?;

    ctx.set_discovered_state(DiscoveredState {
        cluster: Some(cluster),
        instance_types,
        ..Default::default()
    });

    match ctx.discover_transition() {
        Ok(state) => info!(state = %state, "Discovered starting state"),
        Err(err) if err.is_locked() => info!("Instance group is locked, resolving read-only"),
        Err(err) => return Err(err.into()),
    }

    let report = report::Report::resolve(&ctx, args.timestamp());
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("failed to serialize report")?;
    println!("{rendered}");

    if args.metrics {
        print!("{}", metrics.render_prometheus());
    }

    Ok(())
}
