//! Test support for instance manager crates.
//!
//! Mock collaborators for [`EksInstanceGroupContext`] and builders for
//! instance group fixtures.
//!
//! [`EksInstanceGroupContext`]: instancemgr_eks::EksInstanceGroupContext

pub mod fixtures;
pub mod mocks;

pub use fixtures::{cluster_info, offering, InstanceGroupBuilder};
pub use mocks::{context, metrics_key, MockAwsWorker, MockKubernetes, MockMetrics};
