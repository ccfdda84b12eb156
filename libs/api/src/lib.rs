//! # instancemgr-api
//!
//! The `InstanceGroup` custom resource as seen by the EKS provisioner.
//!
//! ## Design Principles
//!
//! - The resource is schema-validated upstream; this crate only models it
//! - Absent fields read as their zero value, never as an error
//! - Status is written only through the provisioner's reconcile context
//!
//! ## Resource Shape
//!
//! - `metadata`: standard Kubernetes object metadata (name, namespace, annotations)
//! - `spec`: desired state (cluster name, bootstrap stages, upgrade strategy, lock flag)
//! - `status`: observed state (provisioner, strategy type, reconcile state)

mod error;
mod names;
mod state;
mod strategy;
mod types;

pub use error::ApiError;
pub use names::{NamespacedName, DEFAULT_NAMESPACE};
pub use state::ReconcileState;
pub use strategy::*;
pub use types::*;

/// Re-export of the Kubernetes API types used in the resource model.
pub use k8s_openapi;
