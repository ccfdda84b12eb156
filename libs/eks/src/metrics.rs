//! Instance group state metrics.
//!
//! The context reports every state transition to a [`MetricsSink`].
//! [`MetricsCollector`] is the in-process sink: one gauge per group holding
//! its current state, rendered in Prometheus text exposition format.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use instancemgr_api::ReconcileState;

use crate::error::MetricsError;

/// Gauge name for instance group state.
pub const INSTANCE_GROUP_STATUS_METRIC: &str = "instance_manager_instance_group_status";

/// Receiver of instance group state transitions.
pub trait MetricsSink: Send + Sync {
    /// Record `state` as the current state of `group` (`namespace/name`).
    fn record_group_state(&self, group: &str, state: &str) -> Result<(), MetricsError>;
}

/// In-memory state gauge per instance group.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    groups: Mutex<BTreeMap<String, String>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of every group seen so far.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stop reporting a group, e.g. after it was deleted.
    pub fn remove(&self, group: &str) {
        self.groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(group);
    }

    /// Render the gauge in Prometheus text format.
    ///
    /// Each group reports `1` for its current state and `0` for all others.
    pub fn render_prometheus(&self) -> String {
        let groups = self.snapshot();
        let mut out = String::new();

        out.push_str(&format!(
            "# HELP {INSTANCE_GROUP_STATUS_METRIC} Current reconcile state of an instance group.\n"
        ));
        out.push_str(&format!("# TYPE {INSTANCE_GROUP_STATUS_METRIC} gauge\n"));
        for (group, current) in &groups {
            for state in ReconcileState::ALL {
                let value = u8::from(state.as_str() == current);
                out.push_str(&format!(
                    "{INSTANCE_GROUP_STATUS_METRIC}{{instancegroup=\"{group}\",state=\"{state}\"}} {value}\n"
                ));
            }
        }

        out
    }
}

impl MetricsSink for MetricsCollector {
    fn record_group_state(&self, group: &str, state: &str) -> Result<(), MetricsError> {
        self.groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(group.to_string(), state.to_string());
        Ok(())
    }
}
