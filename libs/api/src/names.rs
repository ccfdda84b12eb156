//! Namespaced identity of an instance group.

use std::fmt;
use std::str::FromStr;

use crate::ApiError;

/// Namespace used when the resource carries none.
pub const DEFAULT_NAMESPACE: &str = "default";

/// The `namespace/name` identity of a namespaced Kubernetes object.
///
/// This is the key under which group state is reported to metrics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NamespacedName {
    pub namespace: String,
    pub name: String,
}

impl NamespacedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for NamespacedName {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((namespace, name)) = s.split_once('/') else {
            return Err(ApiError::InvalidNamespacedName(s.to_string()));
        };
        if namespace.is_empty() || name.is_empty() || name.contains('/') {
            return Err(ApiError::InvalidNamespacedName(s.to_string()));
        }
        Ok(Self::new(namespace, name))
    }
}
