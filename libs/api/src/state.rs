//! Reconcile state of an instance group.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ApiError;

/// Where an instance group is in its reconcile lifecycle.
///
/// Serialized as the canonical status string (`Init`, `InitCreate`, ...),
/// which is also the value reported to the metrics sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReconcileState {
    /// Sentinel set when a reconcile context is constructed.
    #[default]
    Init,
    InitCreate,
    InitUpdate,
    InitUpgrade,
    InitDelete,
    ReconcileModifying,
    ReconcileModified,
    Deleting,
    Deleted,
    Ready,
    Error,
    /// The group is locked and no mutating action was taken.
    Locked,
}

impl ReconcileState {
    /// All states, in lifecycle order.
    pub const ALL: [ReconcileState; 12] = [
        Self::Init,
        Self::InitCreate,
        Self::InitUpdate,
        Self::InitUpgrade,
        Self::InitDelete,
        Self::ReconcileModifying,
        Self::ReconcileModified,
        Self::Deleting,
        Self::Deleted,
        Self::Ready,
        Self::Error,
        Self::Locked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::InitCreate => "InitCreate",
            Self::InitUpdate => "InitUpdate",
            Self::InitUpgrade => "InitUpgrade",
            Self::InitDelete => "InitDelete",
            Self::ReconcileModifying => "ReconcileModifying",
            Self::ReconcileModified => "ReconcileModified",
            Self::Deleting => "Deleting",
            Self::Deleted => "Deleted",
            Self::Ready => "Ready",
            Self::Error => "Error",
            Self::Locked => "Locked",
        }
    }

    /// Returns true for the states a pass starts from.
    pub fn is_init(&self) -> bool {
        matches!(
            self,
            Self::Init | Self::InitCreate | Self::InitUpdate | Self::InitUpgrade | Self::InitDelete
        )
    }

    /// Returns true if no further work is expected until the spec changes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Deleted | Self::Error)
    }
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReconcileState {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ApiError::UnknownState(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_init() {
        assert_eq!(ReconcileState::default(), ReconcileState::Init);
    }

    #[test]
    fn test_string_roundtrip() {
        for state in ReconcileState::ALL {
            assert_eq!(state.as_str().parse::<ReconcileState>().unwrap(), state);
        }
        assert!("ready".parse::<ReconcileState>().is_err());
    }

    #[test]
    fn test_serialization() {
        assert_eq!(
            serde_json::to_string(&ReconcileState::InitCreate).unwrap(),
            "\"InitCreate\""
        );
        assert_eq!(
            serde_json::to_string(&ReconcileState::ReconcileModified).unwrap(),
            "\"ReconcileModified\""
        );
    }

    #[test]
    fn test_classification() {
        assert!(ReconcileState::InitDelete.is_init());
        assert!(!ReconcileState::Deleting.is_init());
        assert!(ReconcileState::Ready.is_terminal());
        assert!(!ReconcileState::ReconcileModifying.is_terminal());
    }
}
