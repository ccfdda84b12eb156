//! OS family resolution.
//!
//! The OS family selects the bootstrap contract the node user data must
//! follow. Precedence, first match wins:
//!
//! 1. a `NodeConfigYaml` user-data stage (any case) selects `amazonlinux2023`
//! 2. an allow-listed `os-family` annotation value (any case) selects that family
//! 3. an unsupported annotation value is reported and ignored
//! 4. otherwise `amazonlinux2`

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use instancemgr_api::{stages, UserDataStage};

use crate::annotations::{GroupAnnotations, OS_FAMILY_ANNOTATION};

/// Worker node operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Windows,
    Bottlerocket,
    #[default]
    #[serde(rename = "amazonlinux2")]
    AmazonLinux2,
    #[serde(rename = "amazonlinux2023")]
    AmazonLinux2023,
}

/// Families accepted in the `os-family` annotation.
pub const ALLOWED_OS_FAMILIES: [OsFamily; 4] = [
    OsFamily::Windows,
    OsFamily::Bottlerocket,
    OsFamily::AmazonLinux2,
    OsFamily::AmazonLinux2023,
];

/// How bootstrap parameters reach the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapContract {
    /// Pre/post bootstrap commands around a bootstrap script with kubelet arguments.
    Script,
    /// A single rendered node configuration document.
    NodeConfig,
}

impl OsFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Bottlerocket => "bottlerocket",
            Self::AmazonLinux2 => "amazonlinux2",
            Self::AmazonLinux2023 => "amazonlinux2023",
        }
    }

    pub fn bootstrap_contract(&self) -> BootstrapContract {
        match self {
            Self::AmazonLinux2023 => BootstrapContract::NodeConfig,
            Self::Windows | Self::Bottlerocket | Self::AmazonLinux2 => BootstrapContract::Script,
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Self::Windows)
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a value outside [`ALLOWED_OS_FAMILIES`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported os family: {0}")]
pub struct UnsupportedOsFamily(pub String);

impl FromStr for OsFamily {
    type Err = UnsupportedOsFamily;

    /// Case-insensitive parse against the allow-list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALLOWED_OS_FAMILIES
            .into_iter()
            .find(|family| family.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnsupportedOsFamily(s.to_string()))
    }
}

/// Outcome of OS family resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsFamilyResolution {
    pub family: OsFamily,
    /// The rejected annotation value, when one was ignored.
    pub unsupported: Option<String>,
}

/// Returns true if any stage is a `NodeConfigYaml` stage.
pub fn has_node_config_stage(user_data: &[UserDataStage]) -> bool {
    user_data
        .iter()
        .any(|stage| stage.is_stage(stages::NODE_CONFIG_YAML))
}

/// Resolve the OS family without side effects.
pub fn resolve(
    annotations: &BTreeMap<String, String>,
    user_data: &[UserDataStage],
) -> OsFamilyResolution {
    if has_node_config_stage(user_data) {
        return OsFamilyResolution {
            family: OsFamily::AmazonLinux2023,
            unsupported: None,
        };
    }

    match GroupAnnotations::new(annotations).os_family() {
        Some(value) => match value.parse() {
            Ok(family) => OsFamilyResolution {
                family,
                unsupported: None,
            },
            Err(UnsupportedOsFamily(value)) => OsFamilyResolution {
                family: OsFamily::default(),
                unsupported: Some(value),
            },
        },
        None => OsFamilyResolution {
            family: OsFamily::default(),
            unsupported: None,
        },
    }
}

/// Resolve the OS family, logging a warning for an unsupported annotation value.
pub fn resolve_os_family(
    annotations: &BTreeMap<String, String>,
    user_data: &[UserDataStage],
) -> OsFamily {
    let resolution = resolve(annotations, user_data);

    if let Some(value) = &resolution.unsupported {
        let allowed: Vec<&str> = ALLOWED_OS_FAMILIES.iter().map(OsFamily::as_str).collect();
        warn!(
            annotation = OS_FAMILY_ANNOTATION,
            value = %value,
            allowed = ?allowed,
            default = %resolution.family,
            "unsupported os family annotation value, using default"
        );
    } else {
        debug!(os_family = %resolution.family, "resolved os family");
    }

    resolution.family
}
