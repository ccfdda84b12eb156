//! Names of the cloud resources derived from an instance group.
//!
//! Every name is rooted at the resource prefix computed once when the
//! context is built; nothing here re-reads the group's identity.

use chrono::{DateTime, Utc};

use crate::discovered::LaunchConfigurationSummary;

/// IAM role names are limited to 64 characters.
pub const MAX_ROLE_NAME_LEN: usize = 64;

/// `<cluster>-<namespace>-<name>`.
pub fn resource_prefix(cluster_name: &str, namespace: &str, name: &str) -> String {
    format!("{cluster_name}-{namespace}-{name}")
}

/// IAM role name for the group, truncated to [`MAX_ROLE_NAME_LEN`].
pub fn role_name(prefix: &str) -> String {
    prefix.chars().take(MAX_ROLE_NAME_LEN).collect()
}

/// Timestamped launch configuration name, e.g. `prod-default-workers-20240101120000`.
pub fn launch_configuration_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}", prefix, at.format("%Y%m%d%H%M%S"))
}

/// Launch configurations to delete.
///
/// The active configuration is never pruned. Of the rest, the `retention`
/// newest are kept; the result is ordered oldest first.
pub fn configurations_to_prune(
    configurations: &[LaunchConfigurationSummary],
    active: Option<&str>,
    retention: usize,
) -> Vec<String> {
    let mut inactive: Vec<&LaunchConfigurationSummary> = configurations
        .iter()
        .filter(|config| Some(config.name.as_str()) != active)
        .collect();

    // Newest first.
    inactive.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.name.cmp(&a.name)));

    let mut prune: Vec<String> = inactive
        .into_iter()
        .skip(retention)
        .map(|config| config.name.clone())
        .collect();
    prune.reverse();
    prune
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn config(name: &str, minute: u32) -> LaunchConfigurationSummary {
        LaunchConfigurationSummary {
            name: name.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_resource_prefix() {
        assert_eq!(
            resource_prefix("prod", "kube-system", "workers-a"),
            "prod-kube-system-workers-a"
        );
    }

    #[test]
    fn test_role_name_truncated() {
        let prefix = "c".repeat(80);
        assert_eq!(role_name(&prefix).len(), MAX_ROLE_NAME_LEN);
        assert_eq!(role_name("prod-default-workers"), "prod-default-workers");
    }

    #[test]
    fn test_launch_configuration_name() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 8, 5, 1).unwrap();
        assert_eq!(
            launch_configuration_name("prod-default-workers", at),
            "prod-default-workers-20240309080501"
        );
    }

    #[test]
    fn test_prune_keeps_active_and_newest() {
        let configs = vec![
            config("lc-1", 1),
            config("lc-2", 2),
            config("lc-3", 3),
            config("lc-4", 4),
            config("lc-5", 5),
        ];
        assert_eq!(
            configurations_to_prune(&configs, Some("lc-5"), 2),
            vec!["lc-1", "lc-2"]
        );
        assert_eq!(
            configurations_to_prune(&configs, Some("lc-1"), 2),
            vec!["lc-2", "lc-3"]
        );
        assert_eq!(
            configurations_to_prune(&configs, None, 0),
            vec!["lc-1", "lc-2", "lc-3", "lc-4", "lc-5"]
        );
        assert!(configurations_to_prune(&configs, None, 10).is_empty());
    }
}
