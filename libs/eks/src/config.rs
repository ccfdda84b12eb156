//! Provisioner configuration.

use crate::error::ConfigError;
use crate::DEFAULT_CONFIG_RETENTION;

/// Environment variable holding the number of launch configurations to retain.
pub const CONFIG_RETENTION_ENV: &str = "INSTANCEMGR_CONFIG_RETENTION";

/// Environment variable disabling cluster DNS injection on Windows nodes.
pub const DISABLE_WIN_CLUSTER_INJECTION_ENV: &str = "INSTANCEMGR_DISABLE_WIN_CLUSTER_INJECTION";

/// Environment variable holding the default log filter.
pub const LOG_LEVEL_ENV: &str = "INSTANCEMGR_LOG_LEVEL";

/// Controller-wide settings shared by every reconcile context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerConfig {
    /// Historical launch configurations to keep besides the active one.
    pub config_retention: usize,

    /// Skip injecting the cluster DNS IP into Windows user data.
    pub disable_win_cluster_injection: bool,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            config_retention: DEFAULT_CONFIG_RETENTION,
            disable_win_cluster_injection: false,
            log_level: "info".to_string(),
        }
    }
}

impl ProvisionerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_retention = match lookup(CONFIG_RETENTION_ENV) {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(retention) => retention,
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        name: CONFIG_RETENTION_ENV,
                        value,
                    })
                }
            },
            None => DEFAULT_CONFIG_RETENTION,
        };

        let disable_win_cluster_injection = lookup(DISABLE_WIN_CLUSTER_INJECTION_ENV)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let log_level = lookup(LOG_LEVEL_ENV).unwrap_or_else(|| "info".to_string());

        Ok(Self {
            config_retention,
            disable_win_cluster_injection,
            log_level,
        })
    }
}
