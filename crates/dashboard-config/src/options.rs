use charm_error::CharmError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

fn default_port() -> u16 {
    crate::render::DEFAULT_PORT
}

fn default_analytics_enabled() -> bool {
    true
}

/// Options of the machine charm, named as in its `config.yaml`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct MachineOptions {
    /// Port nginx listens on
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_analytics_enabled")]
    pub analytics_enabled: bool,

    /// Public DNS name, used as the nginx server name
    #[serde(default)]
    pub dns_name: Option<String>,
}

/// Options of the Kubernetes charm
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct KubernetesOptions {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_analytics_enabled")]
    pub analytics_enabled: bool,
}

impl Default for MachineOptions {
    fn default() -> Self {
        Self {
            port: default_port(),
            analytics_enabled: default_analytics_enabled(),
            dns_name: None,
        }
    }
}

impl Default for KubernetesOptions {
    fn default() -> Self {
        Self {
            port: default_port(),
            analytics_enabled: default_analytics_enabled(),
        }
    }
}

impl FromStr for MachineOptions {
    type Err = CharmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_yaml_ng::from_str(s).map_err(|e| CharmError::ConfigError(e.to_string()))
    }
}

impl FromStr for KubernetesOptions {
    type Err = CharmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_yaml_ng::from_str(s).map_err(|e| CharmError::ConfigError(e.to_string()))
    }
}

impl MachineOptions {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CharmError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CharmError::ConfigError(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_str(&content)
    }
}

impl KubernetesOptions {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CharmError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CharmError::ConfigError(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_str(&content)
    }
}
