use charm_error::CharmError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Override {
    #[default]
    Replace,
    Merge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Startup {
    #[default]
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayerService {
    #[serde(rename = "override")]
    pub override_: Override,
    #[serde(default)]
    pub summary: String,
    pub command: String,
    #[serde(default)]
    pub startup: Startup,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

/// A pebble configuration layer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Layer {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub services: BTreeMap<String, LayerService>,
}

impl Layer {
    /// Fold `other` into this layer. Replaced services are taken whole,
    /// merged ones only override what they set.
    pub fn combine(&mut self, other: &Layer) {
        if !other.summary.is_empty() {
            self.summary = other.summary.clone();
        }
        if !other.description.is_empty() {
            self.description = other.description.clone();
        }
        for (name, service) in &other.services {
            match (service.override_, self.services.get_mut(name)) {
                (Override::Merge, Some(existing)) => {
                    if !service.summary.is_empty() {
                        existing.summary = service.summary.clone();
                    }
                    if !service.command.is_empty() {
                        existing.command = service.command.clone();
                    }
                    existing.startup = service.startup;
                    existing.environment.extend(service.environment.clone());
                }
                _ => {
                    self.services.insert(name.clone(), service.clone());
                }
            }
        }
    }

    pub fn to_yaml(&self) -> Result<String, CharmError> {
        serde_yaml_ng::to_string(self).map_err(|e| CharmError::WorkloadError(e.to_string()))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, CharmError> {
        serde_yaml_ng::from_str(yaml).map_err(|e| CharmError::ConfigError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(command: &str, override_: Override) -> LayerService {
        LayerService {
            override_,
            summary: "dashboard".to_string(),
            command: command.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn layer_yaml_uses_pebble_field_names() {
        let mut layer = Layer {
            summary: "dashboard layer".to_string(),
            ..Default::default()
        };
        layer
            .services
            .insert("dashboard".to_string(), service("/srv/entrypoint", Override::Replace));

        let yaml = layer.to_yaml().unwrap();
        assert!(yaml.contains("override: replace"));
        assert!(yaml.contains("startup: enabled"));
        assert!(yaml.contains("command: /srv/entrypoint"));
        assert_eq!(Layer::from_yaml(&yaml).unwrap(), layer);
    }

    #[test]
    fn combine_replaces_or_merges_services() {
        let mut base = Layer::default();
        let mut first = service("/srv/old", Override::Replace);
        first.environment.insert("A".to_string(), "1".to_string());
        base.services.insert("dashboard".to_string(), first);

        let mut merge = Layer::default();
        let mut patch = service("", Override::Merge);
        patch.environment.insert("B".to_string(), "2".to_string());
        merge.services.insert("dashboard".to_string(), patch);
        base.combine(&merge);

        let merged = &base.services["dashboard"];
        assert_eq!(merged.command, "/srv/old");
        assert_eq!(merged.environment.len(), 2);

        let mut replace = Layer::default();
        replace
            .services
            .insert("dashboard".to_string(), service("/srv/entrypoint", Override::Replace));
        base.combine(&replace);
        let replaced = &base.services["dashboard"];
        assert_eq!(replaced.command, "/srv/entrypoint");
        assert!(replaced.environment.is_empty());
    }
}
