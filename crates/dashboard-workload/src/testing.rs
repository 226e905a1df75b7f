//! In-memory workloads for charm tests.

use crate::container::Container;
use crate::layer::Layer;
use crate::machine::MachineWorkload;
use charm_error::CharmError;
use dashboard_config::RenderedConfigFile;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Records what the machine charm asked the host to do
#[derive(Debug, Clone)]
pub struct RecordingWorkload {
    pub installed: Vec<String>,
    pub files: BTreeMap<PathBuf, String>,
    pub restarts: Vec<String>,
    pub restart_succeeds: bool,
}

impl Default for RecordingWorkload {
    fn default() -> Self {
        Self {
            installed: Vec::new(),
            files: BTreeMap::new(),
            restarts: Vec::new(),
            restart_succeeds: true,
        }
    }
}

impl RecordingWorkload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(&PathBuf::from(path)).map(String::as_str)
    }
}

impl MachineWorkload for RecordingWorkload {
    fn install_packages(&mut self, packages: &[&str]) -> Result<(), CharmError> {
        self.installed
            .extend(packages.iter().map(|p| p.to_string()));
        Ok(())
    }

    fn write_file(&mut self, file: &RenderedConfigFile) -> Result<(), CharmError> {
        self.files
            .insert(file.path().to_path_buf(), file.rendered().to_string());
        Ok(())
    }

    fn restart_service(&mut self, name: &str) -> bool {
        self.restarts.push(name.to_string());
        self.restart_succeeds
    }
}

/// A container whose pebble API is a handful of maps
#[derive(Debug, Clone)]
pub struct MemoryContainer {
    name: String,
    pub connected: bool,
    pub layers: BTreeMap<String, Layer>,
    pub plan: Layer,
    pub files: BTreeMap<String, String>,
    pub restarts: Vec<String>,
}

impl MemoryContainer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            connected: true,
            layers: BTreeMap::new(),
            plan: Layer::default(),
            files: BTreeMap::new(),
            restarts: Vec::new(),
        }
    }

    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    fn ensure_connected(&self) -> Result<(), CharmError> {
        if self.connected {
            Ok(())
        } else {
            Err(CharmError::ContainerUnreachable(self.name.clone()))
        }
    }
}

impl Container for MemoryContainer {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_connect(&self) -> bool {
        self.connected
    }

    fn add_layer(&mut self, label: &str, layer: &Layer, combine: bool) -> Result<(), CharmError> {
        self.ensure_connected()?;
        match self.layers.get_mut(label) {
            Some(existing) if combine => existing.combine(layer),
            Some(_) => {
                return Err(CharmError::WorkloadError(format!(
                    "layer {} already exists",
                    label
                )));
            }
            None => {
                self.layers.insert(label.to_string(), layer.clone());
            }
        }
        Ok(())
    }

    fn push(&mut self, path: &str, content: &str) -> Result<(), CharmError> {
        self.ensure_connected()?;
        self.files.insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn replan(&mut self) -> Result<(), CharmError> {
        self.ensure_connected()?;
        let mut plan = Layer::default();
        for layer in self.layers.values() {
            plan.combine(layer);
        }
        self.plan = plan;
        Ok(())
    }

    fn restart(&mut self, service: &str) -> Result<(), CharmError> {
        self.ensure_connected()?;
        if !self.plan.services.contains_key(service) {
            return Err(CharmError::WorkloadError(format!(
                "service {} is not in the plan",
                service
            )));
        }
        self.restarts.push(service.to_string());
        Ok(())
    }
}
