use crate::layer::Layer;
use charm_error::CharmError;

/// A workload container driven through a pebble-style service manager
pub trait Container {
    fn name(&self) -> &str;

    fn can_connect(&self) -> bool;

    /// Add a layer under `label`; with `combine` an existing layer of the
    /// same label is merged instead of rejected
    fn add_layer(&mut self, label: &str, layer: &Layer, combine: bool) -> Result<(), CharmError>;

    fn push(&mut self, path: &str, content: &str) -> Result<(), CharmError>;

    /// Apply the combined plan, starting services that should be running
    fn replan(&mut self) -> Result<(), CharmError>;

    fn restart(&mut self, service: &str) -> Result<(), CharmError>;
}
