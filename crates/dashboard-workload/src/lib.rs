//! Process control for the dashboard: the host's nginx on machines, a
//! pebble-managed container on Kubernetes.

pub mod container;
pub mod layer;
pub mod machine;
pub mod testing;

pub use container::Container;
pub use layer::{Layer, LayerService, Override, Startup};
pub use machine::{MachineWorkload, SystemdWorkload};
