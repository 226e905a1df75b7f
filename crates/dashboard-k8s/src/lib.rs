//! Kubernetes flavour of the Juju dashboard charm.

mod charm;

pub use charm::{dashboard_layer, KubernetesCharm, CONTAINER_NAME, SERVICE_NAME};
