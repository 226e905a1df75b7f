//! Machine flavour of the Juju dashboard charm.

mod charm;

pub use charm::{MachineCharm, DEFAULT_DASHBOARD_ROOT, HTTPS_PORT};
