use charm_error::CharmError;
use dashboard_config::RenderedConfigFile;
use service_manager::{
    native_service_manager, ServiceLabel, ServiceManager, ServiceStartCtx, ServiceStopCtx,
};
use std::process::Command;
use tracing::{error, info};

/// What the machine charm needs from the host
pub trait MachineWorkload {
    fn install_packages(&mut self, packages: &[&str]) -> Result<(), CharmError>;

    fn write_file(&mut self, file: &RenderedConfigFile) -> Result<(), CharmError>;

    /// True when the service came back up
    fn restart_service(&mut self, name: &str) -> bool;
}

/// The real host: apt for packages, the native service manager for restarts
#[derive(Debug, Default)]
pub struct SystemdWorkload;

impl SystemdWorkload {
    pub fn new() -> Self {
        Self
    }

    fn restart(name: &str) -> Result<(), CharmError> {
        let manager: Box<dyn ServiceManager> =
            native_service_manager().map_err(|e| CharmError::WorkloadError(e.to_string()))?;
        let label = name
            .parse::<ServiceLabel>()
            .map_err(|e| CharmError::WorkloadError(e.to_string()))?;

        // a stopped service is fine here, start brings it back
        if let Err(e) = manager.stop(ServiceStopCtx {
            label: label.clone(),
        }) {
            info!("Stopping {} failed, starting anyway: {}", name, e);
        }
        manager
            .start(ServiceStartCtx { label })
            .map_err(|e| CharmError::WorkloadError(format!("Failed to start {}: {}", name, e)))
    }
}

impl MachineWorkload for SystemdWorkload {
    fn install_packages(&mut self, packages: &[&str]) -> Result<(), CharmError> {
        info!("Installing {}", packages.join(" "));
        let output = Command::new("apt-get")
            .args(["install", "-y"])
            .args(packages)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .output()
            .map_err(|e| CharmError::WorkloadError(e.to_string()))?;

        if !output.status.success() {
            error!("apt-get failed: {}", String::from_utf8_lossy(&output.stderr));
            return Err(CharmError::WorkloadError(format!(
                "Failed to install {}: {}",
                packages.join(" "),
                output.status
            )));
        }
        Ok(())
    }

    fn write_file(&mut self, file: &RenderedConfigFile) -> Result<(), CharmError> {
        file.write_to_disk()
    }

    fn restart_service(&mut self, name: &str) -> bool {
        match Self::restart(name) {
            Ok(()) => {
                info!("Restarted {}", name);
                true
            }
            Err(e) => {
                error!("Failed to restart {}: {}", name, e);
                false
            }
        }
    }
}
