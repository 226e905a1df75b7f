use charm_error::CharmError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A rendered artifact and where it goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedConfigFile {
    path: PathBuf,
    rendered: String,
}

impl RenderedConfigFile {
    pub fn new(path: impl AsRef<Path>, rendered: String) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            rendered,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    /// Write next to the target, then rename over it
    pub fn write_to_disk(&self) -> Result<(), CharmError> {
        let write_error = |path: &Path, e: std::io::Error| CharmError::WriteError {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        if let Some(dirname) = self.path.parent() {
            fs::create_dir_all(dirname).map_err(|e| write_error(dirname, e))?;
        }

        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| CharmError::WriteError {
                path: self.path.display().to_string(),
                reason: "not a file path".to_string(),
            })?
            .to_string_lossy();
        let staging = self.path.with_file_name(format!(".{}.tmp", file_name));

        trace!("staging {:?}", staging);
        fs::write(&staging, self.rendered.as_bytes()).map_err(|e| write_error(&staging, e))?;
        fs::rename(&staging, &self.path).map_err(|e| {
            let _ = fs::remove_file(&staging);
            write_error(&self.path, e)
        })
    }
}

pub fn write_config_files(rendered: &[RenderedConfigFile]) -> Result<(), CharmError> {
    for file in rendered {
        debug!("Writing {:?}", file.path());
        file.write_to_disk()?;
    }
    Ok(())
}
