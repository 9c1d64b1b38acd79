use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use mctl_model::ProcessDescriptor;

use crate::{error::ExecError, render::render_config};

/// Writes and removes per-process supervisor entries as `<dir>/<prefix>-<entry>.cfg`.
#[derive(Debug, Clone)]
pub struct ConfigWriter {
    dir: PathBuf,
    prefix: String,
}

impl ConfigWriter {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the entry file for watch `entry`.
    pub fn path_for(&self, entry: &str) -> PathBuf {
        self.dir.join(format!("{}-{}.cfg", self.prefix, entry))
    }

    /// Render `descriptor` and replace its entry file.
    ///
    /// The file is written next to its final location and renamed into place,
    /// so the supervisor never reads a partial entry.
    pub fn write(&self, descriptor: &ProcessDescriptor) -> Result<PathBuf, ExecError> {
        let rendered = render_config(descriptor)?;
        let path = self.path_for(&descriptor.full_name());
        let staging = path.with_extension("cfg.tmp");

        fs::create_dir_all(&self.dir)?;
        fs::write(&staging, rendered)?;
        fs::rename(&staging, &path)?;

        info!(path = %path.display(), watch = %descriptor.full_name(), "wrote supervisor entry");
        Ok(path)
    }

    /// Delete the entry file for watch `entry`; a missing file is only logged.
    pub fn remove(&self, entry: &str) -> Result<(), ExecError> {
        let path = self.path_for(entry);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "removed supervisor entry");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "supervisor entry already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
