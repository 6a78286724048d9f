pub mod content;

use crate::error::{Error, Result};
use crate::root::SystemRoot;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

/// A generated configuration file or script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: &'static str,
    pub content: String,
    pub executable: bool,
}

impl Artifact {
    pub fn new(path: &'static str, content: String) -> Self {
        Self {
            path,
            content,
            executable: false,
        }
    }

    pub fn executable(path: &'static str, content: String) -> Self {
        Self {
            path,
            content,
            executable: true,
        }
    }
}

/// Outcome of a cleanup pass. Failures are collected, never short-circuited.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub restored_xsetup: bool,
}

/// Creates and removes envycontrol's files under a [`SystemRoot`].
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: SystemRoot,
}

impl ArtifactStore {
    pub fn new(root: SystemRoot) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &SystemRoot {
        &self.root
    }

    /// Write an artifact, creating parent directories and overwriting any
    /// existing file.
    pub fn write(&self, artifact: &Artifact) -> Result<()> {
        let path = self.root.path(artifact.path);
        let write_err = |source| Error::ArtifactWrite {
            path: PathBuf::from(artifact.path),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(&path, &artifact.content).map_err(write_err)?;
        log::info!("Created file {}", artifact.path);
        log::debug!("{}", artifact.content);

        if artifact.executable {
            let mut perms = std::fs::metadata(&path).map_err(write_err)?.permissions();
            perms.set_mode(perms.mode() | 0o111);
            std::fs::set_permissions(&path, perms).map_err(write_err)?;
            log::info!("Added execution privilege to file {}", artifact.path);
        }

        Ok(())
    }

    /// Remove a file. Returns whether something was removed; a missing file
    /// is not an error.
    pub fn remove(&self, path: &str) -> Result<bool> {
        match std::fs::remove_file(self.root.path(path)) {
            Ok(()) => {
                log::info!("Removed file {}", path);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::ArtifactRemove {
                path: PathBuf::from(path),
                source: e,
            }),
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.root.exists(path)
    }

    /// Remove every managed file from any mode, then restore the sddm Xsetup
    /// backup if one exists. Safe to run any number of times.
    pub fn cleanup(&self) -> CleanupReport {
        let mut report = CleanupReport::default();

        for path in content::managed_paths() {
            match self.remove(path) {
                Ok(true) => report.removed.push(PathBuf::from(path)),
                Ok(false) => {}
                Err(e) => {
                    log::error!("{}", e);
                    report.failed.push((PathBuf::from(path), e.to_string()));
                }
            }
        }

        match self.restore_xsetup() {
            Ok(restored) => report.restored_xsetup = restored,
            Err(e) => {
                log::error!("{}", e);
                report
                    .failed
                    .push((PathBuf::from(content::SDDM_XSETUP_BACKUP_PATH), e.to_string()));
            }
        }

        report
    }

    /// Copy the current sddm Xsetup aside before it is replaced. An existing
    /// backup is never overwritten.
    pub fn backup_xsetup(&self) -> Result<bool> {
        if self.exists(content::SDDM_XSETUP_BACKUP_PATH) {
            log::warn!(
                "Keeping existing Xsetup backup at {}",
                content::SDDM_XSETUP_BACKUP_PATH
            );
            return Ok(false);
        }
        let Some(original) = self.root.read_optional(content::SDDM_XSETUP_PATH) else {
            return Ok(false);
        };
        log::info!("Creating Xsetup backup");
        self.write(&Artifact::new(content::SDDM_XSETUP_BACKUP_PATH, original))?;
        Ok(true)
    }

    /// Put a backed-up Xsetup back in place and drop the backup. The backup
    /// is kept if the restore write fails.
    fn restore_xsetup(&self) -> Result<bool> {
        let Some(backup) = self.root.read_optional(content::SDDM_XSETUP_BACKUP_PATH) else {
            return Ok(false);
        };
        log::info!("Restoring Xsetup backup");
        self.write(&Artifact::executable(content::SDDM_XSETUP_PATH, backup))?;
        self.remove(content::SDDM_XSETUP_BACKUP_PATH)?;
        Ok(true)
    }
}
