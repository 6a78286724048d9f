use std::path::{Path, PathBuf};

/// Abstraction over the filesystem root that configuration lives under.
/// Defaults to `/` in production, redirectable to a temp directory for testing.
#[derive(Debug, Clone)]
pub struct SystemRoot {
    root: PathBuf,
}

impl Default for SystemRoot {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
        }
    }
}

impl SystemRoot {
    /// Create a SystemRoot pointing at the real system.
    pub fn system() -> Self {
        Self::default()
    }

    /// Create a SystemRoot pointing at a custom directory (for testing).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a path against this root. Absolute paths are re-anchored, so
    /// `path("/etc/X11/xorg.conf")` -> `/etc/X11/xorg.conf` or `<test_root>/etc/X11/xorg.conf`
    pub fn path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        let relative = path.strip_prefix("/").unwrap_or(path);
        self.root.join(relative)
    }

    /// Read a file, returning None if it doesn't exist or can't be read.
    pub fn read_optional(&self, path: impl AsRef<Path>) -> Option<String> {
        std::fs::read_to_string(self.path(path)).ok()
    }

    /// Check if a path exists relative to this root.
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.path(path).exists()
    }

    /// True if any of the given paths exist.
    pub fn any_exists(&self, paths: &[&str]) -> bool {
        paths.iter().any(|p| self.exists(p))
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_absolute_paths_are_reanchored() {
        let tmp = tempfile::tempdir().unwrap();
        let root = SystemRoot::new(tmp.path());

        assert_eq!(
            root.path("/etc/X11/xorg.conf"),
            tmp.path().join("etc/X11/xorg.conf")
        );
        assert_eq!(
            root.path("etc/modprobe.d"),
            tmp.path().join("etc/modprobe.d")
        );
    }

    #[test]
    fn test_system_root_is_identity() {
        let root = SystemRoot::system();
        assert_eq!(
            root.path("/etc/modprobe.d/nvidia.conf"),
            PathBuf::from("/etc/modprobe.d/nvidia.conf")
        );
    }

    #[test]
    fn test_read_optional_and_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let root = SystemRoot::new(tmp.path());

        fs::create_dir_all(tmp.path().join("etc")).unwrap();
        fs::write(tmp.path().join("etc/debian_version"), "12.5\n").unwrap();

        assert!(root.exists("/etc/debian_version"));
        assert_eq!(
            root.read_optional("/etc/debian_version").as_deref(),
            Some("12.5\n")
        );
        assert_eq!(root.read_optional("/etc/redhat-release"), None);
        assert!(root.any_exists(&["/ostree", "/etc/debian_version"]));
        assert!(!root.any_exists(&["/ostree", "/sysroot/ostree"]));
    }
}
