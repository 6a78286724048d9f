use crate::artifact::content;
use crate::root::SystemRoot;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

/// Graphics mode of the machine. Never stored; always derived from which
/// managed files are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GraphicsMode {
    /// Only the iGPU; the Nvidia GPU is blacklisted and removed from the bus.
    Integrated,
    /// Nvidia Optimus: both GPUs available, Nvidia used on demand.
    Hybrid,
    /// Nvidia GPU drives the display; iGPU inactive.
    Nvidia,
}

impl fmt::Display for GraphicsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsMode::Integrated => write!(f, "integrated"),
            GraphicsMode::Hybrid => write!(f, "hybrid"),
            GraphicsMode::Nvidia => write!(f, "nvidia"),
        }
    }
}

/// Presence of the files that identify a mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeMarkers {
    pub blacklist: bool,
    pub udev_integrated: bool,
    pub xorg: bool,
    pub modeset: bool,
}

impl ModeMarkers {
    pub fn read(root: &SystemRoot) -> Self {
        Self {
            blacklist: root.exists(content::BLACKLIST_PATH),
            udev_integrated: root.exists(content::UDEV_INTEGRATED_PATH),
            xorg: root.exists(content::XORG_PATH),
            modeset: root.exists(content::MODESET_PATH),
        }
    }

    /// Integrated wins over Nvidia; anything else, including partial or
    /// mixed leftovers, is hybrid.
    pub fn infer(&self) -> GraphicsMode {
        if self.blacklist && self.udev_integrated {
            GraphicsMode::Integrated
        } else if self.xorg && self.modeset {
            GraphicsMode::Nvidia
        } else {
            GraphicsMode::Hybrid
        }
    }
}

pub fn current_mode(root: &SystemRoot) -> GraphicsMode {
    ModeMarkers::read(root).infer()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_infer_defaults_to_hybrid() {
        assert_eq!(ModeMarkers::default().infer(), GraphicsMode::Hybrid);
        let modeset_only = ModeMarkers {
            modeset: true,
            ..Default::default()
        };
        assert_eq!(modeset_only.infer(), GraphicsMode::Hybrid);
        let blacklist_only = ModeMarkers {
            blacklist: true,
            ..Default::default()
        };
        assert_eq!(blacklist_only.infer(), GraphicsMode::Hybrid);
    }

    #[test]
    fn test_infer_integrated_and_nvidia() {
        let integrated = ModeMarkers {
            blacklist: true,
            udev_integrated: true,
            ..Default::default()
        };
        assert_eq!(integrated.infer(), GraphicsMode::Integrated);

        let nvidia = ModeMarkers {
            xorg: true,
            modeset: true,
            ..Default::default()
        };
        assert_eq!(nvidia.infer(), GraphicsMode::Nvidia);
    }

    #[test]
    fn test_infer_mixed_state_prefers_integrated() {
        let mixed = ModeMarkers {
            blacklist: true,
            udev_integrated: true,
            xorg: true,
            modeset: true,
        };
        assert_eq!(mixed.infer(), GraphicsMode::Integrated);
    }

    #[test]
    fn test_current_mode_reads_filesystem() {
        let tmp = TempDir::new().unwrap();
        let root = SystemRoot::new(tmp.path());
        assert_eq!(current_mode(&root), GraphicsMode::Hybrid);

        fs::create_dir_all(tmp.path().join("etc/X11")).unwrap();
        fs::create_dir_all(tmp.path().join("etc/modprobe.d")).unwrap();
        fs::write(tmp.path().join("etc/X11/xorg.conf"), "").unwrap();
        fs::write(tmp.path().join("etc/modprobe.d/nvidia.conf"), "").unwrap();
        assert_eq!(current_mode(&root), GraphicsMode::Nvidia);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(GraphicsMode::Integrated.to_string(), "integrated");
        assert_eq!(GraphicsMode::Hybrid.to_string(), "hybrid");
        assert_eq!(GraphicsMode::Nvidia.to_string(), "nvidia");
    }
}
