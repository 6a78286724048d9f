pub mod services;

use crate::artifact::{Artifact, ArtifactStore, CleanupReport, content};
use crate::cache::{BusResolver, CacheStore};
use crate::command::CommandRunner;
use crate::detect::Prober;
use crate::detect::display_manager::DisplayManager;
use crate::error::{Error, Result};
use crate::initramfs::{self, RebuildOutcome};
use crate::mode::GraphicsMode;
use crate::root::SystemRoot;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coolbits value used when `--coolbits` is given without a value.
pub const DEFAULT_COOLBITS: u32 = 28;

/// PCI-Express Runtime D3 power management level (0-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rtd3Level(u8);

impl Rtd3Level {
    pub const DEFAULT: Rtd3Level = Rtd3Level(2);

    pub fn new(level: u8) -> Result<Self> {
        if level > 3 {
            return Err(Error::Parse {
                input: level.to_string(),
                detail: "RTD3 level must be 0, 1, 2 or 3".to_string(),
            });
        }
        Ok(Self(level))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rtd3Level {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

impl From<Rtd3Level> for u8 {
    fn from(level: Rtd3Level) -> Self {
        level.0
    }
}

impl fmt::Display for Rtd3Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Modifiers for a mode switch. Each only affects the mode named.
#[derive(Debug, Clone, Default)]
pub struct SwitchOptions {
    /// nvidia: skip detection and use this display manager.
    pub display_manager: Option<DisplayManager>,
    /// nvidia: enable ForceCompositionPipeline.
    pub force_comp: bool,
    /// nvidia: Coolbits value.
    pub coolbits: Option<u32>,
    /// hybrid: RTD3 power management level.
    pub rtd3: Option<Rtd3Level>,
    /// Use the `nvidia-current` module names (Debian packaging).
    pub use_nvidia_current: bool,
}

/// What a switch did. Per-file failures are recorded, not raised.
#[derive(Debug)]
pub struct SwitchReport {
    pub mode: GraphicsMode,
    pub cleanup: CleanupReport,
    pub written: Vec<&'static str>,
    pub failed: Vec<(&'static str, String)>,
    /// Files the target mode needs but that could not be generated.
    pub skipped: Vec<(&'static str, String)>,
    pub service_toggled: bool,
    pub initramfs: RebuildOutcome,
}

impl SwitchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty() && self.cleanup.failed.is_empty()
    }
}

/// Outcome of a full reset.
#[derive(Debug)]
pub struct ResetReport {
    pub cleanup: CleanupReport,
    pub cache_deleted: bool,
    pub initramfs: RebuildOutcome,
}

/// Switches between graphics modes: cleanup, then build the target mode.
pub struct ModeController<'a> {
    store: ArtifactStore,
    runner: &'a dyn CommandRunner,
}

impl<'a> ModeController<'a> {
    pub fn new(root: SystemRoot, runner: &'a dyn CommandRunner) -> Self {
        Self {
            store: ArtifactStore::new(root),
            runner,
        }
    }

    fn root(&self) -> &SystemRoot {
        self.store.root()
    }

    fn prober(&self) -> Prober<'_> {
        Prober::new(self.root(), self.runner)
    }

    /// Switch to `target` from whatever is on disk now. Every switch is
    /// cleanup followed by construction, so any mode can follow any other.
    pub fn switch(
        &self,
        target: GraphicsMode,
        opts: &SwitchOptions,
        resolver: &BusResolver,
    ) -> Result<SwitchReport> {
        println!("Switching to {} mode", target.to_string().bold());

        let mut backup_xsetup = false;
        let mut skipped = Vec::new();
        let artifacts = match target {
            GraphicsMode::Integrated => integrated_artifacts(),
            GraphicsMode::Hybrid => {
                println!(
                    "Enable PCI-Express Runtime D3 (RTD3) Power Management: {}",
                    opts.rtd3
                        .map(|l| l.to_string())
                        .unwrap_or_else(|| "false".to_string())
                );
                hybrid_artifacts(opts)
            }
            GraphicsMode::Nvidia => {
                println!("Enable ForceCompositionPipeline: {}", opts.force_comp);
                println!(
                    "Enable Coolbits: {}",
                    opts.coolbits
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "false".to_string())
                );
                // Resolved before cleanup so a missing bus ID leaves the
                // current mode untouched.
                let plan = self.nvidia_artifacts(opts, resolver)?;
                backup_xsetup = plan.backup_xsetup;
                skipped = plan.skipped;
                plan.artifacts
            }
        };

        let cleanup = self.store.cleanup();

        let service_toggled =
            services::toggle_persistenced(self.runner, target != GraphicsMode::Integrated);

        if backup_xsetup {
            if let Err(e) = self.store.backup_xsetup() {
                log::error!("{}", e);
            }
        }

        let mut written = Vec::new();
        let mut failed = Vec::new();
        for artifact in &artifacts {
            match self.store.write(artifact) {
                Ok(()) => written.push(artifact.path),
                Err(e) => {
                    log::error!("{}", e);
                    failed.push((artifact.path, e.to_string()));
                }
            }
        }

        let initramfs = initramfs::rebuild(self.root(), self.runner);

        Ok(SwitchReport {
            mode: target,
            cleanup,
            written,
            failed,
            skipped,
            service_toggled,
            initramfs,
        })
    }

    fn nvidia_artifacts(&self, opts: &SwitchOptions, resolver: &BusResolver) -> Result<NvidiaPlan> {
        let prober = self.prober();
        let bus = resolver.resolve(&prober)?;
        let vendor = prober.igpu_vendor();

        let mut artifacts = Vec::new();
        let mut skipped = Vec::new();
        match vendor {
            Some(vendor) => artifacts.push(Artifact::new(
                content::XORG_PATH,
                content::xorg(vendor, &bus),
            )),
            None => {
                log::error!("Unknown iGPU vendor, not writing {}", content::XORG_PATH);
                skipped.push((
                    content::XORG_PATH,
                    "could not identify an Intel or AMD iGPU".to_string(),
                ));
            }
        }

        artifacts.push(Artifact::new(
            content::MODESET_PATH,
            content::modeset(opts.use_nvidia_current, None),
        ));

        if let Some(extra) = content::extra_xorg(opts.force_comp, opts.coolbits) {
            artifacts.push(Artifact::new(content::EXTRA_XORG_PATH, extra));
        }

        let display_manager = opts.display_manager.or_else(|| prober.display_manager());
        let mut backup_xsetup = false;
        match display_manager {
            Some(DisplayManager::Sddm) => {
                backup_xsetup = true;
                let script = content::xrandr_script(&prober.igpu_provider_name(vendor));
                artifacts.push(Artifact::executable(content::SDDM_XSETUP_PATH, script));
            }
            Some(DisplayManager::Lightdm) => {
                let script = content::xrandr_script(&prober.igpu_provider_name(vendor));
                artifacts.push(Artifact::executable(content::LIGHTDM_SCRIPT_PATH, script));
                artifacts.push(Artifact::new(
                    content::LIGHTDM_CONFIG_PATH,
                    content::lightdm_config(),
                ));
            }
            _ => {}
        }

        Ok(NvidiaPlan {
            artifacts,
            skipped,
            backup_xsetup,
        })
    }

    /// Undo everything: managed files, the cache, and the boot image.
    pub fn reset(&self, cache: &CacheStore) -> ResetReport {
        let cleanup = self.store.cleanup();
        let cache_deleted = match cache.delete() {
            Ok(deleted) => deleted,
            Err(e) => {
                log::error!("{}", e);
                false
            }
        };
        let initramfs = initramfs::rebuild(self.root(), self.runner);

        ResetReport {
            cleanup,
            cache_deleted,
            initramfs,
        }
    }

    /// Put back the stock sddm Xsetup script.
    pub fn reset_sddm(&self) -> Result<()> {
        self.store.write(&Artifact::executable(
            content::SDDM_XSETUP_PATH,
            content::sddm_xsetup_default(),
        ))
    }
}

struct NvidiaPlan {
    artifacts: Vec<Artifact>,
    skipped: Vec<(&'static str, String)>,
    backup_xsetup: bool,
}

fn integrated_artifacts() -> Vec<Artifact> {
    vec![
        Artifact::new(content::BLACKLIST_PATH, content::blacklist()),
        Artifact::new(content::UDEV_INTEGRATED_PATH, content::udev_integrated()),
    ]
}

fn hybrid_artifacts(opts: &SwitchOptions) -> Vec<Artifact> {
    let rtd3 = opts.rtd3.map(|l| l.value());
    let mut artifacts = vec![Artifact::new(
        content::MODESET_PATH,
        content::modeset(opts.use_nvidia_current, rtd3),
    )];
    if rtd3.is_some() {
        artifacts.push(Artifact::new(content::UDEV_PM_PATH, content::udev_pm()));
    }
    artifacts
}
