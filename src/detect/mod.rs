pub mod display_manager;
pub mod pci;
pub mod xrandr;

use crate::command::CommandRunner;
use crate::error::{Error, Result};
use crate::root::SystemRoot;
use display_manager::DisplayManager;
use pci::{IgpuVendor, PciBusId};

const XRANDR_BIN: &str = "/usr/bin/xrandr";

/// Live hardware and session detection.
pub struct Prober<'a> {
    root: &'a SystemRoot,
    runner: &'a dyn CommandRunner,
}

impl<'a> Prober<'a> {
    pub fn new(root: &'a SystemRoot, runner: &'a dyn CommandRunner) -> Self {
        Self { root, runner }
    }

    fn lspci(&self) -> Result<String> {
        self.runner.output("lspci", &[])
    }

    /// Bus ID of the Nvidia GPU. Only reliable in hybrid mode: the device is
    /// removed from the bus in integrated mode.
    pub fn nvidia_pci_bus(&self) -> Result<PciBusId> {
        let lspci = self.lspci()?;
        let Some(slot) = pci::find_nvidia_slot(&lspci) else {
            return Err(Error::NoDiscreteGpu);
        };
        log::info!("Found Nvidia GPU at {}", slot);
        PciBusId::from_slot(slot)
    }

    /// Vendor of the integrated GPU, or None when it can't be identified.
    pub fn igpu_vendor(&self) -> Option<IgpuVendor> {
        let lspci = match self.lspci() {
            Ok(out) => out,
            Err(e) => {
                log::warn!("Could not list PCI devices: {}", e);
                return None;
            }
        };

        match pci::find_igpu_vendor(&lspci) {
            Some(vendor) => {
                log::info!("Found {} iGPU", vendor);
                Some(vendor)
            }
            None => {
                log::warn!("Could not find Intel or AMD iGPU");
                None
            }
        }
    }

    /// Display manager started by `display-manager.service`.
    pub fn display_manager(&self) -> Option<DisplayManager> {
        let Some(unit) = self.root.read_optional(display_manager::DISPLAY_MANAGER_UNIT) else {
            log::warn!("Display Manager detection is not available");
            return None;
        };

        let name = display_manager::exec_start_name(&unit)?;
        match name.parse::<DisplayManager>() {
            Ok(dm) => {
                log::info!("Found {} Display Manager", dm);
                Some(dm)
            }
            Err(_) => {
                log::info!("Found {} Display Manager (no extra setup needed)", name);
                None
            }
        }
    }

    /// xrandr provider whose outputs get routed to the Nvidia GPU.
    pub fn igpu_provider_name(&self, vendor: Option<IgpuVendor>) -> String {
        if vendor == Some(IgpuVendor::Amd) {
            if let Some(name) = self.amd_provider_name() {
                return name;
            }
        }
        xrandr::FALLBACK_PROVIDER.to_string()
    }

    fn amd_provider_name(&self) -> Option<String> {
        if !self.root.exists(XRANDR_BIN) {
            log::warn!(
                "The 'xrandr' command is not available. Make sure the package is installed!"
            );
            return None;
        }

        let output = match self.runner.output("xrandr", &["--listproviders"]) {
            Ok(out) => out,
            Err(e) => {
                log::warn!("Failed to run the 'xrandr' command: {}", e);
                return None;
            }
        };

        let name = xrandr::find_amd_provider(&output);
        if name.is_none() {
            log::warn!("Could not find AMD iGPU in 'xrandr' output.");
        }
        name
    }
}
