//! Paths and text of every file envycontrol manages.

use crate::detect::pci::{IgpuVendor, PciBusId};

pub const BLACKLIST_PATH: &str = "/etc/modprobe.d/blacklist-nvidia.conf";
pub const UDEV_INTEGRATED_PATH: &str = "/etc/udev/rules.d/50-remove-nvidia.rules";
pub const UDEV_PM_PATH: &str = "/etc/udev/rules.d/80-nvidia-pm.rules";
pub const XORG_PATH: &str = "/etc/X11/xorg.conf";
pub const EXTRA_XORG_PATH: &str = "/etc/X11/xorg.conf.d/10-nvidia.conf";
pub const MODESET_PATH: &str = "/etc/modprobe.d/nvidia.conf";
pub const SDDM_XSETUP_PATH: &str = "/usr/share/sddm/scripts/Xsetup";
pub const SDDM_XSETUP_BACKUP_PATH: &str = "/usr/share/sddm/scripts/Xsetup.bak";
pub const LIGHTDM_SCRIPT_PATH: &str = "/etc/lightdm/nvidia.sh";
pub const LIGHTDM_CONFIG_PATH: &str = "/etc/lightdm/lightdm.conf.d/20-nvidia.conf";

/// Files left behind by older releases.
pub const LEGACY_PATHS: &[&str] = &[
    "/etc/X11/xorg.conf.d/90-nvidia.conf",
    "/lib/udev/rules.d/50-remove-nvidia.rules",
    "/lib/udev/rules.d/80-nvidia-pm.rules",
];

/// Everything cleanup removes, current files first.
pub fn managed_paths() -> Vec<&'static str> {
    let mut paths = vec![
        BLACKLIST_PATH,
        UDEV_INTEGRATED_PATH,
        UDEV_PM_PATH,
        XORG_PATH,
        EXTRA_XORG_PATH,
        MODESET_PATH,
        LIGHTDM_SCRIPT_PATH,
        LIGHTDM_CONFIG_PATH,
    ];
    paths.extend_from_slice(LEGACY_PATHS);
    paths
}

const HEADER: &str = "# Automatically generated by EnvyControl\n";

const BLACKLISTED_MODULES: &[&str] = &[
    "nouveau",
    "nvidia",
    "nvidia_drm",
    "nvidia_uvm",
    "nvidia_modeset",
    "nvidia_current",
    "nvidia_current_drm",
    "nvidia_current_uvm",
    "nvidia_current_modeset",
    "i2c_nvidia_gpu",
];

pub fn blacklist() -> String {
    let mut out = format!("{}\n", HEADER);
    for module in BLACKLISTED_MODULES {
        out.push_str(&format!("blacklist {}\n", module));
    }
    for module in BLACKLISTED_MODULES {
        out.push_str(&format!("alias {} off\n", module));
    }
    out
}

pub fn udev_integrated() -> String {
    format!(
        r#"{}
# Remove NVIDIA USB xHCI Host Controller devices, if present
ACTION=="add", SUBSYSTEM=="pci", ATTR{{vendor}}=="0x10de", ATTR{{class}}=="0x0c0330", ATTR{{power/control}}="auto", ATTR{{remove}}="1"

# Remove NVIDIA USB Type-C UCSI devices, if present
ACTION=="add", SUBSYSTEM=="pci", ATTR{{vendor}}=="0x10de", ATTR{{class}}=="0x0c8000", ATTR{{power/control}}="auto", ATTR{{remove}}="1"

# Remove NVIDIA Audio devices, if present
ACTION=="add", SUBSYSTEM=="pci", ATTR{{vendor}}=="0x10de", ATTR{{class}}=="0x040300", ATTR{{power/control}}="auto", ATTR{{remove}}="1"

# Remove NVIDIA VGA/3D controller devices
ACTION=="add", SUBSYSTEM=="pci", ATTR{{vendor}}=="0x10de", ATTR{{class}}=="0x03[0-9]*", ATTR{{power/control}}="auto", ATTR{{remove}}="1"
"#,
        HEADER
    )
}

pub fn udev_pm() -> String {
    format!(
        r#"{}
# Remove NVIDIA USB xHCI Host Controller devices, if present
ACTION=="add", SUBSYSTEM=="pci", ATTR{{vendor}}=="0x10de", ATTR{{class}}=="0x0c0330", ATTR{{remove}}="1"

# Remove NVIDIA USB Type-C UCSI devices, if present
ACTION=="add", SUBSYSTEM=="pci", ATTR{{vendor}}=="0x10de", ATTR{{class}}=="0x0c8000", ATTR{{remove}}="1"

# Remove NVIDIA Audio devices, if present
ACTION=="add", SUBSYSTEM=="pci", ATTR{{vendor}}=="0x10de", ATTR{{class}}=="0x040300", ATTR{{remove}}="1"

# Enable runtime PM for NVIDIA VGA/3D controller devices on driver bind
ACTION=="bind", SUBSYSTEM=="pci", ATTR{{vendor}}=="0x10de", ATTR{{class}}=="0x030000", TEST=="power/control", ATTR{{power/control}}="auto"
ACTION=="bind", SUBSYSTEM=="pci", ATTR{{vendor}}=="0x10de", ATTR{{class}}=="0x030200", TEST=="power/control", ATTR{{power/control}}="auto"

# Disable runtime PM for NVIDIA VGA/3D controller devices on driver unbind
ACTION=="unbind", SUBSYSTEM=="pci", ATTR{{vendor}}=="0x10de", ATTR{{class}}=="0x030000", TEST=="power/control", ATTR{{power/control}}="on"
ACTION=="unbind", SUBSYSTEM=="pci", ATTR{{vendor}}=="0x10de", ATTR{{class}}=="0x030200", TEST=="power/control", ATTR{{power/control}}="on"
"#,
        HEADER
    )
}

/// Xorg config making the Nvidia GPU the primary screen.
/// The iGPU section naming differs between Intel and AMD.
pub fn xorg(vendor: IgpuVendor, bus: &PciBusId) -> String {
    let (layout_inactive, igpu_id, igpu_driver, igpu_screen) = match vendor {
        IgpuVendor::Intel => ("intel", "intel", "modesetting", "intel"),
        IgpuVendor::Amd => ("amdgpu", "amdgpu", "amdgpu", "amd"),
    };

    format!(
        r#"{header}
Section "ServerLayout"
    Identifier "layout"
    Screen 0 "nvidia"
    Inactive "{layout_inactive}"
EndSection

Section "Device"
    Identifier "nvidia"
    Driver "nvidia"
    BusID "{bus}"
EndSection

Section "Screen"
    Identifier "nvidia"
    Device "nvidia"
    Option "AllowEmptyInitialConfiguration"
EndSection

Section "Device"
    Identifier "{igpu_id}"
    Driver "{igpu_driver}"
EndSection

Section "Screen"
    Identifier "{igpu_screen}"
    Device "{igpu_id}"
EndSection
"#,
        header = HEADER,
    )
}

/// Extra OutputClass block, only produced when at least one option is set.
pub fn extra_xorg(force_comp: bool, coolbits: Option<u32>) -> Option<String> {
    if !force_comp && coolbits.is_none() {
        return None;
    }

    let mut out = format!(
        r#"{}
Section "OutputClass"
    Identifier "nvidia"
    MatchDriver "nvidia-drm"
    Driver "nvidia"
"#,
        HEADER
    );
    if force_comp {
        out.push_str("    Option \"ForceCompositionPipeline\" \"true\"\n");
    }
    if let Some(value) = coolbits {
        out.push_str(&format!("    Option \"Coolbits\" \"{}\"\n", value));
    }
    out.push_str("EndSection\n");
    Some(out)
}

/// modprobe options enabling DRM kernel mode setting, optionally with RTD3.
pub fn modeset(use_nvidia_current: bool, rtd3: Option<u8>) -> String {
    let module = if use_nvidia_current {
        "nvidia-current"
    } else {
        "nvidia"
    };

    let mut out = format!("{}\noptions {}-drm modeset=1\n", HEADER, module);
    if let Some(level) = rtd3 {
        out.push_str(&format!(
            "options {} \"NVreg_DynamicPowerManagement=0x0{}\"\n",
            module, level
        ));
    }
    out.push_str(&format!(
        "options {} NVreg_UsePageAttributeTable=1 NVreg_InitializeSystemMemoryAllocations=0\n",
        module
    ));
    out
}

/// Display setup script pointing the iGPU provider at the Nvidia outputs.
pub fn xrandr_script(provider: &str) -> String {
    format!(
        r#"#!/bin/sh
{}
xrandr --setprovideroutputsource "{}" NVIDIA-0
xrandr --auto
"#,
        HEADER, provider
    )
}

pub fn sddm_xsetup_default() -> String {
    "#!/bin/sh\n# Xsetup - run as root before the login dialog appears\n\n".to_string()
}

pub fn lightdm_config() -> String {
    format!(
        "{}\n[Seat:*]\ndisplay-setup-script={}\n",
        HEADER, LIGHTDM_SCRIPT_PATH
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus() -> PciBusId {
        PciBusId::new(1, 0, 0)
    }

    #[test]
    fn test_blacklist_blocks_and_aliases_every_module() {
        let content = blacklist();
        assert!(content.starts_with(HEADER));
        for module in BLACKLISTED_MODULES {
            assert!(content.contains(&format!("blacklist {}\n", module)));
            assert!(content.contains(&format!("alias {} off\n", module)));
        }
    }

    #[test]
    fn test_udev_rules_escape_braces() {
        assert!(udev_integrated().contains(r#"ATTR{remove}="1""#));
        assert!(udev_pm().contains(r#"ATTR{power/control}="on""#));
    }

    #[test]
    fn test_xorg_intel() {
        let content = xorg(IgpuVendor::Intel, &bus());
        assert!(content.contains("Inactive \"intel\""));
        assert!(content.contains("Driver \"nvidia\""));
        assert!(content.contains("BusID \"PCI:1:0:0\""));
        assert!(content.contains("Driver \"modesetting\""));
    }

    #[test]
    fn test_xorg_amd() {
        let content = xorg(IgpuVendor::Amd, &PciBusId::new(45, 0, 0));
        assert!(content.contains("Inactive \"amdgpu\""));
        assert!(content.contains("BusID \"PCI:45:0:0\""));
        assert!(content.contains("Driver \"amdgpu\""));
        assert!(content.contains("Identifier \"amd\""));
    }

    #[test]
    fn test_extra_xorg_variants() {
        assert_eq!(extra_xorg(false, None), None);

        let both = extra_xorg(true, Some(28)).unwrap();
        assert!(both.contains("Option \"ForceCompositionPipeline\" \"true\""));
        assert!(both.contains("Option \"Coolbits\" \"28\""));
        assert!(both.ends_with("EndSection\n"));

        let coolbits_only = extra_xorg(false, Some(4)).unwrap();
        assert!(!coolbits_only.contains("ForceCompositionPipeline"));
        assert!(coolbits_only.contains("Option \"Coolbits\" \"4\""));
    }

    #[test]
    fn test_modeset_variants() {
        let plain = modeset(false, None);
        assert!(plain.contains("options nvidia-drm modeset=1"));
        assert!(!plain.contains("NVreg_DynamicPowerManagement"));

        let current = modeset(true, Some(2));
        assert!(current.contains("options nvidia-current-drm modeset=1"));
        assert!(current.contains("options nvidia-current \"NVreg_DynamicPowerManagement=0x02\""));
        assert!(current.contains("options nvidia-current NVreg_UsePageAttributeTable=1"));
    }

    #[test]
    fn test_xrandr_script_and_lightdm_config() {
        let script = xrandr_script("modesetting");
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("--setprovideroutputsource \"modesetting\" NVIDIA-0"));

        assert!(lightdm_config().contains("display-setup-script=/etc/lightdm/nvidia.sh"));
    }

    #[test]
    fn test_managed_paths_include_legacy() {
        let paths = managed_paths();
        assert!(paths.contains(&BLACKLIST_PATH));
        assert!(paths.contains(&"/lib/udev/rules.d/80-nvidia-pm.rules"));
        assert!(!paths.contains(&SDDM_XSETUP_PATH));
    }
}
