use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DISPLAY_MANAGER_UNIT: &str = "/etc/systemd/system/display-manager.service";

/// Display managers envycontrol knows about. Only sddm and lightdm need
/// extra setup in Nvidia mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DisplayManager {
    Gdm,
    Gdm3,
    Sddm,
    Lightdm,
}

impl fmt::Display for DisplayManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayManager::Gdm => write!(f, "gdm"),
            DisplayManager::Gdm3 => write!(f, "gdm3"),
            DisplayManager::Sddm => write!(f, "sddm"),
            DisplayManager::Lightdm => write!(f, "lightdm"),
        }
    }
}

impl FromStr for DisplayManager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gdm" => Ok(DisplayManager::Gdm),
            "gdm3" => Ok(DisplayManager::Gdm3),
            "sddm" => Ok(DisplayManager::Sddm),
            "lightdm" => Ok(DisplayManager::Lightdm),
            other => Err(format!(
                "unsupported display manager '{}' (expected gdm, gdm3, sddm or lightdm)",
                other
            )),
        }
    }
}

/// Extract the executable name from the `ExecStart=` line of a systemd unit.
pub fn exec_start_name(unit: &str) -> Option<String> {
    let exec = unit
        .lines()
        .find_map(|line| line.trim().strip_prefix("ExecStart="))?;
    let program = exec.split_whitespace().next()?;
    Path::new(program)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
}
