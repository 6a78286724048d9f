use crate::detect::display_manager::DisplayManager;
use crate::root::SystemRoot;
use crate::switch::Rtd3Level;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level envycontrol configuration. Every value is a default that the
/// matching command-line flag overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvyConfig {
    pub nvidia: NvidiaConfig,
    pub hybrid: HybridConfig,
    pub modules: ModulesConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NvidiaConfig {
    /// Display manager to configure instead of detecting one.
    pub display_manager: Option<DisplayManager>,
    /// Enable ForceCompositionPipeline.
    pub force_comp: bool,
    /// Coolbits value to set.
    pub coolbits: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    /// RTD3 power management level (0-3).
    pub rtd3: Option<Rtd3Level>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    /// Use `nvidia-current` kernel module names.
    pub use_nvidia_current: bool,
}

pub const SYSTEM_CONFIG_PATH: &str = "/etc/envycontrol/config.toml";

fn read_toml(path: &Path) -> Option<toml::Value> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content)
        .map_err(|e| log::warn!("Ignoring malformed config {}: {}", path.display(), e))
        .ok()
}

/// `<config_dir>/envycontrol/config.toml`, if the platform has a config dir.
fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("envycontrol").join("config.toml"))
}

/// Overlay `overlay` onto `base`. Tables merge key by key; any other value
/// in `overlay` wins outright.
fn merge_values(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut table), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                let merged = match table.remove(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => value,
                };
                table.insert(key, merged);
            }
            toml::Value::Table(table)
        }
        (_, overlay) => overlay,
    }
}

fn into_config(value: toml::Value, origin: &str) -> EnvyConfig {
    value.try_into().unwrap_or_else(|e| {
        log::warn!("Ignoring config from {}: {}", origin, e);
        EnvyConfig::default()
    })
}

/// Read the files in `paths` in order, later files overriding earlier ones.
fn load_layers(paths: &[PathBuf]) -> EnvyConfig {
    let merged = paths
        .iter()
        .filter_map(|path| read_toml(path))
        .reduce(merge_values);

    match merged {
        Some(value) => into_config(value, "config files"),
        None => EnvyConfig::default(),
    }
}

/// Load defaults for `switch`. An explicit `override_path` replaces both
/// the system file (under `root`) and the user file.
pub fn load(root: &SystemRoot, override_path: Option<&Path>) -> EnvyConfig {
    if let Some(path) = override_path {
        if !path.exists() {
            log::warn!("Config file {} does not exist", path.display());
        }
        return load_layers(&[path.to_path_buf()]);
    }

    let mut layers = vec![root.path(SYSTEM_CONFIG_PATH)];
    layers.extend(user_config_path());
    log::debug!("Config layers: {:?}", layers);
    load_layers(&layers)
}
