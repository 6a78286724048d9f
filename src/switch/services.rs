use crate::command::CommandRunner;
use crate::error::{Error, Result};
use colored::Colorize;

pub const PERSISTENCED_SERVICE: &str = "nvidia-persistenced.service";

/// Enable or disable a systemd unit at boot.
pub fn set_enabled(runner: &dyn CommandRunner, service: &str, enabled: bool) -> Result<()> {
    let verb = if enabled { "enable" } else { "disable" };
    let ok = runner.status("systemctl", &[verb, service])?;
    if !ok {
        return Err(Error::Command {
            program: "systemctl".to_string(),
            detail: format!("{} {} exited with an error", verb, service),
        });
    }
    Ok(())
}

/// Toggle nvidia-persistenced. Failure is logged and the switch carries on.
pub fn toggle_persistenced(runner: &dyn CommandRunner, enabled: bool) -> bool {
    let verb = if enabled { "enabled" } else { "disabled" };
    match set_enabled(runner, PERSISTENCED_SERVICE, enabled) {
        Ok(()) => {
            println!("Successfully {} {}", verb, PERSISTENCED_SERVICE.cyan());
            true
        }
        Err(e) => {
            log::error!("An error occurred while toggling {}: {}", PERSISTENCED_SERVICE, e);
            false
        }
    }
}
