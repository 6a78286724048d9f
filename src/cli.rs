use crate::detect::display_manager::DisplayManager;
use crate::mode::GraphicsMode;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "envycontrol",
    about = "Easy GPU switching for Nvidia Optimus laptops under Linux",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose mode: debug logging and full output of external commands
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Output as JSON instead of plain text (query commands only)
    #[arg(long, global = true)]
    pub json: bool,

    /// Read defaults from this config file instead of the system and user files
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Query the current graphics mode
    Query,

    /// Switch the graphics mode
    Switch {
        /// Target mode
        #[arg(value_enum)]
        mode: GraphicsMode,

        /// Manually specify your Display Manager for Nvidia mode
        #[arg(long = "dm", value_enum, value_name = "DISPLAY_MANAGER")]
        display_manager: Option<DisplayManager>,

        /// Enable ForceCompositionPipeline on Nvidia mode
        #[arg(long)]
        force_comp: bool,

        /// Enable Coolbits on Nvidia mode. Default if specified without a value: 28
        #[arg(long, value_name = "VALUE", num_args = 0..=1, default_missing_value = "28")]
        coolbits: Option<u32>,

        /// Setup PCI-Express Runtime D3 (RTD3) Power Management on Hybrid mode.
        /// Choices: 0-3. Default if specified without a value: 2
        #[arg(
            long,
            value_name = "VALUE",
            num_args = 0..=1,
            default_missing_value = "2",
            value_parser = clap::value_parser!(u8).range(0..=3)
        )]
        rtd3: Option<u8>,

        /// Use nvidia-current instead of nvidia for kernel modules
        #[arg(long)]
        use_nvidia_current: bool,
    },

    /// Restore the default sddm Xsetup file
    ResetSddm,

    /// Revert every change made by envycontrol
    Reset,

    /// Manage the cached Nvidia GPU bus ID
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (auto-detected if omitted)
        shell: Option<Shell>,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Create the cache; only works in hybrid mode
    Create,
    /// Delete the cache
    Delete,
    /// Show the cache
    Query,
}

/// Print shell completions to stdout.
pub fn print_completions(shell: Option<Shell>) {
    let shell = shell.or_else(Shell::from_env).unwrap_or_else(|| {
        eprintln!(
            "Could not detect shell. Specify one: envycontrol completions {}",
            "bash|zsh|fish|elvish|powershell"
        );
        std::process::exit(1);
    });
    clap_complete::generate(
        shell,
        &mut Cli::command(),
        "envycontrol",
        &mut std::io::stdout(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_switch_defaults_for_bare_flags() {
        let cli = Cli::parse_from([
            "envycontrol",
            "switch",
            "nvidia",
            "--coolbits",
            "--force-comp",
            "--dm",
            "lightdm",
        ]);
        match cli.command {
            Command::Switch {
                mode,
                coolbits,
                force_comp,
                display_manager,
                rtd3,
                ..
            } => {
                assert_eq!(mode, GraphicsMode::Nvidia);
                assert_eq!(coolbits, Some(28));
                assert!(force_comp);
                assert_eq!(display_manager, Some(DisplayManager::Lightdm));
                assert_eq!(rtd3, None);
            }
            _ => panic!("expected switch"),
        }
    }

    #[test]
    fn test_rtd3_range() {
        let cli = Cli::parse_from(["envycontrol", "switch", "hybrid", "--rtd3"]);
        match cli.command {
            Command::Switch { rtd3, .. } => assert_eq!(rtd3, Some(2)),
            _ => panic!("expected switch"),
        }

        assert!(Cli::try_parse_from(["envycontrol", "switch", "hybrid", "--rtd3", "4"]).is_err());
        assert!(Cli::try_parse_from(["envycontrol", "switch", "discrete"]).is_err());
        assert!(
            Cli::try_parse_from(["envycontrol", "switch", "nvidia", "--dm", "xdm"]).is_err()
        );
    }
}
