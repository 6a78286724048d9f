use anyhow::Result;
use clap::Parser;
use envycontrol::cache::CacheStore;
use envycontrol::cli::{CacheAction, Cli, Command};
use envycontrol::command::SystemRunner;
use envycontrol::config::EnvyConfig;
use envycontrol::detect::Prober;
use envycontrol::detect::display_manager::DisplayManager;
use envycontrol::error::Error;
use envycontrol::mode::{self, GraphicsMode};
use envycontrol::root::SystemRoot;
use envycontrol::session::Session;
use envycontrol::switch::{Rtd3Level, SwitchOptions};

struct SwitchArgs {
    mode: GraphicsMode,
    display_manager: Option<DisplayManager>,
    force_comp: bool,
    coolbits: Option<u32>,
    rtd3: Option<u8>,
    use_nvidia_current: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    envycontrol::logging::init(cli.verbose);

    let root = SystemRoot::system();
    let runner = SystemRunner::new(cli.verbose);

    match cli.command {
        Command::Query => {
            envycontrol::output::print_mode(mode::current_mode(&root), cli.json);
        }
        Command::Switch {
            mode,
            display_manager,
            force_comp,
            coolbits,
            rtd3,
            use_nvidia_current,
        } => {
            let config = envycontrol::config::load(&root, cli.config.as_deref());
            let args = SwitchArgs {
                mode,
                display_manager,
                force_comp,
                coolbits,
                rtd3,
                use_nvidia_current,
            };
            cmd_switch(root, &runner, args, &config)?;
        }
        Command::ResetSddm => {
            require_root("reset-sddm")?;
            let session = Session::begin(root, &runner)?;
            session.reset_sddm()?;
            println!("Operation completed successfully");
        }
        Command::Reset => {
            require_root("reset")?;
            let session = Session::begin(root, &runner)?;
            let report = session.reset();
            envycontrol::output::print_reset_report(&report);
        }
        Command::Cache { action } => cmd_cache(root, &runner, action, cli.json)?,
        Command::Completions { shell } => envycontrol::cli::print_completions(shell),
    }

    Ok(())
}

fn require_root(operation: &str) -> std::result::Result<(), Error> {
    if !nix::unistd::geteuid().is_root() {
        return Err(Error::NotRoot {
            operation: operation.to_string(),
        });
    }
    Ok(())
}

/// Command-line flags win over config file values.
fn switch_options(args: &SwitchArgs, config: &EnvyConfig) -> Result<SwitchOptions> {
    let rtd3 = match args.rtd3 {
        Some(level) => Some(Rtd3Level::new(level)?),
        None => config.hybrid.rtd3,
    };

    Ok(SwitchOptions {
        display_manager: args.display_manager.or(config.nvidia.display_manager),
        force_comp: args.force_comp || config.nvidia.force_comp,
        coolbits: args.coolbits.or(config.nvidia.coolbits),
        rtd3,
        use_nvidia_current: args.use_nvidia_current || config.modules.use_nvidia_current,
    })
}

fn cmd_switch(
    root: SystemRoot,
    runner: &SystemRunner,
    args: SwitchArgs,
    config: &EnvyConfig,
) -> Result<()> {
    let opts = switch_options(&args, config)?;
    require_root("switch")?;

    let session = Session::begin(root, runner)?;
    let report = session.switch(args.mode, &opts)?;
    envycontrol::output::print_switch_report(&report);
    Ok(())
}

fn cmd_cache(
    root: SystemRoot,
    runner: &SystemRunner,
    action: CacheAction,
    json: bool,
) -> Result<()> {
    let cache = CacheStore::new(root.clone());

    match action {
        CacheAction::Create => {
            require_root("cache create")?;
            let current = mode::current_mode(&root);
            let record = cache.create(current, &Prober::new(&root, runner))?;
            envycontrol::output::print_cache_created(&record);
        }
        CacheAction::Delete => {
            require_root("cache delete")?;
            if cache.delete()? {
                println!("Removed {}", envycontrol::cache::CACHE_FILE_PATH);
            } else {
                println!("No cache to delete");
            }
        }
        CacheAction::Query => {
            let record = cache.load().ok().flatten();
            envycontrol::output::print_cache(&cache.show(), record.as_ref(), json);
        }
    }

    Ok(())
}
