use clap::CommandFactory;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Render one page per command into `dir`, named like `envycontrol-cache.1`.
fn render(cmd: &clap::Command, prefix: &str, dir: &Path) -> io::Result<()> {
    let name = if prefix.is_empty() {
        cmd.get_name().to_string()
    } else {
        format!("{}-{}", prefix, cmd.get_name())
    };

    let page = cmd.clone().name(name.clone());
    let mut buf = Vec::new();
    clap_mangen::Man::new(page).render(&mut buf)?;
    let path = dir.join(format!("{}.1", name));
    fs::write(&path, buf)?;
    println!("Generated {}", path.display());

    for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
        render(sub, &name, dir)?;
    }
    Ok(())
}

fn main() -> io::Result<()> {
    let dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    fs::create_dir_all(&dir)?;

    let mut cmd = envycontrol::cli::Cli::command();
    cmd.build();
    render(&cmd, "", &dir)
}
