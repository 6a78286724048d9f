use crate::artifact::CleanupReport;
use crate::cache::CacheRecord;
use crate::initramfs::RebuildOutcome;
use crate::mode::GraphicsMode;
use crate::switch::{ResetReport, SwitchReport};
use colored::Colorize;
use serde::Serialize;

#[derive(Serialize)]
struct ModeJson {
    mode: GraphicsMode,
}

pub fn mode_json(mode: GraphicsMode) -> String {
    serde_json::to_string_pretty(&ModeJson { mode }).unwrap_or_default()
}

pub fn print_mode(mode: GraphicsMode, json: bool) {
    if json {
        println!("{}", mode_json(mode));
    } else {
        println!("{}", mode);
    }
}

fn print_cleanup_failures(cleanup: &CleanupReport) {
    for (path, err) in &cleanup.failed {
        eprintln!("  {} Could not remove {}: {}", "!".red(), path.display(), err);
    }
}

fn print_rebuild_hint(outcome: RebuildOutcome) {
    if outcome == RebuildOutcome::Failed {
        println!(
            "  {} The initramfs was not rebuilt. Rebuild it manually before rebooting.",
            "!".yellow()
        );
    }
}

pub fn print_switch_report(report: &SwitchReport) {
    print_cleanup_failures(&report.cleanup);
    for (path, err) in &report.failed {
        eprintln!("  {} Could not write {}: {}", "!".red(), path, err);
    }
    for (path, reason) in &report.skipped {
        eprintln!("  {} Did not write {}: {}", "!".red(), path, reason);
    }
    print_rebuild_hint(report.initramfs);

    if report.is_clean() {
        println!("{}", "Operation completed successfully".green().bold());
    } else {
        let message = format!(
            "Switch to {} mode is incomplete (see above). Run `envycontrol reset` to recover.",
            report.mode
        );
        println!("{}", message.yellow().bold());
    }
    println!(
        "{}",
        "Please reboot your computer for changes to take effect!".bold()
    );
}

pub fn print_reset_report(report: &ResetReport) {
    print_cleanup_failures(&report.cleanup);
    if !report.cleanup.removed.is_empty() {
        println!("  {} Removed:", ">>".cyan());
        for path in &report.cleanup.removed {
            println!("     {}", path.display().to_string().dimmed());
        }
    }
    if report.cleanup.restored_xsetup {
        println!("  {} Restored sddm Xsetup from backup", ">>".cyan());
    }
    if report.cache_deleted {
        println!("  {} Deleted cache", ">>".cyan());
    }
    print_rebuild_hint(report.initramfs);
    println!("{}", "Operation completed successfully".green().bold());
}

pub fn print_cache_created(record: &CacheRecord) {
    println!(
        "{} Cached Nvidia GPU bus ID {}",
        ">>".green(),
        record.nvidia_gpu_pci_bus.to_string().bold()
    );
}

/// Print the cache. Plain mode shows the file verbatim; JSON mode prints the
/// parsed record, or `null` when there is no readable cache.
pub fn print_cache(raw: &str, record: Option<&CacheRecord>, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&record).unwrap_or_default()
        );
    } else {
        println!("{}", raw);
    }
}
