use crate::command::CommandRunner;
use crate::root::SystemRoot;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Distribution family, as far as initramfs tooling is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostFamily {
    /// Image-based systems (Fedora Silverblue, Kinoite, ...).
    Ostree,
    Debian,
    /// RHEL, Fedora and SUSE derivatives.
    RhelSuse,
    /// EndeavourOS installs using dracut.
    EndeavourDracut,
    Unknown,
}

impl HostFamily {
    /// Detect by filesystem markers. Order matters: ostree systems also
    /// carry redhat-release.
    pub fn detect(root: &SystemRoot) -> Self {
        if root.any_exists(&["/ostree", "/sysroot/ostree"]) {
            HostFamily::Ostree
        } else if root.exists("/etc/debian_version") {
            HostFamily::Debian
        } else if root.any_exists(&["/etc/redhat-release", "/usr/bin/zypper"]) {
            HostFamily::RhelSuse
        } else if root.exists("/usr/lib/endeavouros-release") && root.exists("/usr/bin/dracut") {
            HostFamily::EndeavourDracut
        } else {
            HostFamily::Unknown
        }
    }

    /// The rebuild command, or None when nothing needs to run.
    pub fn rebuild_command(&self) -> Option<(&'static str, &'static [&'static str])> {
        const OSTREE: &[&str] = &["initramfs", "--enable", "--arg=--force"];
        const DEBIAN: &[&str] = &["-u", "-k", "all"];
        const DRACUT: &[&str] = &["--force", "--regenerate-all"];
        const NO_ARGS: &[&str] = &[];

        match self {
            HostFamily::Ostree => Some(("rpm-ostree", OSTREE)),
            HostFamily::Debian => Some(("update-initramfs", DEBIAN)),
            HostFamily::RhelSuse => Some(("dracut", DRACUT)),
            HostFamily::EndeavourDracut => Some(("dracut-rebuild", NO_ARGS)),
            HostFamily::Unknown => None,
        }
    }
}

/// Result of a rebuild attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    Rebuilt,
    Failed,
    Skipped,
}

/// Regenerate the boot image so modprobe changes reach early boot. Failure is
/// logged, not returned: the new files are already in place and the rebuild
/// can be rerun by hand.
pub fn rebuild(root: &SystemRoot, runner: &dyn CommandRunner) -> RebuildOutcome {
    let family = HostFamily::detect(root);
    let Some((program, args)) = family.rebuild_command() else {
        log::info!("No known initramfs tool for this system, skipping rebuild");
        return RebuildOutcome::Skipped;
    };

    let spinner = if runner.verbose() {
        println!("Rebuilding the initramfs with {}...", program);
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Rebuilding the initramfs with {}...", program));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let result = runner.status(program, args);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match result {
        Ok(true) => {
            println!("{}", "Successfully rebuilt the initramfs!".green());
            RebuildOutcome::Rebuilt
        }
        Ok(false) => {
            log::error!("An error occurred while rebuilding the initramfs");
            RebuildOutcome::Failed
        }
        Err(e) => {
            log::error!("An error occurred while rebuilding the initramfs: {}", e);
            RebuildOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct RecordingRunner {
        succeed: bool,
        calls: RefCell<Vec<String>>,
    }

    impl CommandRunner for RecordingRunner {
        fn output(&self, program: &str, _args: &[&str]) -> Result<String> {
            Err(Error::Command {
                program: program.to_string(),
                detail: "unexpected".to_string(),
            })
        }

        fn status(&self, program: &str, args: &[&str]) -> Result<bool> {
            let mut call = program.to_string();
            for arg in args {
                call.push(' ');
                call.push_str(arg);
            }
            self.calls.borrow_mut().push(call);
            Ok(self.succeed)
        }
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_detect_priority() {
        let tmp = TempDir::new().unwrap();
        let root = SystemRoot::new(tmp.path());
        assert_eq!(HostFamily::detect(&root), HostFamily::Unknown);

        touch(tmp.path(), "usr/lib/endeavouros-release");
        assert_eq!(HostFamily::detect(&root), HostFamily::Unknown);
        touch(tmp.path(), "usr/bin/dracut");
        assert_eq!(HostFamily::detect(&root), HostFamily::EndeavourDracut);

        touch(tmp.path(), "etc/redhat-release");
        assert_eq!(HostFamily::detect(&root), HostFamily::RhelSuse);

        touch(tmp.path(), "etc/debian_version");
        assert_eq!(HostFamily::detect(&root), HostFamily::Debian);

        fs::create_dir_all(tmp.path().join("sysroot/ostree")).unwrap();
        assert_eq!(HostFamily::detect(&root), HostFamily::Ostree);
    }

    #[test]
    fn test_rebuild_runs_exactly_one_command() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "etc/debian_version");
        touch(tmp.path(), "etc/redhat-release");
        let root = SystemRoot::new(tmp.path());
        let runner = RecordingRunner {
            succeed: true,
            calls: RefCell::new(Vec::new()),
        };

        assert_eq!(rebuild(&root, &runner), RebuildOutcome::Rebuilt);
        assert_eq!(*runner.calls.borrow(), vec!["update-initramfs -u -k all"]);
    }

    #[test]
    fn test_rebuild_failure_is_contained() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "usr/bin/zypper");
        let root = SystemRoot::new(tmp.path());
        let runner = RecordingRunner {
            succeed: false,
            calls: RefCell::new(Vec::new()),
        };

        assert_eq!(rebuild(&root, &runner), RebuildOutcome::Failed);
        assert_eq!(
            *runner.calls.borrow(),
            vec!["dracut --force --regenerate-all"]
        );
    }

    #[test]
    fn test_rebuild_skipped_on_unknown_host() {
        let tmp = TempDir::new().unwrap();
        let root = SystemRoot::new(tmp.path());
        let runner = RecordingRunner {
            succeed: true,
            calls: RefCell::new(Vec::new()),
        };

        assert_eq!(rebuild(&root, &runner), RebuildOutcome::Skipped);
        assert!(runner.calls.borrow().is_empty());
    }
}
