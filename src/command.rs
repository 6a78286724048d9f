use crate::error::{Error, Result};
use std::process::{Command, Stdio};

/// Runs external programs. Swapped for a scripted runner in tests.
pub trait CommandRunner {
    /// Run a program and capture its stdout. A non-zero exit is an error.
    fn output(&self, program: &str, args: &[&str]) -> Result<String>;

    /// Run a program to completion and report whether it exited successfully.
    fn status(&self, program: &str, args: &[&str]) -> Result<bool>;

    /// Whether child output is shown to the user.
    fn verbose(&self) -> bool {
        false
    }
}

/// Runs programs on the real system, blocking until they exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner {
    pub verbose: bool,
}

impl SystemRunner {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl CommandRunner for SystemRunner {
    fn output(&self, program: &str, args: &[&str]) -> Result<String> {
        let output = Command::new(program)
            .args(args)
            .stderr(if self.verbose {
                Stdio::inherit()
            } else {
                Stdio::null()
            })
            .output()
            .map_err(|e| Error::Command {
                program: program.to_string(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(Error::Command {
                program: program.to_string(),
                detail: format!("exited with {}", output.status),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn status(&self, program: &str, args: &[&str]) -> Result<bool> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if !self.verbose {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let status = cmd.status().map_err(|e| Error::Command {
            program: program.to_string(),
            detail: e.to_string(),
        })?;
        Ok(status.success())
    }

    fn verbose(&self) -> bool {
        self.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_command_error() {
        let runner = SystemRunner::new(false);
        let err = runner
            .status("envycontrol-definitely-not-a-program", &[])
            .unwrap_err();
        assert!(matches!(err, Error::Command { .. }));
    }

    #[test]
    fn test_output_captures_stdout() {
        let runner = SystemRunner::new(false);
        let out = runner.output("echo", &["hello"]).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn test_status_reports_failure() {
        let runner = SystemRunner::new(false);
        assert!(!runner.status("false", &[]).unwrap());
        assert!(runner.status("true", &[]).unwrap());
    }
}
