//! Shell command execution behind the command policy.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::core::error::EngineError;
use crate::core::policy::CommandPolicy;
use crate::core::types::CommandResult;
use crate::io::config::EngineConfig;
use crate::io::process::run_captured;

/// Runs allow-listed commands through the platform shell.
///
/// A command that exits non-zero is a normal [`CommandResult`]; only blank
/// commands, policy violations and launch failures are errors.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    policy: CommandPolicy,
    workdir: PathBuf,
    timeout: Option<Duration>,
    output_limit_bytes: usize,
}

impl CommandExecutor {
    pub fn new(policy: CommandPolicy, workdir: impl Into<PathBuf>) -> Self {
        let defaults = EngineConfig::default();
        Self {
            policy,
            workdir: workdir.into(),
            timeout: defaults.command_timeout(),
            output_limit_bytes: defaults.command_output_limit_bytes,
        }
    }

    pub fn from_config(
        policy: CommandPolicy,
        workdir: impl Into<PathBuf>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            timeout: config.command_timeout(),
            output_limit_bytes: config.command_output_limit_bytes,
            ..Self::new(policy, workdir)
        }
    }

    pub fn policy(&self) -> &CommandPolicy {
        &self.policy
    }

    /// Run `command` in `cwd`, or in the executor's working directory.
    #[instrument(skip_all, fields(command = %command))]
    pub fn run(&self, command: &str, cwd: Option<&Path>) -> Result<CommandResult, EngineError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(EngineError::EmptyCommand);
        }
        self.policy.check(command)?;

        let workdir = cwd.unwrap_or(&self.workdir);
        info!(workdir = %workdir.display(), "running command");
        let mut cmd = shell_command(command);
        cmd.current_dir(workdir);

        let output = run_captured(cmd, self.timeout, self.output_limit_bytes)
            .map_err(|err| EngineError::io(format!("Failed to run command '{command}'"), err))?;

        let mut stderr = output.stderr_lossy();
        if output.timed_out {
            let secs = self.timeout.map(|t| t.as_secs()).unwrap_or_default();
            stderr.push_str(&format!("command timed out after {secs}s\n"));
        }
        let exit_code = output.status.code().unwrap_or(1);
        debug!(exit_code, "command result");

        Ok(CommandResult {
            stdout: output.stdout_lossy(),
            stderr,
            exit_code,
        })
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn executor(root: &Path) -> CommandExecutor {
        CommandExecutor::new(CommandPolicy::default(), root)
    }

    #[test]
    fn successful_command_returns_output_and_zero() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = executor(temp.path()).run("echo hello", None).expect("run");
        assert_eq!(result.stdout, "hello\n");
        assert_eq!(result.stderr, "");
        assert_eq!(result.exit_code, 0);
        assert!(result.success());
    }

    /// A failing command is a result, not an error.
    #[test]
    fn failing_command_reports_exit_code_and_streams() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = executor(temp.path())
            .run("ls definitely-missing-entry", None)
            .expect("run");
        assert_ne!(result.exit_code, 0);
        assert!(result.stderr.contains("definitely-missing-entry"));
    }

    #[test]
    fn runs_in_the_workdir() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("marker.txt"), "").expect("seed");
        let result = executor(temp.path()).run("ls", None).expect("run");
        assert!(result.stdout.contains("marker.txt"));

        let sub = temp.path().join("sub");
        std::fs::create_dir(&sub).expect("mkdir");
        let result = executor(temp.path()).run("pwd", Some(&sub)).expect("run");
        assert!(result.stdout.trim_end().ends_with("sub"));
    }

    #[test]
    fn blank_and_disallowed_commands_fail_fast() {
        let temp = tempfile::tempdir().expect("tempdir");
        let exec = executor(temp.path());
        assert!(matches!(exec.run("  ", None), Err(EngineError::EmptyCommand)));
        match exec.run("curl http://example.com", None) {
            Err(EngineError::PolicyViolation { command }) => assert_eq!(command, "curl"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn timeout_is_reported_as_failing_result() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = EngineConfig {
            command_timeout_secs: Some(1),
            ..EngineConfig::default()
        };
        let exec = CommandExecutor::from_config(
            CommandPolicy::new(["echo"]),
            temp.path(),
            &config,
        );
        let result = exec
            .run("echo start; exec sleep 5", None)
            .expect("run");
        assert_ne!(result.exit_code, 0);
        assert!(result.stderr.contains("timed out after 1s"));
        assert_eq!(result.stdout, "start\n");
    }

    #[test]
    fn timeout_stops_every_command_in_a_compound_line() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = EngineConfig {
            command_timeout_secs: Some(1),
            ..EngineConfig::default()
        };
        let exec = CommandExecutor::from_config(
            CommandPolicy::new(["echo"]),
            temp.path(),
            &config,
        );
        let started = std::time::Instant::now();
        let result = exec
            .run("echo start; sleep 8; echo late", None)
            .expect("run");
        assert!(started.elapsed() < Duration::from_secs(5), "{:?}", started.elapsed());
        assert_ne!(result.exit_code, 0);
        assert_eq!(result.stdout, "start\n");
        assert!(result.stderr.contains("timed out after 1s"));
    }

    #[test]
    fn missing_workdir_is_io_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let exec = executor(&temp.path().join("does-not-exist"));
        let err = exec.run("echo hi", None).expect_err("spawn");
        assert!(matches!(err, EngineError::Io { .. }));
        assert!(err.to_string().contains("echo hi"));
    }
}
