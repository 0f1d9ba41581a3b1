//! Dispatch of parsed actions to the file and command executors.
//!
//! Each action produces exactly one [`ActionOutcome`], in input order. A
//! failing action never stops the batch; there is no rollback.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::core::error::EngineError;
use crate::core::policy::CommandPolicy;
use crate::core::types::{Action, ActionKind, CommandResult};
use crate::io::command::CommandExecutor;
use crate::io::config::EngineConfig;
use crate::io::files::{FileExecutor, FileOp};
use crate::io::guard::PathGuard;

/// Result of executing one action.
#[derive(Debug)]
pub struct ActionOutcome {
    pub kind: ActionKind,
    /// Success line (marker included) or the failure that stopped this action.
    pub result: Result<String, EngineError>,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Human-readable line for this outcome.
    pub fn render(&self) -> String {
        match &self.result {
            Ok(line) => line.clone(),
            Err(err @ EngineError::MissingParameter { .. }) => format!("ERROR: {err}"),
            Err(err) => format!("❌ Error executing {}: {err}", self.kind),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActionExecutor {
    files: FileExecutor,
    commands: CommandExecutor,
}

impl ActionExecutor {
    pub fn new(files: FileExecutor, commands: CommandExecutor) -> Self {
        Self { files, commands }
    }

    /// Executor sandboxed to `root` with the default command policy.
    pub fn for_root(root: impl Into<PathBuf>, home: Option<PathBuf>, config: &EngineConfig) -> Self {
        let root = root.into();
        let guard = PathGuard::new(&root, home, config.denied_path_substrings.clone());
        let commands = CommandExecutor::from_config(CommandPolicy::default(), guard.root(), config);
        Self::new(FileExecutor::new(guard), commands)
    }

    pub fn execute(&self, action: &Action) -> ActionOutcome {
        let kind = action.kind();
        let result = validate(action).and_then(|()| self.dispatch(action));
        match &result {
            Ok(_) => debug!(%kind, "action succeeded"),
            Err(err) => warn!(%kind, err = %err, "action failed"),
        }
        ActionOutcome { kind, result }
    }

    /// Execute every action in order, one at a time.
    pub fn execute_all(&self, actions: &[Action]) -> Vec<ActionOutcome> {
        actions.iter().map(|action| self.execute(action)).collect()
    }

    fn dispatch(&self, action: &Action) -> Result<String, EngineError> {
        match action {
            Action::CreateFile { path, content } => {
                let message = self.files.apply(FileOp::Write {
                    path: path.as_str(),
                    content: content.as_str(),
                })?;
                Ok(format!("✅ {message}"))
            }
            Action::EditFile {
                path,
                old_string,
                new_string,
            } => {
                let message = self.files.apply(FileOp::Edit {
                    path: path.as_str(),
                    old_string: old_string.as_str(),
                    new_string: new_string.as_str(),
                })?;
                Ok(format!("✅ {message}"))
            }
            Action::RunCommand { command } => {
                let result = self.commands.run(command, None)?;
                Ok(render_command(command, &result))
            }
            Action::ReadFile { path } => {
                let content = self.files.apply(FileOp::Read {
                    path: path.as_str(),
                })?;
                Ok(format!("📄 Content of {path}:\n{content}"))
            }
        }
    }
}

/// Render executed actions as result lines.
pub fn render_outcomes(outcomes: &[ActionOutcome]) -> Vec<String> {
    outcomes.iter().map(ActionOutcome::render).collect()
}

fn validate(action: &Action) -> Result<(), EngineError> {
    let missing = |fields: &'static str| -> Result<(), EngineError> {
        Err(EngineError::MissingParameter {
            action: action.kind().as_str(),
            fields,
        })
    };
    match action {
        Action::CreateFile { path, content } if path.is_empty() || content.is_empty() => {
            missing("filePath or content")
        }
        Action::EditFile {
            path,
            old_string,
            new_string,
        } if path.is_empty() || old_string.is_empty() || new_string.is_empty() => {
            missing("parameters")
        }
        Action::RunCommand { command } if command.trim().is_empty() => missing("command"),
        Action::ReadFile { path } if path.is_empty() => missing("filePath"),
        _ => Ok(()),
    }
}

fn render_command(command: &str, result: &CommandResult) -> String {
    let mut line = format!("✅ Command executed: {command}");
    if !result.stdout.is_empty() {
        line.push_str("\nOutput:\n");
        line.push_str(&result.stdout);
    }
    if !result.stderr.is_empty() {
        line.push_str("\nErrors:\n");
        line.push_str(&result.stderr);
    }
    if !result.success() {
        line.push_str(&format!("\nExit code: {}", result.exit_code));
    }
    line
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;

    fn sandbox() -> (tempfile::TempDir, ActionExecutor) {
        let temp = tempfile::tempdir().expect("tempdir");
        let executor = ActionExecutor::for_root(temp.path(), None, &EngineConfig::default());
        (temp, executor)
    }

    fn create(path: &str, content: &str) -> Action {
        Action::CreateFile {
            path: path.to_string(),
            content: content.to_string(),
        }
    }

    fn run(command: &str) -> Action {
        Action::RunCommand {
            command: command.to_string(),
        }
    }

    #[test]
    fn create_file_writes_and_reports_path() {
        let (temp, executor) = sandbox();
        let outcome = executor.execute(&create("foo.txt", "hello"));
        assert!(outcome.is_success());
        let line = outcome.render();
        assert!(line.starts_with("✅"));
        assert!(line.contains("foo.txt"));
        assert_eq!(fs::read_to_string(temp.path().join("foo.txt")).expect("read"), "hello");
    }

    #[test]
    fn read_file_echoes_content() {
        let (temp, executor) = sandbox();
        fs::write(temp.path().join("notes.md"), "# Notes").expect("seed");
        let outcome = executor.execute(&Action::ReadFile {
            path: "notes.md".to_string(),
        });
        assert_eq!(outcome.render(), "📄 Content of notes.md:\n# Notes");
    }

    #[test]
    fn command_output_is_nested_in_one_line() {
        let (_temp, executor) = sandbox();
        let line = executor.execute(&run("echo hi")).render();
        assert_eq!(line, "✅ Command executed: echo hi\nOutput:\nhi\n");
    }

    #[test]
    fn failing_command_is_still_a_success_line_with_exit_code() {
        let (_temp, executor) = sandbox();
        let outcome = executor.execute(&run("ls no-such-entry"));
        assert!(outcome.is_success());
        let line = outcome.render();
        assert!(line.contains("Errors:\n"));
        assert!(line.contains("Exit code:"));
    }

    #[test]
    fn missing_fields_render_error_line() {
        let (_temp, executor) = sandbox();
        let outcome = executor.execute(&create("empty.txt", ""));
        assert!(matches!(
            outcome.result,
            Err(EngineError::MissingParameter { .. })
        ));
        assert_eq!(
            outcome.render(),
            "ERROR: Missing filePath or content for create_file"
        );

        let outcome = executor.execute(&Action::EditFile {
            path: "a".to_string(),
            old_string: String::new(),
            new_string: "b".to_string(),
        });
        assert_eq!(outcome.render(), "ERROR: Missing parameters for edit_file");
    }

    #[test]
    fn failures_name_the_action_type() {
        let (_temp, executor) = sandbox();
        let line = executor.execute(&run("curl example.com")).render();
        assert!(line.starts_with("❌ Error executing run_command:"));
        assert!(line.contains("'curl'"));

        let line = executor.execute(&create("../out.txt", "x")).render();
        assert!(line.starts_with("❌ Error executing create_file:"));
    }

    /// One failure in the middle does not stop later actions, and later
    /// actions see earlier side effects.
    #[test]
    fn batch_isolation_keeps_order_and_continues_after_failures() {
        let (temp, executor) = sandbox();
        let actions = vec![
            create("a.txt", "alpha"),
            Action::EditFile {
                path: "a.txt".to_string(),
                old_string: "missing".to_string(),
                new_string: "x".to_string(),
            },
            run("curl nope"),
            run("cat a.txt"),
            Action::ReadFile {
                path: "/etc/hostname".to_string(),
            },
            create("b.txt", "beta"),
        ];

        let outcomes = executor.execute_all(&actions);
        let ok: Vec<bool> = outcomes.iter().map(ActionOutcome::is_success).collect();
        assert_eq!(ok, vec![true, false, false, true, false, true]);

        let lines = render_outcomes(&outcomes);
        assert_eq!(lines.len(), actions.len());
        assert!(lines[3].contains("Output:\nalpha"));
        assert!(temp.path().join("b.txt").is_file());
    }

    /// Documented gap: the policy gates only the verb. The command is not
    /// executed here; only the policy decision is asserted.
    #[test]
    fn destructive_arguments_to_allowed_verbs_pass_policy() {
        let (_temp, executor) = sandbox();
        let actions = crate::core::parser::parse_actions("RUN rm -rf /");
        assert_eq!(actions, vec![run("rm -rf /")]);
        assert!(executor.commands.policy().is_safe("rm -rf /"));
    }
}
