use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// Captured result of an external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// `None` when the process could not be started or was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Output reported when the process could not even be launched
    pub fn launch_failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: None,
            stdout: String::new(),
            stderr: message.into(),
        }
    }
}

/// Trait for running external programs synchronously
pub trait CommandRunner {
    /// Runs `program` with `args` to completion. Never fails: launch errors are
    /// reported through the returned output.
    fn run(&self, program: &str, args: &[String]) -> CommandOutput;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, program: &str, args: &[String]) -> CommandOutput {
        (**self).run(program, args)
    }
}

/// Runs commands as child processes of this one
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    working_dir: Option<PathBuf>,
}

impl ProcessRunner {
    pub fn new(working_dir: Option<PathBuf>) -> Self {
        Self { working_dir }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[String]) -> CommandOutput {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        debug!(program, ?args, "running command");

        match command.output() {
            Ok(output) => CommandOutput {
                success: output.status.success(),
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Err(e) => CommandOutput::launch_failure(format!("Failed to run {}: {}", program, e)),
        }
    }
}
