//! Composition and launch of the `kubectl run` command

use crate::error::{Result, ShellError};
use crate::overrides::OverrideDocument;
use crate::pod::PodIdentity;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;
use tracing::{debug, info};

/// How long kubectl waits for the debug pod to start running
pub const DEFAULT_POD_RUNNING_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Inputs for a debug pod command
#[derive(Debug, Clone)]
pub struct ComposeRequest<'a> {
    pub binary: &'a Path,
    pub namespace: &'a str,
    pub pod: &'a PodIdentity,
    pub image: &'a str,
    pub overrides: &'a OverrideDocument,
    pub shell: &'a str,
    pub pod_running_timeout: Duration,
    /// Passed through so kubectl talks to the same cluster we inspected
    pub context: Option<&'a str>,
    pub kubeconfig: Option<&'a Path>,
}

/// A program and its argument vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl ShellCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Single line, quoted for a POSIX shell
    pub fn render(&self) -> String {
        let program = self.program.to_string_lossy();
        let words = std::iter::once(program.as_ref()).chain(self.args.iter().map(String::as_str));

        shlex::try_join(words).unwrap_or_else(|_| {
            let mut line = program.to_string();
            for arg in &self.args {
                line.push(' ');
                line.push_str(arg);
            }
            line
        })
    }
}

/// Build `kubectl run` for an interactive, auto-removed debug pod
pub fn compose(request: &ComposeRequest<'_>) -> Result<ShellCommand> {
    let overrides = request.overrides.to_json()?;

    let mut args = vec![
        "run".to_string(),
        "-it".to_string(),
        "--rm".to_string(),
        "--restart=Never".to_string(),
        format!("--namespace={}", request.namespace),
    ];

    if let Some(context) = request.context {
        args.push(format!("--context={}", context));
    }
    if let Some(kubeconfig) = request.kubeconfig {
        args.push(format!("--kubeconfig={}", kubeconfig.display()));
    }

    args.extend([
        format!("--image={}", request.image),
        format!(
            "--pod-running-timeout={}",
            format_duration(request.pod_running_timeout)
        ),
        request.pod.to_string(),
        format!("--overrides={}", overrides),
        "--".to_string(),
        request.shell.to_string(),
    ]);

    Ok(ShellCommand::new(request.binary, args))
}

/// kubectl duration syntax (`5m`, `90s`, `1h`)
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs > 0 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs > 0 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Only render the command
    Print,
    /// Run the command attached to this terminal
    Execute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Printed(String),
    Executed { exit_code: i32 },
}

impl CommandResult {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandResult::Printed(_) => 0,
            CommandResult::Executed { exit_code } => *exit_code,
        }
    }
}

/// Print or execute a composed command
///
/// In execute mode the child inherits stdin/stdout/stderr and is awaited
/// without a timeout.
pub async fn launch(command: &ShellCommand, mode: LaunchMode) -> Result<CommandResult> {
    match mode {
        LaunchMode::Print => Ok(CommandResult::Printed(command.render())),
        LaunchMode::Execute => {
            info!(program = %command.program.display(), "Starting debug shell");
            debug!(command = %command.render(), "Executing");

            let status = tokio::process::Command::new(&command.program)
                .args(&command.args)
                .status()
                .await
                .map_err(|e| ShellError::Launch {
                    program: command.program.clone(),
                    source: e,
                })?;

            let exit_code = exit_code(status);
            info!(exit_code, "Debug shell exited");
            Ok(CommandResult::Executed { exit_code })
        }
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
