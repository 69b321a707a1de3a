//! External command invocation

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// A program plus its arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program name (looked up on `PATH`) or path
    pub program: String,

    /// Arguments
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Anchor a relative program path and working directory at `base`.
    ///
    /// Bare program names are left alone so they are still looked up on
    /// `PATH`.
    pub fn anchored_at(mut self, base: impl Fn(&Path) -> PathBuf) -> Self {
        let program = Path::new(&self.program);
        if program.is_relative() && program.components().count() > 1 {
            self.program = base(program).to_string_lossy().into_owned();
        }
        self.working_dir = self.working_dir.as_deref().map(base);
        self
    }

    /// Resolve the program to an executable, if one exists
    pub fn resolve_program(&self) -> Option<PathBuf> {
        crate::utils::resolve_program(&self.program)
    }

    fn build(&self) -> Result<Command> {
        let program = self
            .resolve_program()
            .ok_or_else(|| anyhow!("Program not found: {}", self.program))?;

        let mut command = Command::new(program);
        command.args(&self.args);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        Ok(command)
    }

    /// Launch the program without waiting for it to finish.
    ///
    /// The child is handed to the Tokio runtime, which reaps it once it
    /// exits, so this must be called from within a runtime.
    pub fn spawn(&self) -> Result<()> {
        let mut command = self.build()?;
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let handle = tokio::runtime::Handle::try_current()
            .with_context(|| format!("Cannot launch {} outside a runtime", self.program))?;
        let _runtime = handle.enter();

        let child = tokio::process::Command::from(command)
            .spawn()
            .with_context(|| format!("Failed to launch {}", self.program))?;

        match child.id() {
            Some(pid) => debug!("Launched {} (pid {})", self.program, pid),
            None => debug!("Launched {} (already exited)", self.program),
        }
        Ok(())
    }

    /// Run the program to completion and return its trimmed stdout.
    ///
    /// Empty output means "nothing to report". A non-zero exit with no output
    /// is an error; a non-zero exit that printed something still reports it.
    pub fn output(&self) -> Result<Option<String>> {
        let output = self
            .build()?
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run {}", self.program))?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() {
            if output.status.success() {
                return Ok(None);
            }
            return Err(anyhow!("{} exited with {}", self.program, output.status));
        }
        Ok(Some(stdout))
    }
}
