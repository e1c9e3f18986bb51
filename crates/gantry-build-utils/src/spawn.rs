//! Build process execution
//!
//! Install and build commands are spawned through the shell so user-supplied
//! command strings behave exactly as they would in a package.json script.
//! A non-zero exit aborts the build; stderr is surfaced verbatim.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::{BuildUtilsError, Result};
use crate::fs::scan_parent_dirs;

/// Options for spawning a build process
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    pub cwd: PathBuf,
    pub env: HashMap<String, String>,
}

impl SpawnOptions {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            env: std::env::vars().collect(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Run a shell command string in the given working directory.
///
/// Fails with the captured stdout/stderr and exit code when the command
/// exits non-zero. Build tools are not assumed safe to retry, so there is
/// no retry here.
#[instrument(skip(opts), fields(cwd = %opts.cwd.display()))]
pub async fn exec_command(command: &str, opts: &SpawnOptions) -> Result<()> {
    debug!(command, "executing command");

    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(&opts.cwd)
        .env_clear()
        .envs(&opts.env)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| BuildUtilsError::CommandFailed {
            command: command.to_string(),
            exit_code: None,
            stdout: String::new(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(BuildUtilsError::CommandFailed {
            command: command.to_string(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(())
}

/// Run a named script from the project's `package.json` via the detected
/// package manager (e.g. `pnpm run build`).
pub async fn run_package_json_script(
    dir: &Path,
    script: &str,
    opts: &SpawnOptions,
) -> Result<()> {
    let scan = scan_parent_dirs(dir);
    let pm = scan.package_manager;
    let command = format!("{} {} {}", pm.command(), pm.run_args().join(" "), script);
    exec_command(&command, opts).await
}

/// Run the default dependency install for the detected package manager.
pub async fn run_default_install(dir: &Path, opts: &SpawnOptions) -> Result<()> {
    let scan = scan_parent_dirs(dir);
    let pm = scan.package_manager;
    let command = format!("{} {}", pm.command(), pm.install_args().join(" "));
    exec_command(&command, opts).await
}
