//! External toolchain invocation
//!
//! Every interaction with the compiler driver goes through the [`Toolchain`]
//! trait: building an archive, listing a package, and fetching or tidying
//! modules. [`CommandToolchain`] runs the real binary as a subprocess with
//! captured output.

pub mod flags;
pub mod package;

pub use flags::merge_build_flags;
pub use package::{Module, ModuleError, PackageError, PackageMetadata};

use crate::error::{LoadkitError, LoadkitResult};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Max number of output lines to include in error messages.
const ERROR_TAIL_LINES: usize = 50;

/// Captured output of a successful command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Abstract toolchain interface
///
/// The binary comes from the [`BuildConfig`](crate::builder::BuildConfig)
/// of each call.
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Run `<binary> list -json <path>` and decode the first record
    async fn list(
        &self,
        binary: &str,
        path: &str,
        work_dir: Option<&Path>,
    ) -> LoadkitResult<PackageMetadata>;

    /// Run `<binary> <args...>` with captured output, failing on non-zero exit
    async fn build(
        &self,
        binary: &str,
        args: &[String],
        work_dir: &Path,
        env: &[(String, String)],
    ) -> LoadkitResult<CommandOutput>;

    /// Run `<binary> mod download [args...]`
    async fn mod_download(
        &self,
        binary: &str,
        work_dir: Option<&Path>,
        args: &[String],
    ) -> LoadkitResult<()>;

    /// Run `<binary> mod tidy`
    async fn mod_tidy(&self, binary: &str, work_dir: Option<&Path>) -> LoadkitResult<()>;
}

/// Toolchain backed by real subprocesses
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandToolchain;

impl CommandToolchain {
    /// Create a new subprocess toolchain
    pub fn new() -> Self {
        Self
    }

    /// Run a module command, mapping any failure to a dependency resolution error
    async fn exec_mod(
        &self,
        binary: &str,
        args: &[String],
        work_dir: Option<&Path>,
    ) -> LoadkitResult<()> {
        let command_line = command_line(binary, args);
        debug!("Executing: {}", command_line);

        let mut cmd = Command::new(binary);
        cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(dir) = work_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|e| {
            LoadkitError::DependencyResolution(format!("failed to run '{}': {}", command_line, e))
        })?;

        if output.status.success() {
            Ok(())
        } else {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(LoadkitError::DependencyResolution(format!(
                "'{}' failed: {}",
                command_line,
                error_tail(&stdout, &stderr)
            )))
        }
    }
}

#[async_trait]
impl Toolchain for CommandToolchain {
    async fn list(
        &self,
        binary: &str,
        path: &str,
        work_dir: Option<&Path>,
    ) -> LoadkitResult<PackageMetadata> {
        let listing_error = |reason: String, stderr: &[String]| LoadkitError::Listing {
            path: path.to_string(),
            reason,
            stderr: last_lines(stderr),
        };

        debug!("Executing: {} list -json {}", binary, path);
        let mut cmd = Command::new(binary);
        cmd.args(["list", "-json", path])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = work_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| listing_error(format!("failed to start: {}", e), &[]))?;

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(out), Some(err)) => {
                stream_child_output(out, err, &|line| debug!("list: {}", line)).await
            }
            _ => return Err(listing_error("output pipes unavailable".to_string(), &[])),
        };

        let status = child
            .wait()
            .await
            .map_err(|e| listing_error(format!("failed to wait: {}", e), &stderr))?;

        let joined = stdout.join("\n");
        let pkg = serde_json::Deserializer::from_str(&joined)
            .into_iter::<PackageMetadata>()
            .next()
            .ok_or_else(|| listing_error("no package record in output".to_string(), &stderr))?
            .map_err(|e| listing_error(format!("failed to decode output: {}", e), &stderr))?;

        if !status.success() {
            return Err(listing_error(format!("exited with {}", status), &stderr));
        }
        Ok(pkg)
    }

    async fn build(
        &self,
        binary: &str,
        args: &[String],
        work_dir: &Path,
        env: &[(String, String)],
    ) -> LoadkitResult<CommandOutput> {
        let command = command_line(binary, args);
        debug!("Executing: {} (in {})", command, work_dir.display());

        let output = Command::new(binary)
            .args(args)
            .current_dir(work_dir)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| LoadkitError::Build {
                command: command.clone(),
                reason: e.to_string(),
                stdout: String::new(),
                stderr: String::new(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if output.status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else {
            Err(LoadkitError::Build {
                command,
                reason: output.status.to_string(),
                stdout: stream_tail(&stdout),
                stderr: stream_tail(&stderr),
            })
        }
    }

    async fn mod_download(
        &self,
        binary: &str,
        work_dir: Option<&Path>,
        args: &[String],
    ) -> LoadkitResult<()> {
        let mut full = vec!["mod".to_string(), "download".to_string()];
        full.extend(args.iter().cloned());
        self.exec_mod(binary, &full, work_dir).await
    }

    async fn mod_tidy(&self, binary: &str, work_dir: Option<&Path>) -> LoadkitResult<()> {
        let args = ["mod".to_string(), "tidy".to_string()];
        self.exec_mod(binary, &args, work_dir).await
    }
}

/// Join a binary and its arguments into a printable command line
pub fn command_line(binary: &str, args: &[String]) -> String {
    std::iter::once(binary)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the useful tail of command output for error diagnostics.
///
/// Combines stdout and stderr, then returns the last `ERROR_TAIL_LINES`
/// lines so error messages are actionable without being overwhelming.
pub(crate) fn error_tail(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    last_lines(&lines)
}

/// Last `ERROR_TAIL_LINES` lines of a single stream
fn stream_tail(output: &str) -> String {
    let lines: Vec<&str> = output.lines().collect();
    last_lines(&lines)
}

fn last_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let start = lines.len().saturating_sub(ERROR_TAIL_LINES);
    lines[start..]
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Drain stdout and stderr of a child process concurrently.
///
/// Calls `on_stderr` for each stderr line as it arrives and returns both
/// streams as collected lines.
pub(crate) async fn stream_child_output<O, E>(
    stdout: O,
    stderr: E,
    on_stderr: &(dyn Fn(&str) + Send + Sync),
) -> (Vec<String>, Vec<String>)
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut stdout_reader = BufReader::new(stdout).lines();
    let mut stderr_reader = BufReader::new(stderr).lines();

    let mut out_lines = Vec::new();
    let mut err_lines = Vec::new();
    let mut stdout_done = false;
    let mut stderr_done = false;

    while !stdout_done || !stderr_done {
        tokio::select! {
            line = stderr_reader.next_line(), if !stderr_done => {
                match line {
                    Ok(Some(line)) => {
                        on_stderr(&line);
                        err_lines.push(line);
                    }
                    _ => stderr_done = true,
                }
            }
            line = stdout_reader.next_line(), if !stdout_done => {
                match line {
                    Ok(Some(line)) => out_lines.push(line),
                    _ => stdout_done = true,
                }
            }
        }
    }

    (out_lines, err_lines)
}
