//! Dependency installer trait and implementations.

use dockyard_core::error::{DockyardError, Result};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;
use tokio::process::Command;

/// Boxed future returned by installers.
pub type InstallFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Materializes a package's third-party dependencies.
pub trait DependencyInstaller: Send + Sync {
    /// Install the dependencies of the package rooted at `package_dir`.
    fn install<'a>(&'a self, slug: &'a str, package_dir: &'a Path) -> InstallFuture<'a>;

    /// Installer name for logs.
    fn name(&self) -> &'static str;
}

/// Installer that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInstaller;

impl DependencyInstaller for NoopInstaller {
    fn install<'a>(&'a self, _slug: &'a str, _package_dir: &'a Path) -> InstallFuture<'a> {
        Box::pin(async { Ok(()) })
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// Installer that runs an external command with the package path appended.
///
/// The command is killed when it outlives its deadline.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandInstaller {
    /// Build from a command line split into words. Returns `None` when empty.
    pub fn from_command_line(command: &[String], timeout: Duration) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }
}

impl DependencyInstaller for CommandInstaller {
    fn install<'a>(&'a self, slug: &'a str, package_dir: &'a Path) -> InstallFuture<'a> {
        Box::pin(async move {
            let run = Command::new(&self.program)
                .args(&self.args)
                .arg(package_dir)
                .current_dir(package_dir)
                .kill_on_drop(true)
                .output();

            let output = tokio::time::timeout(self.timeout, run)
                .await
                .map_err(|_| DockyardError::DependencyInstallFailed {
                    slug: slug.to_string(),
                    cause: format!(
                        "'{}' timed out after {}ms",
                        self.program,
                        self.timeout.as_millis()
                    ),
                })?
                .map_err(|e| DockyardError::DependencyInstallFailed {
                    slug: slug.to_string(),
                    cause: format!("failed to run '{}': {}", self.program, e),
                })?;

            if output.status.success() {
                return Ok(());
            }

            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(DockyardError::DependencyInstallFailed {
                slug: slug.to_string(),
                cause: format!("'{}' exited with {}: {}", self.program, output.status, stderr.trim()),
            })
        })
    }

    fn name(&self) -> &'static str {
        "command"
    }
}
