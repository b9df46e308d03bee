//! Host configuration.

use dockyard_core::error::{DockyardError, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default time a unit has to announce readiness.
pub const DEFAULT_BOOT_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Default time an option or run call may take.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Default bound on one dependency install command.
pub const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_millis(300_000);

/// Configuration of the connector host.
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    /// Root of the package store (one directory per slug).
    pub packages_dir: PathBuf,
    /// Boot deadline per unit.
    pub boot_timeout: Duration,
    /// Deadline per RPC call.
    pub rpc_timeout: Duration,
    /// Dependency install command; the package path is appended as the last
    /// argument.
    pub install_command: Vec<String>,
    /// Whether dependency installation runs at all.
    pub install_enabled: bool,
    /// Deadline for one install command.
    pub install_timeout: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            packages_dir: PathBuf::from("packages"),
            boot_timeout: DEFAULT_BOOT_TIMEOUT,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            install_command: Vec::new(),
            install_enabled: false,
            install_timeout: DEFAULT_INSTALL_TIMEOUT,
        }
    }
}

/// On-disk form of [`HostConfig`]. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct HostConfigFile {
    packages_dir: Option<PathBuf>,
    boot_timeout_ms: Option<u64>,
    rpc_timeout_ms: Option<u64>,
    install_command: Option<Vec<String>>,
    install_enabled: Option<bool>,
    install_timeout_ms: Option<u64>,
}

impl HostConfig {
    /// Create a configuration rooted at a package store.
    pub fn new(packages_dir: impl Into<PathBuf>) -> Self {
        Self {
            packages_dir: packages_dir.into(),
            ..Default::default()
        }
    }

    /// Set the boot timeout.
    pub fn with_boot_timeout(mut self, timeout: Duration) -> Self {
        self.boot_timeout = timeout;
        self
    }

    /// Set the RPC timeout.
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    /// Set the install command and enable installation.
    pub fn with_install_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.install_command = command.into_iter().map(Into::into).collect();
        self.install_enabled = !self.install_command.is_empty();
        self
    }

    /// Set the install command deadline.
    pub fn with_install_timeout(mut self, timeout: Duration) -> Self {
        self.install_timeout = timeout;
        self
    }

    /// Enable or disable dependency installation.
    pub fn with_install_enabled(mut self, enabled: bool) -> Self {
        self.install_enabled = enabled;
        self
    }

    /// Build a configuration from environment variables over the defaults.
    ///
    /// - `DOCKYARD_PACKAGES_DIR`: package store root
    /// - `DOCKYARD_BOOT_TIMEOUT_MS`: boot timeout in milliseconds
    /// - `DOCKYARD_RPC_TIMEOUT_MS`: RPC timeout in milliseconds
    /// - `DOCKYARD_INSTALL_CMD`: whitespace-separated install command
    /// - `DOCKYARD_INSTALL`: "true"/"false" to toggle installation
    /// - `DOCKYARD_INSTALL_TIMEOUT_MS`: install deadline in milliseconds
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Apply environment overrides to this configuration.
    pub fn merge_env(mut self) -> Result<Self> {
        if let Ok(dir) = env::var("DOCKYARD_PACKAGES_DIR") {
            self.packages_dir = PathBuf::from(dir);
        }
        if let Some(ms) = env_millis("DOCKYARD_BOOT_TIMEOUT_MS")? {
            self.boot_timeout = ms;
        }
        if let Some(ms) = env_millis("DOCKYARD_RPC_TIMEOUT_MS")? {
            self.rpc_timeout = ms;
        }
        if let Ok(cmd) = env::var("DOCKYARD_INSTALL_CMD") {
            self = self.with_install_command(cmd.split_whitespace());
        }
        if let Ok(flag) = env::var("DOCKYARD_INSTALL") {
            self.install_enabled = parse_bool("DOCKYARD_INSTALL", &flag)?;
        }
        if let Some(ms) = env_millis("DOCKYARD_INSTALL_TIMEOUT_MS")? {
            self.install_timeout = ms;
        }
        self.validate()?;
        Ok(self)
    }

    /// Load a configuration from a YAML file over the defaults.
    ///
    /// ```yaml
    /// packages_dir: /srv/connectors
    /// boot_timeout_ms: 20000
    /// rpc_timeout_ms: 15000
    /// install_command: [npm, install, --prefix]
    /// install_timeout_ms: 300000
    /// ```
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DockyardError::Io {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            DockyardError::YamlParse { cause, .. } => DockyardError::YamlParse {
                path: path.to_path_buf(),
                cause,
            },
            other => other,
        })
    }

    /// Parse a configuration from YAML text over the defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: HostConfigFile =
            serde_yaml::from_str(yaml).map_err(|e| DockyardError::YamlParse {
                path: PathBuf::from("<config>"),
                cause: e.to_string(),
            })?;

        let mut config = Self::default();
        if let Some(dir) = file.packages_dir {
            config.packages_dir = dir;
        }
        if let Some(ms) = file.boot_timeout_ms {
            config.boot_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.rpc_timeout_ms {
            config.rpc_timeout = Duration::from_millis(ms);
        }
        if let Some(cmd) = file.install_command {
            config = config.with_install_command(cmd);
        }
        if let Some(enabled) = file.install_enabled {
            config.install_enabled = enabled;
        }
        if let Some(ms) = file.install_timeout_ms {
            config.install_timeout = Duration::from_millis(ms);
        }
        config.validate()?;
        Ok(config)
    }

    /// Check invariants between fields.
    pub fn validate(&self) -> Result<()> {
        if self.boot_timeout.is_zero() {
            return Err(DockyardError::ConfigValue {
                field: "boot_timeout".to_string(),
                cause: "must be greater than zero".to_string(),
            });
        }
        if self.rpc_timeout.is_zero() {
            return Err(DockyardError::ConfigValue {
                field: "rpc_timeout".to_string(),
                cause: "must be greater than zero".to_string(),
            });
        }
        if self.install_timeout.is_zero() {
            return Err(DockyardError::ConfigValue {
                field: "install_timeout".to_string(),
                cause: "must be greater than zero".to_string(),
            });
        }
        if self.install_enabled && self.install_command.is_empty() {
            return Err(DockyardError::ConfigValue {
                field: "install_command".to_string(),
                cause: "installation is enabled but no command is set".to_string(),
            });
        }
        Ok(())
    }
}

fn env_millis(name: &str) -> Result<Option<Duration>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|e| DockyardError::ConfigValue {
                field: name.to_string(),
                cause: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

fn parse_bool(field: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(DockyardError::ConfigValue {
            field: field.to_string(),
            cause: format!("expected a boolean, got '{}'", other),
        }),
    }
}
