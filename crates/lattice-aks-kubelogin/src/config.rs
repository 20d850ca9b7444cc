//! Exchanger configuration and helper lookup

use std::path::{Path, PathBuf};
use std::time::Duration;

use lattice_aks_common::{Error, Result, KUBELOGIN_PATH_ENV};

/// Helper executable looked up on `PATH` when no override is set
pub const DEFAULT_HELPER: &str = "kubelogin";

/// Time the helper may run before it is killed
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// How the temporary kubeconfig location reaches the helper
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KubeconfigChannel {
    /// Only `--kubeconfig <path>`; the process environment is never touched
    #[default]
    Argument,
    /// Additionally point `KUBECONFIG` at the file for the duration of the
    /// call. Calls are serialized process-wide.
    Environment,
}

/// Configuration of a [`CredentialExchanger`](crate::CredentialExchanger)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangerConfig {
    /// Helper location; `None` looks up [`DEFAULT_HELPER`] on `PATH`
    pub helper_path: Option<PathBuf>,
    /// How the kubeconfig path is handed over
    pub channel: KubeconfigChannel,
    /// Helper run timeout
    pub timeout: Duration,
}

impl Default for ExchangerConfig {
    fn default() -> Self {
        Self {
            helper_path: None,
            channel: KubeconfigChannel::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ExchangerConfig {
    /// Defaults, with the helper location taken from `KUBELOGIN_PATH` if set
    pub fn from_env() -> Self {
        Self {
            helper_path: std::env::var_os(KUBELOGIN_PATH_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            ..Self::default()
        }
    }

    /// Program name used in logs and errors
    pub fn helper_name(&self) -> String {
        self.helper_path
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_HELPER))
            .display()
            .to_string()
    }

    /// Locate the helper executable.
    ///
    /// A configured path containing a directory component must point at a
    /// file. A bare name is searched for on `PATH`.
    pub fn resolve_helper(&self) -> Result<PathBuf> {
        let program = self
            .helper_path
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_HELPER));

        if program.components().count() > 1 {
            return if program.is_file() {
                Ok(program.to_path_buf())
            } else {
                Err(Error::external_process(
                    program.display().to_string(),
                    "helper not found",
                ))
            };
        }

        std::env::var_os("PATH")
            .iter()
            .flat_map(std::env::split_paths)
            .map(|dir| dir.join(program))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| {
                Error::external_process(
                    program.display().to_string(),
                    "helper not found on PATH",
                )
            })
    }
}
