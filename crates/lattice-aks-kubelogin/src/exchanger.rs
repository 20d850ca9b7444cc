//! Kubeconfig conversion through the kubelogin helper
//!
//! The input kubeconfig is written to a private temporary file, the helper
//! rewrites it in place to authenticate as a service principal, and the
//! result is read back. The temporary file is owned by an RAII handle and is
//! removed on every exit path, including cancellation.

use std::io::Write;
use std::path::Path;
use std::process::Stdio;

use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use lattice_aks_common::{Credentials, CredentialsProvider, Error, Result};

use crate::config::{ExchangerConfig, KubeconfigChannel};
use crate::env_guard::{KubeconfigEnvGuard, KUBECONFIG_ENV_LOCK};

/// Variables copied from the parent into the helper's otherwise empty
/// environment
const INHERITED_ENV: [&str; 2] = ["HOME", "PATH"];

const REDACTED: &str = "[REDACTED]";

/// Converts kubeconfigs to service principal login
#[derive(Debug, Clone, Default)]
pub struct CredentialExchanger {
    config: ExchangerConfig,
}

impl CredentialExchanger {
    /// Create an exchanger with explicit configuration
    pub fn new(config: ExchangerConfig) -> Self {
        Self { config }
    }

    /// Create an exchanger configured from the environment
    pub fn from_env() -> Self {
        Self::new(ExchangerConfig::from_env())
    }

    /// Active configuration
    pub fn config(&self) -> &ExchangerConfig {
        &self.config
    }

    /// Rewrite `kubeconfig` for `cluster_name` to authenticate with the
    /// provider's service principal.
    ///
    /// Fails with a configuration error before any file or process work when
    /// no provider is given.
    #[instrument(skip(self, kubeconfig, provider), fields(cluster = %cluster_name))]
    pub async fn convert_kubeconfig(
        &self,
        cluster_name: &str,
        kubeconfig: &[u8],
        provider: Option<&dyn CredentialsProvider>,
    ) -> Result<Vec<u8>> {
        let provider = provider.ok_or_else(|| {
            Error::configuration_for(
                "kubelogin",
                "cannot convert kubeconfig without credential provider",
            )
        })?;

        let credentials = provider.credentials().await.map_err(|e| {
            e.into_secret_resolution(format!("client secret for cluster {}", cluster_name))
        })?;
        let helper = self.config.resolve_helper()?;

        let file = write_temp_kubeconfig(cluster_name, kubeconfig)?;
        let path = file.path();
        debug!(path = %path.display(), channel = ?self.config.channel, "Wrote temporary kubeconfig");

        match self.config.channel {
            KubeconfigChannel::Argument => self.run_helper(&helper, path, &credentials).await?,
            KubeconfigChannel::Environment => {
                let _lock = KUBECONFIG_ENV_LOCK.lock().await;
                let _env = KubeconfigEnvGuard::set(path);
                self.run_helper(&helper, path, &credentials).await?
            }
        }

        let converted = tokio::fs::read(path)
            .await
            .map_err(|e| Error::io(path.display().to_string(), e))?;

        info!(bytes = converted.len(), "Converted kubeconfig");
        Ok(converted)
    }

    async fn run_helper(&self, helper: &Path, kubeconfig: &Path, credentials: &Credentials) -> Result<()> {
        let program = self.config.helper_name();
        let secret = credentials.client_secret.expose();

        let mut cmd = Command::new(helper);
        cmd.arg("convert-kubeconfig")
            .args(["-l", "spn"])
            .args(["--client-id", &credentials.client_id])
            .args(["--client-secret", secret])
            .args(["--tenant-id", &credentials.tenant_id])
            .arg("--kubeconfig")
            .arg(kubeconfig)
            .env_clear()
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for var in INHERITED_ENV {
            if let Some(value) = std::env::var_os(var) {
                cmd.env(var, value);
            }
        }

        debug!(helper = %helper.display(), "Running kubeconfig conversion helper");
        let output = tokio::time::timeout(self.config.timeout, cmd.output())
            .await
            .map_err(|_| {
                warn!(helper = %program, timeout = ?self.config.timeout, "Helper timed out");
                Error::external_process(
                    &program,
                    format!("timed out after {:?}", self.config.timeout),
                )
            })?
            .map_err(|e| Error::external_process(&program, format!("failed to execute: {}", e)))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = redact(stderr.trim(), secret);
        warn!(helper = %program, exit_code = ?output.status.code(), stderr = %stderr, "Helper failed");
        Err(Error::external_process_exit(program, output.status.code(), stderr))
    }
}

fn write_temp_kubeconfig(cluster_name: &str, contents: &[u8]) -> Result<NamedTempFile> {
    let prefix = format!("kubeconfig-{}-", cluster_name);
    let tmp_dir = std::env::temp_dir();

    let mut file = tempfile::Builder::new()
        .prefix(&prefix)
        .tempfile_in(&tmp_dir)
        .map_err(|e| Error::io(tmp_dir.display().to_string(), e))?;
    file.write_all(contents)
        .and_then(|_| file.flush())
        .map_err(|e| Error::io(file.path().display().to_string(), e))?;
    Ok(file)
}

fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        text.to_string()
    } else {
        text.replace(secret, REDACTED)
    }
}
