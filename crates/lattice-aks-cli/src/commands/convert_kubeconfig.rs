//! `lattice-aks convert-kubeconfig` - switch a kubeconfig to service principal login
//!
//! # Usage
//!
//! ```bash
//! export AZURE_CLIENT_ID=... AZURE_TENANT_ID=... AZURE_CLIENT_SECRET=...
//! lattice-aks convert-kubeconfig --cluster prod-east --input admin.kubeconfig -o spn.kubeconfig
//! ```

use std::convert::Infallible;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tracing::debug;

use lattice_aks_common::{ClientSecret, Credentials, CredentialsProvider, StaticCredentialsProvider};
use lattice_aks_kubelogin::{CredentialExchanger, ExchangerConfig, KubeconfigChannel};

use crate::{Error, Result};

/// Convert a kubeconfig with the kubelogin helper
#[derive(Args, Debug)]
pub struct ConvertKubeconfigArgs {
    /// Cluster the kubeconfig belongs to
    #[arg(long)]
    pub cluster: String,

    /// Kubeconfig to convert
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Service principal application ID
    #[arg(long, env = "AZURE_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Azure AD tenant ID
    #[arg(long, env = "AZURE_TENANT_ID")]
    pub tenant_id: Option<String>,

    /// Subscription ID
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID", default_value = "")]
    pub subscription_id: String,

    /// Service principal secret
    #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true, value_parser = parse_secret)]
    pub client_secret: Option<ClientSecret>,

    /// kubelogin executable (default: looked up on PATH)
    #[arg(long, env = "KUBELOGIN_PATH")]
    pub kubelogin_path: Option<PathBuf>,

    /// Also export KUBECONFIG while the helper runs
    #[arg(long)]
    pub legacy_env: bool,

    /// Seconds the helper may run before it is killed
    #[arg(long, default_value = "60")]
    pub timeout_secs: u64,
}

fn parse_secret(value: &str) -> std::result::Result<ClientSecret, Infallible> {
    Ok(ClientSecret::new(value))
}

impl ConvertKubeconfigArgs {
    /// Credentials from flags or environment; `None` unless all three of
    /// client ID, tenant ID and secret are present
    pub fn credentials_provider(&self) -> Option<StaticCredentialsProvider> {
        Some(StaticCredentialsProvider::new(Credentials {
            client_id: self.client_id.clone()?,
            client_secret: self.client_secret.clone()?,
            tenant_id: self.tenant_id.clone()?,
            subscription_id: self.subscription_id.clone(),
        }))
    }

    /// Exchanger configuration for these arguments
    pub fn exchanger_config(&self) -> ExchangerConfig {
        ExchangerConfig {
            helper_path: self.kubelogin_path.clone(),
            channel: if self.legacy_env {
                KubeconfigChannel::Environment
            } else {
                KubeconfigChannel::Argument
            },
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Run the convert-kubeconfig command
pub async fn run(args: ConvertKubeconfigArgs) -> Result<()> {
    let kubeconfig = tokio::fs::read(&args.input)
        .await
        .map_err(|e| Error::io(&args.input, e))?;

    let provider = args.credentials_provider();
    if provider.is_none() {
        debug!("No complete service principal credentials supplied");
    }

    let exchanger = CredentialExchanger::new(args.exchanger_config());
    let converted = exchanger
        .convert_kubeconfig(
            &args.cluster,
            &kubeconfig,
            provider.as_ref().map(|p| p as &dyn CredentialsProvider),
        )
        .await?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &converted)
                .await
                .map_err(|e| Error::io(path, e))?;
            eprintln!("Kubeconfig written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&converted)
                .and_then(|_| stdout.flush())
                .map_err(|e| Error::io(std::path::Path::new("<stdout>"), e))?;
        }
    }

    Ok(())
}
