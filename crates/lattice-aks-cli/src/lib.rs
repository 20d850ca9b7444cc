//! lattice-aks CLI library

pub mod commands;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};
use lattice_aks_common::telemetry::LogFormat;

/// lattice-aks - AKS node pool and kubeconfig tooling
#[derive(Parser, Debug)]
#[command(name = "lattice-aks")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log output format (text or json)
    #[arg(long, global = true, env = "LATTICE_AKS_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite a kubeconfig to log in as a service principal
    ConvertKubeconfig(commands::convert_kubeconfig::ConvertKubeconfigArgs),
    /// Print the agent pool spec derived from cluster manifests
    NodePoolSpec(commands::node_pool_spec::NodePoolSpecArgs),
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::ConvertKubeconfig(args) => commands::convert_kubeconfig::run(args).await,
            Commands::NodePoolSpec(args) => commands::node_pool_spec::run(args).await,
        }
    }
}
