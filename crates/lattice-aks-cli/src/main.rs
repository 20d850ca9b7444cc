//! lattice-aks CLI
//!
//! Converts AKS kubeconfigs to service principal login and previews derived
//! agent pool specs.

use clap::Parser;

use lattice_aks_cli::{Cli, Result};
use lattice_aks_common::telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_telemetry(TelemetryConfig {
        format: cli.log_format,
        ..Default::default()
    })?;

    cli.run().await
}
