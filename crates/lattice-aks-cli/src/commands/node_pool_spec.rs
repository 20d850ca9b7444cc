//! `lattice-aks node-pool-spec` - preview the agent pool derived from manifests
//!
//! Reads a multi-document YAML file holding a `Cluster`, an
//! `AzureManagedControlPlane`, a `MachinePool` and an `AzureManagedMachinePool`
//! and prints the resulting node pool spec.

use std::path::PathBuf;

use clap::Args;
use serde::Deserialize;

use lattice_aks_common::crd::{AzureManagedControlPlane, AzureManagedMachinePool, Cluster, MachinePool};
use lattice_aks_scope::{derive_node_pool_spec, validate_pool_ownership, NodePoolSpec};

use crate::{Error, Result};

/// Derive an agent pool spec from cluster manifests
#[derive(Args, Debug)]
pub struct NodePoolSpecArgs {
    /// Multi-document YAML manifest
    #[arg(short, long)]
    pub file: PathBuf,
}

/// Run the node-pool-spec command
pub async fn run(args: NodePoolSpecArgs) -> Result<()> {
    let manifests = tokio::fs::read_to_string(&args.file)
        .await
        .map_err(|e| Error::io(&args.file, e))?;

    let spec = node_pool_spec_from_manifests(&manifests)?;
    print!("{}", serde_yaml::to_string(&spec)?);
    Ok(())
}

#[derive(Default)]
struct Manifests {
    cluster: Option<Cluster>,
    control_plane: Option<AzureManagedControlPlane>,
    machine_pool: Option<MachinePool>,
    infra_pool: Option<AzureManagedMachinePool>,
}

/// Derive the node pool spec from the objects in `yaml`.
///
/// Documents of other kinds are ignored. Each required kind must appear
/// exactly once and the MachinePool must belong to the Cluster.
pub fn node_pool_spec_from_manifests(yaml: &str) -> Result<NodePoolSpec> {
    let mut found = Manifests::default();

    for document in serde_yaml::Deserializer::from_str(yaml) {
        let value = serde_yaml::Value::deserialize(document)?;
        let kind = value
            .get("kind")
            .and_then(|k| k.as_str())
            .unwrap_or_default()
            .to_string();

        match kind.as_str() {
            "Cluster" => set_once(&mut found.cluster, &kind, value)?,
            "AzureManagedControlPlane" => set_once(&mut found.control_plane, &kind, value)?,
            "MachinePool" => set_once(&mut found.machine_pool, &kind, value)?,
            "AzureManagedMachinePool" => set_once(&mut found.infra_pool, &kind, value)?,
            _ => {}
        }
    }

    let cluster = required(found.cluster, "Cluster")?;
    let control_plane = required(found.control_plane, "AzureManagedControlPlane")?;
    let machine_pool = required(found.machine_pool, "MachinePool")?;
    let infra_pool = required(found.infra_pool, "AzureManagedMachinePool")?;

    validate_pool_ownership(&cluster, &machine_pool)?;
    Ok(derive_node_pool_spec(&cluster, &control_plane, &infra_pool))
}

fn set_once<T: serde::de::DeserializeOwned>(
    slot: &mut Option<T>,
    kind: &str,
    value: serde_yaml::Value,
) -> Result<()> {
    if slot.is_some() {
        return Err(Error::validation(format!("manifest contains more than one {}", kind)));
    }
    *slot = Some(serde_yaml::from_value(value)?);
    Ok(())
}

fn required<T>(slot: Option<T>, kind: &str) -> Result<T> {
    slot.ok_or_else(|| Error::validation(format!("manifest is missing a {}", kind)))
}
