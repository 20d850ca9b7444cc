//! Read models for the declarative objects supplied by the host orchestrator
//!
//! Only the fields the scopes actually read are modelled. Admission and
//! defaulting belong to the owning providers; unknown fields are ignored on
//! deserialization.

mod capi;
mod capz;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use capi::{Cluster, ClusterSpec, MachinePool, MachinePoolSpec};
pub use capz::{
    AzureClusterIdentity, AzureClusterIdentitySpec, AzureMachinePool, AzureMachinePoolSpec,
    AzureManagedControlPlane, AzureManagedControlPlaneSpec, AzureManagedMachinePool,
    AzureManagedMachinePoolSpec, ManagedControlPlaneSubnet, ManagedControlPlaneVirtualNetwork,
    ManagedMachinePoolScaling, NodePoolMode, OsType, SecretReference, VmIdentity,
};

/// Reference to another object by kind and name
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
    /// API version of the referent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Kind of the referent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Name of the referent
    pub name: String,
    /// Namespace of the referent; defaults to the referrer's namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}
