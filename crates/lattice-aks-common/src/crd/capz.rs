//! Azure infrastructure provider objects (`infrastructure.cluster.x-k8s.io`)

use std::fmt;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ObjectRef;

/// Managed (AKS) control plane for a cluster.
///
/// Example:
/// ```yaml
/// apiVersion: infrastructure.cluster.x-k8s.io/v1beta1
/// kind: AzureManagedControlPlane
/// metadata:
///   name: cluster1
/// spec:
///   subscriptionID: 00000000-0000-0000-0000-000000000000
///   resourceGroupName: cluster1-rg
///   location: westeurope
///   virtualNetwork:
///     name: cluster1-vnet
///     subnet:
///       name: cluster1-subnet
///   identityRef:
///     kind: AzureClusterIdentity
///     name: cluster-identity
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "AzureManagedControlPlane",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct AzureManagedControlPlaneSpec {
    /// Subscription the cluster lives in
    #[serde(
        rename = "subscriptionID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub subscription_id: Option<String>,

    /// Resource group holding the managed cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<String>,

    /// Azure region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Kubernetes version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Virtual network the node pools attach to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_network: Option<ManagedControlPlaneVirtualNetwork>,

    /// Reference to the AzureClusterIdentity used for cloud calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_ref: Option<ObjectRef>,
}

/// Virtual network settings of a managed control plane
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedControlPlaneVirtualNetwork {
    /// Virtual network name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Address space of the virtual network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr_block: Option<String>,

    /// Resource group of the virtual network when it differs from the cluster's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,

    /// Subnet the node pools attach to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<ManagedControlPlaneSubnet>,
}

/// Subnet settings of a managed control plane
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedControlPlaneSubnet {
    /// Subnet name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Address prefix of the subnet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr_block: Option<String>,
}

/// Agent pool of a managed cluster.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "AzureManagedMachinePool",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct AzureManagedMachinePoolSpec {
    /// Name of the agent pool in Azure; defaults to the object name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// System pools host critical add-ons, user pools host workloads
    pub mode: NodePoolMode,

    /// VM size of the pool's nodes
    pub sku: String,

    /// OS disk size in GB
    #[serde(
        rename = "osDiskSizeGB",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub os_disk_size_gb: Option<i32>,

    /// Cluster autoscaler bounds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<ManagedMachinePoolScaling>,
}

/// Autoscaler bounds declared on an agent pool
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedMachinePoolScaling {
    /// Minimum node count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<i32>,

    /// Maximum node count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<i32>,
}

/// Agent pool mode
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum NodePoolMode {
    /// Hosts critical system pods
    System,
    /// Hosts application workloads
    #[default]
    User,
}

impl NodePoolMode {
    /// The mode string as sent to the cloud API
    pub fn as_str(&self) -> &'static str {
        match self {
            NodePoolMode::System => "System",
            NodePoolMode::User => "User",
        }
    }
}

impl fmt::Display for NodePoolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Self-managed pool backed by a virtual machine scale set.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "AzureMachinePool",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct AzureMachinePoolSpec {
    /// Azure region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// VM size of the scale set instances
    #[serde(default)]
    pub vm_size: String,

    /// Operating system of the instances
    #[serde(default)]
    pub os_type: OsType,

    /// Identity assigned to the scale set
    #[serde(default)]
    pub identity: VmIdentity,

    /// Name (a GUID) of the role assignment granted to a system-assigned identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_assignment_name: Option<String>,
}

/// Managed identity assigned to a VM or scale set
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum VmIdentity {
    /// No identity
    #[default]
    None,
    /// Identity created and owned by the scale set
    SystemAssigned,
    /// Pre-existing identities attached to the scale set
    UserAssigned,
}

/// Operating system of pool instances
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum OsType {
    /// Linux nodes
    #[default]
    Linux,
    /// Windows nodes
    Windows,
}

/// Service principal identity used to talk to Azure.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "AzureClusterIdentity",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct AzureClusterIdentitySpec {
    /// Application (client) ID of the service principal
    #[serde(rename = "clientID")]
    pub client_id: String,

    /// Directory (tenant) ID of the service principal
    #[serde(rename = "tenantID")]
    pub tenant_id: String,

    /// Secret holding the client secret under the `clientSecret` key
    pub client_secret: SecretReference,
}

/// Reference to a Kubernetes Secret
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct SecretReference {
    /// Secret name
    pub name: String,
    /// Secret namespace; defaults to the referrer's namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}
