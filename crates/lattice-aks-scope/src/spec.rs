//! Desired-state descriptions of cloud resources
//!
//! Specs are plain values built fresh for each reconcile pass. Every spec that
//! a service converges carries a stable key used for idempotent existence
//! checks and for attributing failures.

use std::fmt;

use lattice_aks_common::crd::NodePoolMode;
use serde::Serialize;

/// A spec with a stable identity
pub trait ResourceSpec: Send + Sync {
    /// Key identifying the cloud resource this spec describes
    fn key(&self) -> String;
}

/// Autoscaler bounds of a node pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoScaling {
    /// Minimum node count
    pub min_count: i32,
    /// Maximum node count
    pub max_count: i32,
}

/// Desired state of a managed cluster agent pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolSpec {
    /// Agent pool name
    pub name: String,
    /// VM size
    pub sku: String,
    /// System or User
    pub mode: NodePoolMode,
    /// Owning cluster name
    pub cluster: String,
    /// Desired node count
    pub replicas: u32,
    /// Full resource ID of the subnet the nodes attach to
    pub vnet_subnet_id: String,
    /// Autoscaler bounds; `None` when the pool declares no scaling policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_scaling: Option<AutoScaling>,
}

impl ResourceSpec for NodePoolSpec {
    fn key(&self) -> String {
        format!("{}/{}", self.cluster, self.name)
    }
}

/// Kind of compute resource whose identity receives a role assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoleAssignmentResourceType {
    /// A single virtual machine
    VirtualMachine,
    /// A virtual machine scale set
    VirtualMachineScaleSet,
}

impl fmt::Display for RoleAssignmentResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleAssignmentResourceType::VirtualMachine => f.write_str("VirtualMachine"),
            RoleAssignmentResourceType::VirtualMachineScaleSet => {
                f.write_str("VirtualMachineScaleSet")
            }
        }
    }
}

/// A binding of a machine's system-assigned identity to a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignmentSpec {
    /// VM or scale set whose identity is bound
    pub machine_name: String,
    /// Role assignment name (a GUID)
    pub name: String,
    /// Kind of `machine_name`
    pub resource_type: RoleAssignmentResourceType,
}

impl ResourceSpec for RoleAssignmentSpec {
    fn key(&self) -> String {
        self.name.clone()
    }
}

/// A VM extension installed on a scale set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionSpec {
    /// Extension name
    pub name: String,
    /// Scale set the extension is installed on
    pub vm_name: String,
    /// Extension publisher
    pub publisher: String,
    /// Extension handler version
    pub version: String,
    /// Settings passed encrypted to the extension
    #[serde(skip)]
    pub protected_settings: Option<std::collections::BTreeMap<String, String>>,
}

impl ResourceSpec for ExtensionSpec {
    fn key(&self) -> String {
        format!("{}/{}", self.vm_name, self.name)
    }
}
