//! Cloud API seams used by the services
//!
//! Implementations wrap an already-authenticated SDK client. Only the calls
//! the services need are exposed; there are no update operations.

use std::collections::BTreeMap;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use lattice_aks_common::CloudApiError;
use lattice_aks_scope::RoleAssignmentResourceType;

/// A role assignment as returned by the authorization API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    /// Assignment name (a GUID)
    pub name: String,
    /// Scope the assignment applies to
    pub scope: String,
    /// Principal receiving the role
    pub principal_id: String,
    /// Fully qualified role definition ID
    pub role_definition_id: String,
}

/// Body of a role assignment create call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignmentProperties {
    /// Principal receiving the role
    pub principal_id: String,
    /// Fully qualified role definition ID
    pub role_definition_id: String,
}

/// A scale set extension as returned by the compute API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmssExtension {
    /// Extension name
    pub name: String,
    /// Extension publisher
    pub publisher: String,
    /// Handler version
    pub version: String,
    /// `Succeeded`, `Creating`, `Failed`, ...
    pub provisioning_state: Option<String>,
}

/// Body of a scale set extension create call
#[derive(Clone, PartialEq, Eq)]
pub struct VmssExtensionParameters {
    /// Extension name
    pub name: String,
    /// Extension publisher
    pub publisher: String,
    /// Handler version
    pub version: String,
    /// Settings sent encrypted to the VM
    pub protected_settings: Option<BTreeMap<String, String>>,
}

impl std::fmt::Debug for VmssExtensionParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VmssExtensionParameters")
            .field("name", &self.name)
            .field("publisher", &self.publisher)
            .field("version", &self.version)
            .field(
                "protected_settings",
                &self.protected_settings.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Role assignments API
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoleAssignmentsClient: Send + Sync {
    /// Fetch an assignment, `None` if it does not exist
    async fn get(&self, scope: &str, name: &str) -> Result<Option<RoleAssignment>, CloudApiError>;

    /// Create an assignment
    async fn create(
        &self,
        scope: &str,
        name: &str,
        properties: RoleAssignmentProperties,
    ) -> Result<RoleAssignment, CloudApiError>;
}

/// Resolves the system-assigned identity of compute resources
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Principal ID of the VM or scale set's system-assigned identity
    async fn principal_id(
        &self,
        resource_group: &str,
        resource_type: RoleAssignmentResourceType,
        name: &str,
    ) -> Result<String, CloudApiError>;
}

/// Scale set extensions API
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VmssExtensionsClient: Send + Sync {
    /// Fetch an extension, `None` if it does not exist
    async fn get(
        &self,
        resource_group: &str,
        vmss_name: &str,
        name: &str,
    ) -> Result<Option<VmssExtension>, CloudApiError>;

    /// Create an extension
    async fn create(
        &self,
        resource_group: &str,
        vmss_name: &str,
        extension: VmssExtensionParameters,
    ) -> Result<(), CloudApiError>;
}
