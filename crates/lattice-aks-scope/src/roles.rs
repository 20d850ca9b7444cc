//! Narrow capability interfaces consumed by the services
//!
//! Each service depends on exactly the capabilities it uses: cluster
//! identifiers (also used to label its tracing span) plus one spec-list
//! accessor. Test doubles implement a handful of methods instead of the whole
//! scope surface.

use lattice_aks_common::Result;

use crate::conditions::Condition;
use crate::spec::{ExtensionSpec, RoleAssignmentSpec};

/// Identifiers of the cluster a scope belongs to
pub trait ClusterDescriber: Send + Sync {
    /// Cluster name
    fn cluster_name(&self) -> &str;

    /// Resource group holding the cluster's resources
    fn resource_group(&self) -> &str;

    /// Azure region
    fn location(&self) -> &str;

    /// Subscription ID
    fn subscription_id(&self) -> &str;

    /// Span that scopes every log line of one reconcile pass
    fn span(&self, service: &'static str) -> tracing::Span {
        tracing::info_span!(
            "reconcile",
            service = service,
            cluster = %self.cluster_name(),
            resource_group = %self.resource_group(),
            location = %self.location()
        )
    }
}

/// Capabilities of the role assignment service
pub trait RoleAssignmentScope: ClusterDescriber {
    /// Role assignments that should exist
    fn role_assignment_specs(&self) -> Vec<RoleAssignmentSpec>;
}

/// Capabilities of the VMSS extension service
pub trait VmssExtensionScope: ClusterDescriber {
    /// Extensions that should be installed
    fn vmss_extension_specs(&self) -> Vec<ExtensionSpec>;

    /// Record the bootstrap condition derived from an existing extension's
    /// provisioning state. Returns an error while bootstrapping is still in
    /// progress or after it failed.
    fn set_bootstrap_condition(&self, provisioning_state: &str, extension_name: &str)
        -> Result<()>;

    /// Last recorded bootstrap condition
    fn bootstrap_condition(&self) -> Option<Condition>;
}
