//! Role assignments for machine identities
//!
//! Grants the system-assigned identity of each scale set the Contributor role
//! on its subscription. Existing assignments are left untouched.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, Instrument};

use lattice_aks_common::{Error, Result};
use lattice_aks_scope::resource_id::{role_definition_id, subscription_scope, CONTRIBUTOR_ROLE_ID};
use lattice_aks_scope::{RoleAssignmentScope, RoleAssignmentSpec};

use crate::cloud::{IdentityClient, RoleAssignmentProperties, RoleAssignmentsClient};
use crate::reconciler::{reconcile_specs, ReconcileErrors, Reconciler, ReconcilerConfig};

const SERVICE_NAME: &str = "roleassignments";

/// Reconciles the role assignments a scope asks for
pub struct RoleAssignmentService<S> {
    scope: Arc<S>,
    assignments: Arc<dyn RoleAssignmentsClient>,
    identities: Arc<dyn IdentityClient>,
    config: ReconcilerConfig,
}

impl<S: RoleAssignmentScope> RoleAssignmentService<S> {
    /// Create a service for `scope`
    pub fn new(
        scope: Arc<S>,
        assignments: Arc<dyn RoleAssignmentsClient>,
        identities: Arc<dyn IdentityClient>,
    ) -> Self {
        Self {
            scope,
            assignments,
            identities,
            config: ReconcilerConfig::default(),
        }
    }

    /// Override reconcile tuning
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    async fn reconcile_one(&self, spec: RoleAssignmentSpec) -> Result<()> {
        let subscription = self.scope.subscription_id();
        let scope = subscription_scope(subscription);

        let existing = match self.assignments.get(&scope, &spec.name).await {
            Ok(found) => found,
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(Error::cloud_api("get role assignment", e)),
        };
        if existing.is_some() {
            debug!(role_assignment = %spec.name, "Role assignment already exists");
            return Ok(());
        }

        let principal_id = self
            .identities
            .principal_id(self.scope.resource_group(), spec.resource_type, &spec.machine_name)
            .await
            .map_err(|e| Error::cloud_api(format!("get principal ID of {}", spec.machine_name), e))?;

        let properties = RoleAssignmentProperties {
            principal_id,
            role_definition_id: role_definition_id(subscription, CONTRIBUTOR_ROLE_ID),
        };
        self.assignments
            .create(&scope, &spec.name, properties)
            .await
            .map_err(|e| Error::cloud_api("create role assignment", e))?;

        info!(
            role_assignment = %spec.name,
            machine = %spec.machine_name,
            resource_type = %spec.resource_type,
            "Created role assignment"
        );
        Ok(())
    }
}

#[async_trait]
impl<S: RoleAssignmentScope> Reconciler for RoleAssignmentService<S> {
    async fn reconcile(&self) -> std::result::Result<(), ReconcileErrors> {
        let span = self.scope.span(SERVICE_NAME);
        async {
            let specs = self.scope.role_assignment_specs();
            debug!(count = specs.len(), "Reconciling role assignments");
            reconcile_specs(specs, &self.config, |spec| self.reconcile_one(spec)).await
        }
        .instrument(span)
        .await
    }

    async fn delete(&self) -> std::result::Result<(), ReconcileErrors> {
        self.scope.span(SERVICE_NAME).in_scope(|| {
            debug!("Role assignments are removed with their scale set, nothing to delete")
        });
        Ok(())
    }
}
