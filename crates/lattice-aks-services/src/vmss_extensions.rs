//! Scale set extensions
//!
//! Installs the extensions a scope asks for. An extension that already
//! exists is never modified: its provisioning state is handed to the scope,
//! which turns it into the bootstrap condition.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, Instrument};

use lattice_aks_common::{Error, Result};
use lattice_aks_scope::{ExtensionSpec, VmssExtensionScope};

use crate::cloud::{VmssExtensionParameters, VmssExtensionsClient};
use crate::reconciler::{reconcile_specs, ReconcileErrors, Reconciler, ReconcilerConfig};

const SERVICE_NAME: &str = "vmssextensions";

/// Reconciles the scale set extensions a scope asks for
pub struct VmssExtensionService<S> {
    scope: Arc<S>,
    client: Arc<dyn VmssExtensionsClient>,
    config: ReconcilerConfig,
}

impl<S: VmssExtensionScope> VmssExtensionService<S> {
    /// Create a service for `scope`
    pub fn new(scope: Arc<S>, client: Arc<dyn VmssExtensionsClient>) -> Self {
        Self {
            scope,
            client,
            config: ReconcilerConfig::default(),
        }
    }

    /// Override reconcile tuning
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    async fn reconcile_one(&self, spec: ExtensionSpec) -> Result<()> {
        let resource_group = self.scope.resource_group();

        let existing = match self.client.get(resource_group, &spec.vm_name, &spec.name).await {
            Ok(found) => found,
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(Error::cloud_api("get scale set extension", e)),
        };

        if let Some(ext) = existing {
            let state = ext.provisioning_state.as_deref().unwrap_or_default();
            debug!(extension = %spec.name, vmss = %spec.vm_name, state = %state, "Extension exists");
            return self.scope.set_bootstrap_condition(state, &spec.name);
        }

        let parameters = VmssExtensionParameters {
            name: spec.name.clone(),
            publisher: spec.publisher,
            version: spec.version,
            protected_settings: spec.protected_settings,
        };
        self.client
            .create(resource_group, &spec.vm_name, parameters)
            .await
            .map_err(|e| Error::cloud_api("create scale set extension", e))?;

        info!(extension = %spec.name, vmss = %spec.vm_name, "Created scale set extension");
        Ok(())
    }
}

#[async_trait]
impl<S: VmssExtensionScope> Reconciler for VmssExtensionService<S> {
    async fn reconcile(&self) -> std::result::Result<(), ReconcileErrors> {
        let span = self.scope.span(SERVICE_NAME);
        async {
            let specs = self.scope.vmss_extension_specs();
            debug!(count = specs.len(), "Reconciling scale set extensions");
            reconcile_specs(specs, &self.config, |spec| self.reconcile_one(spec)).await
        }
        .instrument(span)
        .await
    }

    async fn delete(&self) -> std::result::Result<(), ReconcileErrors> {
        self.scope.span(SERVICE_NAME).in_scope(|| {
            debug!("Extensions are removed with their scale set, nothing to delete")
        });
        Ok(())
    }
}
