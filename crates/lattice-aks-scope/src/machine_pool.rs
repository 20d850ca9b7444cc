//! Scope for a scale-set backed machine pool
//!
//! Supplies the role assignment and VM extension specs for one
//! `AzureMachinePool` and records the bootstrap condition reported back by the
//! extension service.

use std::collections::BTreeMap;

use kube::ResourceExt;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use lattice_aks_common::crd::{AzureMachinePool, AzureManagedControlPlane, OsType, VmIdentity};
use lattice_aks_common::{Error, Result};

use crate::conditions::{bootstrap_condition, Condition};
use crate::roles::{ClusterDescriber, RoleAssignmentScope, VmssExtensionScope};
use crate::spec::{ExtensionSpec, RoleAssignmentResourceType, RoleAssignmentSpec};

/// Publisher of the bootstrap-status extensions
pub const BOOTSTRAP_EXTENSION_PUBLISHER: &str = "Microsoft.Azure.ContainerUpstream";

/// Version of the bootstrap-status extensions
pub const BOOTSTRAP_EXTENSION_VERSION: &str = "1.0";

/// Extension name used on Linux pools
pub const LINUX_BOOTSTRAP_EXTENSION: &str = "CAPZ.Linux.Bootstrapping";

/// Extension name used on Windows pools
pub const WINDOWS_BOOTSTRAP_EXTENSION: &str = "CAPZ.Windows.Bootstrapping";

const COMMAND_SETTING: &str = "commandToExecute";

const LINUX_BOOTSTRAP_COMMAND: &str = "for i in $(seq 1 120); do test -f /run/cluster-api/bootstrap-success.complete && break; if [ $i -eq 120 ]; then exit 1; else sleep 5; fi; done";

const WINDOWS_BOOTSTRAP_COMMAND: &str = "powershell.exe -Command \"for ($i = 0; $i -lt 120; $i++) { if (Test-Path 'C:\\run\\cluster-api\\bootstrap-success.complete') { break } else { Start-Sleep -Seconds 5 } }; if (-not (Test-Path 'C:\\run\\cluster-api\\bootstrap-success.complete')) { exit -2 }\"";

/// Per-pass scope for an `AzureMachinePool`
pub struct MachinePoolScope {
    cluster_name: String,
    resource_group: String,
    location: String,
    subscription_id: String,
    pool: AzureMachinePool,
    bootstrap: Mutex<Option<Condition>>,
}

impl MachinePoolScope {
    /// Build a scope for `pool` in the cluster managed by `control_plane`
    pub fn new(
        cluster_name: impl Into<String>,
        control_plane: &AzureManagedControlPlane,
        pool: AzureMachinePool,
    ) -> Result<Self> {
        let cluster_name = cluster_name.into();
        if cluster_name.is_empty() {
            return Err(Error::configuration_for("scope", "cluster name is empty"));
        }
        if pool.metadata.name.is_none() {
            return Err(Error::configuration_for("scope", "AzureMachinePool has no name"));
        }

        let cp = &control_plane.spec;
        let location = pool
            .spec
            .location
            .clone()
            .or_else(|| cp.location.clone())
            .unwrap_or_default();

        Ok(Self {
            cluster_name,
            resource_group: cp.resource_group_name.clone().unwrap_or_default(),
            location,
            subscription_id: cp.subscription_id.clone().unwrap_or_default(),
            pool,
            bootstrap: Mutex::new(None),
        })
    }

    /// Name of the pool, which is also the scale set name
    pub fn name(&self) -> String {
        self.pool.name_any()
    }

    fn default_role_assignment_name(&self) -> String {
        let seed = format!(
            "{}/{}/{}",
            self.subscription_id,
            self.resource_group,
            self.name()
        );
        Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()).to_string()
    }
}

impl ClusterDescriber for MachinePoolScope {
    fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    fn resource_group(&self) -> &str {
        &self.resource_group
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn subscription_id(&self) -> &str {
        &self.subscription_id
    }
}

impl RoleAssignmentScope for MachinePoolScope {
    fn role_assignment_specs(&self) -> Vec<RoleAssignmentSpec> {
        if self.pool.spec.identity != VmIdentity::SystemAssigned {
            return Vec::new();
        }

        let name = self
            .pool
            .spec
            .role_assignment_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.default_role_assignment_name());

        vec![RoleAssignmentSpec {
            machine_name: self.name(),
            name,
            resource_type: RoleAssignmentResourceType::VirtualMachineScaleSet,
        }]
    }
}

impl VmssExtensionScope for MachinePoolScope {
    fn vmss_extension_specs(&self) -> Vec<ExtensionSpec> {
        let (name, command) = match self.pool.spec.os_type {
            OsType::Linux => (LINUX_BOOTSTRAP_EXTENSION, LINUX_BOOTSTRAP_COMMAND),
            OsType::Windows => (WINDOWS_BOOTSTRAP_EXTENSION, WINDOWS_BOOTSTRAP_COMMAND),
        };

        vec![ExtensionSpec {
            name: name.to_string(),
            vm_name: self.name(),
            publisher: BOOTSTRAP_EXTENSION_PUBLISHER.to_string(),
            version: BOOTSTRAP_EXTENSION_VERSION.to_string(),
            protected_settings: Some(BTreeMap::from([(
                COMMAND_SETTING.to_string(),
                command.to_string(),
            )])),
        }]
    }

    fn set_bootstrap_condition(&self, provisioning_state: &str, extension_name: &str) -> Result<()> {
        let (condition, result) = bootstrap_condition(provisioning_state, extension_name);
        debug!(
            pool = %self.name(),
            extension = %extension_name,
            state = %provisioning_state,
            status = ?condition.status,
            "Recorded bootstrap condition"
        );
        *self.bootstrap.lock() = Some(condition);
        result
    }

    fn bootstrap_condition(&self) -> Option<Condition> {
        self.bootstrap.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use kube::api::ObjectMeta;

    use super::*;
    use crate::conditions::{ConditionStatus, BOOTSTRAP_IN_PROGRESS_REASON};
    use crate::spec::ResourceSpec;
    use lattice_aks_common::crd::{AzureMachinePoolSpec, AzureManagedControlPlaneSpec};

    fn control_plane() -> AzureManagedControlPlane {
        AzureManagedControlPlane {
            metadata: ObjectMeta {
                name: Some("cluster1".to_string()),
                ..Default::default()
            },
            spec: AzureManagedControlPlaneSpec {
                subscription_id: Some("sub-1".to_string()),
                resource_group_name: Some("cluster1-rg".to_string()),
                location: Some("eastus".to_string()),
                ..Default::default()
            },
        }
    }

    fn pool(identity: VmIdentity, os_type: OsType) -> AzureMachinePool {
        AzureMachinePool {
            metadata: ObjectMeta {
                name: Some("pool0".to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            spec: AzureMachinePoolSpec {
                vm_size: "Standard_D2s_v3".to_string(),
                identity,
                os_type,
                ..Default::default()
            },
        }
    }

    fn scope(identity: VmIdentity, os_type: OsType) -> MachinePoolScope {
        MachinePoolScope::new("cluster1", &control_plane(), pool(identity, os_type)).unwrap()
    }

    #[test]
    fn identifiers_come_from_control_plane() {
        let s = scope(VmIdentity::None, OsType::Linux);
        assert_eq!(s.cluster_name(), "cluster1");
        assert_eq!(s.resource_group(), "cluster1-rg");
        assert_eq!(s.location(), "eastus");
        assert_eq!(s.subscription_id(), "sub-1");
    }

    #[test]
    fn pool_location_overrides_control_plane() {
        let mut p = pool(VmIdentity::None, OsType::Linux);
        p.spec.location = Some("westus2".to_string());
        let s = MachinePoolScope::new("cluster1", &control_plane(), p).unwrap();
        assert_eq!(s.location(), "westus2");
    }

    #[test]
    fn empty_cluster_name_is_rejected() {
        let result = MachinePoolScope::new("", &control_plane(), pool(VmIdentity::None, OsType::Linux));
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn no_role_assignment_without_system_identity() {
        assert!(scope(VmIdentity::None, OsType::Linux)
            .role_assignment_specs()
            .is_empty());
        assert!(scope(VmIdentity::UserAssigned, OsType::Linux)
            .role_assignment_specs()
            .is_empty());
    }

    #[test]
    fn system_identity_gets_stable_generated_name() {
        let first = scope(VmIdentity::SystemAssigned, OsType::Linux).role_assignment_specs();
        let second = scope(VmIdentity::SystemAssigned, OsType::Linux).role_assignment_specs();

        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
        assert_eq!(first[0].machine_name, "pool0");
        assert_eq!(
            first[0].resource_type,
            RoleAssignmentResourceType::VirtualMachineScaleSet
        );
        assert!(Uuid::parse_str(&first[0].name).is_ok());
    }

    #[test]
    fn declared_role_assignment_name_wins() {
        let mut p = pool(VmIdentity::SystemAssigned, OsType::Linux);
        p.spec.role_assignment_name = Some("my-assignment".to_string());
        let s = MachinePoolScope::new("cluster1", &control_plane(), p).unwrap();
        assert_eq!(s.role_assignment_specs()[0].key(), "my-assignment");
    }

    #[test]
    fn extension_follows_os_type() {
        let linux = scope(VmIdentity::None, OsType::Linux).vmss_extension_specs();
        assert_eq!(linux.len(), 1);
        assert_eq!(linux[0].name, LINUX_BOOTSTRAP_EXTENSION);
        assert_eq!(linux[0].publisher, BOOTSTRAP_EXTENSION_PUBLISHER);
        assert_eq!(linux[0].version, "1.0");
        assert_eq!(linux[0].key(), "pool0/CAPZ.Linux.Bootstrapping");
        assert!(linux[0]
            .protected_settings
            .as_ref()
            .is_some_and(|s| s.contains_key(COMMAND_SETTING)));

        let windows = scope(VmIdentity::None, OsType::Windows).vmss_extension_specs();
        assert_eq!(windows[0].name, WINDOWS_BOOTSTRAP_EXTENSION);
    }

    #[test]
    fn bootstrap_condition_is_recorded() {
        let s = scope(VmIdentity::None, OsType::Linux);
        assert!(s.bootstrap_condition().is_none());

        let err = s
            .set_bootstrap_condition("Creating", LINUX_BOOTSTRAP_EXTENSION)
            .unwrap_err();
        assert!(err.is_retryable());
        let cond = s.bootstrap_condition().unwrap();
        assert_eq!(cond.status, ConditionStatus::False);
        assert_eq!(cond.reason, BOOTSTRAP_IN_PROGRESS_REASON);

        s.set_bootstrap_condition("Succeeded", LINUX_BOOTSTRAP_EXTENSION)
            .unwrap();
        assert_eq!(s.bootstrap_condition().unwrap().status, ConditionStatus::True);
    }
}
