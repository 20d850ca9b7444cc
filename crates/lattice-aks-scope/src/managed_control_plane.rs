//! Scope for one agent pool of a managed (AKS) cluster
//!
//! Assembled per reconcile pass from objects the orchestrator already fetched.
//! Deriving the [`NodePoolSpec`] is pure: no I/O, no shared state, and missing
//! optional fields degrade to empty strings rather than errors.

use kube::ResourceExt;
use tracing::debug;

use lattice_aks_common::crd::{
    AzureManagedControlPlane, AzureManagedMachinePool, Cluster, MachinePool,
    ManagedMachinePoolScaling,
};
use lattice_aks_common::{CredentialsProvider, Error, Result};

use crate::resource_id::subnet_id;
use crate::roles::ClusterDescriber;
use crate::spec::{AutoScaling, NodePoolSpec};

/// Desired replicas reported for every agent pool.
///
/// Held constant even when autoscaler bounds are declared; the autoscaler owns
/// the live count once the pool exists.
pub const BASELINE_REPLICAS: u32 = 1;

/// Inputs for [`ManagedControlPlaneScope::new`]
pub struct ManagedControlPlaneScopeParams<P> {
    /// CAPI Cluster
    pub cluster: Cluster,
    /// AKS control plane
    pub control_plane: AzureManagedControlPlane,
    /// CAPI MachinePool owning the agent pool
    pub machine_pool: MachinePool,
    /// Infrastructure agent pool
    pub infra_machine_pool: AzureManagedMachinePool,
    /// Credentials for the cluster's subscription
    pub credentials: P,
}

/// Per-pass scope for an AKS agent pool
pub struct ManagedControlPlaneScope<P> {
    cluster: Cluster,
    control_plane: AzureManagedControlPlane,
    machine_pool: MachinePool,
    infra_machine_pool: AzureManagedMachinePool,
    credentials: P,
}

impl<P: CredentialsProvider> ManagedControlPlaneScope<P> {
    /// Build a scope, checking that the pool belongs to the cluster
    pub fn new(params: ManagedControlPlaneScopeParams<P>) -> Result<Self> {
        validate_pool_ownership(&params.cluster, &params.machine_pool)?;

        debug!(
            cluster = %params.cluster.name_any(),
            pool = %params.infra_machine_pool.name_any(),
            "Created managed control plane scope"
        );

        Ok(Self {
            cluster: params.cluster,
            control_plane: params.control_plane,
            machine_pool: params.machine_pool,
            infra_machine_pool: params.infra_machine_pool,
            credentials: params.credentials,
        })
    }

    /// Desired state of the agent pool
    pub fn node_pool_spec(&self) -> NodePoolSpec {
        derive_node_pool_spec(&self.cluster, &self.control_plane, &self.infra_machine_pool)
    }

    /// Credentials for the cluster's subscription
    pub fn credentials(&self) -> &P {
        &self.credentials
    }

    /// The CAPI MachinePool this scope was built for
    pub fn machine_pool(&self) -> &MachinePool {
        &self.machine_pool
    }
}

impl<P: CredentialsProvider> ClusterDescriber for ManagedControlPlaneScope<P> {
    fn cluster_name(&self) -> &str {
        self.cluster.metadata.name.as_deref().unwrap_or_default()
    }

    fn resource_group(&self) -> &str {
        self.control_plane
            .spec
            .resource_group_name
            .as_deref()
            .unwrap_or_default()
    }

    fn location(&self) -> &str {
        self.control_plane.spec.location.as_deref().unwrap_or_default()
    }

    fn subscription_id(&self) -> &str {
        self.credentials.subscription_id()
    }
}

/// Check that `machine_pool` belongs to the named `cluster`
pub fn validate_pool_ownership(cluster: &Cluster, machine_pool: &MachinePool) -> Result<()> {
    let cluster_name = cluster.name_any();
    if cluster_name.is_empty() {
        return Err(Error::configuration_for("scope", "cluster has no name"));
    }
    if machine_pool.spec.cluster_name != cluster_name {
        return Err(Error::configuration_for(
            "scope",
            format!(
                "MachinePool {} belongs to cluster {:?}, not {}",
                machine_pool.name_any(),
                machine_pool.spec.cluster_name,
                cluster_name
            ),
        ));
    }
    Ok(())
}

/// Derive the desired state of an agent pool.
///
/// - name: the pool's `spec.name`, else its object name
/// - sku and mode: copied from the infrastructure pool
/// - replicas: [`BASELINE_REPLICAS`]
/// - auto scaling: present only when both bounds are declared
/// - subnet: built from the control plane's subscription and virtual network,
///   absent segments left empty
pub fn derive_node_pool_spec(
    cluster: &Cluster,
    control_plane: &AzureManagedControlPlane,
    infra_pool: &AzureManagedMachinePool,
) -> NodePoolSpec {
    let cp = &control_plane.spec;
    let vnet = cp.virtual_network.as_ref();

    let subscription = cp.subscription_id.as_deref().unwrap_or_default();
    let resource_group = vnet
        .and_then(|v| v.resource_group.as_deref())
        .or(cp.resource_group_name.as_deref())
        .unwrap_or_default();
    let vnet_name = vnet.and_then(|v| v.name.as_deref()).unwrap_or_default();
    let subnet_name = vnet
        .and_then(|v| v.subnet.as_ref())
        .and_then(|s| s.name.as_deref())
        .unwrap_or_default();

    NodePoolSpec {
        name: infra_pool
            .spec
            .name
            .clone()
            .or_else(|| infra_pool.metadata.name.clone())
            .unwrap_or_default(),
        sku: infra_pool.spec.sku.clone(),
        mode: infra_pool.spec.mode,
        cluster: cluster.metadata.name.clone().unwrap_or_default(),
        replicas: BASELINE_REPLICAS,
        vnet_subnet_id: subnet_id(subscription, resource_group, vnet_name, subnet_name),
        auto_scaling: infra_pool.spec.scaling.as_ref().and_then(auto_scaling),
    }
}

fn auto_scaling(scaling: &ManagedMachinePoolScaling) -> Option<AutoScaling> {
    match (scaling.min_size, scaling.max_size) {
        (Some(min_count), Some(max_count)) => Some(AutoScaling {
            min_count,
            max_count,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use kube::api::ObjectMeta;

    use super::*;
    use lattice_aks_common::crd::{
        AzureManagedControlPlaneSpec, AzureManagedMachinePoolSpec, ClusterSpec,
        MachinePoolSpec, ManagedControlPlaneSubnet, ManagedControlPlaneVirtualNetwork,
        NodePoolMode,
    };
    use lattice_aks_common::{ClientSecret, Credentials, StaticCredentialsProvider};

    const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";
    const EMPTY_SUBNET_ID: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups//providers/Microsoft.Network/virtualNetworks//subnets/";

    fn meta(name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("default".to_string()),
            ..Default::default()
        }
    }

    fn cluster() -> Cluster {
        Cluster {
            metadata: meta("cluster1"),
            spec: ClusterSpec::default(),
        }
    }

    fn control_plane() -> AzureManagedControlPlane {
        AzureManagedControlPlane {
            metadata: meta("cluster1"),
            spec: AzureManagedControlPlaneSpec {
                subscription_id: Some(SUBSCRIPTION.to_string()),
                ..Default::default()
            },
        }
    }

    fn machine_pool(name: &str) -> MachinePool {
        MachinePool {
            metadata: meta(name),
            spec: MachinePoolSpec {
                cluster_name: "cluster1".to_string(),
                replicas: Some(3),
            },
        }
    }

    fn azure_machine_pool(name: &str, mode: NodePoolMode) -> AzureManagedMachinePool {
        AzureManagedMachinePool {
            metadata: meta(name),
            spec: AzureManagedMachinePoolSpec {
                name: Some(name.to_string()),
                mode,
                sku: "Standard_D2s_v3".to_string(),
                os_disk_size_gb: None,
                scaling: None,
            },
        }
    }

    fn azure_machine_pool_with_scaling(name: &str, min: i32, max: i32) -> AzureManagedMachinePool {
        let mut pool = azure_machine_pool(name, NodePoolMode::User);
        pool.spec.scaling = Some(ManagedMachinePoolScaling {
            min_size: Some(min),
            max_size: Some(max),
        });
        pool
    }

    fn credentials() -> StaticCredentialsProvider {
        StaticCredentialsProvider::new(Credentials {
            client_id: "app".to_string(),
            client_secret: ClientSecret::new("secret"),
            tenant_id: "tenant".to_string(),
            subscription_id: SUBSCRIPTION.to_string(),
        })
    }

    fn scope(
        pool: MachinePool,
        infra: AzureManagedMachinePool,
    ) -> Result<ManagedControlPlaneScope<StaticCredentialsProvider>> {
        ManagedControlPlaneScope::new(ManagedControlPlaneScopeParams {
            cluster: cluster(),
            control_plane: control_plane(),
            machine_pool: pool,
            infra_machine_pool: infra,
            credentials: credentials(),
        })
    }

    #[test]
    fn without_autoscaling() {
        let s = scope(
            machine_pool("pool0"),
            azure_machine_pool("pool0", NodePoolMode::System),
        )
        .unwrap();

        assert_eq!(
            s.node_pool_spec(),
            NodePoolSpec {
                name: "pool0".to_string(),
                sku: "Standard_D2s_v3".to_string(),
                mode: NodePoolMode::System,
                cluster: "cluster1".to_string(),
                replicas: 1,
                vnet_subnet_id: EMPTY_SUBNET_ID.to_string(),
                auto_scaling: None,
            }
        );
    }

    #[test]
    fn with_autoscaling() {
        let s = scope(
            machine_pool("pool1"),
            azure_machine_pool_with_scaling("pool1", 2, 10),
        )
        .unwrap();

        assert_eq!(
            s.node_pool_spec(),
            NodePoolSpec {
                name: "pool1".to_string(),
                sku: "Standard_D2s_v3".to_string(),
                mode: NodePoolMode::User,
                cluster: "cluster1".to_string(),
                replicas: 1,
                vnet_subnet_id: EMPTY_SUBNET_ID.to_string(),
                auto_scaling: Some(AutoScaling {
                    min_count: 2,
                    max_count: 10,
                }),
            }
        );
    }

    #[test]
    fn replicas_ignore_declared_count_and_bounds() {
        let mut pool = machine_pool("pool1");
        pool.spec.replicas = Some(7);
        let s = scope(pool, azure_machine_pool_with_scaling("pool1", 4, 9)).unwrap();
        assert_eq!(s.node_pool_spec().replicas, BASELINE_REPLICAS);
    }

    #[test]
    fn partial_scaling_policy_is_absent() {
        let mut infra = azure_machine_pool("pool2", NodePoolMode::User);
        infra.spec.scaling = Some(ManagedMachinePoolScaling {
            min_size: Some(1),
            max_size: None,
        });
        let spec = derive_node_pool_spec(&cluster(), &control_plane(), &infra);
        assert!(spec.auto_scaling.is_none());

        infra.spec.scaling = Some(ManagedMachinePoolScaling::default());
        let spec = derive_node_pool_spec(&cluster(), &control_plane(), &infra);
        assert!(spec.auto_scaling.is_none());
    }

    #[test]
    fn derivation_is_deterministic() {
        let infra = azure_machine_pool_with_scaling("pool1", 2, 10);
        let first = derive_node_pool_spec(&cluster(), &control_plane(), &infra);
        let _other = derive_node_pool_spec(
            &cluster(),
            &control_plane(),
            &azure_machine_pool("pool0", NodePoolMode::System),
        );
        let second = derive_node_pool_spec(&cluster(), &control_plane(), &infra);
        assert_eq!(first, second);
    }

    #[test]
    fn name_falls_back_to_object_name() {
        let mut infra = azure_machine_pool("pool3", NodePoolMode::User);
        infra.spec.name = None;
        assert_eq!(
            derive_node_pool_spec(&cluster(), &control_plane(), &infra).name,
            "pool3"
        );

        infra.metadata.name = None;
        assert_eq!(
            derive_node_pool_spec(&cluster(), &control_plane(), &infra).name,
            ""
        );
    }

    #[test]
    fn subnet_id_uses_virtual_network() {
        let mut cp = control_plane();
        cp.spec.resource_group_name = Some("cluster1-rg".to_string());
        cp.spec.virtual_network = Some(ManagedControlPlaneVirtualNetwork {
            name: Some("cluster1-vnet".to_string()),
            subnet: Some(ManagedControlPlaneSubnet {
                name: Some("cluster1-subnet".to_string()),
                cidr_block: None,
            }),
            ..Default::default()
        });
        let infra = azure_machine_pool("pool0", NodePoolMode::System);

        assert_eq!(
            derive_node_pool_spec(&cluster(), &cp, &infra).vnet_subnet_id,
            "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/cluster1-rg/providers/Microsoft.Network/virtualNetworks/cluster1-vnet/subnets/cluster1-subnet"
        );

        cp.spec.virtual_network.as_mut().unwrap().resource_group = Some("net-rg".to_string());
        assert!(derive_node_pool_spec(&cluster(), &cp, &infra)
            .vnet_subnet_id
            .contains("/resourceGroups/net-rg/"));
    }

    #[test]
    fn missing_subscription_yields_empty_segment() {
        let mut cp = control_plane();
        cp.spec.subscription_id = None;
        let infra = azure_machine_pool("pool0", NodePoolMode::System);
        assert!(derive_node_pool_spec(&cluster(), &cp, &infra)
            .vnet_subnet_id
            .starts_with("/subscriptions//resourceGroups/"));
    }

    #[test]
    fn pool_from_another_cluster_is_rejected() {
        let mut pool = machine_pool("pool0");
        pool.spec.cluster_name = "other".to_string();
        let result = scope(pool, azure_machine_pool("pool0", NodePoolMode::System));
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn ownership_requires_named_cluster() {
        let pool = machine_pool("pool0");
        assert!(validate_pool_ownership(&cluster(), &pool).is_ok());

        let unnamed = Cluster {
            metadata: ObjectMeta::default(),
            spec: ClusterSpec::default(),
        };
        match validate_pool_ownership(&unnamed, &pool) {
            Err(Error::Configuration { message, .. }) => {
                assert_eq!(message, "cluster has no name")
            }
            other => panic!("Expected Configuration error, got {other:?}"),
        }
    }

    #[test]
    fn scope_exposes_cluster_identifiers_and_credentials() {
        let mut cp = control_plane();
        cp.spec.resource_group_name = Some("cluster1-rg".to_string());
        cp.spec.location = Some("westeurope".to_string());
        let s = ManagedControlPlaneScope::new(ManagedControlPlaneScopeParams {
            cluster: cluster(),
            control_plane: cp,
            machine_pool: machine_pool("pool0"),
            infra_machine_pool: azure_machine_pool("pool0", NodePoolMode::System),
            credentials: credentials(),
        })
        .unwrap();

        assert_eq!(s.cluster_name(), "cluster1");
        assert_eq!(s.resource_group(), "cluster1-rg");
        assert_eq!(s.location(), "westeurope");
        assert_eq!(s.subscription_id(), SUBSCRIPTION);
        assert_eq!(s.credentials().client_id(), "app");
        assert_eq!(s.machine_pool().name_any(), "pool0");
    }
}
