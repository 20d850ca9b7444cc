//! Scopes for lattice-aks reconcile passes
//!
//! A scope is assembled once per pass from already-fetched declarative
//! objects. It derives desired-state specs and exposes the narrow capabilities
//! services consume (see [`roles`]).

#![deny(missing_docs)]

pub mod conditions;
pub mod machine_pool;
pub mod managed_control_plane;
pub mod resource_id;
pub mod roles;
pub mod spec;

pub use conditions::{Condition, ConditionStatus};
pub use machine_pool::MachinePoolScope;
pub use managed_control_plane::{
    derive_node_pool_spec, validate_pool_ownership, ManagedControlPlaneScope,
    ManagedControlPlaneScopeParams,
};
pub use roles::{ClusterDescriber, RoleAssignmentScope, VmssExtensionScope};
pub use spec::{
    AutoScaling, ExtensionSpec, NodePoolSpec, ResourceSpec, RoleAssignmentResourceType,
    RoleAssignmentSpec,
};
