//! Reconcilers for Azure resources owned by a machine pool
//!
//! Each service reads its desired specs from a narrow scope, converges them
//! through a cloud client seam, and reports per-spec failures as one
//! [`ReconcileErrors`].

#![deny(missing_docs)]

pub mod cloud;
pub mod reconciler;
pub mod role_assignments;
pub mod vmss_extensions;

pub use cloud::{
    IdentityClient, RoleAssignment, RoleAssignmentProperties, RoleAssignmentsClient,
    VmssExtension, VmssExtensionParameters, VmssExtensionsClient,
};
pub use reconciler::{reconcile_specs, ReconcileErrors, Reconciler, ReconcilerConfig};
pub use role_assignments::RoleAssignmentService;
pub use vmss_extensions::VmssExtensionService;
