//! Azure resource identifier composition
//!
//! IDs are built from fixed templates. Segments are substituted verbatim, so an
//! empty segment yields an empty path component rather than an error; callers
//! compare these strings literally.

use lattice_aks_common::NETWORK_PROVIDER;

/// Built-in Contributor role definition GUID
pub const CONTRIBUTOR_ROLE_ID: &str = "b24988ac-6180-42a0-ab88-20f7382dd24c";

/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.Network/virtualNetworks/{vnet}/subnets/{subnet}`
pub fn subnet_id(subscription_id: &str, resource_group: &str, vnet: &str, subnet: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/{}/virtualNetworks/{}/subnets/{}",
        subscription_id, resource_group, NETWORK_PROVIDER, vnet, subnet
    )
}

/// Scope of a subscription-wide role assignment (trailing slash included)
pub fn subscription_scope(subscription_id: &str) -> String {
    format!("/subscriptions/{}/", subscription_id)
}

/// Fully qualified ID of a built-in role definition in a subscription
pub fn role_definition_id(subscription_id: &str, role_id: &str) -> String {
    format!(
        "/subscriptions/{}/providers/Microsoft.Authorization/roleDefinitions/{}",
        subscription_id, role_id
    )
}
