//! Access to the identity objects and Secrets that back cluster credentials
//!
//! The store is the only piece of the credentials chain that talks to the
//! Kubernetes API, so tests substitute it with a mock.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::Api;
use kube::Client;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::crd::{AzureClusterIdentity, AzureClusterIdentitySpec};
use crate::Error;

/// Trait abstracting reads of identity objects and their Secrets
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Get an AzureClusterIdentity spec, `None` if it does not exist
    async fn get_cluster_identity(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<AzureClusterIdentitySpec>, Error>;

    /// Get the raw data of a Secret, `None` if the Secret does not exist
    async fn get_secret_data(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<BTreeMap<String, Vec<u8>>>, Error>;
}

/// Identity store backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeIdentityStore {
    client: Client,
}

impl KubeIdentityStore {
    /// Create a new store using the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityStore for KubeIdentityStore {
    async fn get_cluster_identity(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<AzureClusterIdentitySpec>, Error> {
        let api: Api<AzureClusterIdentity> = Api::namespaced(self.client.clone(), namespace);
        let identity = api.get_opt(name).await?;
        debug!(identity = %name, namespace = %namespace, found = identity.is_some(), "Fetched AzureClusterIdentity");
        Ok(identity.map(|i| i.spec))
    }

    async fn get_secret_data(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<BTreeMap<String, Vec<u8>>>, Error> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let Some(secret) = api.get_opt(name).await? else {
            return Ok(None);
        };

        let mut data: BTreeMap<String, Vec<u8>> = secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, v.0))
            .collect();
        // stringData is write-only on the server but shows up in fixtures
        if let Some(string_data) = secret.string_data {
            for (k, v) in string_data {
                data.entry(k).or_insert_with(|| v.into_bytes());
            }
        }
        Ok(Some(data))
    }
}
