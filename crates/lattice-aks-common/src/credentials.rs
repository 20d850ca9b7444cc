//! Azure service principal credentials
//!
//! A [`CredentialsProvider`] hands out the client id, tenant id and
//! subscription id synchronously and resolves the client secret on demand.
//! The secret is cached for the provider's lifetime, which is one reconcile
//! pass, and is never rendered by `Debug` or `Display`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;
use zeroize::Zeroizing;

use crate::crd::{AzureClusterIdentitySpec, AzureManagedControlPlane};
use crate::identity::IdentityStore;
use crate::{Error, Result};

/// Key of the client secret inside the referenced Secret
pub const CLIENT_SECRET_KEY: &str = "clientSecret";

/// Namespace used when neither the reference nor the referrer names one
const DEFAULT_NAMESPACE: &str = "default";

/// Service principal client secret (zeroized on drop, redacted in `Debug`)
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecret(Zeroizing<String>);

impl ClientSecret {
    /// Wrap a secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Borrow the secret value. Callers must not log it.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret([REDACTED])")
    }
}

/// Fully resolved service principal credentials
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Application (client) ID
    pub client_id: String,
    /// Client secret
    pub client_secret: ClientSecret,
    /// Directory (tenant) ID
    pub tenant_id: String,
    /// Subscription ID
    pub subscription_id: String,
}

/// Resolves service principal credentials for a cluster
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Application (client) ID
    fn client_id(&self) -> &str;

    /// Directory (tenant) ID
    fn tenant_id(&self) -> &str;

    /// Subscription ID
    fn subscription_id(&self) -> &str;

    /// Resolve the client secret
    async fn client_secret(&self) -> Result<ClientSecret>;

    /// Resolve all four values
    async fn credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            client_id: self.client_id().to_string(),
            client_secret: self.client_secret().await?,
            tenant_id: self.tenant_id().to_string(),
            subscription_id: self.subscription_id().to_string(),
        })
    }
}

#[async_trait]
impl<T: CredentialsProvider + ?Sized> CredentialsProvider for Arc<T> {
    fn client_id(&self) -> &str {
        (**self).client_id()
    }

    fn tenant_id(&self) -> &str {
        (**self).tenant_id()
    }

    fn subscription_id(&self) -> &str {
        (**self).subscription_id()
    }

    async fn client_secret(&self) -> Result<ClientSecret> {
        (**self).client_secret().await
    }
}

/// Credentials known up front (CLI flags, environment)
#[derive(Debug, Clone)]
pub struct StaticCredentialsProvider {
    credentials: Credentials,
}

impl StaticCredentialsProvider {
    /// Wrap already resolved credentials
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// Load credentials from the `AZURE_*` environment variables
    pub fn from_env() -> Option<Self> {
        Some(Self::new(Credentials {
            client_id: std::env::var("AZURE_CLIENT_ID").ok()?,
            client_secret: ClientSecret::new(std::env::var("AZURE_CLIENT_SECRET").ok()?),
            tenant_id: std::env::var("AZURE_TENANT_ID").ok()?,
            subscription_id: std::env::var("AZURE_SUBSCRIPTION_ID").unwrap_or_default(),
        }))
    }
}

#[async_trait]
impl CredentialsProvider for StaticCredentialsProvider {
    fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    fn tenant_id(&self) -> &str {
        &self.credentials.tenant_id
    }

    fn subscription_id(&self) -> &str {
        &self.credentials.subscription_id
    }

    async fn client_secret(&self) -> Result<ClientSecret> {
        Ok(self.credentials.client_secret.clone())
    }
}

/// Credentials resolved through a control plane's `identityRef`.
///
/// Chain: AzureManagedControlPlane → AzureClusterIdentity → Secret
/// (`clientSecret` key). The identity is read when the provider is built;
/// the Secret is read on the first `client_secret()` call.
pub struct ClusterIdentityCredentialsProvider<S> {
    store: S,
    identity: AzureClusterIdentitySpec,
    identity_namespace: String,
    subscription_id: String,
    secret: OnceCell<ClientSecret>,
}

impl<S: IdentityStore> ClusterIdentityCredentialsProvider<S> {
    /// Resolve the identity referenced by `control_plane`
    pub async fn new(store: S, control_plane: &AzureManagedControlPlane) -> Result<Self> {
        let cp_name = control_plane.metadata.name.as_deref().unwrap_or_default();
        let identity_ref = control_plane.spec.identity_ref.as_ref().ok_or_else(|| {
            Error::configuration_for(
                "credentials",
                format!("AzureManagedControlPlane {} has no identityRef", cp_name),
            )
        })?;

        let identity_namespace = identity_ref
            .namespace
            .clone()
            .or_else(|| control_plane.metadata.namespace.clone())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let identity_key = format!("{}/{}", identity_namespace, identity_ref.name);
        let identity = store
            .get_cluster_identity(&identity_ref.name, &identity_namespace)
            .await
            .map_err(|e| e.into_secret_resolution(&identity_key))?
            .ok_or_else(|| {
                Error::secret_resolution(&identity_key, "AzureClusterIdentity not found")
            })?;

        debug!(
            control_plane = %cp_name,
            identity = %identity_ref.name,
            "Resolved cluster identity"
        );

        Ok(Self {
            store,
            identity,
            identity_namespace,
            subscription_id: control_plane.spec.subscription_id.clone().unwrap_or_default(),
            secret: OnceCell::new(),
        })
    }

    async fn fetch_secret(&self) -> Result<ClientSecret> {
        let secret_ref = &self.identity.client_secret;
        let namespace = secret_ref
            .namespace
            .as_deref()
            .unwrap_or(&self.identity_namespace);
        let reference = format!("{}/{}", namespace, secret_ref.name);

        let data = self
            .store
            .get_secret_data(&secret_ref.name, namespace)
            .await
            .map_err(|e| e.into_secret_resolution(&reference))?
            .ok_or_else(|| Error::secret_resolution(&reference, "secret not found"))?;

        let raw = data.get(CLIENT_SECRET_KEY).ok_or_else(|| {
            Error::secret_resolution(
                format!("{}#{}", reference, CLIENT_SECRET_KEY),
                "key not present",
            )
        })?;

        let value = String::from_utf8(raw.clone()).map_err(|_| {
            Error::secret_resolution(
                format!("{}#{}", reference, CLIENT_SECRET_KEY),
                "value is not valid UTF-8",
            )
        })?;

        debug!(secret = %reference, "Resolved client secret");
        Ok(ClientSecret::new(value))
    }
}

#[async_trait]
impl<S: IdentityStore> CredentialsProvider for ClusterIdentityCredentialsProvider<S> {
    fn client_id(&self) -> &str {
        &self.identity.client_id
    }

    fn tenant_id(&self) -> &str {
        &self.identity.tenant_id
    }

    fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    async fn client_secret(&self) -> Result<ClientSecret> {
        self.secret
            .get_or_try_init(|| self.fetch_secret())
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use kube::core::ObjectMeta;

    use super::*;
    use crate::crd::{AzureManagedControlPlaneSpec, ObjectRef, SecretReference};
    use crate::identity::MockIdentityStore;

    fn control_plane(identity_ref: Option<ObjectRef>) -> AzureManagedControlPlane {
        AzureManagedControlPlane {
            metadata: ObjectMeta {
                name: Some("cluster1".to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            spec: AzureManagedControlPlaneSpec {
                subscription_id: Some("sub-123".to_string()),
                identity_ref,
                ..Default::default()
            },
        }
    }

    fn identity_ref() -> Option<ObjectRef> {
        Some(ObjectRef {
            kind: Some("AzureClusterIdentity".to_string()),
            name: "cluster-identity".to_string(),
            ..Default::default()
        })
    }

    fn identity_spec(secret_namespace: Option<&str>) -> AzureClusterIdentitySpec {
        AzureClusterIdentitySpec {
            client_id: "app-id".to_string(),
            tenant_id: "tenant-id".to_string(),
            client_secret: SecretReference {
                name: "sp-secret".to_string(),
                namespace: secret_namespace.map(String::from),
            },
        }
    }

    fn secret_with(key: &str, value: &[u8]) -> BTreeMap<String, Vec<u8>> {
        BTreeMap::from([(key.to_string(), value.to_vec())])
    }

    #[test]
    fn client_secret_debug_is_redacted() {
        let secret = ClientSecret::new("hunter2");
        let rendered = format!("{:?}", secret);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("REDACTED"));
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn credentials_debug_does_not_leak_secret() {
        let creds = Credentials {
            client_id: "app".to_string(),
            client_secret: ClientSecret::new("super-secret-value"),
            tenant_id: "tenant".to_string(),
            subscription_id: "sub".to_string(),
        };
        assert!(!format!("{:?}", creds).contains("super-secret-value"));
    }

    #[tokio::test]
    async fn static_provider_returns_values() {
        let provider = StaticCredentialsProvider::new(Credentials {
            client_id: "app".to_string(),
            client_secret: ClientSecret::new("s3cr3t"),
            tenant_id: "tenant".to_string(),
            subscription_id: "sub".to_string(),
        });
        let creds = provider.credentials().await.unwrap();
        assert_eq!(creds.client_id, "app");
        assert_eq!(creds.tenant_id, "tenant");
        assert_eq!(creds.subscription_id, "sub");
        assert_eq!(creds.client_secret.expose(), "s3cr3t");
    }

    #[tokio::test]
    async fn missing_identity_ref_is_configuration_error() {
        let store = MockIdentityStore::new();
        let result = ClusterIdentityCredentialsProvider::new(store, &control_plane(None)).await;
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[tokio::test]
    async fn missing_identity_is_secret_resolution_error() {
        let mut store = MockIdentityStore::new();
        store
            .expect_get_cluster_identity()
            .returning(|_, _| Ok(None));

        let result =
            ClusterIdentityCredentialsProvider::new(store, &control_plane(identity_ref())).await;
        match result {
            Err(Error::SecretResolution { reference, .. }) => {
                assert_eq!(reference, "default/cluster-identity")
            }
            _ => panic!("Expected SecretResolution error"),
        }
    }

    #[tokio::test]
    async fn secret_is_resolved_once_and_cached() {
        let mut store = MockIdentityStore::new();
        store
            .expect_get_cluster_identity()
            .withf(|name, ns| name == "cluster-identity" && ns == "default")
            .returning(|_, _| Ok(Some(identity_spec(Some("capz-system")))));
        store
            .expect_get_secret_data()
            .withf(|name, ns| name == "sp-secret" && ns == "capz-system")
            .times(1)
            .returning(|_, _| Ok(Some(secret_with(CLIENT_SECRET_KEY, b"s3cr3t"))));

        let provider = ClusterIdentityCredentialsProvider::new(store, &control_plane(identity_ref()))
            .await
            .unwrap();

        assert_eq!(provider.client_id(), "app-id");
        assert_eq!(provider.tenant_id(), "tenant-id");
        assert_eq!(provider.subscription_id(), "sub-123");
        assert_eq!(provider.client_secret().await.unwrap().expose(), "s3cr3t");
        assert_eq!(provider.client_secret().await.unwrap().expose(), "s3cr3t");
    }

    #[tokio::test]
    async fn secret_namespace_defaults_to_identity_namespace() {
        let mut store = MockIdentityStore::new();
        store
            .expect_get_cluster_identity()
            .returning(|_, _| Ok(Some(identity_spec(None))));
        store
            .expect_get_secret_data()
            .withf(|_, ns| ns == "default")
            .returning(|_, _| Ok(Some(secret_with(CLIENT_SECRET_KEY, b"value"))));

        let provider = ClusterIdentityCredentialsProvider::new(store, &control_plane(identity_ref()))
            .await
            .unwrap();
        assert!(provider.client_secret().await.is_ok());
    }

    #[tokio::test]
    async fn missing_secret_fails_without_caching() {
        let mut store = MockIdentityStore::new();
        store
            .expect_get_cluster_identity()
            .returning(|_, _| Ok(Some(identity_spec(None))));
        store
            .expect_get_secret_data()
            .times(2)
            .returning(|_, _| Ok(None));

        let provider = ClusterIdentityCredentialsProvider::new(store, &control_plane(identity_ref()))
            .await
            .unwrap();
        assert!(matches!(
            provider.client_secret().await,
            Err(Error::SecretResolution { .. })
        ));
        assert!(provider.client_secret().await.is_err());
    }

    #[tokio::test]
    async fn identity_lookup_failure_is_secret_resolution_error() {
        let mut store = MockIdentityStore::new();
        store.expect_get_cluster_identity().returning(|_, _| {
            Err(Error::io(
                "azureclusteridentities",
                std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out"),
            ))
        });

        let result =
            ClusterIdentityCredentialsProvider::new(store, &control_plane(identity_ref())).await;
        match result {
            Err(Error::SecretResolution { reference, .. }) => {
                assert_eq!(reference, "default/cluster-identity")
            }
            _ => panic!("Expected SecretResolution error"),
        }
    }

    #[tokio::test]
    async fn store_failure_is_secret_resolution_error() {
        let mut store = MockIdentityStore::new();
        store
            .expect_get_cluster_identity()
            .returning(|_, _| Ok(Some(identity_spec(Some("capz-system")))));
        store.expect_get_secret_data().returning(|_, _| {
            Err(Error::io(
                "secrets",
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
            ))
        });

        let provider = ClusterIdentityCredentialsProvider::new(store, &control_plane(identity_ref()))
            .await
            .unwrap();
        let err = provider.client_secret().await.unwrap_err();
        match &err {
            Error::SecretResolution { reference, message } => {
                assert_eq!(reference, "capz-system/sp-secret");
                assert!(message.contains("connection refused"));
            }
            other => panic!("Expected SecretResolution error, got {other:?}"),
        }
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn missing_key_names_reference_not_value() {
        let mut store = MockIdentityStore::new();
        store
            .expect_get_cluster_identity()
            .returning(|_, _| Ok(Some(identity_spec(None))));
        store
            .expect_get_secret_data()
            .returning(|_, _| Ok(Some(secret_with("password", b"do-not-print"))));

        let provider = ClusterIdentityCredentialsProvider::new(store, &control_plane(identity_ref()))
            .await
            .unwrap();
        let err = provider.client_secret().await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("default/sp-secret#clientSecret"));
        assert!(!msg.contains("do-not-print"));
    }

    #[tokio::test]
    async fn undecodable_secret_is_secret_resolution_error() {
        let mut store = MockIdentityStore::new();
        store
            .expect_get_cluster_identity()
            .returning(|_, _| Ok(Some(identity_spec(None))));
        store
            .expect_get_secret_data()
            .returning(|_, _| Ok(Some(secret_with(CLIENT_SECRET_KEY, &[0xff, 0xfe, 0xfd]))));

        let provider = ClusterIdentityCredentialsProvider::new(store, &control_plane(identity_ref()))
            .await
            .unwrap();
        match provider.client_secret().await {
            Err(Error::SecretResolution { message, .. }) => assert!(message.contains("UTF-8")),
            other => panic!("Expected SecretResolution error, got {:?}", other.map(|_| ())),
        }
    }
}
