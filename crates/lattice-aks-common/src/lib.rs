//! Common types for lattice-aks: errors, declarative read models, credentials

#![deny(missing_docs)]

pub mod credentials;
pub mod crd;
pub mod error;
pub mod identity;
pub mod telemetry;

pub use credentials::{
    ClientSecret, ClusterIdentityCredentialsProvider, Credentials, CredentialsProvider,
    StaticCredentialsProvider,
};
pub use error::{CloudApiError, Error};
pub use identity::{IdentityStore, KubeIdentityStore};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Environment variable naming the active kubeconfig
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// Environment variable overriding the kubelogin executable location
pub const KUBELOGIN_PATH_ENV: &str = "KUBELOGIN_PATH";

/// Provider name used in Azure resource IDs for networking
pub const NETWORK_PROVIDER: &str = "Microsoft.Network";
