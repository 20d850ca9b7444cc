//! Error types for lattice-aks
//!
//! Errors are structured with fields so that the outer control loop can decide
//! whether to requeue. Secret material never appears in any variant: secret
//! failures name the reference that could not be resolved, not its content.

use std::fmt;

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Error returned by a cloud provider API call.
///
/// Kept opaque to the core but structured enough for callers to classify it:
/// `status` is the HTTP status when the request reached the service, `code` the
/// provider error code (e.g. `ResourceNotFound`, `AuthorizationFailed`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudApiError {
    /// HTTP status code, if a response was received
    pub status: Option<u16>,
    /// Provider-specific error code
    pub code: Option<String>,
    /// Human readable message
    pub message: String,
}

impl CloudApiError {
    /// Error with an HTTP status and message
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            code: None,
            message: message.into(),
        }
    }

    /// Error that never received a response (DNS, connection reset, timeout)
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    /// Attach a provider error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Whether the resource addressed by the call does not exist
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    /// Transport failures, throttling, timeouts and 5xx are worth retrying.
    /// Any other 4xx means the request itself is wrong.
    pub fn is_retryable(&self) -> bool {
        match self.status {
            None => true,
            Some(408) | Some(429) => true,
            Some(s) => s >= 500,
        }
    }
}

impl fmt::Display for CloudApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, &self.code) {
            (Some(status), Some(code)) => write!(f, "{} ({}): {}", status, code, self.message),
            (Some(status), None) => write!(f, "{}: {}", status, self.message),
            (None, _) => write!(f, "transport: {}", self.message),
        }
    }
}

impl std::error::Error for CloudApiError {}

/// Main error type for lattice-aks operations
#[derive(Debug, Error)]
pub enum Error {
    /// Missing credentials provider or required scope data
    #[error("configuration error [{context}]: {message}")]
    Configuration {
        /// Where the missing configuration was needed (e.g. "kubelogin", "scope")
        context: String,
        /// What is missing
        message: String,
    },

    /// Secret lookup or decode failure
    #[error("secret resolution error for {reference}: {message}")]
    SecretResolution {
        /// `namespace/name` (or `namespace/name#key`) of the reference
        reference: String,
        /// What went wrong; never contains secret material
        message: String,
    },

    /// External helper not found, failed to start, or exited non-zero
    #[error("external process error [{program}]: {message}")]
    ExternalProcess {
        /// Helper executable name or path
        program: String,
        /// Description or captured standard error
        message: String,
        /// Exit code when the process ran to completion
        exit_code: Option<i32>,
    },

    /// Cloud provider API failure
    #[error("cloud API error [{operation}]: {source}")]
    CloudApi {
        /// Operation that failed (e.g. "create role assignment")
        operation: String,
        /// Underlying API error
        source: CloudApiError,
    },

    /// A cloud resource exists but has not finished provisioning
    #[error("{resource} is still provisioning: {message}")]
    Pending {
        /// Resource being waited on
        resource: String,
        /// Current state
        message: String,
    },

    /// A cloud resource reached a terminal failed state
    #[error("{resource} failed to provision: {message}")]
    ProvisioningFailed {
        /// Failed resource
        resource: String,
        /// Reported state or reason
        message: String,
    },

    /// Temporary file write/read failure
    #[error("io error at {path}: {source}")]
    Io {
        /// Path being accessed
        path: String,
        /// Underlying io error
        source: std::io::Error,
    },

    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },
}

impl Error {
    /// Create a configuration error without specific context
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            context: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
        }
    }

    /// Create a configuration error with context
    pub fn configuration_for(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Configuration {
            context: context.into(),
            message: msg.into(),
        }
    }

    /// Create a secret resolution error for a reference
    pub fn secret_resolution(reference: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::SecretResolution {
            reference: reference.into(),
            message: msg.into(),
        }
    }

    /// Reclassify a failure met while resolving `reference` as a secret
    /// resolution error. Errors that already are one pass through unchanged.
    pub fn into_secret_resolution(self, reference: impl Into<String>) -> Self {
        match self {
            Error::SecretResolution { .. } => self,
            other => Self::SecretResolution {
                reference: reference.into(),
                message: format!("lookup failed: {}", other),
            },
        }
    }

    /// Create an external process error that did not produce an exit code
    pub fn external_process(program: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ExternalProcess {
            program: program.into(),
            message: msg.into(),
            exit_code: None,
        }
    }

    /// Create an external process error for a non-zero exit
    pub fn external_process_exit(
        program: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::ExternalProcess {
            program: program.into(),
            message: stderr.into(),
            exit_code,
        }
    }

    /// Wrap a cloud API error with the operation that produced it
    pub fn cloud_api(operation: impl Into<String>, source: CloudApiError) -> Self {
        Self::CloudApi {
            operation: operation.into(),
            source,
        }
    }

    /// Create a pending error for a resource that is still provisioning
    pub fn pending(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Pending {
            resource: resource.into(),
            message: msg.into(),
        }
    }

    /// Create a provisioning failure error
    pub fn provisioning_failed(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ProvisioningFailed {
            resource: resource.into(),
            message: msg.into(),
        }
    }

    /// Wrap an io error with the path being accessed
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with resource kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Check if this error is retryable
    ///
    /// Configuration and serialization errors need a spec fix. Secret
    /// resolution is retried because the referenced Secret is often created
    /// after the cluster objects.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Configuration { .. } => false,
            Error::SecretResolution { .. } => true,
            Error::ExternalProcess { .. } => true,
            Error::CloudApi { source, .. } => source.is_retryable(),
            Error::Pending { .. } => true,
            Error::ProvisioningFailed { .. } => false,
            Error::Io { .. } => true,
            Error::Kube { source } => !matches!(
                source,
                kube::Error::Api(ae) if (400..500).contains(&ae.code)
            ),
            Error::Serialization { .. } => false,
        }
    }

    /// Get the context if this error has one
    pub fn context(&self) -> Option<&str> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            Error::CloudApi { operation, .. } => Some(operation),
            _ => None,
        }
    }
}
