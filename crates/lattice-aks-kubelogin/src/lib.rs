//! Kubeconfig credential exchange for AKS clusters
//!
//! Turns an AKS admin or user kubeconfig into one that logs in as a service
//! principal by running the external `kubelogin convert-kubeconfig` helper.
//!
//! The kubeconfig location is handed to the helper as an explicit argument by
//! default, so concurrent conversions never contend on process state. The
//! [`KubeconfigChannel::Environment`] channel additionally exports
//! `KUBECONFIG` for the duration of the call; those calls are serialized.

#![deny(missing_docs)]

pub mod config;
mod env_guard;
pub mod exchanger;

pub use config::{ExchangerConfig, KubeconfigChannel};
pub use exchanger::CredentialExchanger;

/// Serializes tests that spawn helpers or touch `KUBECONFIG`
#[cfg(test)]
pub(crate) static TEST_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());
