//! Scoped `KUBECONFIG` override for the environment channel

use std::ffi::OsString;
use std::path::Path;

use tokio::sync::Mutex;

use lattice_aks_common::KUBECONFIG_ENV;

/// Serializes every environment-channel conversion in the process
pub(crate) static KUBECONFIG_ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Points `KUBECONFIG` at a path until dropped, then restores the previous
/// value, or removes the variable if it was unset.
///
/// Hold [`KUBECONFIG_ENV_LOCK`] for the guard's whole lifetime.
#[derive(Debug)]
pub(crate) struct KubeconfigEnvGuard {
    previous: Option<OsString>,
}

impl KubeconfigEnvGuard {
    pub(crate) fn set(path: &Path) -> Self {
        let previous = std::env::var_os(KUBECONFIG_ENV);
        std::env::set_var(KUBECONFIG_ENV, path);
        Self { previous }
    }
}

impl Drop for KubeconfigEnvGuard {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => std::env::set_var(KUBECONFIG_ENV, value),
            None => std::env::remove_var(KUBECONFIG_ENV),
        }
    }
}
