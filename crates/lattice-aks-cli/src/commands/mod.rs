//! CLI commands

pub mod convert_kubeconfig;
pub mod node_pool_spec;
