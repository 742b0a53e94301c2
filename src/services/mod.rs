// Services module - cluster-facing helpers used by commands
pub mod kubeconfig;

pub use kubeconfig::{Kubeconfig, KubeconfigError, resolve_api_host};
