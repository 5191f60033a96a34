//! Name constants for stackprobe checks, stack outputs and parameters
//!
//! Following the naming convention: {crate-name}::{type}::{name}

/// Stage names, used as poller labels in logs
pub mod stages {
    /// Waiting for the stack to reach `CREATE_COMPLETE`
    pub const WAIT_FOR_READY: &str = "stackprobe::orchestration::wait-for-ready";

    /// Running one post-deploy check
    pub const VALIDATE_DEPLOYMENT: &str = "stackprobe::orchestration::validate-deployment";
}

/// Post-deploy check names
pub mod checks {
    /// Number of overlay network leases equals the number of cluster nodes
    ///
    /// **Reads:** output [`super::outputs::OVERLORD_IP`], parameters
    /// [`super::parameters::MASTER_COUNT`] and [`super::parameters::MINION_COUNT`]
    pub const OVERLAY_NETWORKS_COUNT: &str = "overlay_networks_count";
}

/// Stack output keys
pub mod outputs {
    /// Address of the node running the coordination service
    pub const OVERLORD_IP: &str = "overlord_ip";
}

/// Stack input parameters
pub mod parameters {
    pub const MASTER_COUNT: &str = "kubernetes-master-count";
    pub const MINION_COUNT: &str = "kubernetes-minion-count";
}

/// Coordination service (etcd v2) defaults
pub mod etcd {
    pub const CLIENT_PORT: u16 = 2379;
    pub const API_VERSION: &str = "v2";
    pub const NETWORK_NAMESPACE: &str = "coreos.com/network";
}
