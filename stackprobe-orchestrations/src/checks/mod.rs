//! Post-deploy checks run against a completed stack

use async_trait::async_trait;
use stackprobe_models::{StackStatus, ValidationOutcome};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub mod overlay_networks;

pub use overlay_networks::OverlayNetworksCount;

/// A named check, run inside a bounded poller by
/// [`crate::orchestrations::validate_deployment`].
///
/// Implementations may poll until their condition holds; they should stop
/// promptly once `cancel` fires.
#[async_trait]
pub trait DeploymentCheck: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, status: Arc<StackStatus>, cancel: CancellationToken) -> ValidationOutcome;
}
