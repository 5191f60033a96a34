//! Overlay network count check
//!
//! Every node in the cluster leases one overlay subnet from the coordination
//! service, so once the cluster has settled the number of leases equals
//! masters + minions.

use async_trait::async_trait;
use stackprobe_models::{StackStatus, ValidationOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tokio_util::sync::CancellationToken;

use super::DeploymentCheck;
use crate::clients::CoordinationService;
use crate::names::{checks, outputs, parameters};

pub struct OverlayNetworksCount {
    coordination: Arc<dyn CoordinationService>,
    poll_interval: Duration,
}

impl OverlayNetworksCount {
    pub fn new(coordination: Arc<dyn CoordinationService>, poll_interval: Duration) -> Self {
        Self { coordination, poll_interval }
    }
}

/// Where to look and how many leases to expect
#[derive(Debug, PartialEq, Eq)]
struct Target {
    address: String,
    expected: usize,
}

fn target(status: &StackStatus) -> Result<Target, String> {
    let address = status
        .output_str(outputs::OVERLORD_IP)
        .filter(|ip| !ip.is_empty())
        .ok_or_else(|| format!("stack output '{}' is missing", outputs::OVERLORD_IP))?;

    let masters = count_parameter(status, parameters::MASTER_COUNT)?;
    let minions = count_parameter(status, parameters::MINION_COUNT)?;

    Ok(Target {
        address: address.to_string(),
        expected: masters + minions,
    })
}

fn count_parameter(status: &StackStatus, name: &str) -> Result<usize, String> {
    let raw = status
        .parameter(name)
        .ok_or_else(|| format!("stack parameter '{}' is missing", name))?;

    raw.trim()
        .parse::<usize>()
        .map_err(|e| format!("stack parameter '{}' is not a count ({:?}): {}", name, raw, e))
}

#[async_trait]
impl DeploymentCheck for OverlayNetworksCount {
    fn name(&self) -> &str {
        checks::OVERLAY_NETWORKS_COUNT
    }

    async fn run(&self, status: Arc<StackStatus>, cancel: CancellationToken) -> ValidationOutcome {
        let name = self.name();

        let Target { address, expected } = match target(&status) {
            Ok(target) => target,
            Err(msg) => return ValidationOutcome::failed(name, msg),
        };

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let observed = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                observed = self.coordination.subnet_count(&address) => observed,
            };

            match observed {
                Ok(count) if count == expected => {
                    tracing::info!(
                        check = name,
                        attempt,
                        "Overlay networks match the cluster size ({})",
                        count
                    );
                    return ValidationOutcome::passed(name);
                }
                Ok(count) => tracing::info!(
                    check = name,
                    attempt,
                    "{}: ExpectedCount: {}, OverlayNetworkCount: {}",
                    name,
                    expected,
                    count
                ),
                Err(e) => {
                    tracing::warn!(check = name, attempt, "Failed to list overlay networks: {}", e)
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = time::sleep(self.poll_interval) => {}
            }
        }

        ValidationOutcome::timed_out(name, format!("stopped after {} attempt(s)", attempt))
    }
}
