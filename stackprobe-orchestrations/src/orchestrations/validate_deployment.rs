//! Run one post-deploy check against a deadline

use stackprobe_models::{StackStatus, ValidationOutcome};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::bounded_poller::{BoundedPoller, RaceOutcome};
use crate::checks::DeploymentCheck;
use crate::error::PollerError;
use crate::names::stages;
use crate::types::describe_duration;

/// Runs `check` inside a [`BoundedPoller`]; `on_timeout` runs once if the
/// deadline fires first and the outcome is then `TimedOut`.
pub async fn validate_deployment<Abort, AbortFut>(
    check: Arc<dyn DeploymentCheck>,
    status: Arc<StackStatus>,
    deadline: Duration,
    on_timeout: Abort,
    cancel: &CancellationToken,
) -> Result<ValidationOutcome, PollerError>
where
    Abort: FnOnce() -> AbortFut,
    AbortFut: Future<Output = ()>,
{
    let name = check.name().to_string();
    let poller = BoundedPoller::new(format!("{}::{}", stages::VALIDATE_DEPLOYMENT, name), deadline);

    let worker_check = check.clone();
    let outcome = poller
        .race(
            cancel,
            move |token| async move { worker_check.run(status, token).await },
            on_timeout,
        )
        .await?;

    Ok(match outcome {
        RaceOutcome::Completed(outcome) => outcome,
        RaceOutcome::TimedOut { deadline } => ValidationOutcome::timed_out(
            name,
            format!("timed out after {}", describe_duration(deadline)),
        ),
    })
}
