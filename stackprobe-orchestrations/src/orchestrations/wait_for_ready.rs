//! Wait for a submitted stack to reach `CREATE_COMPLETE`
//!
//! The status poll loop runs inside a [`BoundedPoller`] and never deletes
//! anything itself. Teardown happens once the race has resolved: as the
//! poller's timeout action when the deadline fires, or here when the loop
//! reports a non-complete terminal status or an unreadable stack.

use stackprobe_models::{StackHandle, StackPhase, StackStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use super::bounded_poller::{BoundedPoller, RaceOutcome};
use crate::activities::{delete_stack, get_stack_status};
use crate::clients::StackService;
use crate::error::ProvisionError;
use crate::names::stages;
use crate::types::describe_duration;

pub async fn wait_for_ready(
    stacks: Arc<dyn StackService>,
    handle: Arc<StackHandle>,
    max_wait: Duration,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Result<StackStatus, ProvisionError> {
    let poller = BoundedPoller::new(stages::WAIT_FOR_READY, max_wait);
    let started = Instant::now();

    let watch_stacks = stacks.clone();
    let watch_handle = handle.clone();

    let outcome = poller
        .race(
            cancel,
            move |token| watch_stack_creation(watch_stacks, watch_handle, poll_interval, token),
            {
                let stacks = stacks.clone();
                let handle = handle.clone();
                move || async move {
                    tracing::error!("Stack create timed out after {}", describe_duration(max_wait));
                    delete_stack::activity(stacks.as_ref(), &handle).await;
                }
            },
        )
        .await?;

    match outcome {
        RaceOutcome::Completed(Ok(status)) => {
            tracing::info!(
                "Stack ready after {} seconds: {}",
                started.elapsed().as_secs(),
                status.reason
            );
            Ok(status)
        }
        RaceOutcome::Completed(Err(
            e @ (ProvisionError::Failed { .. } | ProvisionError::StatusUnavailable(_)),
        )) => {
            delete_stack::activity(stacks.as_ref(), &handle).await;
            Err(e)
        }
        RaceOutcome::Completed(Err(e)) => Err(e),
        RaceOutcome::TimedOut { deadline } => Err(ProvisionError::TimedOut { deadline }),
    }
}

/// Poll until the stack leaves `CREATE_IN_PROGRESS`.
///
/// Returns `Cancelled` when `token` fires; the party that cancelled owns
/// cleanup.
async fn watch_stack_creation(
    stacks: Arc<dyn StackService>,
    handle: Arc<StackHandle>,
    poll_interval: Duration,
    token: CancellationToken,
) -> Result<StackStatus, ProvisionError> {
    loop {
        let fetched = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ProvisionError::Cancelled),
            fetched = get_stack_status::activity(stacks.as_ref(), &handle) => fetched,
        };

        let status = match fetched {
            Ok(status) => status,
            Err(e) => {
                if token.is_cancelled() {
                    return Err(ProvisionError::Cancelled);
                }
                tracing::error!(stack = %handle, "Unable to read stack status: {}", e);
                return Err(ProvisionError::StatusUnavailable(e));
            }
        };

        match status.phase() {
            StackPhase::InProgress => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(ProvisionError::Cancelled),
                    _ = time::sleep(poll_interval) => {}
                }
            }
            StackPhase::Complete => return Ok(status),
            StackPhase::OtherTerminal(code) => {
                if token.is_cancelled() {
                    return Err(ProvisionError::Cancelled);
                }
                tracing::error!("Stack Status: {}", code);
                tracing::error!("Stack Status Reason: {}", status.reason);
                return Err(ProvisionError::Failed {
                    status: code,
                    reason: status.reason,
                });
            }
        }
    }
}
