//! Fetch stack status activity

use stackprobe_models::{StackHandle, StackStatus};

use crate::clients::StackService;
use crate::error::ClientError;

/// Activity name for logging
pub const NAME: &str = "stackprobe::activity::get-stack-status";

pub async fn activity(
    stacks: &dyn StackService,
    handle: &StackHandle,
) -> Result<StackStatus, ClientError> {
    let status = stacks.stack_status(handle).await?;
    tracing::info!(activity = NAME, "Stack Status: {}", status.status);
    Ok(status)
}
