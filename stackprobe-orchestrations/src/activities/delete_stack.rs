//! Delete stack activity (teardown)
//!
//! Best effort: a failed delete is logged and otherwise indistinguishable
//! from a successful one.

use stackprobe_models::StackHandle;

use crate::clients::StackService;

/// Activity name for logging
pub const NAME: &str = "stackprobe::activity::delete-stack";

pub async fn activity(stacks: &dyn StackService, handle: &StackHandle) {
    tracing::info!(activity = NAME, stack = %handle, "Tearing down stack");

    match stacks.delete_stack(handle).await {
        Ok(()) => tracing::info!(activity = NAME, "Delete stack requested."),
        Err(e) => {
            tracing::warn!(activity = NAME, stack = %handle, "Delete stack not accepted: {}", e)
        }
    }
}
