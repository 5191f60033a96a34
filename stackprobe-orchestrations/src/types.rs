//! Settings and outcome types for stackprobe orchestrations

use stackprobe_models::{StackHandle, ValidationOutcome};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ProvisionError;

// ============================================================================
// Settings
// ============================================================================

/// How the create-stack request is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Stack name prefix; the submission timestamp is appended
    pub name_prefix: String,
    /// Creation timeout handed to the provisioning service (minutes)
    pub creation_timeout_mins: u32,
    /// Ask the provisioning service not to roll back a failed stack
    pub disable_rollback: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            name_prefix: "stackprobe".to_string(),
            creation_timeout_mins: stackprobe_models::DEFAULT_CREATION_TIMEOUT_MINS,
            disable_rollback: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub submit: SubmitOptions,
    /// Deadline for the stack to reach `CREATE_COMPLETE` (default: 10 minutes)
    pub stack_timeout: Duration,
    /// Deadline for each post-deploy check (default: 1 minute)
    pub check_timeout: Duration,
    /// Delay between status polls (default: 10 seconds)
    pub poll_interval: Duration,
    /// Delete the stack after a fully successful run (default: keep it)
    pub teardown_on_success: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            submit: SubmitOptions::default(),
            stack_timeout: Duration::from_secs(10 * 60),
            check_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(10),
            teardown_on_success: false,
        }
    }
}

/// Human form of a deadline: whole minutes as "N mins", anything else in seconds
pub fn describe_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 && secs % 60 == 0 && duration.subsec_nanos() == 0 {
        format!("{} mins", secs / 60)
    } else if duration.subsec_nanos() == 0 {
        format!("{} secs", secs)
    } else {
        format!("{:.1} secs", duration.as_secs_f64())
    }
}

// ============================================================================
// Outcome
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Provisioning,
    Validation,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Provisioning => f.write_str("provisioning"),
            Stage::Validation => f.write_str("validation"),
        }
    }
}

/// Final result of one harness run, handed to the single top-level handler
#[derive(Debug)]
pub enum RunOutcome {
    /// Every check passed
    Success {
        stack: Arc<StackHandle>,
        validations: Vec<ValidationOutcome>,
        /// Whether the stack was deleted afterwards
        torn_down: bool,
    },
    /// Stack could not be submitted or reached a non-complete terminal status
    ProvisionFailed {
        stack: Option<Arc<StackHandle>>,
        error: ProvisionError,
    },
    /// A deadline fired
    Timeout {
        stage: Stage,
        stack: Arc<StackHandle>,
        deadline: Duration,
    },
    /// A check reported `Failed`
    ValidationFailed {
        stack: Arc<StackHandle>,
        outcome: ValidationOutcome,
    },
    /// The run was cancelled from outside (e.g. Ctrl-C)
    Interrupted { stack: Option<Arc<StackHandle>> },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }

    pub fn stack(&self) -> Option<&StackHandle> {
        match self {
            RunOutcome::Success { stack, .. }
            | RunOutcome::Timeout { stack, .. }
            | RunOutcome::ValidationFailed { stack, .. } => Some(&**stack),
            RunOutcome::ProvisionFailed { stack, .. } | RunOutcome::Interrupted { stack } => {
                stack.as_deref()
            }
        }
    }

    /// Process exit code: 0 on success, 130 when interrupted, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Success { .. } => 0,
            RunOutcome::Interrupted { .. } => 130,
            _ => 1,
        }
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Success { stack, validations, torn_down } => write!(
                f,
                "all {} check(s) passed for stack {} ({})",
                validations.len(),
                stack,
                if *torn_down { "deleted" } else { "left running" }
            ),
            RunOutcome::ProvisionFailed { error, .. } => {
                write!(f, "provisioning failed: {}", error)
            }
            RunOutcome::Timeout { stage, deadline, .. } => {
                write!(f, "{} timed out after {}", stage, describe_duration(*deadline))
            }
            RunOutcome::ValidationFailed { outcome, .. } => {
                write!(f, "validation failed: {}", outcome)
            }
            RunOutcome::Interrupted { .. } => f.write_str("run interrupted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let stack = Arc::new(StackHandle::new("http://heat/stacks/s/1"));

        let success =
            RunOutcome::Success { stack: stack.clone(), validations: vec![], torn_down: false };
        assert_eq!(success.exit_code(), 0);
        assert!(success.is_success());

        let timeout = RunOutcome::Timeout {
            stage: Stage::Validation,
            stack: stack.clone(),
            deadline: Duration::from_secs(60),
        };
        assert_eq!(timeout.exit_code(), 1);
        assert_eq!(timeout.to_string(), "validation timed out after 1 mins");
        assert_eq!(timeout.stack(), Some(stack.as_ref()));

        let interrupted = RunOutcome::Interrupted { stack: None };
        assert_eq!(interrupted.exit_code(), 130);
        assert!(interrupted.stack().is_none());
    }

    #[test]
    fn test_short_deadlines_are_reported_in_seconds() {
        assert_eq!(describe_duration(Duration::from_secs(600)), "10 mins");
        assert_eq!(describe_duration(Duration::from_secs(15)), "15 secs");
        assert_eq!(describe_duration(Duration::from_secs(90)), "90 secs");
        assert_eq!(describe_duration(Duration::from_millis(1500)), "1.5 secs");

        let timeout = RunOutcome::Timeout {
            stage: Stage::Provisioning,
            stack: Arc::new(StackHandle::new("http://heat/stacks/s/1")),
            deadline: Duration::from_secs(15),
        };
        assert_eq!(timeout.to_string(), "provisioning timed out after 15 secs");
    }

    #[test]
    fn test_default_settings() {
        let settings = RunSettings::default();
        assert_eq!(settings.stack_timeout, Duration::from_secs(600));
        assert_eq!(settings.check_timeout, Duration::from_secs(60));
        assert_eq!(settings.poll_interval, Duration::from_secs(10));
        assert!(!settings.teardown_on_success);
        assert_eq!(settings.submit.name_prefix, "stackprobe");
    }
}
