//! Provision a stack, wait for it, validate it
//!
//! ```text
//! create-stack ──► wait-for-ready ──► check 1 ──► … ──► Success
//!      │                 │                │           (stack kept)
//!      ▼                 ▼                ▼
//!  ProvisionFailed   ProvisionFailed   ValidationFailed / Timeout
//!                    / Timeout           (teardown first)
//!                    (teardown first)
//! ```
//!
//! Teardown runs at most once per failure: `wait_for_ready` and the pollers'
//! timeout actions delete the stack themselves, every other failure branch
//! that holds a handle deletes it here.

use stackprobe_models::{StackHandle, ValidationOutcome, Verdict};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::validate_deployment::validate_deployment;
use super::wait_for_ready::wait_for_ready;
use crate::activities::{create_stack, delete_stack};
use crate::checks::DeploymentCheck;
use crate::clients::StackService;
use crate::error::ProvisionError;
use crate::types::{RunOutcome, RunSettings, Stage};

pub struct Orchestrator {
    stacks: Arc<dyn StackService>,
    checks: Vec<Arc<dyn DeploymentCheck>>,
    settings: RunSettings,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(stacks: Arc<dyn StackService>, settings: RunSettings) -> Self {
        Self {
            stacks,
            checks: Vec::new(),
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Checks run in the order they were added
    pub fn with_check(mut self, check: Arc<dyn DeploymentCheck>) -> Self {
        self.checks.push(check);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(&self, template_file: &Path, key_name: &str) -> RunOutcome {
        tracing::info!(
            template = %template_file.display(),
            checks = self.checks.len(),
            "Starting stack provisioning run"
        );

        let handle = match create_stack::activity(
            self.stacks.as_ref(),
            template_file,
            key_name,
            &self.settings.submit,
        )
        .await
        {
            Ok(handle) => Arc::new(handle),
            Err(error) => return RunOutcome::ProvisionFailed { stack: None, error },
        };

        let status = match wait_for_ready(
            self.stacks.clone(),
            handle.clone(),
            self.settings.stack_timeout,
            self.settings.poll_interval,
            &self.cancel,
        )
        .await
        {
            Ok(status) => Arc::new(status),
            Err(ProvisionError::TimedOut { deadline }) => {
                return RunOutcome::Timeout { stage: Stage::Provisioning, stack: handle, deadline };
            }
            Err(ProvisionError::Cancelled) => {
                self.teardown(&handle).await;
                return RunOutcome::Interrupted { stack: Some(handle) };
            }
            Err(error @ ProvisionError::Poller(_)) => {
                self.teardown(&handle).await;
                return RunOutcome::ProvisionFailed { stack: Some(handle), error };
            }
            // wait_for_ready has already torn the stack down
            Err(error) => return RunOutcome::ProvisionFailed { stack: Some(handle), error },
        };

        let mut validations = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            let stacks = self.stacks.clone();
            let timeout_handle = handle.clone();

            let outcome = validate_deployment(
                check.clone(),
                status.clone(),
                self.settings.check_timeout,
                move || async move {
                    delete_stack::activity(stacks.as_ref(), &timeout_handle).await;
                },
                &self.cancel,
            )
            .await;

            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.teardown(&handle).await;
                    return RunOutcome::ValidationFailed {
                        stack: handle,
                        outcome: ValidationOutcome::failed(check.name(), e.to_string()),
                    };
                }
            };

            tracing::info!("{}", outcome);

            match outcome.verdict {
                Verdict::Passed => validations.push(outcome),
                Verdict::TimedOut if self.cancel.is_cancelled() => {
                    self.teardown(&handle).await;
                    return RunOutcome::Interrupted { stack: Some(handle) };
                }
                // the poller's timeout action has already torn the stack down
                Verdict::TimedOut => {
                    return RunOutcome::Timeout {
                        stage: Stage::Validation,
                        stack: handle,
                        deadline: self.settings.check_timeout,
                    };
                }
                Verdict::Failed => {
                    self.teardown(&handle).await;
                    return RunOutcome::ValidationFailed { stack: handle, outcome };
                }
            }
        }

        let torn_down = if self.settings.teardown_on_success {
            self.teardown(&handle).await;
            true
        } else {
            tracing::info!(stack = %handle, "Leaving stack running for inspection");
            false
        };

        RunOutcome::Success { stack: handle, validations, torn_down }
    }

    async fn teardown(&self, handle: &StackHandle) {
        delete_stack::activity(self.stacks.as_ref(), handle).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::OverlayNetworksCount;
    use crate::clients::CoordinationService;
    use crate::testing::{
        deployed_status, stack_status, FakeCoordination, FakeStackService, Scripted,
    };
    use stackprobe_models::statuses::{CREATE_FAILED, CREATE_IN_PROGRESS};
    use stackprobe_models::StackStatus;
    use std::path::PathBuf;
    use std::time::Duration;

    struct Harness {
        stacks: Arc<FakeStackService>,
        coordination: Arc<FakeCoordination>,
        _dir: tempfile::TempDir,
        template: PathBuf,
    }

    impl Harness {
        fn new(script: Vec<Scripted>, counts: Vec<Option<usize>>) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let template = dir.path().join("valid.yaml");
            std::fs::write(&template, "heat_template_version: 2013-05-23\nresources: {}\n")
                .unwrap();

            Self {
                stacks: Arc::new(FakeStackService::new(script)),
                coordination: Arc::new(FakeCoordination::new(counts)),
                _dir: dir,
                template,
            }
        }

        fn orchestrator(&self, settings: RunSettings) -> Orchestrator {
            let stacks: Arc<dyn StackService> = self.stacks.clone();
            let coordination: Arc<dyn CoordinationService> = self.coordination.clone();
            let interval = settings.poll_interval;

            Orchestrator::new(stacks, settings)
                .with_check(Arc::new(OverlayNetworksCount::new(coordination, interval)))
        }

        async fn run(&self, settings: RunSettings) -> RunOutcome {
            self.orchestrator(settings).run(&self.template, "ci-key").await
        }
    }

    fn in_progress() -> Scripted {
        Scripted::Status(stack_status(CREATE_IN_PROGRESS, ""))
    }

    fn complete() -> Scripted {
        Scripted::Status(deployed_status("10.0.0.5", "1", "3"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_proceeds_to_validation_without_teardown() {
        let harness = Harness::new(vec![in_progress(), in_progress(), complete()], vec![Some(4)]);

        let outcome = harness.run(RunSettings::default()).await;

        match &outcome {
            RunOutcome::Success { stack, validations, torn_down } => {
                assert_eq!(stack.as_ref(), &harness.stacks.handle);
                assert_eq!(validations.len(), 1);
                assert!(validations[0].is_passed());
                assert!(!torn_down);
            }
            other => panic!("unexpected outcome: {other}"),
        }
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(harness.stacks.status_calls(), 3);
        assert_eq!(harness.coordination.calls(), 1);
        assert!(harness.stacks.deleted().is_empty());

        let created = harness.stacks.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].parameters.get("key-name").map(String::as_str), Some("ci-key"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_flag_deletes_after_success() {
        let harness = Harness::new(vec![complete()], vec![Some(4)]);
        let settings = RunSettings { teardown_on_success: true, ..RunSettings::default() };

        let outcome = harness.run(settings).await;

        assert!(matches!(outcome, RunOutcome::Success { torn_down: true, .. }));
        assert_eq!(harness.stacks.deleted().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_stack_tears_down_once_and_keeps_reason() {
        let harness = Harness::new(
            vec![in_progress(), Scripted::Status(stack_status(CREATE_FAILED, "quota exceeded"))],
            vec![Some(4)],
        );

        let outcome = harness.run(RunSettings::default()).await;

        match &outcome {
            RunOutcome::ProvisionFailed { stack, error: ProvisionError::Failed { reason, .. } } => {
                assert_eq!(reason, "quota exceeded");
                assert_eq!(stack.as_deref(), Some(&harness.stacks.handle));
            }
            other => panic!("unexpected outcome: {other}"),
        }
        assert_eq!(harness.stacks.deleted(), vec![harness.stacks.handle.clone()]);
        assert_eq!(harness.stacks.deleted()[0].url, crate::testing::FAKE_STACK_URL);
        assert_eq!(harness.coordination.calls(), 0);
        assert_eq!(outcome.exit_code(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provisioning_timeout_tears_down_once() {
        let harness = Harness::new(vec![in_progress()], vec![Some(4)]);
        let settings =
            RunSettings { stack_timeout: Duration::from_secs(120), ..RunSettings::default() };

        let outcome = harness.run(settings).await;

        assert!(matches!(outcome, RunOutcome::Timeout { stage: Stage::Provisioning, .. }));
        assert_eq!(harness.stacks.deleted().len(), 1);
        assert_eq!(harness.coordination.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_timeout_tears_down_once() {
        let harness = Harness::new(vec![complete()], vec![Some(3)]);

        let outcome = harness.run(RunSettings::default()).await;

        assert!(matches!(outcome, RunOutcome::Timeout { stage: Stage::Validation, .. }));
        assert_eq!(harness.stacks.deleted().len(), 1);
        assert!(harness.coordination.calls() >= 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unusable_outputs_fail_validation() {
        let mut status = deployed_status("10.0.0.5", "1", "3");
        status.outputs.clear();
        let harness = Harness::new(vec![Scripted::Status(status)], vec![Some(4)]);

        let outcome = harness.run(RunSettings::default()).await;

        match &outcome {
            RunOutcome::ValidationFailed { outcome, .. } => {
                assert_eq!(outcome.verdict, Verdict::Failed);
                assert!(outcome.message.as_deref().unwrap().contains("overlord_ip"));
            }
            other => panic!("unexpected outcome: {other}"),
        }
        assert_eq!(harness.stacks.deleted().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_submission_has_no_stack_to_delete() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("valid.yaml");
        std::fs::write(&template, "resources: {}\n").unwrap();
        let stacks = Arc::new(FakeStackService::new(vec![complete()]).rejecting_creates());
        let service: Arc<dyn StackService> = stacks.clone();

        let outcome = Orchestrator::new(service, RunSettings::default())
            .run(&template, "ci-key")
            .await;

        assert!(matches!(
            outcome,
            RunOutcome::ProvisionFailed { stack: None, error: ProvisionError::Submit(_) }
        ));
        assert!(stacks.deleted().is_empty());
        assert_eq!(stacks.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_while_waiting_tears_down() {
        let harness = Harness::new(vec![in_progress()], vec![Some(4)]);
        let orchestrator = harness.orchestrator(RunSettings::default());

        let cancel = orchestrator.cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(25)).await;
            cancel.cancel();
        });

        let outcome = orchestrator.run(&harness.template, "ci-key").await;

        assert!(matches!(outcome, RunOutcome::Interrupted { stack: Some(_) }));
        assert_eq!(outcome.exit_code(), 130);
        assert_eq!(harness.stacks.deleted().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_validation_tears_down() {
        let harness = Harness::new(vec![complete()], vec![Some(3)]);
        let orchestrator = harness.orchestrator(RunSettings::default());

        let cancel = orchestrator.cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(25)).await;
            cancel.cancel();
        });

        let outcome = orchestrator.run(&harness.template, "ci-key").await;

        assert!(matches!(outcome, RunOutcome::Interrupted { stack: Some(_) }));
        assert_eq!(outcome.exit_code(), 130);
        assert_eq!(harness.coordination.calls(), 3);
        assert_eq!(harness.stacks.deleted(), vec![harness.stacks.handle.clone()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lost_provisioning_worker_tears_down() {
        let harness = Harness::new(vec![in_progress(), Scripted::Panic], vec![Some(4)]);

        let outcome = harness.run(RunSettings::default()).await;

        assert!(matches!(
            outcome,
            RunOutcome::ProvisionFailed { stack: Some(_), error: ProvisionError::Poller(_) }
        ));
        assert_eq!(harness.stacks.deleted().len(), 1);
        assert_eq!(harness.coordination.calls(), 0);
    }

    struct PanickingCheck;

    #[async_trait::async_trait]
    impl DeploymentCheck for PanickingCheck {
        fn name(&self) -> &str {
            "panicking_check"
        }

        async fn run(
            &self,
            _status: Arc<StackStatus>,
            _cancel: CancellationToken,
        ) -> ValidationOutcome {
            panic!("check blew up")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_lost_validation_worker_fails_and_tears_down() {
        let harness = Harness::new(vec![complete()], vec![Some(4)]);
        let stacks: Arc<dyn StackService> = harness.stacks.clone();

        let outcome = Orchestrator::new(stacks, RunSettings::default())
            .with_check(Arc::new(PanickingCheck))
            .run(&harness.template, "ci-key")
            .await;

        match &outcome {
            RunOutcome::ValidationFailed { outcome, .. } => {
                assert_eq!(outcome.check, "panicking_check");
                assert_eq!(outcome.verdict, Verdict::Failed);
            }
            other => panic!("unexpected outcome: {other}"),
        }
        assert_eq!(harness.stacks.deleted().len(), 1);
    }
}
