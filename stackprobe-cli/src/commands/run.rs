//! `stackprobe run`: provision, wait, validate, report

use anyhow::Result;
use stackprobe_orchestrations::checks::OverlayNetworksCount;
use stackprobe_orchestrations::clients::{EtcdClient, HeatClient};
use stackprobe_orchestrations::{Orchestrator, RunOutcome, RunSettings, SubmitOptions};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct RunArgs {
    pub template_file: PathBuf,
    pub stack_timeout_mins: u64,
    pub test_timeout_mins: u64,
    pub poll_interval_secs: u64,
    pub creation_timeout_mins: u32,
    pub disable_rollback: bool,
    pub cleanup: bool,
}

impl RunArgs {
    fn settings(&self, config: &Config) -> RunSettings {
        RunSettings {
            submit: SubmitOptions {
                name_prefix: config.stack_prefix.clone(),
                creation_timeout_mins: self.creation_timeout_mins,
                disable_rollback: self.disable_rollback,
            },
            stack_timeout: Duration::from_secs(self.stack_timeout_mins.saturating_mul(60)),
            check_timeout: Duration::from_secs(self.test_timeout_mins.saturating_mul(60)),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            teardown_on_success: self.cleanup,
        }
    }
}

/// Returns the process exit code for the outcome
pub async fn run(args: RunArgs) -> Result<i32> {
    let config = Config::load()?;
    let settings = args.settings(&config);

    let heat = HeatClient::new(config.heat_url.clone(), config.credential_provider());
    let etcd = EtcdClient::new(config.etcd_port);
    let overlay = OverlayNetworksCount::new(Arc::new(etcd), settings.poll_interval);

    let cancel = CancellationToken::new();
    spawn_interrupt_watcher(cancel.clone());

    let orchestrator = Orchestrator::new(Arc::new(heat), settings)
        .with_check(Arc::new(overlay))
        .with_cancellation(cancel);

    let outcome = orchestrator.run(&args.template_file, &config.key_name).await;

    report(&outcome);
    Ok(outcome.exit_code())
}

/// First Ctrl-C cancels the run; pollers stop and the stack is torn down
fn spawn_interrupt_watcher(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping run");
            cancel.cancel();
        }
    });
}

/// The single place a run outcome is logged
fn report(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Success { stack, torn_down, .. } => {
            if *torn_down {
                tracing::info!("✓ Run succeeded, stack deleted");
            } else {
                tracing::info!("✓ Run succeeded, stack left running: {}", stack);
                tracing::info!("  Remove it with: stackprobe delete {}", stack);
            }
        }
        RunOutcome::Interrupted { stack } => {
            tracing::warn!(stack = ?stack.as_deref().map(|s| s.url()), "✗ {}", outcome);
        }
        _ => {
            tracing::error!(stack = ?outcome.stack().map(|s| s.url()), "✗ {}", outcome);
        }
    }
}
