//! Race a long-running operation against a hard deadline
//!
//! ```text
//! Operation first:
//!   spawn(operation) → oneshot ← value → Completed(value)
//!
//! Deadline first:
//!   sleep(deadline) → cancel child token → on_timeout() → TimedOut
//!                     (late value from the worker is discarded)
//! ```
//!
//! ## Rules
//! - Exactly **one** branch runs: the value is returned, or `on_timeout` runs once
//! - The worker gets a **child** token; cancelling it never affects the parent
//! - A worker that dies without a value is `PollerError::WorkerLost`, and
//!   `on_timeout` is not run

use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::PollerError;
use crate::types::describe_duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceOutcome<T> {
    /// The operation produced its value before the deadline
    Completed(T),
    /// The deadline fired first; the timeout action has run
    TimedOut { deadline: Duration },
}

#[derive(Debug, Clone)]
pub struct BoundedPoller {
    label: String,
    deadline: Duration,
}

impl BoundedPoller {
    pub fn new(label: impl Into<String>, deadline: Duration) -> Self {
        Self { label: label.into(), deadline }
    }

    /// Runs `operation` on its own task and races it against the deadline.
    ///
    /// `operation` receives a child of `parent` that is cancelled when the
    /// deadline wins, so poll loops can stop promptly. If the deadline and
    /// the operation become ready at the same instant, the deadline wins.
    pub async fn race<T, Op, OpFut, Abort, AbortFut>(
        &self,
        parent: &CancellationToken,
        operation: Op,
        on_timeout: Abort,
    ) -> Result<RaceOutcome<T>, PollerError>
    where
        T: Send + 'static,
        Op: FnOnce(CancellationToken) -> OpFut,
        OpFut: Future<Output = T> + Send + 'static,
        Abort: FnOnce() -> AbortFut,
        AbortFut: Future<Output = ()>,
    {
        let child = parent.child_token();
        let (tx, rx) = oneshot::channel();

        let work = operation(child.clone());
        tokio::spawn(async move {
            // receiver is gone once the deadline has won
            let _ = tx.send(work.await);
        });

        tracing::debug!(
            poller = %self.label,
            deadline_secs = self.deadline.as_secs(),
            "Race started"
        );

        tokio::select! {
            biased;

            _ = time::sleep(self.deadline) => {
                child.cancel();
                tracing::warn!(
                    poller = %self.label,
                    "Deadline of {} reached before the operation finished",
                    describe_duration(self.deadline)
                );
                on_timeout().await;
                Ok(RaceOutcome::TimedOut { deadline: self.deadline })
            }

            received = rx => match received {
                Ok(value) => {
                    tracing::debug!(poller = %self.label, "Operation finished before the deadline");
                    Ok(RaceOutcome::Completed(value))
                }
                Err(_) => {
                    tracing::error!(poller = %self.label, "Worker task ended without a result");
                    Err(PollerError::WorkerLost { label: self.label.clone() })
                }
            },
        }
    }
}
