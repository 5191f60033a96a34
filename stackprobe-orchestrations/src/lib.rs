//! Stackprobe Orchestrations - provision a Heat stack, wait for it, validate it
//!
//! This crate provides the bounded poller, the provisioning and validation
//! stages built on it, and the HTTP clients for the orchestration, identity
//! and etcd services.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stackprobe_orchestrations::{
//!     clients::{EtcdClient, HeatClient, StaticToken},
//!     checks::OverlayNetworksCount,
//!     Orchestrator, RunSettings,
//! };
//!
//! # async fn example() {
//! let settings = RunSettings::default();
//! let token = Arc::new(StaticToken::new("token"));
//! let heat = HeatClient::new("https://heat.example/v1/tenant", token);
//! let check = OverlayNetworksCount::new(Arc::new(EtcdClient::default()), settings.poll_interval);
//!
//! let outcome = Orchestrator::new(Arc::new(heat), settings)
//!     .with_check(Arc::new(check))
//!     .run("cluster.yaml".as_ref(), "ci-key")
//!     .await;
//!
//! std::process::exit(outcome.exit_code());
//! # }
//! ```

pub mod activities;
pub mod checks;
pub mod clients;
pub mod error;
pub mod names;
pub mod orchestrations;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export key types for convenience
pub use error::{ClientError, CredentialError, PollerError, ProvisionError};
pub use orchestrations::{BoundedPoller, Orchestrator, RaceOutcome};
pub use types::*;
