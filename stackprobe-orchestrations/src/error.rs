//! Error types for the stackprobe clients and orchestrations

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::types::describe_duration;

/// Failure talking to the identity provider
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("identity request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("identity service {url} rejected credentials with status {status}")]
    Rejected { url: String, status: u16 },

    #[error("malformed identity response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of a single remote call
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned unexpected status {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response from {url} carried no stack link")]
    MissingLink { url: String },

    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

#[derive(Debug, Error)]
pub enum PollerError {
    #[error("{label}: worker task ended without producing a result")]
    WorkerLost { label: String },
}

/// Why a stack could not be brought to `CREATE_COMPLETE`
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to read template {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template {} is not valid YAML: {source}", path.display())]
    TemplateSyntax {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("stack create request failed: {0}")]
    Submit(#[source] ClientError),

    #[error("stack reached status {status}: {reason}")]
    Failed { status: String, reason: String },

    #[error("stack status unavailable: {0}")]
    StatusUnavailable(#[source] ClientError),

    #[error("stack create timed out after {}", describe_duration(*deadline))]
    TimedOut { deadline: Duration },

    #[error("stack watch cancelled")]
    Cancelled,

    #[error(transparent)]
    Poller(#[from] PollerError),
}
