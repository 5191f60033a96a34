//! Remote service seams used by the activities
//!
//! Each trait has one reqwest-backed implementation; tests substitute
//! in-memory fakes.

use async_trait::async_trait;
use stackprobe_models::{AuthToken, StackHandle, StackRequest, StackStatus};

use crate::error::{ClientError, CredentialError};

pub mod etcd;
pub mod heat;
pub mod identity;

pub use etcd::EtcdClient;
pub use heat::HeatClient;
pub use identity::{CachedCredentials, IdentityClient, StaticToken};

/// Header carrying the bearer token on provisioning calls
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Stack provisioning service (Heat)
#[async_trait]
pub trait StackService: Send + Sync {
    /// `POST {base}/stacks`, expecting 201 and a self link
    async fn create_stack(&self, request: &StackRequest) -> Result<StackHandle, ClientError>;

    /// `GET {handle}`, expecting 200
    async fn stack_status(&self, handle: &StackHandle) -> Result<StackStatus, ClientError>;

    /// `DELETE {handle}`, expecting 204
    async fn delete_stack(&self, handle: &StackHandle) -> Result<(), ClientError>;
}

/// Coordination service running inside the stack
#[async_trait]
pub trait CoordinationService: Send + Sync {
    /// Number of overlay network leases registered at `address`
    async fn subnet_count(&self, address: &str) -> Result<usize, ClientError>;
}

/// Source of the `X-Auth-Token` value
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn token(&self) -> Result<AuthToken, CredentialError>;
}
