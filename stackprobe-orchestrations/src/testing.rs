//! In-memory fakes for the remote service seams

use async_trait::async_trait;
use stackprobe_models::{StackHandle, StackRequest, StackStatus};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::clients::{CoordinationService, StackService};
use crate::error::ClientError;
use crate::names::{outputs, parameters};

pub const FAKE_STACK_URL: &str = "http://heat.test/v1/tenant/stacks/stackprobe-1/abc";

/// One scripted answer to a status poll
#[derive(Debug, Clone)]
pub enum Scripted {
    Status(StackStatus),
    Unavailable,
    /// The status call panics, taking the polling task down with it
    Panic,
}

pub fn stack_status(code: &str, reason: &str) -> StackStatus {
    StackStatus {
        status: code.to_string(),
        reason: reason.to_string(),
        outputs: BTreeMap::new(),
        parameters: BTreeMap::new(),
        created_at: None,
    }
}

/// A complete stack with an overlord address and node counts
pub fn deployed_status(overlord_ip: &str, masters: &str, minions: &str) -> StackStatus {
    let mut status = stack_status(stackprobe_models::statuses::CREATE_COMPLETE, "");
    status.outputs.insert(
        outputs::OVERLORD_IP.to_string(),
        serde_json::Value::String(overlord_ip.to_string()),
    );
    status.parameters.insert(parameters::MASTER_COUNT.to_string(), masters.to_string());
    status.parameters.insert(parameters::MINION_COUNT.to_string(), minions.to_string());
    status
}

/// Replays scripted statuses; the last entry repeats forever
pub struct FakeStackService {
    pub handle: StackHandle,
    script: Mutex<VecDeque<Scripted>>,
    created: Mutex<Vec<StackRequest>>,
    deleted: Mutex<Vec<StackHandle>>,
    status_calls: AtomicUsize,
    reject_creates: bool,
    reject_deletes: bool,
    delete_delay: Option<Duration>,
}

impl FakeStackService {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            handle: StackHandle {
                url: FAKE_STACK_URL.to_string(),
                id: Some("abc".to_string()),
            },
            script: Mutex::new(script.into()),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
            reject_creates: false,
            reject_deletes: false,
            delete_delay: None,
        }
    }

    pub fn rejecting_creates(mut self) -> Self {
        self.reject_creates = true;
        self
    }

    pub fn rejecting_deletes(mut self) -> Self {
        self.reject_deletes = true;
        self
    }

    /// Every delete takes `delay` to complete
    pub fn with_delete_delay(mut self, delay: Duration) -> Self {
        self.delete_delay = Some(delay);
        self
    }

    pub fn created(&self) -> Vec<StackRequest> {
        self.created.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<StackHandle> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn next_scripted(&self) -> Scripted {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap_or(Scripted::Unavailable)
        }
    }
}

#[async_trait]
impl StackService for FakeStackService {
    async fn create_stack(&self, request: &StackRequest) -> Result<StackHandle, ClientError> {
        if self.reject_creates {
            return Err(ClientError::UnexpectedStatus {
                url: "http://heat.test/stacks".into(),
                status: 400,
            });
        }
        self.created.lock().unwrap().push(request.clone());
        Ok(self.handle.clone())
    }

    async fn stack_status(&self, handle: &StackHandle) -> Result<StackStatus, ClientError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match self.next_scripted() {
            Scripted::Status(status) => Ok(status),
            Scripted::Unavailable => Err(ClientError::UnexpectedStatus {
                url: handle.url.clone(),
                status: 503,
            }),
            Scripted::Panic => panic!("status call for {} blew up", handle),
        }
    }

    async fn delete_stack(&self, handle: &StackHandle) -> Result<(), ClientError> {
        self.deleted.lock().unwrap().push(handle.clone());
        if let Some(delay) = self.delete_delay {
            tokio::time::sleep(delay).await;
        }
        if self.reject_deletes {
            return Err(ClientError::UnexpectedStatus { url: handle.url.clone(), status: 409 });
        }
        Ok(())
    }
}

/// Replays scripted subnet counts (`None` = request failure); the last entry repeats
pub struct FakeCoordination {
    counts: Mutex<VecDeque<Option<usize>>>,
    calls: AtomicUsize,
    addresses: Mutex<Vec<String>>,
}

impl FakeCoordination {
    pub fn new(counts: Vec<Option<usize>>) -> Self {
        Self {
            counts: Mutex::new(counts.into()),
            calls: AtomicUsize::new(0),
            addresses: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn addresses(&self) -> Vec<String> {
        self.addresses.lock().unwrap().clone()
    }
}

#[async_trait]
impl CoordinationService for FakeCoordination {
    async fn subnet_count(&self, address: &str) -> Result<usize, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.addresses.lock().unwrap().push(address.to_string());

        let next = {
            let mut counts = self.counts.lock().unwrap();
            if counts.len() > 1 {
                counts.pop_front().flatten()
            } else {
                counts.front().copied().flatten()
            }
        };

        next.ok_or_else(|| ClientError::UnexpectedStatus {
            url: format!("http://{}:2379/v2/keys/coreos.com/network/subnets", address),
            status: 500,
        })
    }
}
