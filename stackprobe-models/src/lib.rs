use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameter carrying the SSH key-pair name into the template
pub const KEY_NAME_PARAMETER: &str = "key-name";

/// Stack creation timeout (minutes) handed to the provisioning service
pub const DEFAULT_CREATION_TIMEOUT_MINS: u32 = 10;

// ============================================================================
// Stack request
// ============================================================================

/// Create-stack request body, in the shape the Heat API expects
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackRequest {
    /// Unique stack name (`{prefix}-{unix seconds}`)
    #[serde(rename = "stack_name")]
    pub name: String,
    /// Template body, passed through untouched
    pub template: String,
    /// Template parameters
    pub parameters: BTreeMap<String, String>,
    /// Creation timeout in minutes
    pub timeout_mins: u32,
    /// Keep a failed stack around instead of rolling it back
    pub disable_rollback: bool,
}

impl StackRequest {
    pub fn new(prefix: &str, template: String, key_name: &str, now: DateTime<Utc>) -> Self {
        let mut parameters = BTreeMap::new();
        parameters.insert(KEY_NAME_PARAMETER.to_string(), key_name.to_string());

        Self {
            name: unique_stack_name(prefix, now),
            template,
            parameters,
            timeout_mins: DEFAULT_CREATION_TIMEOUT_MINS,
            disable_rollback: false,
        }
    }

    pub fn with_timeout_mins(mut self, timeout_mins: u32) -> Self {
        self.timeout_mins = timeout_mins;
        self
    }

    pub fn with_disable_rollback(mut self, disable_rollback: bool) -> Self {
        self.disable_rollback = disable_rollback;
        self
    }
}

/// Stack names are qualified with the submission time to avoid collisions
pub fn unique_stack_name(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}", prefix, now.timestamp())
}

// ============================================================================
// Stack handle
// ============================================================================

/// Identifies a submitted stack for every later stage (status, teardown)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StackHandle {
    /// Self link returned by the provisioning service
    pub url: String,
    /// Stack id, when the service reported one
    pub id: Option<String>,
}

impl StackHandle {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), id: None }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Display for StackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

// ============================================================================
// Provisioning service responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub href: String,
    #[serde(default)]
    pub rel: Option<String>,
}

/// `POST /stacks` response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateStackResponse {
    pub stack: CreatedStack,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatedStack {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl CreateStackResponse {
    /// The first link is the stack's self link; `None` when the service sent none
    pub fn into_handle(self) -> Option<StackHandle> {
        let id = self.stack.id;
        self.stack
            .links
            .into_iter()
            .next()
            .map(|link| StackHandle { url: link.href, id })
    }
}

/// `GET {handle}` response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackDetailsResponse {
    pub stack: StackDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackDetails {
    #[serde(default)]
    pub stack_name: Option<String>,
    pub stack_status: String,
    #[serde(default)]
    pub stack_status_reason: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub outputs: Vec<StackOutput>,
    #[serde(default)]
    pub creation_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackOutput {
    pub output_key: String,
    #[serde(default)]
    pub output_value: serde_json::Value,
    #[serde(default)]
    pub description: Option<String>,
}

// ============================================================================
// Stack status
// ============================================================================

/// Heat status literals the provisioner reacts to
pub mod statuses {
    pub const CREATE_IN_PROGRESS: &str = "CREATE_IN_PROGRESS";
    pub const CREATE_COMPLETE: &str = "CREATE_COMPLETE";
    pub const CREATE_FAILED: &str = "CREATE_FAILED";
}

/// Snapshot of a stack produced by a single status poll
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackStatus {
    pub status: String,
    pub reason: String,
    /// Output key -> value
    pub outputs: BTreeMap<String, serde_json::Value>,
    /// Input parameter name -> value
    pub parameters: BTreeMap<String, String>,
    /// When the provisioning service started creating the stack
    #[serde(default)]
    pub created_at: Option<String>,
}

impl StackStatus {
    pub fn phase(&self) -> StackPhase {
        StackPhase::classify(&self.status)
    }

    /// String value of an output, `None` if absent or not a string
    pub fn output_str(&self, key: &str) -> Option<&str> {
        self.outputs.get(key).and_then(|v| v.as_str())
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

impl From<StackDetails> for StackStatus {
    fn from(details: StackDetails) -> Self {
        let parameters = details
            .parameters
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (name, value)
            })
            .collect();

        let outputs = details
            .outputs
            .into_iter()
            .map(|output| (output.output_key, output.output_value))
            .collect();

        Self {
            status: details.stack_status,
            reason: details.stack_status_reason.unwrap_or_default(),
            outputs,
            parameters,
            created_at: details.creation_time,
        }
    }
}

/// Classification of a stack status string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackPhase {
    /// Still being created; the only state that is polled again
    InProgress,
    /// Created successfully
    Complete,
    /// Any other status, failures included
    OtherTerminal(String),
}

impl StackPhase {
    pub fn classify(status: &str) -> Self {
        match status {
            statuses::CREATE_IN_PROGRESS => StackPhase::InProgress,
            statuses::CREATE_COMPLETE => StackPhase::Complete,
            other => StackPhase::OtherTerminal(other.to_string()),
        }
    }
}

// ============================================================================
// Validation
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Passed,
    Failed,
    TimedOut,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::Passed => "Passed",
            Verdict::Failed => "Failed",
            Verdict::TimedOut => "TimedOut",
        };
        f.write_str(s)
    }
}

/// Result of one post-deploy check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Name of the check that produced this outcome
    pub check: String,
    pub verdict: Verdict,
    /// Diagnostic detail, if any
    pub message: Option<String>,
}

impl ValidationOutcome {
    pub fn passed(check: impl Into<String>) -> Self {
        Self { check: check.into(), verdict: Verdict::Passed, message: None }
    }

    pub fn failed(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self { check: check.into(), verdict: Verdict::Failed, message: Some(message.into()) }
    }

    pub fn timed_out(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self { check: check.into(), verdict: Verdict::TimedOut, message: Some(message.into()) }
    }

    pub fn is_passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }
}

impl std::fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{} {}: {}", self.check, self.verdict, msg),
            None => write!(f, "{} {}.", self.check, self.verdict),
        }
    }
}

// ============================================================================
// Coordination service (etcd v2 keys API)
// ============================================================================

/// `GET /v2/keys/{namespace}/subnets` response
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubnetListing {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub node: Option<KeyNode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KeyNode {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub dir: bool,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub nodes: Vec<KeyNode>,
}

impl SubnetListing {
    /// Number of subnet leases listed under the directory
    pub fn count(&self) -> usize {
        self.node.as_ref().map(|n| n.nodes.len()).unwrap_or(0)
    }
}

// ============================================================================
// Identity
// ============================================================================

/// Bearer token sent as `X-Auth-Token`
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub id: String,
    /// `None` for tokens that never expire (pre-issued)
    pub expires: Option<DateTime<Utc>>,
}

impl AuthToken {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), expires: None }
    }

    /// True if the token expires within `margin` of `now`
    pub fn expires_within(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        match self.expires {
            Some(expires) => expires - margin <= now,
            None => false,
        }
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("id", &"****")
            .field("expires", &self.expires)
            .finish()
    }
}
